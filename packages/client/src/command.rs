//! Parsing of lines typed at the prompt.

/// What a line of input asks the client to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Plain text to send to the room
    Say(String),
    /// `/leave`
    Leave,
    /// `/end` ends the chat session for both participants
    End,
    /// `/quit` or `/exit`
    Quit,
    /// `/help`
    Help,
    /// Blank line
    Empty,
    /// Unrecognized slash command
    Unknown(String),
}

pub const HELP: &str = "\
/leave  leave the room (stay connected)
/end    end the chat session
/quit   disconnect and exit
/help   show this help";

impl Command {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Self::Empty;
        }

        match trimmed {
            "/leave" => Self::Leave,
            "/end" => Self::End,
            "/quit" | "/exit" => Self::Quit,
            "/help" => Self::Help,
            other if other.starts_with('/') && !other.contains(' ') => {
                Self::Unknown(other.to_string())
            }
            // Send the line as typed; the server sanitizes it
            _ => Self::Say(line.to_string()),
        }
    }
}
