//! WebSocket event DTOs for the relay protocol.
//!
//! Every frame is a JSON object tagged by `type`.

use serde::{Deserialize, Serialize};

use super::http::{CrisisResponseDto, MessageDto, SessionDto};
use crate::domain::Participant;

/// Events sent by clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    JoinRoom {
        room_id: String,
        /// Overrides the connection's display name inside this room
        #[serde(default, skip_serializing_if = "Option::is_none")]
        display_name: Option<String>,
    },
    SendMessage {
        room_id: String,
        /// Must match the connection's user when present
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sender_id: Option<String>,
        content: String,
    },
    Typing {
        room_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sender_id: Option<String>,
    },
    StopTyping {
        room_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sender_id: Option<String>,
    },
    LeaveRoom {
        room_id: String,
    },
}

impl ClientEvent {
    pub fn room_id(&self) -> &str {
        match self {
            Self::JoinRoom { room_id, .. }
            | Self::SendMessage { room_id, .. }
            | Self::Typing { room_id, .. }
            | Self::StopTyping { room_id, .. }
            | Self::LeaveRoom { room_id } => room_id,
        }
    }
}

/// Participant information sent with `room_joined`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantInfo {
    pub user_id: String,
    pub display_name: String,
    /// Unix timestamp (milliseconds since epoch) in KST
    pub joined_at: i64,
}

impl From<&Participant> for ParticipantInfo {
    fn from(participant: &Participant) -> Self {
        Self {
            user_id: participant.user_id.as_str().to_string(),
            display_name: participant.display_name.as_str().to_string(),
            joined_at: participant.joined_at.value(),
        }
    }
}

/// Events sent by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Ack to the joiner only
    RoomJoined {
        room_id: String,
        participants: Vec<ParticipantInfo>,
    },
    /// Ack to the leaver only
    RoomLeft { room_id: String },
    ReceiveMessage {
        room_id: String,
        display_name: String,
        message: MessageDto,
    },
    UserTyping {
        room_id: String,
        sender_id: String,
        display_name: String,
    },
    StopTyping {
        room_id: String,
        sender_id: String,
    },
    /// Moderation rejection, to the sender only
    MessageRejected {
        room_id: String,
        reason: String,
        filtered_content: String,
    },
    /// Crisis override, to the sender only
    CrisisResources {
        room_id: String,
        crisis: CrisisResponseDto,
    },
    Matched {
        session: SessionDto,
    },
    SessionEnded {
        session: SessionDto,
    },
    Error {
        message: String,
    },
}

impl ServerEvent {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}
