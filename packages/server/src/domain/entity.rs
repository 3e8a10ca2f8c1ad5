//! Core domain models for the support chat.

use serde::{Deserialize, Serialize};

use super::{
    error::RoomError,
    value_object::{
        ConnectionId, DisplayName, MessageContent, MessageId, RoomId, SessionId, Timestamp, UserId,
    },
};

/// Default maximum number of participants allowed in a room
pub const DEFAULT_PARTICIPANT_CAPACITY: usize = 10;

/// Represents a room: an ephemeral broadcast group and its current members
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    /// Room identifier
    pub id: RoomId,
    /// Participants currently joined, in join order
    pub participants: Vec<Participant>,
    /// Timestamp when the room was created (first join)
    pub created_at: Timestamp,
    /// Maximum number of participants allowed (default: 10)
    pub participant_capacity: usize,
}

impl Room {
    /// Create a new empty room with the given ID and creation timestamp
    pub fn new(id: RoomId, created_at: Timestamp) -> Self {
        Self::with_capacity(id, created_at, DEFAULT_PARTICIPANT_CAPACITY)
    }

    /// Create a new empty room with a custom participant capacity
    pub fn with_capacity(id: RoomId, created_at: Timestamp, participant_capacity: usize) -> Self {
        Self {
            id,
            participants: Vec::new(),
            created_at,
            participant_capacity,
        }
    }

    /// Add a participant to the room.
    ///
    /// A participant already joined on the same connection is replaced, which
    /// resets it to a fresh idle state.
    ///
    /// # Errors
    ///
    /// Returns `RoomError::CapacityExceeded` if the room is at full capacity
    pub fn add_participant(&mut self, participant: Participant) -> Result<(), RoomError> {
        if let Some(existing) = self
            .participants
            .iter_mut()
            .find(|p| p.connection_id == participant.connection_id)
        {
            *existing = participant;
            return Ok(());
        }
        if self.participants.len() >= self.participant_capacity {
            return Err(RoomError::CapacityExceeded {
                capacity: self.participant_capacity,
                current: self.participants.len(),
            });
        }
        self.participants.push(participant);
        Ok(())
    }

    /// Remove a participant from the room by connection
    pub fn remove_participant(&mut self, connection_id: ConnectionId) -> Option<Participant> {
        let index = self
            .participants
            .iter()
            .position(|p| p.connection_id == connection_id)?;
        Some(self.participants.remove(index))
    }

    /// Get a participant by connection
    pub fn get_participant(&self, connection_id: ConnectionId) -> Option<&Participant> {
        self.participants
            .iter()
            .find(|p| p.connection_id == connection_id)
    }

    /// Update the presence of a joined participant. Returns false if not joined.
    pub fn set_presence(&mut self, connection_id: ConnectionId, presence: Presence) -> bool {
        match self
            .participants
            .iter_mut()
            .find(|p| p.connection_id == connection_id)
        {
            Some(participant) => {
                participant.presence = presence;
                true
            }
            None => false,
        }
    }

    /// Connections of every participant except `exclude`
    pub fn connections_except(&self, exclude: Option<ConnectionId>) -> Vec<ConnectionId> {
        self.participants
            .iter()
            .map(|p| p.connection_id)
            .filter(|id| Some(*id) != exclude)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}

/// Per-participant presence while joined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Idle,
    Typing,
}

/// Represents a participant joined to a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Connection this participant is bound to
    pub connection_id: ConnectionId,
    /// Anonymous user behind the connection
    pub user_id: UserId,
    /// Pseudonym shown to others
    pub display_name: DisplayName,
    /// Timestamp when the participant joined
    pub joined_at: Timestamp,
    pub presence: Presence,
}

impl Participant {
    /// Create a freshly joined, idle participant
    pub fn new(
        connection_id: ConnectionId,
        user_id: UserId,
        display_name: DisplayName,
        joined_at: Timestamp,
    ) -> Self {
        Self {
            connection_id,
            user_id,
            display_name,
            joined_at,
            presence: Presence::Idle,
        }
    }
}

/// A pairing record between two participants (or one participant and the AI)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: SessionId,
    pub participant_a: UserId,
    pub participant_b: Option<UserId>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub ended_at: Option<Timestamp>,
}

impl ChatSession {
    /// Create a session owned by `owner` that is awaiting a match
    pub fn awaiting(id: SessionId, owner: UserId, created_at: Timestamp) -> Self {
        Self {
            id,
            participant_a: owner,
            participant_b: None,
            is_active: true,
            created_at,
            ended_at: None,
        }
    }

    /// Active and still missing its second participant
    pub fn is_awaiting(&self) -> bool {
        self.is_active && self.participant_b.is_none()
    }

    /// Whether `user` may be matched into this session (never its own owner)
    pub fn is_available_for(&self, user: &UserId) -> bool {
        self.is_awaiting() && &self.participant_a != user
    }

    /// Bind the second participant.
    ///
    /// Succeeds only while the session is still available for `user`, so a
    /// second concurrent bind against the same session fails.
    pub fn bind(&mut self, user: UserId) -> bool {
        if !self.is_available_for(&user) {
            return false;
        }
        self.participant_b = Some(user);
        true
    }

    /// Mark the session ended. Ending twice keeps the first end time.
    pub fn end(&mut self, at: Timestamp) {
        if self.is_active {
            self.is_active = false;
            self.ended_at = Some(at);
        }
    }

    pub fn has_participant(&self, user: &UserId) -> bool {
        &self.participant_a == user || self.participant_b.as_ref() == Some(user)
    }

    /// The other party of the session, if bound
    pub fn counterpart_of(&self, user: &UserId) -> Option<&UserId> {
        if &self.participant_a == user {
            self.participant_b.as_ref()
        } else if self.participant_b.as_ref() == Some(user) {
            Some(&self.participant_a)
        } else {
            None
        }
    }
}

/// Kind of AI-generated message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiKind {
    Comfort,
}

/// A persisted chat message. Content is always sanitized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub session_id: SessionId,
    pub sender_id: UserId,
    pub content: MessageContent,
    pub is_ai_message: bool,
    pub ai_kind: Option<AiKind>,
    pub created_at: Timestamp,
}

/// A message to be appended to storage; the repository assigns id and time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChatMessage {
    pub session_id: SessionId,
    pub sender_id: UserId,
    pub content: MessageContent,
    pub ai_kind: Option<AiKind>,
}

impl NewChatMessage {
    /// A message typed by a participant
    pub fn from_user(session_id: SessionId, sender_id: UserId, content: MessageContent) -> Self {
        Self {
            session_id,
            sender_id,
            content,
            ai_kind: None,
        }
    }

    /// An AI message attributed to the triggering sender's slot
    pub fn from_ai(
        session_id: SessionId,
        sender_id: UserId,
        content: MessageContent,
        kind: AiKind,
    ) -> Self {
        Self {
            session_id,
            sender_id,
            content,
            ai_kind: Some(kind),
        }
    }

    pub fn is_ai_message(&self) -> bool {
        self.ai_kind.is_some()
    }
}
