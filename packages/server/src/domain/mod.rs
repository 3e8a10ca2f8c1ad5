//! Domain layer for the support chat.
//!
//! This module contains business logic that is independent of
//! data transfer objects (DTOs) and infrastructure concerns.

pub mod analyzer;
pub mod entity;
pub mod error;
pub mod factory;
pub mod moderation;
pub mod probability;
pub mod repository;
pub mod value_object;

pub use analyzer::{
    ComfortPrompt, CrisisAssessment, EmotionAnalysis, FALLBACK_COMFORT_MESSAGE, TextAnalyzer,
    fallback_comfort_for,
};
pub use entity::{AiKind, ChatMessage, ChatSession, NewChatMessage, Participant, Presence, Room};
pub use error::{AnalyzerError, RepositoryError, RoomError, ValueObjectError};
pub use factory::{IdentityFactory, SessionIdFactory};
pub use moderation::{KeywordMatcher, ModerationGate, ModerationVerdict, SubstringMatcher};
pub use probability::{FixedProbability, ProbabilitySource};
pub use repository::ChatRepository;
pub use value_object::{
    ConnectionId, DisplayName, MAX_CONTENT_LENGTH, MessageContent, MessageId, RoomId, SessionId,
    Timestamp, UserId,
};

#[cfg(test)]
pub use analyzer::MockTextAnalyzer;
#[cfg(test)]
pub use repository::MockChatRepository;
