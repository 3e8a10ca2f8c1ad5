//! Storage collaborator contract for chat sessions and messages.
//!
//! The core depends only on this trait; any backing store can sit behind it.

use async_trait::async_trait;

use super::{
    entity::{ChatMessage, ChatSession, NewChatMessage},
    error::RepositoryError,
    value_object::{SessionId, Timestamp, UserId},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatRepository: Send + Sync {
    /// Oldest session that is active, has no second participant and is not
    /// owned by `exclude`.
    async fn find_available_session(
        &self,
        exclude: &UserId,
    ) -> Result<Option<ChatSession>, RepositoryError>;

    /// Conditionally bind `user` as the second participant.
    ///
    /// Returns the updated session, or `None` when the session is no longer
    /// available (already bound, ended, or owned by `user`). At most one
    /// concurrent bind per session returns `Some`.
    async fn bind_session(
        &self,
        id: &SessionId,
        user: &UserId,
    ) -> Result<Option<ChatSession>, RepositoryError>;

    /// Create an awaiting session owned by `owner`.
    async fn create_session(&self, owner: &UserId) -> Result<ChatSession, RepositoryError>;

    async fn get_session(&self, id: &SessionId) -> Result<Option<ChatSession>, RepositoryError>;

    /// Mark a session ended. `None` if it does not exist.
    async fn end_session(&self, id: &SessionId) -> Result<Option<ChatSession>, RepositoryError>;

    /// End every awaiting session created before `created_before`.
    /// Returns how many were ended.
    async fn expire_awaiting_sessions(
        &self,
        created_before: Timestamp,
    ) -> Result<usize, RepositoryError>;

    async fn append_message(&self, message: NewChatMessage)
    -> Result<ChatMessage, RepositoryError>;

    /// Up to `limit` messages of the session, newest first.
    async fn list_messages(
        &self,
        id: &SessionId,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, RepositoryError>;
}
