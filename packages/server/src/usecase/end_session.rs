//! UseCase: チャットセッションの終了

use std::sync::Arc;

use crate::{
    domain::{ChatRepository, ChatSession, RoomId, SessionId, UserId},
    infrastructure::{
        RoomRelay,
        dto::{http::SessionDto, websocket::ServerEvent},
    },
};

use super::error::SessionError;

/// セッション終了のユースケース
///
/// 終了済みのセッションに対しては何もせずそのまま返します（冪等）。
pub struct EndSessionUseCase {
    repository: Arc<dyn ChatRepository>,
    relay: Arc<RoomRelay>,
}

impl EndSessionUseCase {
    pub fn new(repository: Arc<dyn ChatRepository>, relay: Arc<RoomRelay>) -> Self {
        Self { repository, relay }
    }

    /// # Arguments
    ///
    /// * `session_id` - 終了するセッション
    /// * `requester` - 終了を要求したユーザー（セッションの参加者であること）
    pub async fn execute(
        &self,
        session_id: &SessionId,
        requester: &UserId,
    ) -> Result<ChatSession, SessionError> {
        let session = self
            .repository
            .get_session(session_id)
            .await?
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;
        if !session.has_participant(requester) {
            return Err(SessionError::NotParticipant(requester.to_string()));
        }
        if !session.is_active {
            return Ok(session);
        }

        let ended = self
            .repository
            .end_session(session_id)
            .await?
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;

        // ルームの参加者と両当事者の全接続に 1 回ずつ通知
        let mut users = vec![ended.participant_a.clone()];
        users.extend(ended.counterpart_of(&ended.participant_a).cloned());
        let event = ServerEvent::SessionEnded {
            session: SessionDto::from(&ended),
        };
        let notified = self
            .relay
            .notify_room_and_users(&RoomId::from(session_id), &users, &event)
            .await;
        tracing::info!(
            "Session {} ended by '{}' ({} connections notified)",
            session_id,
            requester,
            notified
        );

        Ok(ended)
    }
}
