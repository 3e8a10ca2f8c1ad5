//! UseCase: タイピング通知

use std::sync::Arc;

use crate::{
    domain::{ConnectionId, RoomError, RoomId},
    infrastructure::RoomRelay,
};

/// タイピング開始・停止のユースケース
///
/// 通知には常に接続のユーザー情報を使います。期限切れの管理はしません。
pub struct TypingUseCase {
    relay: Arc<RoomRelay>,
}

impl TypingUseCase {
    pub fn new(relay: Arc<RoomRelay>) -> Self {
        Self { relay }
    }

    /// # Returns
    ///
    /// * `Ok(usize)` - 通知を受け取った接続数
    pub async fn execute(
        &self,
        connection_id: ConnectionId,
        room_id: &RoomId,
        typing: bool,
    ) -> Result<usize, RoomError> {
        let notified = self.relay.set_typing(connection_id, room_id, typing).await?;
        tracing::debug!(
            "Connection {} typing={} in room '{}' ({} notified)",
            connection_id,
            typing,
            room_id,
            notified
        );
        Ok(notified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{DisplayName, UserId},
        infrastructure::dto::websocket::ServerEvent,
    };
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_typing_notifies_others_only() {
        // テスト項目: タイピング通知は送信者以外の参加者にだけ届く
        // given (前提条件):
        let relay = Arc::new(RoomRelay::default());
        let usecase = TypingUseCase::new(relay.clone());
        let room_id = RoomId::new("r1".to_string()).unwrap();
        let (alice_tx, mut alice_rx) = mpsc::unbounded_channel();
        let (bob_tx, mut bob_rx) = mpsc::unbounded_channel();
        let alice = relay
            .connect(
                UserId::new("alice".to_string()).unwrap(),
                DisplayName::new("조용한 고양이".to_string()).unwrap(),
                alice_tx,
            )
            .await;
        let bob = relay
            .connect(
                UserId::new("bob".to_string()).unwrap(),
                DisplayName::new("밝은 토끼".to_string()).unwrap(),
                bob_tx,
            )
            .await;
        relay.join(alice, room_id.clone(), None).await.unwrap();
        relay.join(bob, room_id.clone(), None).await.unwrap();

        // when (操作):
        let notified = usecase.execute(alice, &room_id, true).await.unwrap();

        // then (期待する結果):
        assert_eq!(notified, 1);
        assert!(matches!(
            bob_rx.try_recv().unwrap(),
            ServerEvent::UserTyping { sender_id, .. } if sender_id == "alice"
        ));
        assert!(alice_rx.try_recv().is_err());
    }
}
