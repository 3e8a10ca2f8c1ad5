//! UseCase: ルーム退出処理

use std::sync::Arc;

use crate::{
    domain::{ConnectionId, RoomError, RoomId},
    infrastructure::RoomRelay,
};

/// ルーム退出のユースケース
///
/// 退出は他の参加者に通知しません。最後の参加者が抜けたルームは破棄されます。
pub struct LeaveRoomUseCase {
    relay: Arc<RoomRelay>,
}

impl LeaveRoomUseCase {
    pub fn new(relay: Arc<RoomRelay>) -> Self {
        Self { relay }
    }

    pub async fn execute(
        &self,
        connection_id: ConnectionId,
        room_id: &RoomId,
    ) -> Result<(), RoomError> {
        self.relay.leave(connection_id, room_id).await?;
        tracing::info!("Connection {} left room '{}'", connection_id, room_id);
        Ok(())
    }

    /// 切断時の暗黙的な退出
    pub async fn disconnect(&self, connection_id: ConnectionId) -> Option<RoomId> {
        let left = self.relay.disconnect(connection_id).await;
        if let Some(room_id) = &left {
            tracing::info!(
                "Connection {} disconnected and left room '{}'",
                connection_id,
                room_id
            );
        }
        left
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DisplayName, UserId};
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_leave_then_leave_again_fails() {
        // テスト項目: 退出は成功し、同じルームからの 2 回目の退出はエラーになる
        // given (前提条件):
        let relay = Arc::new(RoomRelay::default());
        let usecase = LeaveRoomUseCase::new(relay.clone());
        let (tx, _rx) = mpsc::unbounded_channel();
        let alice = relay
            .connect(
                UserId::new("alice".to_string()).unwrap(),
                DisplayName::new("조용한 고양이".to_string()).unwrap(),
                tx,
            )
            .await;
        let room_id = RoomId::new("r1".to_string()).unwrap();
        relay.join(alice, room_id.clone(), None).await.unwrap();

        // when (操作):
        let first = usecase.execute(alice, &room_id).await;
        let second = usecase.execute(alice, &room_id).await;

        // then (期待する結果):
        assert!(first.is_ok());
        assert_eq!(second, Err(RoomError::NotJoined("r1".to_string())));
        assert!(relay.rooms().await.is_empty());
    }

    #[tokio::test]
    async fn test_disconnect_reports_room_left() {
        // テスト項目: 切断すると参加していたルームが返され、接続が登録から消える
        // given (前提条件):
        let relay = Arc::new(RoomRelay::default());
        let usecase = LeaveRoomUseCase::new(relay.clone());
        let (tx, _rx) = mpsc::unbounded_channel();
        let alice = relay
            .connect(
                UserId::new("alice".to_string()).unwrap(),
                DisplayName::new("조용한 고양이".to_string()).unwrap(),
                tx,
            )
            .await;
        let room_id = RoomId::new("r1".to_string()).unwrap();
        relay.join(alice, room_id.clone(), None).await.unwrap();

        // when (操作):
        let left = usecase.disconnect(alice).await;

        // then (期待する結果):
        assert_eq!(left, Some(room_id));
        assert_eq!(relay.connection_count().await, 0);
    }
}
