//! UseCase: ルーム参加処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - JoinRoomUseCase::execute() メソッド
//!
//! ### なぜこのテストが必要か
//! - 参加は他の参加者に通知されず、参加者リストは参加者本人にだけ返す
//! - 1 つの接続は同時に 1 つのルームにしか参加できない
//!
//! ### どのような状況を想定しているか
//! - 正常系：新規参加、表示名の上書き
//! - 異常系：満員のルーム

use std::sync::Arc;

use crate::{
    domain::{ConnectionId, DisplayName, Participant, RoomId},
    infrastructure::RoomRelay,
};

use super::error::JoinRoomError;

/// ルーム参加のユースケース
pub struct JoinRoomUseCase {
    relay: Arc<RoomRelay>,
}

impl JoinRoomUseCase {
    pub fn new(relay: Arc<RoomRelay>) -> Self {
        Self { relay }
    }

    /// ルーム参加を実行
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<Participant>)` - 参加後の参加者リスト（参加順）
    /// * `Err(JoinRoomError)` - 参加失敗
    pub async fn execute(
        &self,
        connection_id: ConnectionId,
        room_id: RoomId,
        display_name: Option<DisplayName>,
    ) -> Result<Vec<Participant>, JoinRoomError> {
        let participants = self
            .relay
            .join(connection_id, room_id.clone(), display_name)
            .await?;
        tracing::info!(
            "Connection {} joined room '{}' ({} participants)",
            connection_id,
            room_id,
            participants.len()
        );
        Ok(participants)
    }
}
