//! UseCase: メッセージ送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() / execute_as_user() メソッド
//! - 参加確認 → 内容の検証・サニタイズ → モデレーション → 危機対応 → 保存 → 配信 → AI 応答
//!
//! ### なぜこのテストが必要か
//! - 不適切な内容は保存も配信もされず、送信者にだけ理由が返ることを保証する
//! - 深刻な危機の場合は相談窓口だけを返し、何も保存・配信しないことを保証する
//! - 送信者自身にはメッセージがエコーされないことを確認する
//!
//! ### どのような状況を想定しているか
//! - 正常系：配信、AI 応答付きの配信、HTTP（接続なし）からの配信
//! - 拒否：禁止語による拒否、危機対応
//! - 異常系：未参加、送信者の不一致、セッション外のユーザー、終了済みセッション、
//!   ストレージ障害、長さ制限

use std::sync::Arc;

use crate::{
    domain::{
        ChatMessage, ChatRepository, ConnectionId, ModerationGate, NewChatMessage, RoomId,
        SessionId, UserId,
    },
    infrastructure::{
        RoomRelay,
        dto::{http::MessageDto, websocket::ServerEvent},
    },
};

use super::{
    comfort::{ComfortResponder, ComfortTrigger},
    crisis::{CrisisPolicy, CrisisResponse},
    error::SendMessageError,
};

/// 送信結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// 保存して配信した
    Delivered {
        message: ChatMessage,
        /// 配信先の接続数（送信者を除く）
        recipients: usize,
        ai_message: Option<ChatMessage>,
    },
    /// モデレーションで拒否した（送信者にだけ返す）
    Rejected {
        reason: String,
        filtered_content: String,
    },
    /// 危機対応（送信者にだけ返す。保存・配信はしない）
    Crisis(CrisisResponse),
}

/// 送信者の表示名が分からない場合の名前
pub const ANONYMOUS_DISPLAY_NAME: &str = "익명";

/// 送信元
struct Origin<'a> {
    /// HTTP からの送信では None
    connection_id: Option<ConnectionId>,
    sender_id: &'a UserId,
    display_name: String,
}

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    repository: Arc<dyn ChatRepository>,
    relay: Arc<RoomRelay>,
    gate: Arc<ModerationGate>,
    crisis: Arc<CrisisPolicy>,
    responder: Arc<ComfortResponder>,
}

impl SendMessageUseCase {
    pub fn new(
        repository: Arc<dyn ChatRepository>,
        relay: Arc<RoomRelay>,
        gate: Arc<ModerationGate>,
        crisis: Arc<CrisisPolicy>,
        responder: Arc<ComfortResponder>,
    ) -> Self {
        Self {
            repository,
            relay,
            gate,
            crisis,
            responder,
        }
    }

    /// WebSocket 接続からのメッセージ送信を実行
    ///
    /// # Arguments
    ///
    /// * `connection_id` - 送信元の接続
    /// * `room_id` - 送信先ルーム（チャットセッション ID）
    /// * `claimed_sender` - ペイロードに含まれていた sender_id
    /// * `raw_content` - サニタイズ前の内容
    pub async fn execute(
        &self,
        connection_id: ConnectionId,
        room_id: &RoomId,
        claimed_sender: Option<&UserId>,
        raw_content: &str,
    ) -> Result<SendOutcome, SendMessageError> {
        // ルームに参加しているか
        let participant = self
            .relay
            .member(connection_id, room_id)
            .await
            .map_err(|_| SendMessageError::NotJoined(room_id.to_string()))?;
        if let Some(claimed) = claimed_sender
            && claimed != &participant.user_id
        {
            return Err(SendMessageError::SenderMismatch {
                expected: participant.user_id.to_string(),
                actual: claimed.to_string(),
            });
        }

        let session_id = SessionId::try_from(room_id)
            .map_err(|_| SendMessageError::SessionNotFound(room_id.to_string()))?;

        self.deliver(
            Origin {
                connection_id: Some(connection_id),
                sender_id: &participant.user_id,
                display_name: participant.display_name.to_string(),
            },
            room_id,
            &session_id,
            raw_content,
        )
        .await
    }

    /// HTTP からのメッセージ送信を実行
    ///
    /// 接続を持たないため、送信者のすべての接続を除いてルームに配信し、
    /// 相手がルーム外で接続していればそこにも届けます。
    pub async fn execute_as_user(
        &self,
        session_id: &SessionId,
        sender_id: &UserId,
        raw_content: &str,
    ) -> Result<SendOutcome, SendMessageError> {
        let room_id = RoomId::from(session_id);
        let display_name = self
            .relay
            .display_name_of(&room_id, sender_id)
            .await
            .map(|name| name.to_string())
            .unwrap_or_else(|| ANONYMOUS_DISPLAY_NAME.to_string());

        self.deliver(
            Origin {
                connection_id: None,
                sender_id,
                display_name,
            },
            &room_id,
            session_id,
            raw_content,
        )
        .await
    }

    async fn deliver(
        &self,
        origin: Origin<'_>,
        room_id: &RoomId,
        session_id: &SessionId,
        raw_content: &str,
    ) -> Result<SendOutcome, SendMessageError> {
        let sender_id = origin.sender_id;

        // 1. セッションの参加者で、セッションが有効か
        let session = self
            .repository
            .get_session(session_id)
            .await
            .map_err(SendMessageError::Storage)?
            .ok_or_else(|| SendMessageError::SessionNotFound(session_id.to_string()))?;
        if !session.has_participant(sender_id) {
            return Err(SendMessageError::NotSessionParticipant(sender_id.to_string()));
        }
        if !session.is_active {
            return Err(SendMessageError::SessionEnded(session_id.to_string()));
        }

        // 2. 長さの検証とサニタイズ
        let content = self.gate.prepare(raw_content)?;

        // 3. モデレーション
        let verdict = self.gate.classify(content.as_str());
        if verdict.is_filtered {
            tracing::info!("Rejected message from '{}' in room '{}'", sender_id, room_id);
            return Ok(SendOutcome::Rejected {
                reason: verdict.reason.unwrap_or_default(),
                filtered_content: verdict.filtered_content,
            });
        }

        // 4. 危機対応
        if verdict.is_crisis
            && let Some(crisis) = self.crisis.evaluate(content.as_str()).await
        {
            return Ok(SendOutcome::Crisis(crisis));
        }

        // 5. 保存して送信者以外に配信
        let message = self
            .repository
            .append_message(NewChatMessage::from_user(
                session_id.clone(),
                sender_id.clone(),
                content.clone(),
            ))
            .await
            .map_err(SendMessageError::Storage)?;

        let event = ServerEvent::ReceiveMessage {
            room_id: room_id.to_string(),
            display_name: origin.display_name,
            message: MessageDto::from(&message),
        };
        let recipient = session.counterpart_of(sender_id);
        let recipients = match origin.connection_id {
            Some(connection_id) => {
                self.relay
                    .broadcast_from(connection_id, room_id, &event)
                    .await
            }
            None => {
                self.relay
                    .deliver_from_user(room_id, sender_id, recipient, &event)
                    .await
            }
        };
        tracing::info!(
            "Message {} from '{}' delivered to {} connections",
            message.id,
            sender_id,
            recipients
        );

        // 6. AI 応答（失敗してもチャットは止めない）
        let ai_message = self
            .responder
            .maybe_respond(ComfortTrigger {
                connection_id: origin.connection_id,
                recipient,
                room_id,
                session_id,
                sender_id,
                content: &content,
                is_crisis: verdict.is_crisis,
            })
            .await;

        Ok(SendOutcome::Delivered {
            message,
            recipients,
            ai_message,
        })
    }
}
