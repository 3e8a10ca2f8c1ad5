//! AI 慰めメッセージの応答処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ComfortResponder::maybe_respond() メソッド
//!
//! ### なぜこのテストが必要か
//! - 危機語を含むメッセージには必ず応答し、それ以外は確率で応答する
//! - 分析やストレージの失敗がチャットの流れを止めないことを保証する
//!
//! ### どのような状況を想定しているか
//! - 正常系：確率ヒット、危機語による強制応答
//! - 異常系：分析失敗（固定メッセージで応答）、保存失敗（応答なし）
//! - エッジケース：確率が外れた場合は何もしない

use std::sync::Arc;

use crate::{
    domain::{
        AiKind, ChatMessage, ChatRepository, ConnectionId, EmotionAnalysis, FALLBACK_COMFORT_MESSAGE,
        MessageContent, ModerationGate, NewChatMessage, ProbabilitySource, RoomId, SessionId,
        TextAnalyzer, UserId,
    },
    infrastructure::{
        RoomRelay,
        dto::{http::MessageDto, websocket::ServerEvent},
    },
};

/// 既定の応答確率
pub const DEFAULT_COMFORT_PROBABILITY: f64 = 0.3;

/// AI メッセージの表示名
pub const AI_DISPLAY_NAME: &str = "마음 AI";

/// 応答のきっかけになった送信
pub struct ComfortTrigger<'a> {
    /// WebSocket からの送信なら送信元の接続、HTTP からなら None
    pub connection_id: Option<ConnectionId>,
    /// 接続がない場合に、ルーム外でも届ける相手
    pub recipient: Option<&'a UserId>,
    pub room_id: &'a RoomId,
    pub session_id: &'a SessionId,
    pub sender_id: &'a UserId,
    pub content: &'a MessageContent,
    pub is_crisis: bool,
}

/// AI 慰めメッセージの応答者
pub struct ComfortResponder {
    repository: Arc<dyn ChatRepository>,
    relay: Arc<RoomRelay>,
    gate: Arc<ModerationGate>,
    analyzer: Arc<dyn TextAnalyzer>,
    probability: Arc<dyn ProbabilitySource>,
    comfort_probability: f64,
}

impl ComfortResponder {
    pub fn new(
        repository: Arc<dyn ChatRepository>,
        relay: Arc<RoomRelay>,
        gate: Arc<ModerationGate>,
        analyzer: Arc<dyn TextAnalyzer>,
        probability: Arc<dyn ProbabilitySource>,
        comfort_probability: f64,
    ) -> Self {
        Self {
            repository,
            relay,
            gate,
            analyzer,
            probability,
            comfort_probability,
        }
    }

    /// 条件を満たせば AI メッセージを保存し、送信者以外の参加者に配信する
    ///
    /// # Returns
    ///
    /// * `Some(ChatMessage)` - 保存された AI メッセージ
    /// * `None` - 応答しなかった、または保存に失敗した
    pub async fn maybe_respond(&self, trigger: ComfortTrigger<'_>) -> Option<ChatMessage> {
        if !trigger.is_crisis && !self.probability.hit(self.comfort_probability) {
            return None;
        }

        let analysis = match self.analyzer.analyze_emotion(trigger.content.as_str()).await {
            Ok(analysis) => analysis,
            Err(e) => {
                tracing::warn!("Emotion analysis failed, using fallback message: {}", e);
                EmotionAnalysis::fallback()
            }
        };

        let content = MessageContent::new(self.gate.sanitize(&analysis.comfort_message))
            .or_else(|_| MessageContent::new(FALLBACK_COMFORT_MESSAGE.to_string()))
            .ok()?;

        let message = match self
            .repository
            .append_message(NewChatMessage::from_ai(
                trigger.session_id.clone(),
                trigger.sender_id.clone(),
                content,
                AiKind::Comfort,
            ))
            .await
        {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!("Failed to store AI comfort message: {}", e);
                return None;
            }
        };

        let event = ServerEvent::ReceiveMessage {
            room_id: trigger.room_id.to_string(),
            display_name: AI_DISPLAY_NAME.to_string(),
            message: MessageDto::from(&message),
        };
        let delivered = match trigger.connection_id {
            Some(connection_id) => {
                self.relay
                    .broadcast_from(connection_id, trigger.room_id, &event)
                    .await
            }
            None => {
                self.relay
                    .deliver_from_user(trigger.room_id, trigger.sender_id, trigger.recipient, &event)
                    .await
            }
        };
        tracing::info!(
            "AI comfort message {} delivered to {} connections",
            message.id,
            delivered
        );

        Some(message)
    }
}
