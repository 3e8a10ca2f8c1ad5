//! HTTP API request/response DTOs.

use maeum_shared::time::timestamp_to_kst_rfc3339;
use serde::{Deserialize, Serialize};

use crate::{
    domain::{AiKind, ChatMessage, ChatSession, EmotionAnalysis, Room},
    usecase::CrisisResponse,
};

/// Chat session as exposed to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDto {
    pub id: String,
    pub participant_a_id: String,
    pub participant_b_id: Option<String>,
    pub is_active: bool,
    pub created_at: String, // ISO 8601
    pub ended_at: Option<String>,
}

impl From<&ChatSession> for SessionDto {
    fn from(session: &ChatSession) -> Self {
        Self {
            id: session.id.as_str().to_string(),
            participant_a_id: session.participant_a.as_str().to_string(),
            participant_b_id: session
                .participant_b
                .as_ref()
                .map(|id| id.as_str().to_string()),
            is_active: session.is_active,
            created_at: timestamp_to_kst_rfc3339(session.created_at.value()),
            ended_at: session
                .ended_at
                .map(|at| timestamp_to_kst_rfc3339(at.value())),
        }
    }
}

/// Persisted chat message as exposed to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDto {
    pub id: String,
    pub session_id: String,
    pub sender_id: String,
    pub content: String,
    pub is_ai_message: bool,
    pub ai_kind: Option<AiKind>,
    pub created_at: String, // ISO 8601
}

impl From<&ChatMessage> for MessageDto {
    fn from(message: &ChatMessage) -> Self {
        Self {
            id: message.id.to_string(),
            session_id: message.session_id.as_str().to_string(),
            sender_id: message.sender_id.as_str().to_string(),
            content: message.content.as_str().to_string(),
            is_ai_message: message.is_ai_message,
            ai_kind: message.ai_kind,
            created_at: timestamp_to_kst_rfc3339(message.created_at.value()),
        }
    }
}

/// Newly issued anonymous identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnonymousIdentityDto {
    pub user_id: String,
    pub display_name: String,
    pub session_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRequestDto {
    pub user_id: String,
}

/// Body of `/api/chat/{session_id}/end`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndSessionRequestDto {
    pub user_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Matched,
    Waiting,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResponseDto {
    pub status: MatchStatus,
    pub session: SessionDto,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListMessagesQuery {
    pub limit: Option<usize>,
}

/// Body of `POST /api/chat/message`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageRequestDto {
    pub session_id: String,
    pub sender_id: String,
    pub content: String,
}

/// Result of `POST /api/chat/message`: the stored message, or hotlines
/// instead of delivery
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SendMessageResponseDto {
    Crisis(CrisisResponseDto),
    Message(MessageDto),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComfortRequestDto {
    pub emotion: String,
    #[serde(default)]
    pub context: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComfortResponseDto {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeRequestDto {
    pub content: String,
}

/// Result of `/api/emotions/analyze`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalyzeResponseDto {
    Crisis(CrisisResponseDto),
    Analysis(EmotionAnalysisDto),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionAnalysisDto {
    pub emotion: String,
    pub confidence: u8,
    pub intensity: u8,
    pub comfort_message: String,
}

impl From<EmotionAnalysis> for EmotionAnalysisDto {
    fn from(analysis: EmotionAnalysis) -> Self {
        Self {
            emotion: analysis.emotion,
            confidence: analysis.confidence,
            intensity: analysis.intensity,
            comfort_message: analysis.comfort_message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrisisResponseDto {
    pub is_crisis: bool,
    pub severity: u8,
    pub resources: Vec<String>,
    pub message: String,
}

impl From<&CrisisResponse> for CrisisResponseDto {
    fn from(crisis: &CrisisResponse) -> Self {
        Self {
            is_crisis: true,
            severity: crisis.severity,
            resources: crisis.resources.clone(),
            message: crisis.message.clone(),
        }
    }
}

/// Body of 4xx/5xx responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponseDto {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filtered_content: Option<String>,
}

impl ErrorResponseDto {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            filtered_content: None,
        }
    }

    pub fn filtered(reason: impl Into<String>, filtered_content: impl Into<String>) -> Self {
        Self {
            error: reason.into(),
            filtered_content: Some(filtered_content.into()),
        }
    }
}

/// Room summary for list endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSummaryDto {
    pub id: String,
    /// User ids in join order
    pub participants: Vec<String>,
    pub created_at: String, // ISO 8601
}

impl From<&Room> for RoomSummaryDto {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id.as_str().to_string(),
            participants: room
                .participants
                .iter()
                .map(|p| p.user_id.as_str().to_string())
                .collect(),
            created_at: timestamp_to_kst_rfc3339(room.created_at.value()),
        }
    }
}
