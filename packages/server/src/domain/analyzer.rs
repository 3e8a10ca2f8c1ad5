//! Text-analysis collaborator contract.
//!
//! Implementations are best-effort and fallible; callers recover locally
//! from every [`AnalyzerError`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::AnalyzerError;

/// Comfort message used whenever emotion analysis is unavailable.
pub const FALLBACK_COMFORT_MESSAGE: &str =
    "지금 이 순간도 충분히 잘하고 계세요. 당신의 마음을 응원합니다.";

/// Detected emotion and a comfort message for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionAnalysis {
    /// One of happy, sad, angry, anxious, excited, tired, neutral
    pub emotion: String,
    /// 0-100
    pub confidence: u8,
    /// 1-10
    pub intensity: u8,
    pub comfort_message: String,
}

impl EmotionAnalysis {
    /// Neutral analysis carrying the fixed fallback message
    pub fn fallback() -> Self {
        Self {
            emotion: "neutral".to_string(),
            confidence: 50,
            intensity: 5,
            comfort_message: FALLBACK_COMFORT_MESSAGE.to_string(),
        }
    }
}

/// Comfort message written for a known emotion.
pub fn fallback_comfort_for(emotion: &str) -> &'static str {
    match emotion {
        "happy" => "기쁜 마음이 오래오래 지속되길 바라요. 행복한 순간을 만끽하세요!",
        "sad" => "힘든 시간이지만 당신은 혼자가 아니에요. 천천히, 하루하루 나아가면 됩니다.",
        "angry" => "화가 나는 마음, 충분히 이해해요. 깊게 숨을 쉬고 잠시 쉬어가도 괜찮아요.",
        "anxious" => "불안한 마음이 드는 건 자연스러운 일이에요. 지금 이 순간에 집중해보세요.",
        "excited" => "설레는 마음이 느껴져요! 좋은 일들이 기다리고 있을 거예요. 응원해요!",
        "tired" => "정말 수고 많으셨어요. 충분히 쉬어가며 자신을 돌봐주세요. 당신은 소중해요.",
        "neutral" => "평온한 마음도 좋은 거예요. 오늘도 당신만의 속도로 천천히 걸어가세요.",
        _ => "당신의 마음을 이해하고 응원합니다. 함께 이겨나가요.",
    }
}

/// What a standalone comfort message is asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComfortPrompt {
    pub emotion: String,
    /// Sanitized description of the situation
    pub context: Option<String>,
}

/// Self-harm risk assessment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrisisAssessment {
    pub is_crisis: bool,
    /// 1-10
    pub severity: u8,
    pub resources: Vec<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextAnalyzer: Send + Sync {
    async fn analyze_emotion(&self, text: &str) -> Result<EmotionAnalysis, AnalyzerError>;

    async fn assess_crisis(&self, text: &str) -> Result<CrisisAssessment, AnalyzerError>;

    /// Free-form comfort text for an emotion, without analyzing any message
    async fn comfort_message(&self, prompt: &ComfortPrompt) -> Result<String, AnalyzerError>;
}
