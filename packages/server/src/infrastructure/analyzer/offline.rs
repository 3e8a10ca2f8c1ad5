//! Analyzer used when no AI backend is configured.

use async_trait::async_trait;

use crate::domain::{
    AnalyzerError, ComfortPrompt, CrisisAssessment, EmotionAnalysis, TextAnalyzer,
};

/// Always reports [`AnalyzerError::NotConfigured`], so every caller takes
/// its fallback path.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineTextAnalyzer;

#[async_trait]
impl TextAnalyzer for OfflineTextAnalyzer {
    async fn analyze_emotion(&self, _text: &str) -> Result<EmotionAnalysis, AnalyzerError> {
        Err(AnalyzerError::NotConfigured)
    }

    async fn assess_crisis(&self, _text: &str) -> Result<CrisisAssessment, AnalyzerError> {
        Err(AnalyzerError::NotConfigured)
    }

    async fn comfort_message(&self, _prompt: &ComfortPrompt) -> Result<String, AnalyzerError> {
        Err(AnalyzerError::NotConfigured)
    }
}
