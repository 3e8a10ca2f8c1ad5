//! Time limit around any TextAnalyzer.

use std::{future::Future, sync::Arc, time::Duration};

use async_trait::async_trait;

use crate::domain::{
    AnalyzerError, ComfortPrompt, CrisisAssessment, EmotionAnalysis, TextAnalyzer,
};

/// Gives up on the inner analyzer after `limit` so callers fall back
pub struct TimeLimitedAnalyzer {
    inner: Arc<dyn TextAnalyzer>,
    limit: Duration,
}

impl TimeLimitedAnalyzer {
    pub fn new(inner: Arc<dyn TextAnalyzer>, limit: Duration) -> Self {
        Self { inner, limit }
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, AnalyzerError>>,
    ) -> Result<T, AnalyzerError> {
        match tokio::time::timeout(self.limit, call).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!("Analyzer call exceeded {:?}", self.limit);
                Err(AnalyzerError::Timeout(self.limit))
            }
        }
    }
}

#[async_trait]
impl TextAnalyzer for TimeLimitedAnalyzer {
    async fn analyze_emotion(&self, text: &str) -> Result<EmotionAnalysis, AnalyzerError> {
        self.bounded(self.inner.analyze_emotion(text)).await
    }

    async fn assess_crisis(&self, text: &str) -> Result<CrisisAssessment, AnalyzerError> {
        self.bounded(self.inner.assess_crisis(text)).await
    }

    async fn comfort_message(&self, prompt: &ComfortPrompt) -> Result<String, AnalyzerError> {
        self.bounded(self.inner.comfort_message(prompt)).await
    }
}
