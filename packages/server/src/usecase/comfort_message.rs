//! UseCase: 感情に合わせた慰めメッセージの生成
//!
//! 分析できない場合は感情ごとの固定メッセージを返します。

use std::sync::Arc;

use crate::domain::{ComfortPrompt, ModerationGate, TextAnalyzer, fallback_comfort_for};

use super::error::ComfortError;

pub struct ComfortMessageUseCase {
    gate: Arc<ModerationGate>,
    analyzer: Arc<dyn TextAnalyzer>,
}

impl ComfortMessageUseCase {
    pub fn new(gate: Arc<ModerationGate>, analyzer: Arc<dyn TextAnalyzer>) -> Self {
        Self { gate, analyzer }
    }

    pub async fn execute(
        &self,
        emotion: &str,
        context: Option<&str>,
    ) -> Result<String, ComfortError> {
        let emotion = self.gate.sanitize(emotion).to_lowercase();
        if emotion.is_empty() {
            return Err(ComfortError::EmotionMissing);
        }
        let context = context
            .map(|c| self.gate.sanitize(c))
            .filter(|c| !c.is_empty());

        let prompt = ComfortPrompt { emotion, context };
        let message = match self.analyzer.comfort_message(&prompt).await {
            Ok(message) => self.gate.sanitize(&message),
            Err(e) => {
                tracing::warn!("Comfort generation failed, using fallback: {}", e);
                String::new()
            }
        };

        if message.is_empty() {
            return Ok(fallback_comfort_for(&prompt.emotion).to_string());
        }
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AnalyzerError, MockTextAnalyzer};

    fn usecase(analyzer: MockTextAnalyzer) -> ComfortMessageUseCase {
        ComfortMessageUseCase::new(Arc::new(ModerationGate::default()), Arc::new(analyzer))
    }

    #[tokio::test]
    async fn test_generated_message_is_sanitized() {
        // テスト項目: 生成されたメッセージは整形して返され、分析には整形後の感情と状況が渡される
        // given (前提条件):
        let mut analyzer = MockTextAnalyzer::new();
        analyzer
            .expect_comfort_message()
            .withf(|prompt| {
                prompt.emotion == "anxious" && prompt.context.as_deref() == Some("시험 b전날/b")
            })
            .returning(|_| Ok("  <em>괜찮아요</em>,   잘 될 거예요 ".to_string()));

        // when (操作):
        let message = usecase(analyzer)
            .execute(" Anxious ", Some("시험  <b>전날</b>"))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(message, "em괜찮아요/em, 잘 될 거예요");
    }

    #[tokio::test]
    async fn test_analyzer_failure_uses_emotion_fallback() {
        // テスト項目: 生成に失敗した場合は感情ごとの固定メッセージになる
        // given (前提条件):
        let mut analyzer = MockTextAnalyzer::new();
        analyzer
            .expect_comfort_message()
            .withf(|prompt| prompt.context.is_none())
            .returning(|_| Err(AnalyzerError::Timeout(std::time::Duration::from_secs(10))));

        // when (操作):
        let message = usecase(analyzer).execute("sad", Some("  ")).await.unwrap();

        // then (期待する結果):
        assert_eq!(message, fallback_comfort_for("sad"));
    }

    #[tokio::test]
    async fn test_blank_answer_uses_emotion_fallback() {
        // テスト項目: 空の応答も固定メッセージに置き換えられる
        // given (前提条件):
        let mut analyzer = MockTextAnalyzer::new();
        analyzer
            .expect_comfort_message()
            .returning(|_| Ok("<>".to_string()));

        // when (操作):
        let message = usecase(analyzer).execute("tired", None).await.unwrap();

        // then (期待する結果):
        assert_eq!(message, fallback_comfort_for("tired"));
    }

    #[tokio::test]
    async fn test_emotion_is_required() {
        // テスト項目: 感情が空の場合はエラーになり、分析は呼ばれない
        // given (前提条件):
        let mut analyzer = MockTextAnalyzer::new();
        analyzer.expect_comfort_message().never();

        // when (操作):
        let result = usecase(analyzer).execute("  ", None).await;

        // then (期待する結果):
        assert_eq!(result, Err(ComfortError::EmotionMissing));
    }
}
