//! UseCase: 感情分析
//!
//! 内容の検証・サニタイズ・モデレーションはメッセージ送信と同じ手順で行い、
//! 危機対応が必要な場合は相談窓口を、それ以外は感情分析の結果を返します。

use std::sync::Arc;

use crate::domain::{EmotionAnalysis, ModerationGate, TextAnalyzer};

use super::{
    crisis::{CrisisPolicy, CrisisResponse},
    error::AnalyzeError,
};

/// 感情分析の結果
#[derive(Debug, Clone, PartialEq)]
pub enum AnalyzeOutcome {
    Analysis(EmotionAnalysis),
    Rejected {
        reason: String,
        filtered_content: String,
    },
    Crisis(CrisisResponse),
}

pub struct AnalyzeEmotionUseCase {
    gate: Arc<ModerationGate>,
    crisis: Arc<CrisisPolicy>,
    analyzer: Arc<dyn TextAnalyzer>,
}

impl AnalyzeEmotionUseCase {
    pub fn new(
        gate: Arc<ModerationGate>,
        crisis: Arc<CrisisPolicy>,
        analyzer: Arc<dyn TextAnalyzer>,
    ) -> Self {
        Self {
            gate,
            crisis,
            analyzer,
        }
    }

    pub async fn execute(&self, raw_content: &str) -> Result<AnalyzeOutcome, AnalyzeError> {
        let content = self.gate.prepare(raw_content)?;

        let verdict = self.gate.classify(content.as_str());
        if verdict.is_filtered {
            return Ok(AnalyzeOutcome::Rejected {
                reason: verdict.reason.unwrap_or_default(),
                filtered_content: verdict.filtered_content,
            });
        }

        if verdict.is_crisis
            && let Some(crisis) = self.crisis.evaluate(content.as_str()).await
        {
            return Ok(AnalyzeOutcome::Crisis(crisis));
        }

        let analysis = self
            .analyzer
            .analyze_emotion(content.as_str())
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("Emotion analysis failed, using fallback: {}", e);
                EmotionAnalysis::fallback()
            });
        Ok(AnalyzeOutcome::Analysis(analysis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{AnalyzerError, CrisisAssessment, MockTextAnalyzer, ValueObjectError},
        usecase::crisis::DEFAULT_CRISIS_SEVERITY_THRESHOLD,
    };

    fn usecase(analyzer: MockTextAnalyzer) -> AnalyzeEmotionUseCase {
        let analyzer: Arc<dyn TextAnalyzer> = Arc::new(analyzer);
        AnalyzeEmotionUseCase::new(
            Arc::new(ModerationGate::default()),
            Arc::new(CrisisPolicy::new(
                analyzer.clone(),
                DEFAULT_CRISIS_SEVERITY_THRESHOLD,
            )),
            analyzer,
        )
    }

    #[tokio::test]
    async fn test_analysis_is_returned_for_clean_text() {
        // テスト項目: 問題のない文章は分析結果が返され、分析には整形後の文章が渡される
        // given (前提条件):
        let mut analyzer = MockTextAnalyzer::new();
        analyzer
            .expect_analyze_emotion()
            .withf(|text| text.to_string() == "오늘 정말 즐거웠어")
            .returning(|_| {
                Ok(EmotionAnalysis {
                    emotion: "happy".to_string(),
                    confidence: 90,
                    intensity: 7,
                    comfort_message: "좋은 하루였네요!".to_string(),
                })
            });

        // when (操作):
        let outcome = usecase(analyzer).execute("  오늘   정말 즐거웠어 ").await.unwrap();

        // then (期待する結果):
        let AnalyzeOutcome::Analysis(analysis) = outcome else {
            panic!("expected analysis");
        };
        assert_eq!(analysis.emotion, "happy");
    }

    #[tokio::test]
    async fn test_analyzer_failure_returns_fallback() {
        // テスト項目: 分析に失敗した場合は中立の固定結果が返される
        // given (前提条件):
        let mut analyzer = MockTextAnalyzer::new();
        analyzer
            .expect_analyze_emotion()
            .returning(|_| Err(AnalyzerError::Api("429".to_string())));

        // when (操作):
        let outcome = usecase(analyzer).execute("그냥 그래").await.unwrap();

        // then (期待する結果):
        assert_eq!(outcome, AnalyzeOutcome::Analysis(EmotionAnalysis::fallback()));
    }

    #[tokio::test]
    async fn test_filtered_and_crisis_outcomes() {
        // テスト項目: 禁止語は拒否、深刻な危機は相談窓口が返される
        // given (前提条件):
        let mut analyzer = MockTextAnalyzer::new();
        analyzer.expect_assess_crisis().returning(|_| {
            Ok(CrisisAssessment {
                is_crisis: true,
                severity: 8,
                resources: vec![],
            })
        });
        analyzer.expect_analyze_emotion().never();
        let usecase = usecase(analyzer);

        // when (操作):
        let rejected = usecase.execute("fuck this").await.unwrap();
        let crisis = usecase.execute("자해하고 싶어").await.unwrap();

        // then (期待する結果):
        assert!(matches!(
            rejected,
            AnalyzeOutcome::Rejected { filtered_content, .. } if filtered_content == "**** this"
        ));
        assert!(matches!(crisis, AnalyzeOutcome::Crisis(c) if c.severity == 8));
    }

    #[tokio::test]
    async fn test_invalid_length_is_an_error() {
        // テスト項目: 空の文章はエラーになる
        // when (操作):
        let result = usecase(MockTextAnalyzer::new()).execute("").await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(AnalyzeError::Validation(ValueObjectError::MessageContentEmpty))
        );
    }
}
