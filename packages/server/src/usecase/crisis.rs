//! 危機対応ポリシー
//!
//! モデレーションで危機語が検出されたとき、分析コラボレーターに深刻度を確認し、
//! しきい値以上なら固定の相談窓口リストを返します。
//! 分析に失敗した場合は危機対応を行わず、通常の処理を続けます。

use std::sync::Arc;

use crate::domain::TextAnalyzer;

/// 既定の深刻度しきい値（1-10）
pub const DEFAULT_CRISIS_SEVERITY_THRESHOLD: u8 = 7;

/// 常にこの一覧を返す（分析結果の resources は使わない）
pub const CRISIS_HOTLINES: [&str; 4] = [
    "생명의전화: 1393",
    "청소년전화: 1388",
    "정신건강위기상담전화: 1577-0199",
    "자살예방상담전화: 109",
];

pub const CRISIS_MESSAGE: &str = "전문가의 도움이 필요한 상황입니다. 위의 상담전화로 연락해보세요.";

/// 送信者本人だけに返す危機対応の内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrisisResponse {
    pub severity: u8,
    pub resources: Vec<String>,
    pub message: String,
}

impl CrisisResponse {
    pub fn new(severity: u8) -> Self {
        Self {
            severity,
            resources: CRISIS_HOTLINES.iter().map(|s| s.to_string()).collect(),
            message: CRISIS_MESSAGE.to_string(),
        }
    }
}

pub struct CrisisPolicy {
    analyzer: Arc<dyn TextAnalyzer>,
    severity_threshold: u8,
}

impl CrisisPolicy {
    pub fn new(analyzer: Arc<dyn TextAnalyzer>, severity_threshold: u8) -> Self {
        Self {
            analyzer,
            severity_threshold,
        }
    }

    /// 危機対応が必要なら `Some` を返す
    pub async fn evaluate(&self, text: &str) -> Option<CrisisResponse> {
        match self.analyzer.assess_crisis(text).await {
            Ok(assessment)
                if assessment.is_crisis && assessment.severity >= self.severity_threshold =>
            {
                tracing::info!(severity = assessment.severity, "Crisis override triggered");
                Some(CrisisResponse::new(assessment.severity))
            }
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("Crisis assessment failed, continuing without override: {}", e);
                None
            }
        }
    }
}
