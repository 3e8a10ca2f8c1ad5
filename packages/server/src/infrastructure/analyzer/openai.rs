//! OpenAI chat-completions backed text analyzer.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{
    AnalyzerError, ComfortPrompt, CrisisAssessment, EmotionAnalysis, TextAnalyzer,
};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";

const DEFAULT_COMFORT_MESSAGE: &str =
    "힘든 시간을 보내고 계시는군요. 당신의 마음을 이해합니다. 조금씩 나아질 거예요.";

const EMOTION_PROMPT: &str = r#"당신은 한국어 전문 감정 분석 및 심리 상담 AI입니다. 사용자의 텍스트를 분석하여 다음을 제공해주세요:

1. 주된 감정 (happy, sad, angry, anxious, excited, tired, neutral 중 하나)
2. 확신도 (0-100 사이의 숫자)
3. 감정 강도 (1-10 사이의 숫자)
4. 따뜻하고 공감적인 위로 메시지 (한국어, 100자 이내)

응답은 반드시 JSON 형식으로 해주세요: {"emotion": "감정", "confidence": 숫자, "intensity": 숫자, "comfortMessage": "위로메시지"}"#;

const CRISIS_PROMPT: &str = r#"당신은 위기 상황 감지 전문 AI입니다. 다음 텍스트에서 자해, 자살, 극심한 우울 등의 위기 신호를 분석하고 JSON으로 응답해주세요:

{"isCrisis": boolean, "severity": 1-10 숫자, "resources": ["도움 리소스 배열"]}

severity 기준:
1-3: 경미한 우울감
4-6: 중간 정도 심리적 어려움
7-10: 즉각적인 전문가 도움이 필요한 위기 상황"#;

const COMFORT_PROMPT: &str = r#"당신은 따뜻하고 공감적인 한국어 심리상담 AI입니다. 사용자의 감정 상태에 맞는 위로와 격려의 메시지를 생성해주세요.

감정별 메시지 가이드라인:
- happy: 기쁜 마음을 함께 나누고 축하
- sad: 깊은 공감과 따뜻한 위로
- angry: 감정을 인정하고 건설적인 방향 제시
- anxious: 불안을 수용하고 안정감 제공
- excited: 설렘을 함께 나누고 응원
- tired: 휴식의 필요성 인정과 자기돌봄 격려
- neutral: 평온함을 인정하고 긍정적 에너지 제공

메시지는 100자 이내로 작성하고, 한국의 정서와 문화에 맞게 표현해주세요."#;

const EMOTIONS: [&str; 7] = [
    "happy", "sad", "angry", "anxious", "excited", "tired", "neutral",
];

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    r#type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Text analyzer calling the OpenAI chat completions API in JSON mode
#[derive(Clone)]
pub struct OpenAiTextAnalyzer {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl OpenAiTextAnalyzer {
    /// `timeout` bounds each API call from connect to the end of the body.
    pub fn new(
        api_key: String,
        model: String,
        base_url: String,
        timeout: Duration,
    ) -> Result<Self, AnalyzerError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AnalyzerError::Network(e.to_string()))?;

        Ok(Self {
            http,
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    fn request_error(&self, e: reqwest::Error) -> AnalyzerError {
        if e.is_timeout() {
            AnalyzerError::Timeout(self.timeout)
        } else {
            AnalyzerError::Network(e.to_string())
        }
    }

    async fn complete_json(&self, system_prompt: &str, text: &str) -> Result<Value, AnalyzerError> {
        let content = self.complete(system_prompt, text, true).await?;
        serde_json::from_str(&content).map_err(|e| AnalyzerError::Parse(e.to_string()))
    }

    /// First choice of one completion. `json` turns on JSON mode.
    async fn complete(
        &self,
        system_prompt: &str,
        text: &str,
        json: bool,
    ) -> Result<String, AnalyzerError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
            response_format: json.then_some(ResponseFormat {
                r#type: "json_object",
            }),
        };

        tracing::debug!(model = %self.model, text_length = text.len(), "Calling OpenAI API");

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "OpenAI API returned an error");
            return Err(AnalyzerError::Api(format!("{status}: {body}")));
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                AnalyzerError::Timeout(self.timeout)
            } else {
                AnalyzerError::Parse(e.to_string())
            }
        })?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| AnalyzerError::Parse("empty completion".to_string()))
    }
}

#[async_trait]
impl TextAnalyzer for OpenAiTextAnalyzer {
    async fn analyze_emotion(&self, text: &str) -> Result<EmotionAnalysis, AnalyzerError> {
        let value = self.complete_json(EMOTION_PROMPT, text).await?;
        Ok(parse_emotion(&value))
    }

    async fn assess_crisis(&self, text: &str) -> Result<CrisisAssessment, AnalyzerError> {
        let value = self.complete_json(CRISIS_PROMPT, text).await?;
        Ok(parse_crisis(&value))
    }

    async fn comfort_message(&self, prompt: &ComfortPrompt) -> Result<String, AnalyzerError> {
        let message = self
            .complete(COMFORT_PROMPT, &comfort_request_text(prompt), false)
            .await?;
        Ok(message.trim().to_string())
    }
}

fn comfort_request_text(prompt: &ComfortPrompt) -> String {
    match &prompt.context {
        Some(context) => format!("감정: {}, 상황: {}", prompt.emotion, context),
        None => format!("감정: {}", prompt.emotion),
    }
}

/// Read a model answer, filling gaps with defaults and clamping ranges
fn parse_emotion(value: &Value) -> EmotionAnalysis {
    let emotion = value
        .get("emotion")
        .and_then(Value::as_str)
        .filter(|e| EMOTIONS.contains(e))
        .unwrap_or("neutral");
    let comfort_message = value
        .get("comfortMessage")
        .and_then(Value::as_str)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or(DEFAULT_COMFORT_MESSAGE);

    EmotionAnalysis {
        emotion: emotion.to_string(),
        confidence: clamped(value.get("confidence"), 50, 0, 100),
        intensity: clamped(value.get("intensity"), 5, 1, 10),
        comfort_message: comfort_message.to_string(),
    }
}

fn parse_crisis(value: &Value) -> CrisisAssessment {
    CrisisAssessment {
        is_crisis: value
            .get("isCrisis")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        severity: clamped(value.get("severity"), 1, 1, 10),
        resources: value
            .get("resources")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
    }
}

fn clamped(value: Option<&Value>, default: u8, min: u8, max: u8) -> u8 {
    value
        .and_then(Value::as_f64)
        .map(|n| n.round().clamp(f64::from(min), f64::from(max)) as u8)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_emotion_clamps_ranges() {
        // テスト項目: 範囲外の数値は丸められ、未知の感情は neutral になる
        // given (前提条件):
        let value = json!({
            "emotion": "melancholy",
            "confidence": 140,
            "intensity": 0,
            "comfortMessage": "괜찮아요"
        });

        // when (操作):
        let analysis = parse_emotion(&value);

        // then (期待する結果):
        assert_eq!(analysis.emotion, "neutral");
        assert_eq!(analysis.confidence, 100);
        assert_eq!(analysis.intensity, 1);
        assert_eq!(analysis.comfort_message, "괜찮아요");
    }

    #[test]
    fn test_parse_emotion_defaults() {
        // テスト項目: フィールドが欠けている場合は既定値で補われる
        // when (操作):
        let analysis = parse_emotion(&json!({ "emotion": "sad" }));

        // then (期待する結果):
        assert_eq!(analysis.emotion, "sad");
        assert_eq!(analysis.confidence, 50);
        assert_eq!(analysis.intensity, 5);
        assert_eq!(analysis.comfort_message, DEFAULT_COMFORT_MESSAGE);
    }

    #[test]
    fn test_parse_crisis() {
        // テスト項目: 危機判定の応答から severity を 1-10 に収め、リソースを文字列だけ取り出す
        // when (操作):
        let crisis = parse_crisis(&json!({
            "isCrisis": true,
            "severity": 12,
            "resources": ["생명의전화: 1393", 42]
        }));
        let empty = parse_crisis(&json!({}));

        // then (期待する結果):
        assert!(crisis.is_crisis);
        assert_eq!(crisis.severity, 10);
        assert_eq!(crisis.resources, vec!["생명의전화: 1393".to_string()]);
        assert!(!empty.is_crisis);
        assert_eq!(empty.severity, 1);
        assert!(empty.resources.is_empty());
    }

    #[test]
    fn test_comfort_request_text() {
        // テスト項目: 慰めメッセージの依頼文には感情と、あれば状況が含まれる
        // given (前提条件):
        let mut prompt = ComfortPrompt {
            emotion: "tired".to_string(),
            context: None,
        };

        // when (操作):
        let without = comfort_request_text(&prompt);
        prompt.context = Some("야근이 계속돼요".to_string());
        let with = comfort_request_text(&prompt);

        // then (期待する結果):
        assert_eq!(without, "감정: tired");
        assert_eq!(with, "감정: tired, 상황: 야근이 계속돼요");
    }

    #[test]
    fn test_plain_completion_omits_response_format() {
        // テスト項目: JSON モードでないリクエストには response_format が含まれない
        // given (前提条件):
        let request = ChatCompletionRequest {
            model: DEFAULT_OPENAI_MODEL,
            messages: [
                ChatMessage {
                    role: "system",
                    content: COMFORT_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: "감정: sad",
                },
            ],
            response_format: None,
        };

        // when (操作):
        let value = serde_json::to_value(&request).unwrap();

        // then (期待する結果):
        assert!(value.get("response_format").is_none());
        assert_eq!(value["messages"][1]["content"], "감정: sad");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        // テスト項目: 接続できない API への呼び出しは Network エラーになる
        // given (前提条件):
        let analyzer = OpenAiTextAnalyzer::new(
            "test-key".to_string(),
            DEFAULT_OPENAI_MODEL.to_string(),
            "http://127.0.0.1:9/v1/".to_string(),
            Duration::from_secs(5),
        )
        .unwrap();

        // when (操作):
        let result = analyzer.analyze_emotion("오늘 너무 힘들어요").await;

        // then (期待する結果):
        assert!(matches!(result, Err(AnalyzerError::Network(_))));
    }

    #[tokio::test]
    async fn test_silent_endpoint_times_out() {
        // テスト項目: 応答しない API への呼び出しは設定した時間で Timeout エラーになる
        // given (前提条件): 接続は受け付けるが何も返さないサーバー
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        let limit = Duration::from_millis(200);
        let analyzer = OpenAiTextAnalyzer::new(
            "test-key".to_string(),
            DEFAULT_OPENAI_MODEL.to_string(),
            format!("http://{addr}/v1"),
            limit,
        )
        .unwrap();

        // when (操作):
        let result = tokio::time::timeout(
            Duration::from_secs(5),
            analyzer.assess_crisis("요즘 우울해"),
        )
        .await
        .expect("the client timeout should fire first");

        // then (期待する結果):
        assert_eq!(result, Err(AnalyzerError::Timeout(limit)));
        server.abort();
    }
}
