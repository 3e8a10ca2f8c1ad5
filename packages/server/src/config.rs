//! Server configuration from command-line flags and environment variables.

use std::time::Duration;

use clap::Parser;

use crate::{
    domain::entity::DEFAULT_PARTICIPANT_CAPACITY,
    infrastructure::analyzer::{DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENAI_MODEL},
    usecase::{comfort::DEFAULT_COMFORT_PROBABILITY, crisis::DEFAULT_CRISIS_SEVERITY_THRESHOLD},
};

pub const DEFAULT_ANALYZER_TIMEOUT_SECS: u64 = 10;

fn parse_probability(value: &str) -> Result<f64, String> {
    let probability: f64 = value
        .parse()
        .map_err(|e| format!("`{value}` is not a number: {e}"))?;
    if (0.0..=1.0).contains(&probability) {
        Ok(probability)
    } else {
        Err(format!("`{value}` is not between 0 and 1"))
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "maeum-server", version, about = "Anonymous support chat relay")]
pub struct ServerConfig {
    /// Address to bind
    #[arg(long, env = "MAEUM_HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(short, long, env = "MAEUM_PORT", default_value_t = 3001)]
    pub port: u16,

    /// Probability that an ordinary message gets an AI comfort reply
    #[arg(
        long,
        env = "MAEUM_COMFORT_PROBABILITY",
        default_value_t = DEFAULT_COMFORT_PROBABILITY,
        value_parser = parse_probability
    )]
    pub comfort_probability: f64,

    /// Crisis severity (1-10) at which hotlines replace delivery
    #[arg(
        long,
        env = "MAEUM_CRISIS_SEVERITY_THRESHOLD",
        default_value_t = DEFAULT_CRISIS_SEVERITY_THRESHOLD,
        value_parser = clap::value_parser!(u8).range(1..=10)
    )]
    pub crisis_severity_threshold: u8,

    /// Awaiting sessions older than this are expired before matching (0 disables)
    #[arg(long, env = "MAEUM_MATCH_TTL_SECS", default_value_t = 600)]
    pub match_ttl_secs: u64,

    #[arg(long, env = "MAEUM_ROOM_CAPACITY", default_value_t = DEFAULT_PARTICIPANT_CAPACITY)]
    pub room_capacity: usize,

    /// Seconds to wait for one analyzer call before falling back
    #[arg(
        long,
        env = "MAEUM_ANALYZER_TIMEOUT_SECS",
        default_value_t = DEFAULT_ANALYZER_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub analyzer_timeout_secs: u64,

    /// Without a key the server runs with the offline analyzer
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    #[arg(long, env = "OPENAI_MODEL", default_value = DEFAULT_OPENAI_MODEL)]
    pub openai_model: String,

    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_OPENAI_BASE_URL)]
    pub openai_base_url: String,
}

impl ServerConfig {
    /// Parse flags after loading `.env` if present.
    pub fn load() -> Self {
        if let Err(e) = dotenvy::dotenv()
            && !e.not_found()
        {
            eprintln!("Failed to load .env: {e}");
        }
        Self::parse()
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn match_ttl(&self) -> Option<Duration> {
        (self.match_ttl_secs > 0).then(|| Duration::from_secs(self.match_ttl_secs))
    }

    pub fn analyzer_timeout(&self) -> Duration {
        Duration::from_secs(self.analyzer_timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            comfort_probability: DEFAULT_COMFORT_PROBABILITY,
            crisis_severity_threshold: DEFAULT_CRISIS_SEVERITY_THRESHOLD,
            match_ttl_secs: 600,
            room_capacity: DEFAULT_PARTICIPANT_CAPACITY,
            analyzer_timeout_secs: DEFAULT_ANALYZER_TIMEOUT_SECS,
            openai_api_key: None,
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        // テスト項目: コマンドライン引数で既定値を上書きでき、TTL 0 は無効を意味する
        // when (操作):
        let config = ServerConfig::try_parse_from([
            "maeum-server",
            "--port",
            "4000",
            "--comfort-probability",
            "0.5",
            "--match-ttl-secs",
            "0",
        ])
        .unwrap();

        // then (期待する結果):
        assert_eq!(config.port, 4000);
        assert_eq!(config.comfort_probability, 0.5);
        assert_eq!(config.match_ttl(), None);
    }

    #[test]
    fn test_crisis_threshold_range() {
        // テスト項目: 危機しきい値は 1-10 の範囲外を受け付けない
        // when (操作):
        let result = ServerConfig::try_parse_from([
            "maeum-server",
            "--crisis-severity-threshold",
            "11",
        ]);

        // then (期待する結果):
        assert!(result.is_err());
    }

    #[test]
    fn test_comfort_probability_range() {
        // テスト項目: 慰め応答の確率は 0 以上 1 以下の数値だけを受け付ける
        // when (操作):
        let parse = |value: &str| {
            ServerConfig::try_parse_from(["maeum-server", "--comfort-probability", value])
        };

        // then (期待する結果):
        assert!(parse("1.5").is_err());
        assert!(parse("-0.1").is_err());
        assert!(parse("NaN").is_err());
        assert!(parse("often").is_err());
        assert_eq!(parse("0").unwrap().comfort_probability, 0.0);
        assert_eq!(parse("1").unwrap().comfort_probability, 1.0);
    }

    #[test]
    fn test_analyzer_timeout_must_be_positive() {
        // テスト項目: 解析のタイムアウトは 1 秒以上で、既定は 10 秒
        // then (期待する結果):
        assert!(
            ServerConfig::try_parse_from(["maeum-server", "--analyzer-timeout-secs", "0"]).is_err()
        );
        assert_eq!(
            ServerConfig::default().analyzer_timeout(),
            Duration::from_secs(10)
        );
    }

    #[test]
    fn test_default_match_ttl() {
        // テスト項目: 既定の待機期限は 600 秒
        // then (期待する結果):
        assert_eq!(
            ServerConfig::default().match_ttl(),
            Some(Duration::from_secs(600))
        );
        assert_eq!(ServerConfig::default().bind_addr(), "0.0.0.0:3001");
    }
}
