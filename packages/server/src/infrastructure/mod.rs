//! Infrastructure 層
//!
//! ドメイン層が定義する trait の具体的な実装と、外部とのデータ変換（DTO）を提供します。

pub mod analyzer;
pub mod dto;
pub mod random;
pub mod relay;
pub mod repository;

pub use analyzer::{OfflineTextAnalyzer, OpenAiTextAnalyzer, TimeLimitedAnalyzer};
pub use random::ThreadRngProbability;
pub use relay::RoomRelay;
pub use repository::InMemoryChatRepository;
