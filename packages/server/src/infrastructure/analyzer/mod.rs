//! TextAnalyzer implementations.

mod offline;
mod openai;
mod time_limit;

pub use offline::OfflineTextAnalyzer;
pub use openai::{DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENAI_MODEL, OpenAiTextAnalyzer};
pub use time_limit::TimeLimitedAnalyzer;
