//! Maeum anonymous support chat relay.
//!
//! Pairs anonymous users into chat sessions, relays their messages over
//! WebSocket through a content moderation gate, and occasionally answers
//! with an AI comfort message.

pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub use config::ServerConfig;

/// Run the server with `config`.
pub async fn run_server(config: ServerConfig) -> std::io::Result<()> {
    ui::run(config).await
}
