//! Maeum chat relay server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin maeum-server -- --port 3001
//! ```

use maeum_server::ServerConfig;
use maeum_shared::logger::setup_logger;

#[tokio::main]
async fn main() {
    let config = ServerConfig::load();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    // Run the server
    if let Err(e) = maeum_server::run_server(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
