//! Maeum chat client.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin maeum-client -- --url http://127.0.0.1:3001
//! ```

use clap::Parser;
use maeum_client::ClientArgs;
use maeum_shared::logger::setup_logger;

#[tokio::main]
async fn main() {
    let args = ClientArgs::parse();

    // Keep the prompt readable: only warnings unless RUST_LOG says otherwise
    setup_logger(env!("CARGO_BIN_NAME"), "warn");

    if let Err(e) = maeum_client::run(args).await {
        tracing::error!("Client error: {}", e);
        eprintln!("{e}");
        std::process::exit(1);
    }
}
