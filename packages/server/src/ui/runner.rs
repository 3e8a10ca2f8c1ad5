//! Router construction and server startup.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{
    config::ServerConfig,
    domain::{ChatRepository, TextAnalyzer},
    infrastructure::{
        InMemoryChatRepository, OfflineTextAnalyzer, OpenAiTextAnalyzer, ThreadRngProbability,
    },
};

use super::{
    handler::{
        analyze_emotion, comfort_message, create_anonymous_identity, end_session, get_rooms,
        health_check, list_messages, request_match, send_message, websocket_handler,
    },
    signal::shutdown_signal,
    state::{AppSettings, AppState},
};

/// Build the application router over `state`.
pub fn build_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(websocket_handler))
        .route("/api/health", get(health_check))
        .route("/api/auth/anonymous", post(create_anonymous_identity))
        .route("/api/chat/match", post(request_match))
        .route("/api/chat/message", post(send_message))
        .route("/api/chat/{session_id}/end", post(end_session))
        .route("/api/chat/{session_id}/messages", get(list_messages))
        .route("/api/emotions/analyze", post(analyze_emotion))
        .route("/api/ai/comfort", post(comfort_message))
        .route("/api/rooms", get(get_rooms))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Wire the production collaborators from `config`.
pub fn build_state(config: &ServerConfig) -> AppState {
    let repository: Arc<dyn ChatRepository> = Arc::new(InMemoryChatRepository::new());
    let analyzer: Arc<dyn TextAnalyzer> = match &config.openai_api_key {
        Some(key) if !key.trim().is_empty() => match OpenAiTextAnalyzer::new(
            key.clone(),
            config.openai_model.clone(),
            config.openai_base_url.clone(),
            config.analyzer_timeout(),
        ) {
            Ok(analyzer) => {
                tracing::info!("Using OpenAI analyzer (model: {})", config.openai_model);
                Arc::new(analyzer)
            }
            Err(e) => {
                tracing::error!(
                    "Failed to build OpenAI client, using the offline analyzer: {}",
                    e
                );
                Arc::new(OfflineTextAnalyzer)
            }
        },
        _ => {
            tracing::warn!("OPENAI_API_KEY is not set, AI replies use the fallback message");
            Arc::new(OfflineTextAnalyzer)
        }
    };

    AppState::new(
        &AppSettings::from(config),
        repository,
        analyzer,
        Arc::new(ThreadRngProbability),
    )
}

/// Run the server until a shutdown signal arrives.
pub async fn run(config: ServerConfig) -> std::io::Result<()> {
    let state = Arc::new(build_state(&config));
    let app = build_app(state);

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}
