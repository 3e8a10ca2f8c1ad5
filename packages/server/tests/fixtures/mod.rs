//! Shared helpers for integration tests.
//!
//! Each test starts its own server on an ephemeral port with the offline
//! analyzer or an in-process stub, so no network access or API key is needed.

#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use maeum_server::{
    domain::{ChatRepository, FixedProbability, TextAnalyzer},
    infrastructure::{
        InMemoryChatRepository, OfflineTextAnalyzer,
        dto::websocket::{ClientEvent, ServerEvent},
    },
    ui::{
        build_app,
        state::{AppSettings, AppState},
    },
};
use tokio::{net::TcpStream, task::JoinHandle};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How long to wait for an event that should arrive.
const RECV_TIMEOUT: Duration = Duration::from_secs(2);
/// How long to wait before concluding that no event will arrive.
const SILENCE_WINDOW: Duration = Duration::from_millis(300);
pub const ANALYZER_TIMEOUT: Duration = Duration::from_millis(200);

pub struct TestServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a server that never sends AI comfort replies for ordinary messages.
    pub async fn start() -> Self {
        Self::start_with(0.0, FixedProbability(0.99)).await
    }

    /// Start a server that replies with an AI comfort message to every message.
    pub async fn start_with_comfort() -> Self {
        Self::start_with(1.0, FixedProbability(0.0)).await
    }

    /// Start a server whose analyzer is `analyzer`, cut off after [`ANALYZER_TIMEOUT`].
    pub async fn start_with_analyzer(analyzer: Arc<dyn TextAnalyzer>) -> Self {
        Self::build(0.0, FixedProbability(0.99), analyzer).await
    }

    async fn start_with(comfort_probability: f64, probability: FixedProbability) -> Self {
        Self::build(comfort_probability, probability, Arc::new(OfflineTextAnalyzer)).await
    }

    async fn build(
        comfort_probability: f64,
        probability: FixedProbability,
        analyzer: Arc<dyn TextAnalyzer>,
    ) -> Self {
        let settings = AppSettings {
            comfort_probability,
            crisis_severity_threshold: 7,
            match_ttl: None,
            room_capacity: 10,
            analyzer_timeout: ANALYZER_TIMEOUT,
        };
        let repository: Arc<dyn ChatRepository> = Arc::new(InMemoryChatRepository::new());
        let state = Arc::new(AppState::new(
            &settings,
            repository,
            analyzer,
            Arc::new(probability),
        ));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local addr");
        let app = build_app(state);
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Test server failed");
        });

        Self { addr, handle }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn ws_url(&self, user_id: &str) -> String {
        format!("ws://{}/ws?user_id={}", self.addr, user_id)
    }

    /// Open a WebSocket connection as `user_id`.
    pub async fn connect(&self, user_id: &str) -> WsClient {
        let (ws, _) = connect_async(self.ws_url(user_id))
            .await
            .expect("Failed to connect WebSocket");
        ws
    }

    /// Open a WebSocket connection as `user_id` with a chosen display name.
    pub async fn connect_named(&self, user_id: &str, display_name: &str) -> WsClient {
        let url = reqwest::Url::parse_with_params(
            &format!("ws://{}/ws", self.addr),
            &[("user_id", user_id), ("display_name", display_name)],
        )
        .expect("Failed to build WebSocket URL");
        let (ws, _) = connect_async(url.as_str())
            .await
            .expect("Failed to connect WebSocket");
        ws
    }

    /// Request a match for two fresh users. Returns `(user_a, user_b, session_id)`.
    pub async fn matched_pair(&self, client: &reqwest::Client) -> (String, String, String) {
        let user_a = uuid::Uuid::new_v4().to_string();
        let user_b = uuid::Uuid::new_v4().to_string();

        let waiting = self.request_match(client, &user_a).await;
        assert_eq!(waiting["status"], "waiting");
        let matched = self.request_match(client, &user_b).await;
        assert_eq!(matched["status"], "matched");

        let session_id = matched["session"]["id"]
            .as_str()
            .expect("session id should be a string")
            .to_string();
        (user_a, user_b, session_id)
    }

    pub async fn request_match(&self, client: &reqwest::Client, user_id: &str) -> serde_json::Value {
        client
            .post(format!("{}/api/chat/match", self.base_url()))
            .json(&serde_json::json!({ "user_id": user_id }))
            .send()
            .await
            .expect("Failed to send request")
            .json()
            .await
            .expect("Failed to parse JSON")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub async fn send_event(ws: &mut WsClient, event: &ClientEvent) {
    let json = serde_json::to_string(event).expect("Failed to serialize event");
    ws.send(Message::text(json))
        .await
        .expect("Failed to send event");
}

/// Next server event, skipping control frames.
pub async fn next_event(ws: &mut WsClient) -> ServerEvent {
    loop {
        let msg = tokio::time::timeout(RECV_TIMEOUT, ws.next())
            .await
            .expect("Timed out waiting for server event")
            .expect("WebSocket closed")
            .expect("WebSocket error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).expect("Failed to parse server event");
        }
    }
}

/// Assert that no text frame arrives within the silence window.
pub async fn assert_silent(ws: &mut WsClient) {
    if let Ok(Some(Ok(Message::Text(text)))) = tokio::time::timeout(SILENCE_WINDOW, ws.next()).await
    {
        panic!("Expected no event, got {}", text.as_str());
    }
}

/// Join `room_id` and consume the `room_joined` acknowledgement.
pub async fn join(ws: &mut WsClient, room_id: &str) -> ServerEvent {
    send_event(
        ws,
        &ClientEvent::JoinRoom {
            room_id: room_id.to_string(),
            display_name: None,
        },
    )
    .await;
    let event = next_event(ws).await;
    assert!(
        matches!(event, ServerEvent::RoomJoined { .. }),
        "Expected room_joined, got {event:?}"
    );
    event
}
