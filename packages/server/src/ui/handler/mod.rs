//! Handler modules for HTTP and WebSocket endpoints.

pub mod http;
pub mod websocket;

// Re-export HTTP handlers
pub use http::{
    analyze_emotion, comfort_message, create_anonymous_identity, end_session, get_rooms,
    health_check, list_messages, request_match, send_message,
};

// Re-export WebSocket handlers
pub use websocket::websocket_handler;
