//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionId, DisplayName, IdentityFactory, RoomId, UserId},
    infrastructure::dto::{
        http::CrisisResponseDto,
        websocket::{ClientEvent, ParticipantInfo, ServerEvent},
    },
    ui::state::{AppState, ConnectQuery},
    usecase::{SendMessageError, SendOutcome},
};

const SEND_RETRY_MESSAGE: &str = "Failed to send message, please try again";

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    // Convert String -> UserId (Domain Model)
    let user_id = match UserId::try_from(query.user_id.clone()) {
        Ok(id) => id,
        Err(_) => {
            tracing::warn!("Invalid user_id format: '{}'", query.user_id);
            return Err(StatusCode::BAD_REQUEST);
        }
    };
    let display_name = match query.display_name {
        Some(name) => DisplayName::new(name).map_err(|e| {
            tracing::warn!("Invalid display_name for '{}': {}", user_id, e);
            StatusCode::BAD_REQUEST
        })?,
        None => IdentityFactory::generate_display_name(),
    };

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, user_id, display_name)))
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    user_id: UserId,
    display_name: DisplayName,
) {
    let (mut sender, mut receiver) = socket.split();

    // Every event for this connection, replies included, goes through one FIFO channel
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();
    let connection_id = state.relay.connect(user_id.clone(), display_name, tx).await;
    tracing::info!("User '{}' connected as connection {}", user_id, connection_id);

    let state_clone = state.clone();

    // Spawn a task to receive events from this client
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!("WebSocket error: {}", e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    let reply = match serde_json::from_str::<ClientEvent>(&text) {
                        Ok(event) => handle_event(&state_clone, connection_id, event).await,
                        Err(e) => {
                            tracing::warn!("Failed to parse client event: {}", e);
                            Some(ServerEvent::error(format!("Invalid event: {e}")))
                        }
                    };
                    if let Some(reply) = reply {
                        state_clone.relay.send_to(connection_id, reply).await;
                    }
                }
                Message::Ping(_) => {
                    tracing::debug!("Received ping");
                    // Ping/pong is handled automatically by the WebSocket protocol
                }
                Message::Close(_) => {
                    tracing::info!("Connection {} requested close", connection_id);
                    break;
                }
                _ => {}
            }
        }
    });

    // Spawn a task to forward relay events to this client
    let mut send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("Failed to serialize server event: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    state.leave_room().disconnect(connection_id).await;
    tracing::info!("User '{}' disconnected (connection {})", user_id, connection_id);
}

/// Run one client event. Returns the reply for the sender, if any.
async fn handle_event(
    state: &AppState,
    connection_id: ConnectionId,
    event: ClientEvent,
) -> Option<ServerEvent> {
    let room_id = match RoomId::try_from(event.room_id().to_string()) {
        Ok(id) => id,
        Err(e) => return Some(ServerEvent::error(e.to_string())),
    };

    match event {
        ClientEvent::JoinRoom { display_name, .. } => {
            let display_name = match display_name.map(DisplayName::new).transpose() {
                Ok(name) => name,
                Err(e) => return Some(ServerEvent::error(e.to_string())),
            };
            match state
                .join_room()
                .execute(connection_id, room_id.clone(), display_name)
                .await
            {
                Ok(participants) => Some(ServerEvent::RoomJoined {
                    room_id: room_id.into_string(),
                    participants: participants.iter().map(ParticipantInfo::from).collect(),
                }),
                Err(e) => Some(ServerEvent::error(e.to_string())),
            }
        }
        ClientEvent::SendMessage {
            sender_id, content, ..
        } => {
            let claimed_sender = match sender_id.map(UserId::try_from).transpose() {
                Ok(id) => id,
                Err(e) => return Some(ServerEvent::error(e.to_string())),
            };
            match state
                .send_message()
                .execute(connection_id, &room_id, claimed_sender.as_ref(), &content)
                .await
            {
                Ok(SendOutcome::Delivered { .. }) => None,
                Ok(SendOutcome::Rejected {
                    reason,
                    filtered_content,
                }) => Some(ServerEvent::MessageRejected {
                    room_id: room_id.into_string(),
                    reason,
                    filtered_content,
                }),
                Ok(SendOutcome::Crisis(crisis)) => Some(ServerEvent::CrisisResources {
                    room_id: room_id.into_string(),
                    crisis: CrisisResponseDto::from(&crisis),
                }),
                Err(SendMessageError::Storage(e)) => {
                    tracing::error!("Failed to store message: {}", e);
                    Some(ServerEvent::error(SEND_RETRY_MESSAGE))
                }
                Err(e) => {
                    tracing::warn!("Rejected send from connection {}: {}", connection_id, e);
                    Some(ServerEvent::error(e.to_string()))
                }
            }
        }
        ClientEvent::Typing { .. } => set_typing(state, connection_id, &room_id, true).await,
        ClientEvent::StopTyping { .. } => set_typing(state, connection_id, &room_id, false).await,
        ClientEvent::LeaveRoom { .. } => {
            match state.leave_room().execute(connection_id, &room_id).await {
                Ok(()) => Some(ServerEvent::RoomLeft {
                    room_id: room_id.into_string(),
                }),
                Err(e) => Some(ServerEvent::error(e.to_string())),
            }
        }
    }
}

async fn set_typing(
    state: &AppState,
    connection_id: ConnectionId,
    room_id: &RoomId,
    typing: bool,
) -> Option<ServerEvent> {
    match state.typing().execute(connection_id, room_id, typing).await {
        Ok(_) => None,
        Err(e) => Some(ServerEvent::error(e.to_string())),
    }
}
