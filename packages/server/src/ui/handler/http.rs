//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    domain::{IdentityFactory, SessionId, UserId},
    infrastructure::dto::http::{
        AnalyzeRequestDto, AnalyzeResponseDto, AnonymousIdentityDto, ComfortRequestDto,
        ComfortResponseDto, CrisisResponseDto, EmotionAnalysisDto, EndSessionRequestDto,
        ErrorResponseDto, ListMessagesQuery, MatchRequestDto, MatchResponseDto, MatchStatus,
        MessageDto, RoomSummaryDto, SendMessageRequestDto, SendMessageResponseDto, SessionDto,
    },
    ui::state::AppState,
    usecase::{AnalyzeOutcome, MatchOutcome, SendMessageError, SendOutcome, SessionError},
};

type ApiError = (StatusCode, Json<ErrorResponseDto>);
type ApiResult<T> = Result<Json<T>, ApiError>;

fn error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponseDto::new(message)))
}

fn parse_user_id(raw: String) -> Result<UserId, ApiError> {
    UserId::try_from(raw).map_err(|e| error(StatusCode::BAD_REQUEST, e.to_string()))
}

fn parse_session_id(raw: String) -> Result<SessionId, ApiError> {
    SessionId::try_from(raw).map_err(|e| error(StatusCode::BAD_REQUEST, e.to_string()))
}

fn session_error(e: SessionError) -> ApiError {
    match e {
        SessionError::NotFound(_) => error(StatusCode::NOT_FOUND, e.to_string()),
        SessionError::NotParticipant(_) => error(StatusCode::FORBIDDEN, e.to_string()),
        SessionError::Storage(_) => {
            tracing::error!("Session storage error: {}", e);
            error(StatusCode::INTERNAL_SERVER_ERROR, "Please try again later")
        }
    }
}

fn send_error(e: SendMessageError) -> ApiError {
    match e {
        SendMessageError::SessionNotFound(_) => error(StatusCode::NOT_FOUND, e.to_string()),
        SendMessageError::NotSessionParticipant(_) => error(StatusCode::FORBIDDEN, e.to_string()),
        SendMessageError::SessionEnded(_) => error(StatusCode::CONFLICT, e.to_string()),
        SendMessageError::Storage(_) => {
            tracing::error!("Send message error: {}", e);
            error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to send message")
        }
        SendMessageError::Validation(_)
        | SendMessageError::NotJoined(_)
        | SendMessageError::SenderMismatch { .. } => error(StatusCode::BAD_REQUEST, e.to_string()),
    }
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Issue a fresh anonymous identity. Nothing is stored.
pub async fn create_anonymous_identity() -> Json<AnonymousIdentityDto> {
    Json(AnonymousIdentityDto {
        user_id: uuid::Uuid::new_v4().to_string(),
        display_name: IdentityFactory::generate_display_name().as_str().to_string(),
        session_token: IdentityFactory::generate_session_token(),
    })
}

/// Find a partner or wait in a new session
pub async fn request_match(
    State(state): State<Arc<AppState>>,
    Json(body): Json<MatchRequestDto>,
) -> ApiResult<MatchResponseDto> {
    let user_id = parse_user_id(body.user_id)?;

    match state.request_match().execute(&user_id).await {
        Ok(MatchOutcome::Matched(session)) => Ok(Json(MatchResponseDto {
            status: MatchStatus::Matched,
            session: SessionDto::from(&session),
        })),
        Ok(MatchOutcome::Waiting(session)) => Ok(Json(MatchResponseDto {
            status: MatchStatus::Waiting,
            session: SessionDto::from(&session),
        })),
        Err(e) => {
            tracing::error!("Chat matching error: {}", e);
            Err(error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to match chat",
            ))
        }
    }
}

pub async fn end_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(body): Json<EndSessionRequestDto>,
) -> ApiResult<SessionDto> {
    let session_id = parse_session_id(session_id)?;
    let user_id = parse_user_id(body.user_id)?;

    let session = state
        .end_session()
        .execute(&session_id, &user_id)
        .await
        .map_err(session_error)?;
    Ok(Json(SessionDto::from(&session)))
}

/// Messages of a session, newest first
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Query(query): Query<ListMessagesQuery>,
) -> ApiResult<Vec<MessageDto>> {
    let session_id = parse_session_id(session_id)?;

    let messages = state
        .list_messages()
        .execute(&session_id, query.limit)
        .await
        .map_err(session_error)?;
    Ok(Json(messages.iter().map(MessageDto::from).collect()))
}

/// Send a message without a WebSocket connection
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SendMessageRequestDto>,
) -> ApiResult<SendMessageResponseDto> {
    let session_id = parse_session_id(body.session_id)?;
    let sender_id = parse_user_id(body.sender_id)?;

    match state
        .send_message()
        .execute_as_user(&session_id, &sender_id, &body.content)
        .await
        .map_err(send_error)?
    {
        SendOutcome::Delivered { message, .. } => Ok(Json(SendMessageResponseDto::Message(
            MessageDto::from(&message),
        ))),
        SendOutcome::Crisis(crisis) => Ok(Json(SendMessageResponseDto::Crisis(
            CrisisResponseDto::from(&crisis),
        ))),
        SendOutcome::Rejected {
            reason,
            filtered_content,
        } => Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponseDto::filtered(reason, filtered_content)),
        )),
    }
}

pub async fn analyze_emotion(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AnalyzeRequestDto>,
) -> ApiResult<AnalyzeResponseDto> {
    match state.analyze_emotion().execute(&body.content).await {
        Ok(AnalyzeOutcome::Analysis(analysis)) => Ok(Json(AnalyzeResponseDto::Analysis(
            EmotionAnalysisDto::from(analysis),
        ))),
        Ok(AnalyzeOutcome::Crisis(crisis)) => Ok(Json(AnalyzeResponseDto::Crisis(
            CrisisResponseDto::from(&crisis),
        ))),
        Ok(AnalyzeOutcome::Rejected {
            reason,
            filtered_content,
        }) => Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponseDto::filtered(reason, filtered_content)),
        )),
        Err(_) => Err(error(StatusCode::BAD_REQUEST, "Invalid content length")),
    }
}

/// Comfort message for an emotion, falling back to a fixed one
pub async fn comfort_message(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ComfortRequestDto>,
) -> ApiResult<ComfortResponseDto> {
    let message = state
        .comfort_message()
        .execute(&body.emotion, body.context.as_deref())
        .await
        .map_err(|e| error(StatusCode::BAD_REQUEST, e.to_string()))?;
    Ok(Json(ComfortResponseDto { message }))
}

/// Currently open rooms
pub async fn get_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomSummaryDto>> {
    let rooms = state.relay.rooms().await;
    Json(rooms.iter().map(RoomSummaryDto::from).collect())
}
