//! Direct message handlers: send and conversation history.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::SendMessageRequest;
use crate::app_state::AppState;
use crate::auth::AuthUser;
use crate::domain::{Message, UserId};
use crate::error::{ErrorResponse, RelayError};

/// `POST /messages`: Store a message and push it to the receiver if online.
///
/// # Errors
///
/// Returns [`RelayError::ReceiverNotFound`] for an unknown receiver and
/// [`RelayError::InvalidRequest`] for empty content.
#[utoipa::path(
    post,
    path = "/api/messages",
    tag = "Messages",
    summary = "Send a direct message",
    description = "Persists the message, then delivers a `new_message` event to the receiver's live connection if there is one. Offline receivers find it in their history.",
    security(("bearer" = [])),
    request_body = SendMessageRequest,
    responses(
        (status = 201, description = "Message stored", body = Message),
        (status = 400, description = "Empty content", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Receiver not found", body = ErrorResponse),
    )
)]
pub async fn send_message(
    State(state): State<AppState>,
    AuthUser(sender): AuthUser,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, RelayError> {
    if req.content.is_empty() {
        return Err(RelayError::InvalidRequest(
            "content must not be empty".to_string(),
        ));
    }

    let receipt = state
        .messages
        .send(
            &sender.profile(),
            &req.receiver_id,
            &req.content,
            &req.message_type,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(receipt.message)))
}

/// `GET /messages/{user_id}`: Conversation between the caller and `user_id`.
///
/// # Errors
///
/// Returns [`RelayError`] on authentication or storage failure.
#[utoipa::path(
    get,
    path = "/api/messages/{user_id}",
    tag = "Messages",
    summary = "Conversation history",
    description = "Returns messages exchanged in either direction between the caller and the given user, oldest first.",
    security(("bearer" = [])),
    params(("user_id" = String, Path, description = "Other participant")),
    responses(
        (status = 200, description = "Messages, ascending by timestamp", body = Vec<Message>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
    )
)]
pub async fn history(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(other): Path<String>,
) -> Result<impl IntoResponse, RelayError> {
    let messages = state
        .messages
        .history(&caller.id, &UserId::from(other))
        .await?;
    Ok((StatusCode::OK, Json(messages)))
}

/// Message routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/messages", post(send_message))
        .route("/messages/{user_id}", get(history))
}
