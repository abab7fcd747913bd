//! User directory handlers.

use std::collections::HashSet;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::app_state::AppState;
use crate::auth::AuthUser;
use crate::domain::{UserId, UserProfile};
use crate::error::{ErrorResponse, RelayError};

/// `GET /users`: Every user except the caller.
///
/// # Errors
///
/// Returns [`RelayError`] on authentication or storage failure.
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    summary = "List users",
    description = "Returns the profile of every registered user except the caller. A user is reported online if they are logged in or hold a live WebSocket connection.",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "User list", body = Vec<UserProfile>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<impl IntoResponse, RelayError> {
    let live: HashSet<UserId> = state.registry.online_users().into_iter().collect();
    let users: Vec<UserProfile> = state
        .directory
        .list_users_except(&caller.id)
        .await?
        .iter()
        .map(|user| {
            let mut profile = UserProfile::from(user);
            profile.is_online |= live.contains(&user.id);
            profile
        })
        .collect();
    Ok((StatusCode::OK, Json(users)))
}

/// `GET /users/me`: The caller's own profile.
#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "Users",
    summary = "Current user",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Caller profile", body = UserProfile),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
    )
)]
pub async fn me(AuthUser(caller): AuthUser) -> impl IntoResponse {
    (StatusCode::OK, Json(caller.profile()))
}

/// User routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/me", get(me))
}
