//! Account handlers: register, login, logout.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{LoginRequest, LoginResponse, LogoutResponse, RegisterRequest};
use crate::app_state::AppState;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::{AuthError, AuthUser};
use crate::domain::{NewUser, UserProfile};
use crate::error::{ErrorResponse, RelayError};

/// `POST /auth/register`: Create an account.
///
/// # Errors
///
/// Returns [`RelayError::InvalidRequest`] on blank fields and
/// [`RelayError::Conflict`] if the username or e-mail is taken.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    summary = "Register a user",
    description = "Creates an account. Usernames and e-mail addresses are unique.",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created", body = UserProfile),
        (status = 400, description = "Blank field or duplicate account", body = ErrorResponse),
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, RelayError> {
    let username = req.username.trim();
    let email = req.email.trim();
    if username.is_empty() || email.is_empty() || req.password.is_empty() {
        return Err(RelayError::InvalidRequest(
            "username, email and password are required".to_string(),
        ));
    }

    let password = req.password.clone();
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| RelayError::Internal(e.to_string()))??;

    let user = state
        .directory
        .create_user(NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
        })
        .await?;

    tracing::info!(user_id = %user.id, username = %user.username, "user registered");
    Ok((StatusCode::CREATED, Json(user.profile())))
}

/// `POST /auth/login`: Exchange credentials for a bearer token.
///
/// # Errors
///
/// Returns [`RelayError::Unauthorized`] on an unknown username or a wrong
/// password.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    summary = "Log in",
    description = "Verifies the password, marks the user online and returns an access token usable on the REST API and the WebSocket.",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, RelayError> {
    let Some(mut user) = state
        .directory
        .find_user_by_username(req.username.trim())
        .await?
    else {
        return Err(AuthError::InvalidLogin.into());
    };
    let stored = user.password_hash.clone();
    let matches = tokio::task::spawn_blocking(move || verify_password(&req.password, &stored))
        .await
        .map_err(|e| RelayError::Internal(e.to_string()))?;
    if !matches {
        return Err(AuthError::InvalidLogin.into());
    }

    state.directory.set_online(&user.id, true).await?;
    user.is_online = true;
    let access_token = state.auth.issue(&user.id)?;

    tracing::info!(user_id = %user.id, "user logged in");
    Ok((
        StatusCode::OK,
        Json(LoginResponse {
            access_token,
            token_type: "bearer".to_string(),
            user: user.profile(),
        }),
    ))
}

/// `POST /auth/logout`: Mark the caller offline.
///
/// Tokens are stateless; the client discards its own copy.
///
/// # Errors
///
/// Returns [`RelayError::Unauthorized`] without a valid token.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    summary = "Log out",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Logged out", body = LogoutResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, RelayError> {
    state.directory.set_online(&user.id, false).await?;
    tracing::info!(user_id = %user.id, "user logged out");
    Ok((
        StatusCode::OK,
        Json(LogoutResponse {
            message: "Successfully logged out".to_string(),
        }),
    ))
}

/// Account routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}
