//! Registration, login and logout DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::UserProfile;

/// Request body for `POST /api/auth/register`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    /// Desired login name.
    pub username: String,
    /// Contact e-mail.
    pub email: String,
    /// Plain-text password; hashed before storage.
    pub password: String,
}

/// Request body for `POST /api/auth/login`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Login name.
    pub username: String,
    /// Plain-text password.
    pub password: String,
}

/// Response body for `POST /api/auth/login`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    /// Bearer token for the REST API and the WebSocket.
    pub access_token: String,
    /// Always `"bearer"`.
    pub token_type: String,
    /// Profile of the logged-in user.
    pub user: UserProfile,
}

/// Response body for `POST /api/auth/logout`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LogoutResponse {
    /// Confirmation text.
    pub message: String,
}
