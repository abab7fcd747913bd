//! Relay error types with HTTP status code mapping.
//!
//! [`RelayError`] is the central error type for the REST surface and the
//! directory. Each variant maps to a specific HTTP status code and
//! structured JSON error response. Routing misses on the realtime path are
//! not errors and never appear here.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::AuthError;
use crate::domain::UserId;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2001,
///     "message": "receiver not found: 6f1c..."
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`RelayError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category         | HTTP Status                 |
/// |-----------|------------------|-----------------------------|
/// | 1000–1999 | Validation       | 400 Bad Request             |
/// | 2000–2999 | Not Found        | 404 Not Found               |
/// | 3000–3999 | Server           | 500 Internal Server Error   |
/// | 4000–4999 | Authentication   | 401 Unauthorized            |
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Credential was missing, invalid or expired.
    #[error("unauthorized: {0}")]
    Unauthorized(#[from] AuthError),

    /// Username or e-mail is already taken.
    #[error("Username or email already registered")]
    Conflict,

    /// Message addressee does not exist.
    #[error("receiver not found: {0}")]
    ReceiverNotFound(UserId),

    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Directory storage failure.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RelayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::Conflict => 1002,
            Self::ReceiverNotFound(_) => 2001,
            Self::Internal(_) => 3000,
            Self::Persistence(_) => 3001,
            Self::Unauthorized(_) => 4001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::Conflict => StatusCode::BAD_REQUEST,
            Self::ReceiverNotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Persistence(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for RelayError {
    fn from(err: sqlx::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receiver_not_found_is_404() {
        let err = RelayError::ReceiverNotFound(UserId::new("ghost"));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.error_code(), 2001);
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn auth_error_converts_to_401() {
        let err = RelayError::from(AuthError::MissingCredential);
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn internal_error_is_500() {
        let err = RelayError::Internal("token signing failed".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error_code(), 3000);
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn conflict_message_is_user_visible() {
        let response = RelayError::Conflict.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
