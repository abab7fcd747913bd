//! Axum extractor for bearer-authenticated REST requests.

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use super::{AuthError, IdentityVerifier};
use crate::app_state::AppState;
use crate::domain::User;
use crate::error::RelayError;

/// The authenticated caller of a REST endpoint.
///
/// Resolved from the `Authorization: Bearer <token>` header; the token
/// subject must still exist in the directory.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = RelayError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(AuthError::MissingCredential)?;
        let user_id = state.auth.verify(token)?;
        let user = state
            .directory
            .find_user(&user_id)
            .await?
            .ok_or(AuthError::UnknownUser)?;
        Ok(Self(user))
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
