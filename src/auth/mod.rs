//! Authentication: credential verification, token issuance and password
//! hashing.
//!
//! Every entry point (WebSocket connect and the REST routes) turns a bearer
//! credential into a [`UserId`] through the [`IdentityVerifier`] trait.
//! [`JwtAuthority`] is the production implementation.

pub mod extractor;
pub mod jwt;
pub mod password;

use std::fmt;

use crate::domain::UserId;

pub use extractor::AuthUser;
pub use jwt::{Claims, JwtAuthority};

/// Authentication failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No credential was supplied.
    #[error("missing credential")]
    MissingCredential,

    /// The credential was well formed but has expired.
    #[error("credential expired")]
    Expired,

    /// The credential could not be verified.
    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    /// The credential names a user that no longer exists.
    #[error("user not found")]
    UnknownUser,

    /// Username/password pair did not match.
    #[error("invalid credentials")]
    InvalidLogin,
}

/// Turns a bearer credential into a verified identity.
pub trait IdentityVerifier: Send + Sync + fmt::Debug {
    /// Verifies `credential` and returns the identity it names.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] if the credential is invalid or expired.
    fn verify(&self, credential: &str) -> Result<UserId, AuthError>;
}
