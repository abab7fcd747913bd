//! User records and their public projection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::UserId;

/// A user account as stored in the [`crate::directory::Directory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Routing identity (immutable after creation).
    pub id: UserId,
    /// Unique login name.
    pub username: String,
    /// Unique e-mail address.
    pub email: String,
    /// Salted password digest, see [`crate::auth::password`].
    pub password_hash: String,
    /// Account creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Best-effort mirror of the live presence state.
    pub is_online: bool,
}

impl User {
    /// Builds a fresh, offline user from registration fields.
    #[must_use]
    pub fn from_new(new_user: NewUser) -> Self {
        Self {
            id: UserId::generate(),
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            created_at: Utc::now(),
            is_online: false,
        }
    }

    /// Returns the public projection of this user.
    #[must_use]
    pub fn profile(&self) -> UserProfile {
        UserProfile::from(self)
    }
}

/// Fields required to create a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Requested login name.
    pub username: String,
    /// Requested e-mail address.
    pub email: String,
    /// Already-hashed password.
    pub password_hash: String,
}

/// Public view of a user, safe to send to other clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    /// User identity.
    pub id: UserId,
    /// Login name.
    pub username: String,
    /// E-mail address.
    pub email: String,
    /// Presence flag as last recorded in the directory.
    pub is_online: bool,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            is_online: user.is_online,
        }
    }
}
