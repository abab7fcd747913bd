//! Type-safe user identity.
//!
//! [`UserId`] is a newtype wrapper around an opaque string so that user
//! identities cannot be confused with usernames, e-mails or message IDs.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Unique identity of a user account.
///
/// Stable for the lifetime of the account and used as the sole routing
/// key by the [`super::ConnectionRegistry`]. Newly registered accounts get
/// a UUID v4 string, but any non-empty string is accepted when parsing
/// credentials or inbound events.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Generates a fresh random identity (UUID v4 string).
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Wraps an existing identity string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identity as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the identity is the empty string.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn generate_creates_unique_ids() {
        assert_ne!(UserId::generate(), UserId::generate());
    }

    #[test]
    fn generated_id_is_uuid_string() {
        let id = UserId::generate();
        assert_eq!(id.as_str().len(), 36);
        assert!(id.as_str().parse::<uuid::Uuid>().is_ok());
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = UserId::new("alice");
        let Ok(json) = serde_json::to_string(&id) else {
            panic!("serialization failed");
        };
        assert_eq!(json, "\"alice\"");
    }

    #[test]
    fn empty_id_is_detected() {
        assert!(UserId::new("").is_empty());
        assert!(!UserId::new("bob").is_empty());
    }
}
