//! Directory: durable store of users and messages.
//!
//! The relay core only talks to storage through the [`Directory`] trait.
//! [`InMemoryDirectory`] backs tests and single-node deployments without a
//! database; [`PostgresDirectory`] uses `sqlx::PgPool`.

pub mod memory;
pub mod postgres;

use std::fmt;

use async_trait::async_trait;

use crate::domain::{Message, NewUser, User, UserId};
use crate::error::RelayError;

pub use memory::InMemoryDirectory;
pub use postgres::PostgresDirectory;

/// Maximum number of messages returned by [`Directory::find_messages`].
pub const HISTORY_LIMIT: usize = 1000;

/// Storage interface consulted by the relay.
#[async_trait]
pub trait Directory: Send + Sync + fmt::Debug {
    /// Creates a user.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Conflict`] if the username or e-mail is taken.
    async fn create_user(&self, new_user: NewUser) -> Result<User, RelayError>;

    /// Looks up a user by identity.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Persistence`] on storage failure.
    async fn find_user(&self, user_id: &UserId) -> Result<Option<User>, RelayError>;

    /// Looks up a user by login name.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Persistence`] on storage failure.
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, RelayError>;

    /// Lists every user except `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Persistence`] on storage failure.
    async fn list_users_except(&self, user_id: &UserId) -> Result<Vec<User>, RelayError>;

    /// Updates the presence mirror for `user_id`. Unknown users are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Persistence`] on storage failure.
    async fn set_online(&self, user_id: &UserId, online: bool) -> Result<(), RelayError>;

    /// Stores a new message from `sender` to `receiver`.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::ReceiverNotFound`] if `receiver` does not exist;
    /// nothing is stored in that case.
    async fn create_message(
        &self,
        sender: &UserId,
        receiver: &UserId,
        content: &str,
        message_type: &str,
    ) -> Result<Message, RelayError>;

    /// Returns the conversation between `a` and `b` (both directions),
    /// oldest first, capped at [`HISTORY_LIMIT`].
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Persistence`] on storage failure.
    async fn find_messages(&self, a: &UserId, b: &UserId) -> Result<Vec<Message>, RelayError>;
}
