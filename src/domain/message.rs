//! Immutable direct message records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::UserId;

/// Message type assigned when the client does not specify one.
pub const DEFAULT_MESSAGE_TYPE: &str = "text";

/// A direct message between two users.
///
/// Created by the directory when a message is sent and never mutated
/// afterwards. The timestamp is assigned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Message {
    /// Unique message identifier.
    pub id: uuid::Uuid,
    /// Author of the message.
    pub sender_id: UserId,
    /// Addressee of the message.
    pub receiver_id: UserId,
    /// Message body.
    pub content: String,
    /// Server-assigned creation time (UTC).
    pub timestamp: DateTime<Utc>,
    /// Free-form content type, `"text"` by default.
    pub message_type: String,
}

impl Message {
    /// Creates a new message stamped with the current server time.
    #[must_use]
    pub fn new(
        sender_id: UserId,
        receiver_id: UserId,
        content: impl Into<String>,
        message_type: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            sender_id,
            receiver_id,
            content: content.into(),
            timestamp: Utc::now(),
            message_type: message_type.into(),
        }
    }

    /// Returns `true` if this message belongs to the conversation between
    /// `a` and `b`, in either direction.
    #[must_use]
    pub fn is_between(&self, a: &UserId, b: &UserId) -> bool {
        (&self.sender_id == a && &self.receiver_id == b)
            || (&self.sender_id == b && &self.receiver_id == a)
    }
}
