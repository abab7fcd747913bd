//! Direct message DTOs.

use serde::Deserialize;
use utoipa::ToSchema;

use crate::domain::{DEFAULT_MESSAGE_TYPE, UserId};

/// Request body for `POST /api/messages`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SendMessageRequest {
    /// Addressee.
    pub receiver_id: UserId,
    /// Message body.
    pub content: String,
    /// Content type. Defaults to `"text"`.
    #[serde(default = "default_message_type")]
    pub message_type: String,
}

fn default_message_type() -> String {
    DEFAULT_MESSAGE_TYPE.to_string()
}
