//! WebSocket wire codec and close codes.
//!
//! Frames are JSON text of the form `{"event": "...", "data": {...}}`, see
//! [`crate::domain::relay_event`].

use crate::auth::AuthError;
use crate::domain::{InboundEvent, OutboundEvent};
use crate::service::ConnectError;

/// Close code sent when the credential has expired.
pub const CLOSE_TOKEN_EXPIRED: u16 = 4001;

/// Close code sent when the credential is missing or invalid.
pub const CLOSE_TOKEN_INVALID: u16 = 4002;

/// Parses a client text frame.
///
/// # Errors
///
/// Returns the JSON error for malformed frames and unknown event kinds.
pub fn decode_inbound(text: &str) -> Result<InboundEvent, serde_json::Error> {
    serde_json::from_str(text)
}

/// Serializes an event for the socket.
///
/// # Errors
///
/// Returns the JSON error if the event cannot be serialized.
pub fn encode_outbound(event: &OutboundEvent) -> Result<String, serde_json::Error> {
    serde_json::to_string(event)
}

/// Maps a refused connect to a WebSocket close code and reason.
#[must_use]
pub const fn close_reason(err: &ConnectError) -> (u16, &'static str) {
    match err {
        ConnectError::Auth(AuthError::Expired) => (CLOSE_TOKEN_EXPIRED, "token expired"),
        ConnectError::Auth(_) | ConnectError::NotPending => (CLOSE_TOKEN_INVALID, "token invalid"),
    }
}
