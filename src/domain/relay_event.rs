//! Typed realtime events exchanged over a relay connection.
//!
//! Both directions use the same JSON envelope:
//!
//! ```json
//! { "event": "send_message", "data": { "receiver_id": "...", "content": "hi" } }
//! ```
//!
//! [`InboundEvent`] is what a client may send, [`OutboundEvent`] is what the
//! relay delivers. Signaling payloads (`offer`, `answer`, `candidate`) are
//! carried as opaque JSON values and never inspected.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Message, UserId, UserProfile};

/// Event received from a client connection.
///
/// Every field is optional at the wire level so that a partially filled
/// event still parses; the router drops events whose required fields are
/// missing or empty.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum InboundEvent {
    /// Persist a direct message and deliver it to the receiver.
    SendMessage {
        /// Addressee.
        #[serde(default)]
        receiver_id: Option<UserId>,
        /// Message body.
        #[serde(default)]
        content: Option<String>,
    },

    /// Start a call by forwarding an SDP offer to the receiver.
    #[serde(alias = "call_user")]
    CallOffer {
        /// Callee.
        #[serde(default)]
        receiver_id: Option<UserId>,
        /// Opaque SDP offer.
        #[serde(default)]
        offer: Option<Value>,
    },

    /// Accept a call by forwarding an SDP answer to the caller.
    #[serde(alias = "call_accepted")]
    CallAnswer {
        /// Original caller.
        #[serde(default)]
        caller_id: Option<UserId>,
        /// Opaque SDP answer.
        #[serde(default)]
        answer: Option<Value>,
    },

    /// Decline an incoming call.
    #[serde(alias = "call_rejected")]
    CallReject {
        /// Original caller.
        #[serde(default)]
        caller_id: Option<UserId>,
    },

    /// Hang up an ongoing call.
    #[serde(alias = "end_call")]
    CallEnd {
        /// The other party.
        #[serde(default)]
        other_user_id: Option<UserId>,
    },

    /// Forward an ICE candidate to the other party.
    IceCandidate {
        /// The other party.
        #[serde(default)]
        other_user_id: Option<UserId>,
        /// Opaque ICE candidate.
        #[serde(default)]
        candidate: Option<Value>,
    },
}

impl InboundEvent {
    /// Returns the canonical event kind as a static string slice.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::SendMessage { .. } => "send_message",
            Self::CallOffer { .. } => "call_offer",
            Self::CallAnswer { .. } => "call_answer",
            Self::CallReject { .. } => "call_reject",
            Self::CallEnd { .. } => "call_end",
            Self::IceCandidate { .. } => "ice_candidate",
        }
    }
}

/// Event delivered to a client connection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum OutboundEvent {
    /// A new direct message addressed to this user.
    NewMessage {
        /// The stored message.
        message: Message,
        /// Public profile of the author.
        sender: UserProfile,
    },

    /// Another user came online.
    UserOnline {
        /// Identity that connected.
        user_id: UserId,
    },

    /// Another user went offline.
    UserOffline {
        /// Identity that disconnected.
        user_id: UserId,
    },

    /// Someone is calling this user.
    IncomingCall {
        /// Public profile of the caller.
        caller: UserProfile,
        /// Opaque SDP offer.
        offer: Value,
    },

    /// The callee accepted this user's call.
    CallAccepted {
        /// Opaque SDP answer.
        answer: Value,
    },

    /// The callee rejected this user's call.
    CallRejected {},

    /// The other party hung up.
    CallEnded {},

    /// ICE candidate from the other party.
    IceCandidate {
        /// Opaque ICE candidate.
        candidate: Value,
    },
}

impl OutboundEvent {
    /// Returns the wire event name as a static string slice.
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::NewMessage { .. } => "new_message",
            Self::UserOnline { .. } => "user_online",
            Self::UserOffline { .. } => "user_offline",
            Self::IncomingCall { .. } => "incoming_call",
            Self::CallAccepted { .. } => "call_accepted",
            Self::CallRejected {} => "call_rejected",
            Self::CallEnded {} => "call_ended",
            Self::IceCandidate { .. } => "ice_candidate",
        }
    }

    /// Returns `true` for the presence events that are broadcast rather
    /// than targeted.
    #[must_use]
    pub const fn is_presence(&self) -> bool {
        matches!(self, Self::UserOnline { .. } | Self::UserOffline { .. })
    }
}
