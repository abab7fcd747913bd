//! Domain layer: identities, messages, live connections and events.
//!
//! This module contains the server-side domain model including user
//! identity, message records, connection handles with their outbound
//! queues, per-user rooms, the typed event vocabulary, and the connection
//! registry that maps identities to live connections.

pub mod connection;
pub mod connection_registry;
pub mod message;
pub mod relay_event;
pub mod room;
pub mod user;
pub mod user_id;

pub use connection::{ConnectionHandle, ConnectionId, Delivery};
pub use connection_registry::ConnectionRegistry;
pub use message::{DEFAULT_MESSAGE_TYPE, Message};
pub use relay_event::{InboundEvent, OutboundEvent};
pub use room::Room;
pub use user::{NewUser, User, UserProfile};
pub use user_id::UserId;
