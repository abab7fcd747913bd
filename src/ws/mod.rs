//! WebSocket layer: upgrade, connection loop, wire codec.
//!
//! The WebSocket endpoint at `/ws` carries presence, direct messages and
//! call signaling in both directions.

pub mod connection;
pub mod handler;
pub mod messages;
