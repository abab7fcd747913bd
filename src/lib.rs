//! # presence-relay
//!
//! Realtime presence, direct messaging and WebRTC signaling relay.
//!
//! Authenticated clients hold one WebSocket connection each. The relay
//! tracks which identity is online on which connection, announces presence
//! changes, persists and delivers direct messages, and forwards opaque call
//! signaling payloads (offers, answers, ICE candidates) between peers. A
//! REST API under `/api` covers accounts, the user directory and message
//! history.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── SessionManager / EventRouter / MessageService (service/)
//!     ├── JwtAuthority (auth/)
//!     │
//!     ├── ConnectionRegistry (domain/)
//!     │
//!     └── Directory: in-memory or PostgreSQL (directory/)
//! ```

pub mod api;
pub mod app_state;
pub mod auth;
pub mod config;
pub mod directory;
pub mod domain;
pub mod error;
pub mod server;
pub mod service;
pub mod ws;
