//! Data Transfer Objects for REST request/response serialization.
//!
//! User profiles and messages are returned as their domain types
//! ([`crate::domain::UserProfile`], [`crate::domain::Message`]).

pub mod auth_dto;
pub mod message_dto;

pub use auth_dto::*;
pub use message_dto::*;
