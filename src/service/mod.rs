//! Service layer: the relay core.
//!
//! [`SessionManager`] owns the connection lifecycle, [`EventRouter`]
//! routes inbound events to their targets, and [`MessageService`] is the
//! persist-then-deliver path shared with the REST API.

pub mod messaging;
pub mod router;
pub mod session;

pub use messaging::{MessageService, SendReceipt};
pub use router::{DropReason, EventRouter, RouteOutcome};
pub use session::{ConnectError, Session, SessionManager, SessionState};
