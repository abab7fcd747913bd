//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::auth::{IdentityVerifier, JwtAuthority};
use crate::directory::Directory;
use crate::domain::ConnectionRegistry;
use crate::service::{EventRouter, MessageService, SessionManager};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// User and message storage.
    pub directory: Arc<dyn Directory>,
    /// Token issuer and verifier.
    pub auth: Arc<JwtAuthority>,
    /// Live identity → connection map.
    pub registry: Arc<ConnectionRegistry>,
    /// Connection lifecycle manager.
    pub sessions: Arc<SessionManager>,
    /// Inbound event router.
    pub router: Arc<EventRouter>,
    /// Persist-then-deliver message path.
    pub messages: Arc<MessageService>,
    /// Capacity of each connection's outbound queue.
    pub outbound_queue_capacity: usize,
}

impl AppState {
    /// Wires the relay core around `directory` and `auth`.
    ///
    /// Creates a fresh [`ConnectionRegistry`]; it lives as long as the
    /// returned state.
    #[must_use]
    pub fn new(
        directory: Arc<dyn Directory>,
        auth: Arc<JwtAuthority>,
        outbound_queue_capacity: usize,
    ) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let verifier: Arc<dyn IdentityVerifier> = Arc::<JwtAuthority>::clone(&auth);
        let messages = MessageService::new(Arc::clone(&directory), Arc::clone(&registry));
        let router = EventRouter::new(
            Arc::clone(&registry),
            Arc::clone(&directory),
            messages.clone(),
        );
        let sessions = SessionManager::new(Arc::clone(&registry), Arc::clone(&directory), verifier);

        Self {
            directory,
            auth,
            registry,
            sessions: Arc::new(sessions),
            router: Arc::new(router),
            messages: Arc::new(messages),
            outbound_queue_capacity,
        }
    }
}
