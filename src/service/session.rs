//! Session lifecycle: authenticate, register, announce, and clean up.
//!
//! Each connection owns one [`Session`] that moves through
//! `Unauthenticated → Registered → Terminated`. [`SessionManager`] drives
//! the transitions and keeps the registry, the directory presence mirror
//! and the presence broadcasts consistent.

use std::sync::Arc;

use crate::auth::{AuthError, IdentityVerifier};
use crate::directory::Directory;
use crate::domain::{ConnectionHandle, ConnectionId, ConnectionRegistry, Delivery, OutboundEvent, UserId};

/// Lifecycle state of one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Connected, no credential accepted yet.
    Unauthenticated,
    /// Authenticated and registered under the identity.
    Registered(UserId),
    /// Closed. Absorbing: no further events are accepted.
    Terminated,
}

/// Per-connection session owned by the connection task.
#[derive(Debug)]
pub struct Session {
    handle: ConnectionHandle,
    state: SessionState,
}

impl Session {
    /// Creates an unauthenticated session for `handle`.
    #[must_use]
    pub const fn new(handle: ConnectionHandle) -> Self {
        Self {
            handle,
            state: SessionState::Unauthenticated,
        }
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    /// Returns the identity if the session is registered.
    #[must_use]
    pub const fn user_id(&self) -> Option<&UserId> {
        match &self.state {
            SessionState::Registered(user_id) => Some(user_id),
            SessionState::Unauthenticated | SessionState::Terminated => None,
        }
    }

    /// Returns the underlying connection identifier.
    #[must_use]
    pub const fn connection_id(&self) -> ConnectionId {
        self.handle.id()
    }

    /// Returns `true` once the session has terminated.
    #[must_use]
    pub const fn is_terminated(&self) -> bool {
        matches!(self.state, SessionState::Terminated)
    }

    /// Moves the lifecycle state into a new session over the same
    /// connection, leaving this one `Terminated`.
    ///
    /// Lets cleanup take ownership from a context that only has `&mut`.
    #[must_use]
    pub fn detach(&mut self) -> Self {
        Self {
            handle: self.handle.clone(),
            state: std::mem::replace(&mut self.state, SessionState::Terminated),
        }
    }
}

/// Why a connect attempt was refused.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    /// The credential was missing or did not verify.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The session already left the `Unauthenticated` state.
    #[error("session is not awaiting authentication")]
    NotPending,
}

/// Drives session transitions against the registry and directory.
#[derive(Debug, Clone)]
pub struct SessionManager {
    registry: Arc<ConnectionRegistry>,
    directory: Arc<dyn Directory>,
    verifier: Arc<dyn IdentityVerifier>,
}

impl SessionManager {
    /// Creates a new `SessionManager`.
    #[must_use]
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        directory: Arc<dyn Directory>,
        verifier: Arc<dyn IdentityVerifier>,
    ) -> Self {
        Self {
            registry,
            directory,
            verifier,
        }
    }

    /// Authenticates `session` with `credential` and registers it.
    ///
    /// On success the identity joins its room, the directory mirror is set
    /// online, and `user_online` is sent to every other registered
    /// connection. On failure the session is terminated without ever
    /// being registered.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectError::Auth`] for a missing or invalid credential
    /// and [`ConnectError::NotPending`] if the session is not
    /// `Unauthenticated`.
    pub async fn connect(
        &self,
        session: &mut Session,
        credential: Option<&str>,
    ) -> Result<UserId, ConnectError> {
        if session.state != SessionState::Unauthenticated {
            return Err(ConnectError::NotPending);
        }

        let verified = credential
            .filter(|c| !c.is_empty())
            .ok_or(AuthError::MissingCredential)
            .and_then(|c| self.verifier.verify(c));
        let user_id = match verified {
            Ok(user_id) => user_id,
            Err(err) => {
                session.state = SessionState::Terminated;
                tracing::info!(connection_id = %session.connection_id(), error = %err, "connection rejected");
                return Err(err.into());
            }
        };

        self.registry.register(user_id.clone(), session.handle.clone());
        session.state = SessionState::Registered(user_id.clone());

        if let Err(err) = self.directory.set_online(&user_id, true).await {
            tracing::warn!(%user_id, error = %err, "failed to mirror online presence");
        }

        let notified = self.broadcast_presence(
            &user_id,
            &OutboundEvent::UserOnline {
                user_id: user_id.clone(),
            },
        );
        tracing::info!(
            %user_id,
            connection_id = %session.connection_id(),
            notified,
            "session registered"
        );
        Ok(user_id)
    }

    /// Terminates `session`, cleaning up if it was registered.
    ///
    /// Graceful closes and transport failures take the same path. If the
    /// session was superseded by a newer connection for the same identity,
    /// the newer registration is left untouched and no presence change is
    /// announced.
    pub async fn disconnect(&self, session: &mut Session) {
        let previous = std::mem::replace(&mut session.state, SessionState::Terminated);
        let SessionState::Registered(user_id) = previous else {
            return;
        };

        let connection_id = session.connection_id();
        if !self.registry.unregister(&user_id, connection_id) {
            tracing::debug!(%user_id, %connection_id, "superseded session closed");
            return;
        }

        // A reconnect may have raced in; leave its online flag alone.
        if !self.registry.is_online(&user_id)
            && let Err(err) = self.directory.set_online(&user_id, false).await
        {
            tracing::warn!(%user_id, error = %err, "failed to mirror offline presence");
        }

        let notified = self.broadcast_presence(
            &user_id,
            &OutboundEvent::UserOffline {
                user_id: user_id.clone(),
            },
        );
        tracing::info!(%user_id, %connection_id, notified, "session terminated");
    }

    /// Sends a presence event to every registered connection except
    /// `user_id`'s, using a snapshot of the registry.
    ///
    /// Returns the number of connections the event was enqueued on.
    fn broadcast_presence(&self, user_id: &UserId, event: &OutboundEvent) -> usize {
        let mut notified = 0;
        for (_, handle) in self.registry.snapshot_except(user_id) {
            if handle.deliver(event.clone()) == Delivery::Enqueued {
                notified += 1;
            }
        }
        notified
    }
}
