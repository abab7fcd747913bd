//! WebSocket connection task.
//!
//! Authenticates the connection, then runs the read/write loop: inbound
//! text frames go through the [`crate::service::EventRouter`], and events
//! queued on this connection's outbound channel are written to the socket.

use std::sync::Arc;

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures_util::{SinkExt, StreamExt};

use super::messages::{close_reason, decode_inbound, encode_outbound};
use crate::app_state::AppState;
use crate::domain::ConnectionHandle;
use crate::service::{Session, SessionManager};

/// Runs a single WebSocket connection to completion.
///
/// Connections without a valid credential are closed with a 4001/4002
/// close frame before they ever reach the registry.
pub async fn run_connection(socket: WebSocket, state: AppState, credential: Option<String>) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (handle, mut outbound_rx) = ConnectionHandle::channel(state.outbound_queue_capacity);
    let mut guard = SessionGuard::new(Arc::clone(&state.sessions), Session::new(handle));

    let user_id = match state.sessions.connect(&mut guard.session, credential.as_deref()).await {
        Ok(user_id) => user_id,
        Err(err) => {
            let (code, reason) = close_reason(&err);
            let frame = CloseFrame {
                code,
                reason: reason.into(),
            };
            let _ = ws_tx.send(Message::Close(Some(frame))).await;
            return;
        }
    };

    loop {
        tokio::select! {
            // Incoming frame from client
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => match decode_inbound(&text) {
                        Ok(event) => {
                            let _ = state.router.dispatch(&guard.session, event).await;
                        }
                        Err(err) => {
                            tracing::debug!(%user_id, error = %err, "ignoring malformed frame");
                        }
                    },
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(err)) => {
                        tracing::debug!(%user_id, error = %err, "ws transport error");
                        break;
                    }
                    _ => {}
                }
            }
            // Event queued for this connection
            event = outbound_rx.recv() => {
                let Some(event) = event else { break };
                match encode_outbound(&event) {
                    Ok(json) => {
                        if ws_tx.send(Message::text(json)).await.is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        tracing::warn!(%user_id, event = event.event_name(), error = %err, "failed to encode event");
                    }
                }
            }
        }
    }

    guard.close().await;
    tracing::debug!(%user_id, "ws connection closed");
}

/// Owns a connection's session and guarantees its disconnect runs.
///
/// [`SessionGuard::close`] runs cleanup on the normal path. If the guard is
/// dropped while still registered (task aborted, panic in the loop), the
/// disconnect is spawned from `Drop` instead.
#[derive(Debug)]
struct SessionGuard {
    sessions: Arc<SessionManager>,
    session: Session,
}

impl SessionGuard {
    const fn new(sessions: Arc<SessionManager>, session: Session) -> Self {
        Self { sessions, session }
    }

    /// Disconnects on a separate task and waits for it. The task finishes
    /// even if the caller is cancelled while waiting.
    async fn close(mut self) {
        let connection_id = self.session.connection_id();
        let cleanup = self.spawn_disconnect();
        if let Err(err) = cleanup.await {
            tracing::error!(%connection_id, error = %err, "session cleanup failed");
        }
    }

    fn spawn_disconnect(&mut self) -> tokio::task::JoinHandle<()> {
        let mut session = self.session.detach();
        let sessions = Arc::clone(&self.sessions);
        tokio::spawn(async move {
            sessions.disconnect(&mut session).await;
        })
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if self.session.user_id().is_none() {
            return;
        }
        if tokio::runtime::Handle::try_current().is_ok() {
            drop(self.spawn_disconnect());
        } else {
            tracing::warn!(
                connection_id = %self.session.connection_id(),
                "no runtime left for session cleanup"
            );
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;
    use crate::auth::{IdentityVerifier, JwtAuthority};
    use crate::directory::{Directory, InMemoryDirectory};
    use crate::domain::{ConnectionRegistry, OutboundEvent, UserId};

    struct Fixture {
        sessions: Arc<SessionManager>,
        registry: Arc<ConnectionRegistry>,
        auth: Arc<JwtAuthority>,
    }

    fn fixture() -> Fixture {
        let registry = Arc::new(ConnectionRegistry::new());
        let auth = Arc::new(JwtAuthority::new(b"guard-secret", 1));
        let sessions = Arc::new(SessionManager::new(
            Arc::clone(&registry),
            Arc::new(InMemoryDirectory::new()) as Arc<dyn Directory>,
            Arc::clone(&auth) as Arc<dyn IdentityVerifier>,
        ));
        Fixture {
            sessions,
            registry,
            auth,
        }
    }

    async fn connected(fx: &Fixture, name: &str) -> (SessionGuard, mpsc::Receiver<OutboundEvent>) {
        let (handle, rx) = ConnectionHandle::channel(8);
        let mut guard = SessionGuard::new(Arc::clone(&fx.sessions), Session::new(handle));
        let Ok(token) = fx.auth.issue(&UserId::new(name)) else {
            panic!("issue failed");
        };
        let Ok(_) = fx
            .sessions
            .connect(&mut guard.session, Some(token.as_str()))
            .await
        else {
            panic!("connect failed");
        };
        (guard, rx)
    }

    async fn wait_offline(registry: &ConnectionRegistry, user_id: &UserId) {
        for _ in 0..100 {
            if !registry.is_online(user_id) {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("{user_id} still registered");
    }

    #[tokio::test]
    async fn close_unregisters_and_announces() {
        let fx = fixture();
        let (_bob, mut bob_rx) = connected(&fx, "bob").await;
        let (alice, _alice_rx) = connected(&fx, "alice").await;
        let _ = bob_rx.recv().await;

        alice.close().await;
        assert!(!fx.registry.is_online(&UserId::new("alice")));
        assert_eq!(
            bob_rx.recv().await,
            Some(OutboundEvent::UserOffline {
                user_id: UserId::new("alice")
            })
        );
    }

    #[tokio::test]
    async fn aborted_connection_task_still_cleans_up() {
        let fx = fixture();
        let (_bob, mut bob_rx) = connected(&fx, "bob").await;
        let (alice, _alice_rx) = connected(&fx, "alice").await;
        let _ = bob_rx.recv().await;

        let task = tokio::spawn(async move {
            let _alice = alice;
            std::future::pending::<()>().await;
        });
        tokio::task::yield_now().await;
        task.abort();
        assert!(matches!(task.await, Err(err) if err.is_cancelled()));

        wait_offline(&fx.registry, &UserId::new("alice")).await;
        assert_eq!(
            bob_rx.recv().await,
            Some(OutboundEvent::UserOffline {
                user_id: UserId::new("alice")
            })
        );
    }

    #[tokio::test]
    async fn unregistered_guard_drop_is_a_no_op() {
        let fx = fixture();
        let (handle, _rx) = ConnectionHandle::channel(1);
        let guard = SessionGuard::new(Arc::clone(&fx.sessions), Session::new(handle));
        drop(guard);
        tokio::task::yield_now().await;
        assert!(fx.registry.is_empty());
    }
}
