//! Event router: classify inbound events and deliver them to their target.
//!
//! The realtime channel is fire-and-forget. Nothing the router decides is
//! reported back to the sender; every decision is instead captured in a
//! [`RouteOutcome`] that the connection task logs and tests assert on.

use std::sync::Arc;

use serde_json::Value;

use super::messaging::MessageService;
use super::session::Session;
use crate::directory::Directory;
use crate::domain::{
    ConnectionRegistry, DEFAULT_MESSAGE_TYPE, Delivery, InboundEvent, OutboundEvent, Room, UserId,
    UserProfile,
};

/// Why an inbound event was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The sending connection is not the one registered for its identity.
    NotRegistered,
    /// A required field was absent, `null` or empty.
    MissingFields,
    /// The sender's profile could not be loaded.
    SenderUnknown,
    /// The directory refused to store the message.
    Rejected,
    /// The target's outbound queue was full.
    QueueFull,
}

/// What happened to one inbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Enqueued on the target's connection.
    Delivered,
    /// The target has no live connection. Not an error.
    RoutingMiss,
    /// Discarded before or during delivery.
    Dropped(DropReason),
}

impl From<Option<Delivery>> for RouteOutcome {
    fn from(delivery: Option<Delivery>) -> Self {
        match delivery {
            Some(Delivery::Enqueued) => Self::Delivered,
            Some(Delivery::QueueFull) => Self::Dropped(DropReason::QueueFull),
            // A connection that closed but has not unregistered yet is as good as gone.
            Some(Delivery::Closed) | None => Self::RoutingMiss,
        }
    }
}

/// Routes inbound events from a registered session to exactly one target.
#[derive(Debug, Clone)]
pub struct EventRouter {
    registry: Arc<ConnectionRegistry>,
    directory: Arc<dyn Directory>,
    messages: MessageService,
}

impl EventRouter {
    /// Creates a new `EventRouter`.
    #[must_use]
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        directory: Arc<dyn Directory>,
        messages: MessageService,
    ) -> Self {
        Self {
            registry,
            directory,
            messages,
        }
    }

    /// Dispatches `event` sent by `session`.
    ///
    /// Events from sessions that are not the live registration for their
    /// identity are dropped, as are events with missing required fields.
    pub async fn dispatch(&self, session: &Session, event: InboundEvent) -> RouteOutcome {
        let kind = event.kind();
        let Some(sender_id) = session.user_id() else {
            return dropped(kind, DropReason::NotRegistered);
        };
        if !self.registry.is_current(sender_id, session.connection_id()) {
            return dropped(kind, DropReason::NotRegistered);
        }

        let outcome = match event {
            InboundEvent::SendMessage {
                receiver_id,
                content,
            } => {
                let (Some(receiver_id), Some(content)) = (present(receiver_id), text(content)) else {
                    return dropped(kind, DropReason::MissingFields);
                };
                self.relay_message(sender_id, &receiver_id, &content).await
            }
            InboundEvent::CallOffer { receiver_id, offer } => {
                let (Some(receiver_id), Some(offer)) = (present(receiver_id), payload(offer)) else {
                    return dropped(kind, DropReason::MissingFields);
                };
                let Some(caller) = self.profile(sender_id).await else {
                    return dropped(kind, DropReason::SenderUnknown);
                };
                self.forward(&receiver_id, OutboundEvent::IncomingCall { caller, offer })
            }
            InboundEvent::CallAnswer { caller_id, answer } => {
                let (Some(caller_id), Some(answer)) = (present(caller_id), payload(answer)) else {
                    return dropped(kind, DropReason::MissingFields);
                };
                self.forward(&caller_id, OutboundEvent::CallAccepted { answer })
            }
            InboundEvent::CallReject { caller_id } => {
                let Some(caller_id) = present(caller_id) else {
                    return dropped(kind, DropReason::MissingFields);
                };
                self.forward(&caller_id, OutboundEvent::CallRejected {})
            }
            InboundEvent::CallEnd { other_user_id } => {
                let Some(other_user_id) = present(other_user_id) else {
                    return dropped(kind, DropReason::MissingFields);
                };
                self.forward(&other_user_id, OutboundEvent::CallEnded {})
            }
            InboundEvent::IceCandidate {
                other_user_id,
                candidate,
            } => {
                let (Some(other_user_id), Some(candidate)) =
                    (present(other_user_id), payload(candidate))
                else {
                    return dropped(kind, DropReason::MissingFields);
                };
                self.forward(&other_user_id, OutboundEvent::IceCandidate { candidate })
            }
        };

        tracing::debug!(sender_id = %sender_id, kind, ?outcome, "inbound event routed");
        outcome
    }

    async fn relay_message(
        &self,
        sender_id: &UserId,
        receiver_id: &UserId,
        content: &str,
    ) -> RouteOutcome {
        let Some(sender) = self.profile(sender_id).await else {
            return RouteOutcome::Dropped(DropReason::SenderUnknown);
        };
        match self
            .messages
            .send(&sender, receiver_id, content, DEFAULT_MESSAGE_TYPE)
            .await
        {
            Ok(receipt) => receipt.outcome,
            Err(err) => {
                tracing::debug!(%sender_id, %receiver_id, error = %err, "send_message rejected");
                RouteOutcome::Dropped(DropReason::Rejected)
            }
        }
    }

    fn forward(&self, target: &UserId, event: OutboundEvent) -> RouteOutcome {
        RouteOutcome::from(self.registry.deliver_to_room(&Room::for_user(target), event))
    }

    async fn profile(&self, user_id: &UserId) -> Option<UserProfile> {
        match self.directory.find_user(user_id).await {
            Ok(Some(user)) => Some(user.profile()),
            Ok(None) => None,
            Err(err) => {
                tracing::warn!(%user_id, error = %err, "sender lookup failed");
                None
            }
        }
    }
}

fn dropped(kind: &'static str, reason: DropReason) -> RouteOutcome {
    tracing::debug!(kind, ?reason, "inbound event dropped");
    RouteOutcome::Dropped(reason)
}

fn present(id: Option<UserId>) -> Option<UserId> {
    id.filter(|id| !id.is_empty())
}

fn text(content: Option<String>) -> Option<String> {
    content.filter(|c| !c.is_empty())
}

/// Signaling payloads must carry something: `null`, `false`, zero, and
/// empty strings, arrays or objects count as missing.
fn payload(value: Option<Value>) -> Option<Value> {
    value.filter(|v| match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    })
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use serde_json::json;
    use tokio::sync::mpsc;

    use super::*;
    use crate::auth::{IdentityVerifier, JwtAuthority};
    use crate::directory::InMemoryDirectory;
    use crate::domain::{ConnectionHandle, NewUser, User};
    use crate::service::session::SessionManager;

    struct Fixture {
        router: EventRouter,
        sessions: SessionManager,
        directory: Arc<InMemoryDirectory>,
        registry: Arc<ConnectionRegistry>,
        auth: JwtAuthority,
    }

    fn fixture() -> Fixture {
        let registry = Arc::new(ConnectionRegistry::new());
        let directory = Arc::new(InMemoryDirectory::new());
        let auth = JwtAuthority::new(b"router-secret", 1);
        let dir = Arc::clone(&directory) as Arc<dyn Directory>;
        let messages = MessageService::new(Arc::clone(&dir), Arc::clone(&registry));
        let router = EventRouter::new(Arc::clone(&registry), Arc::clone(&dir), messages);
        let sessions = SessionManager::new(
            Arc::clone(&registry),
            dir,
            Arc::new(auth.clone()) as Arc<dyn IdentityVerifier>,
        );
        Fixture {
            router,
            sessions,
            directory,
            registry,
            auth,
        }
    }

    async fn user(fx: &Fixture, name: &str) -> User {
        let Ok(user) = fx
            .directory
            .create_user(NewUser {
                username: name.to_string(),
                email: format!("{name}@example.com"),
                password_hash: String::new(),
            })
            .await
        else {
            panic!("create {name}");
        };
        user
    }

    async fn connect(fx: &Fixture, user: &User) -> (Session, mpsc::Receiver<OutboundEvent>) {
        let (handle, rx) = ConnectionHandle::channel(16);
        let mut session = Session::new(handle);
        let Ok(token) = fx.auth.issue(&user.id) else {
            panic!("issue failed");
        };
        let Ok(_) = fx.sessions.connect(&mut session, Some(token.as_str())).await else {
            panic!("connect failed");
        };
        (session, rx)
    }

    fn drain(rx: &mut mpsc::Receiver<OutboundEvent>) {
        while rx.try_recv().is_ok() {}
    }

    #[tokio::test]
    async fn send_message_reaches_online_receiver_once() {
        let fx = fixture();
        let alice = user(&fx, "alice").await;
        let bob = user(&fx, "bob").await;
        let (alice_session, mut alice_rx) = connect(&fx, &alice).await;
        let (_bob_session, mut bob_rx) = connect(&fx, &bob).await;
        drain(&mut alice_rx);

        let before = chrono::Utc::now();
        let outcome = fx
            .router
            .dispatch(
                &alice_session,
                InboundEvent::SendMessage {
                    receiver_id: Some(bob.id.clone()),
                    content: Some("hello bob".to_string()),
                },
            )
            .await;
        assert_eq!(outcome, RouteOutcome::Delivered);

        let Some(OutboundEvent::NewMessage { message, sender }) = bob_rx.recv().await else {
            panic!("expected new_message");
        };
        assert_eq!(message.content, "hello bob");
        assert_eq!(message.sender_id, alice.id);
        assert_eq!(sender.username, "alice");
        assert!(message.timestamp >= before);
        assert!(bob_rx.try_recv().is_err());
        // Never echoed to the sender.
        assert!(alice_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn send_message_to_offline_receiver_is_persisted_only() {
        let fx = fixture();
        let alice = user(&fx, "alice").await;
        let bob = user(&fx, "bob").await;
        let (alice_session, _alice_rx) = connect(&fx, &alice).await;

        let outcome = fx
            .router
            .dispatch(
                &alice_session,
                InboundEvent::SendMessage {
                    receiver_id: Some(bob.id.clone()),
                    content: Some("are you there?".to_string()),
                },
            )
            .await;
        assert_eq!(outcome, RouteOutcome::RoutingMiss);

        let Ok(history) = fx.directory.find_messages(&alice.id, &bob.id).await else {
            panic!("history failed");
        };
        assert_eq!(history.len(), 1);

        // Coming online later does not replay the message.
        let (_bob_session, mut bob_rx) = connect(&fx, &bob).await;
        assert!(bob_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn same_pair_messages_arrive_in_order() {
        let fx = fixture();
        let alice = user(&fx, "alice").await;
        let bob = user(&fx, "bob").await;
        let (alice_session, _alice_rx) = connect(&fx, &alice).await;
        let (_bob_session, mut bob_rx) = connect(&fx, &bob).await;

        for text in ["m1", "m2", "m3"] {
            let outcome = fx
                .router
                .dispatch(
                    &alice_session,
                    InboundEvent::SendMessage {
                        receiver_id: Some(bob.id.clone()),
                        content: Some(text.to_string()),
                    },
                )
                .await;
            assert_eq!(outcome, RouteOutcome::Delivered);
        }

        let mut received = Vec::new();
        while let Ok(OutboundEvent::NewMessage { message, .. }) = bob_rx.try_recv() {
            received.push(message.content);
        }
        assert_eq!(received, vec!["m1", "m2", "m3"]);
    }

    #[tokio::test]
    async fn signaling_events_are_forwarded_opaquely() {
        let fx = fixture();
        let alice = user(&fx, "alice").await;
        let bob = user(&fx, "bob").await;
        let (alice_session, mut alice_rx) = connect(&fx, &alice).await;
        let (bob_session, mut bob_rx) = connect(&fx, &bob).await;
        drain(&mut alice_rx);

        let offer = json!({"type": "offer", "sdp": "v=0 whatever"});
        let outcome = fx
            .router
            .dispatch(
                &alice_session,
                InboundEvent::CallOffer {
                    receiver_id: Some(bob.id.clone()),
                    offer: Some(offer.clone()),
                },
            )
            .await;
        assert_eq!(outcome, RouteOutcome::Delivered);
        let Some(OutboundEvent::IncomingCall { caller, offer: got }) = bob_rx.recv().await else {
            panic!("expected incoming_call");
        };
        assert_eq!(caller.id, alice.id);
        assert_eq!(got, offer);

        let answer = json!({"type": "answer", "sdp": "v=0 reply"});
        let outcome = fx
            .router
            .dispatch(
                &bob_session,
                InboundEvent::CallAnswer {
                    caller_id: Some(alice.id.clone()),
                    answer: Some(answer.clone()),
                },
            )
            .await;
        assert_eq!(outcome, RouteOutcome::Delivered);
        assert_eq!(
            alice_rx.recv().await,
            Some(OutboundEvent::CallAccepted { answer })
        );

        let candidate = json!({"candidate": "candidate:1 1 udp 2122260223 10.0.0.1 5000 typ host"});
        fx.router
            .dispatch(
                &bob_session,
                InboundEvent::IceCandidate {
                    other_user_id: Some(alice.id.clone()),
                    candidate: Some(candidate.clone()),
                },
            )
            .await;
        assert_eq!(
            alice_rx.recv().await,
            Some(OutboundEvent::IceCandidate { candidate })
        );

        fx.router
            .dispatch(
                &alice_session,
                InboundEvent::CallEnd {
                    other_user_id: Some(bob.id.clone()),
                },
            )
            .await;
        assert_eq!(bob_rx.recv().await, Some(OutboundEvent::CallEnded {}));

        fx.router
            .dispatch(
                &bob_session,
                InboundEvent::CallReject {
                    caller_id: Some(alice.id.clone()),
                },
            )
            .await;
        assert_eq!(alice_rx.recv().await, Some(OutboundEvent::CallRejected {}));
    }

    #[tokio::test]
    async fn signaling_to_offline_user_is_routing_miss() {
        let fx = fixture();
        let alice = user(&fx, "alice").await;
        let (alice_session, _rx) = connect(&fx, &alice).await;

        let outcome = fx
            .router
            .dispatch(
                &alice_session,
                InboundEvent::CallEnd {
                    other_user_id: Some(UserId::new("nobody")),
                },
            )
            .await;
        assert_eq!(outcome, RouteOutcome::RoutingMiss);
    }

    #[tokio::test]
    async fn missing_fields_are_dropped() {
        let fx = fixture();
        let alice = user(&fx, "alice").await;
        let bob = user(&fx, "bob").await;
        let (alice_session, _alice_rx) = connect(&fx, &alice).await;
        let (_bob_session, mut bob_rx) = connect(&fx, &bob).await;

        let cases = [
            InboundEvent::SendMessage {
                receiver_id: Some(bob.id.clone()),
                content: Some(String::new()),
            },
            InboundEvent::SendMessage {
                receiver_id: None,
                content: Some("hi".to_string()),
            },
            InboundEvent::CallOffer {
                receiver_id: Some(bob.id.clone()),
                offer: Some(Value::Null),
            },
            InboundEvent::IceCandidate {
                other_user_id: Some(UserId::new("")),
                candidate: Some(json!({"c": 1})),
            },
        ];
        for event in cases {
            assert_eq!(
                fx.router.dispatch(&alice_session, event).await,
                RouteOutcome::Dropped(DropReason::MissingFields)
            );
        }
        assert!(bob_rx.try_recv().is_err());
        assert_eq!(fx.directory.message_count().await, 0);
    }

    #[tokio::test]
    async fn empty_signaling_payloads_are_dropped() {
        let fx = fixture();
        let alice = user(&fx, "alice").await;
        let bob = user(&fx, "bob").await;
        let (alice_session, _alice_rx) = connect(&fx, &alice).await;
        let (_bob_session, mut bob_rx) = connect(&fx, &bob).await;

        for offer in [json!({}), json!([]), json!(false), json!(0), json!(0.0), json!("")] {
            let event = InboundEvent::CallOffer {
                receiver_id: Some(bob.id.clone()),
                offer: Some(offer.clone()),
            };
            assert_eq!(
                fx.router.dispatch(&alice_session, event).await,
                RouteOutcome::Dropped(DropReason::MissingFields),
                "offer {offer} should be dropped"
            );
        }
        assert!(bob_rx.try_recv().is_err());

        let event = InboundEvent::CallOffer {
            receiver_id: Some(bob.id.clone()),
            offer: Some(json!(true)),
        };
        assert_eq!(
            fx.router.dispatch(&alice_session, event).await,
            RouteOutcome::Delivered
        );
    }

    #[tokio::test]
    async fn unregistered_sessions_are_ignored() {
        let fx = fixture();
        let alice = user(&fx, "alice").await;
        let bob = user(&fx, "bob").await;
        let (_bob_session, mut bob_rx) = connect(&fx, &bob).await;

        let (handle, _rx) = ConnectionHandle::channel(4);
        let anonymous = Session::new(handle);
        let event = InboundEvent::CallEnd {
            other_user_id: Some(bob.id.clone()),
        };
        assert_eq!(
            fx.router.dispatch(&anonymous, event.clone()).await,
            RouteOutcome::Dropped(DropReason::NotRegistered)
        );

        // A terminated session is absorbing.
        let (mut alice_session, _alice_rx) = connect(&fx, &alice).await;
        let _ = bob_rx.recv().await;
        fx.sessions.disconnect(&mut alice_session).await;
        let _ = bob_rx.recv().await;
        assert_eq!(
            fx.router.dispatch(&alice_session, event).await,
            RouteOutcome::Dropped(DropReason::NotRegistered)
        );
        assert!(bob_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn superseded_connection_cannot_send() {
        let fx = fixture();
        let alice = user(&fx, "alice").await;
        let bob = user(&fx, "bob").await;
        let (_bob_session, mut bob_rx) = connect(&fx, &bob).await;
        let (stale, _stale_rx) = connect(&fx, &alice).await;
        let (_fresh, _fresh_rx) = connect(&fx, &alice).await;
        drain(&mut bob_rx);
        assert_eq!(fx.registry.len(), 2);

        let outcome = fx
            .router
            .dispatch(
                &stale,
                InboundEvent::CallEnd {
                    other_user_id: Some(bob.id.clone()),
                },
            )
            .await;
        assert_eq!(outcome, RouteOutcome::Dropped(DropReason::NotRegistered));
    }

    #[tokio::test]
    async fn send_to_unknown_receiver_is_rejected_silently() {
        let fx = fixture();
        let alice = user(&fx, "alice").await;
        let (alice_session, mut alice_rx) = connect(&fx, &alice).await;

        let outcome = fx
            .router
            .dispatch(
                &alice_session,
                InboundEvent::SendMessage {
                    receiver_id: Some(UserId::new("ghost")),
                    content: Some("boo".to_string()),
                },
            )
            .await;
        assert_eq!(outcome, RouteOutcome::Dropped(DropReason::Rejected));
        assert!(alice_rx.try_recv().is_err());
    }
}
