//! Message service: persist-then-deliver for direct messages.
//!
//! Shared by the REST `POST /api/messages` endpoint and the realtime
//! `send_message` event so both paths store first and only then attempt
//! delivery.

use std::sync::Arc;

use super::router::RouteOutcome;
use crate::directory::Directory;
use crate::domain::{ConnectionRegistry, Message, OutboundEvent, Room, UserId, UserProfile};
use crate::error::RelayError;

/// Result of a successful send.
#[derive(Debug, Clone)]
pub struct SendReceipt {
    /// The stored message.
    pub message: Message,
    /// What happened to the live delivery attempt.
    pub outcome: RouteOutcome,
}

/// Stores messages in the directory and pushes them to online receivers.
#[derive(Debug, Clone)]
pub struct MessageService {
    directory: Arc<dyn Directory>,
    registry: Arc<ConnectionRegistry>,
}

impl MessageService {
    /// Creates a new `MessageService`.
    #[must_use]
    pub fn new(directory: Arc<dyn Directory>, registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            directory,
            registry,
        }
    }

    /// Stores a message from `sender` to `receiver_id`, then delivers
    /// `new_message` to the receiver's room if it is occupied.
    ///
    /// An offline receiver is not an error: the message stays retrievable
    /// through [`MessageService::history`].
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::ReceiverNotFound`] if the receiver does not
    /// exist, or a persistence error; no delivery is attempted in either case.
    pub async fn send(
        &self,
        sender: &UserProfile,
        receiver_id: &UserId,
        content: &str,
        message_type: &str,
    ) -> Result<SendReceipt, RelayError> {
        let message = self
            .directory
            .create_message(&sender.id, receiver_id, content, message_type)
            .await?;

        let event = OutboundEvent::NewMessage {
            message: message.clone(),
            sender: sender.clone(),
        };
        let outcome =
            RouteOutcome::from(self.registry.deliver_to_room(&Room::for_user(receiver_id), event));

        tracing::debug!(
            message_id = %message.id,
            sender_id = %sender.id,
            %receiver_id,
            ?outcome,
            "message stored"
        );
        Ok(SendReceipt { message, outcome })
    }

    /// Returns the conversation between `a` and `b`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the directory fails.
    pub async fn history(&self, a: &UserId, b: &UserId) -> Result<Vec<Message>, RelayError> {
        self.directory.find_messages(a, b).await
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::directory::InMemoryDirectory;
    use crate::domain::{ConnectionHandle, DEFAULT_MESSAGE_TYPE, NewUser, User};

    async fn setup() -> (MessageService, Arc<InMemoryDirectory>, Arc<ConnectionRegistry>, User, User) {
        let directory = Arc::new(InMemoryDirectory::new());
        let registry = Arc::new(ConnectionRegistry::new());
        let mut users = Vec::new();
        for name in ["alice", "bob"] {
            let Ok(user) = directory
                .create_user(NewUser {
                    username: name.to_string(),
                    email: format!("{name}@example.com"),
                    password_hash: String::new(),
                })
                .await
            else {
                panic!("create user");
            };
            users.push(user);
        }
        let (Some(bob), Some(alice)) = (users.pop(), users.pop()) else {
            panic!("missing users");
        };
        let dir: Arc<dyn Directory> = Arc::clone(&directory) as Arc<dyn Directory>;
        let service = MessageService::new(dir, Arc::clone(&registry));
        (service, directory, registry, alice, bob)
    }

    #[tokio::test]
    async fn online_receiver_gets_new_message() {
        let (service, _, registry, alice, bob) = setup().await;
        let (conn, mut rx) = ConnectionHandle::channel(4);
        registry.register(bob.id.clone(), conn);

        let Ok(receipt) = service
            .send(&alice.profile(), &bob.id, "hello", DEFAULT_MESSAGE_TYPE)
            .await
        else {
            panic!("send failed");
        };
        assert_eq!(receipt.outcome, RouteOutcome::Delivered);

        let Some(OutboundEvent::NewMessage { message, sender }) = rx.recv().await else {
            panic!("expected new_message");
        };
        assert_eq!(message, receipt.message);
        assert_eq!(sender.id, alice.id);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn offline_receiver_still_persists() {
        let (service, directory, _, alice, bob) = setup().await;
        let Ok(receipt) = service
            .send(&alice.profile(), &bob.id, "later", DEFAULT_MESSAGE_TYPE)
            .await
        else {
            panic!("send failed");
        };
        assert_eq!(receipt.outcome, RouteOutcome::RoutingMiss);
        assert_eq!(directory.message_count().await, 1);

        let Ok(history) = service.history(&bob.id, &alice.id).await else {
            panic!("history failed");
        };
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn unknown_receiver_fails_without_side_effects() {
        let (service, directory, _, alice, _) = setup().await;
        let result = service
            .send(&alice.profile(), &UserId::new("ghost"), "hi", DEFAULT_MESSAGE_TYPE)
            .await;
        assert!(matches!(result, Err(RelayError::ReceiverNotFound(_))));
        assert_eq!(directory.message_count().await, 0);
    }
}
