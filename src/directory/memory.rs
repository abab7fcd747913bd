//! In-process directory backed by `tokio::sync::RwLock`-protected maps.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Directory, HISTORY_LIMIT};
use crate::domain::{Message, NewUser, User, UserId};
use crate::error::RelayError;

/// Volatile [`Directory`] implementation.
///
/// Users live in a `RwLock<HashMap>` keyed by identity; messages in an
/// append-only `RwLock<Vec>` in creation order, which is also timestamp
/// order since timestamps are assigned under the write lock.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    users: RwLock<HashMap<UserId, User>>,
    messages: RwLock<Vec<Message>>,
}

impl InMemoryDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored messages.
    pub async fn message_count(&self) -> usize {
        self.messages.read().await.len()
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn create_user(&self, new_user: NewUser) -> Result<User, RelayError> {
        let mut users = self.users.write().await;
        let taken = users
            .values()
            .any(|u| u.username == new_user.username || u.email == new_user.email);
        if taken {
            return Err(RelayError::Conflict);
        }
        let user = User::from_new(new_user);
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn find_user(&self, user_id: &UserId) -> Result<Option<User>, RelayError> {
        Ok(self.users.read().await.get(user_id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, RelayError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn list_users_except(&self, user_id: &UserId) -> Result<Vec<User>, RelayError> {
        let users = self.users.read().await;
        let mut list: Vec<User> = users.values().filter(|u| &u.id != user_id).cloned().collect();
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(list)
    }

    async fn set_online(&self, user_id: &UserId, online: bool) -> Result<(), RelayError> {
        if let Some(user) = self.users.write().await.get_mut(user_id) {
            user.is_online = online;
        }
        Ok(())
    }

    async fn create_message(
        &self,
        sender: &UserId,
        receiver: &UserId,
        content: &str,
        message_type: &str,
    ) -> Result<Message, RelayError> {
        if !self.users.read().await.contains_key(receiver) {
            return Err(RelayError::ReceiverNotFound(receiver.clone()));
        }
        let mut messages = self.messages.write().await;
        let message = Message::new(sender.clone(), receiver.clone(), content, message_type);
        messages.push(message.clone());
        Ok(message)
    }

    async fn find_messages(&self, a: &UserId, b: &UserId) -> Result<Vec<Message>, RelayError> {
        let messages = self.messages.read().await;
        let mut conversation: Vec<Message> = messages
            .iter()
            .filter(|m| m.is_between(a, b))
            .take(HISTORY_LIMIT)
            .cloned()
            .collect();
        conversation.sort_by(|x, y| x.timestamp.cmp(&y.timestamp));
        Ok(conversation)
    }
}
