//! PostgreSQL implementation of the directory.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use super::{Directory, HISTORY_LIMIT};
use crate::config::RelayConfig;
use crate::domain::{Message, NewUser, User, UserId};
use crate::error::RelayError;

type UserRow = (String, String, String, String, DateTime<Utc>, bool);
type MessageRow = (Uuid, String, String, String, DateTime<Utc>, String);

const USER_COLUMNS: &str = "id, username, email, password_hash, created_at, is_online";

/// PostgreSQL-backed directory using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresDirectory {
    pool: PgPool,
}

impl PostgresDirectory {
    /// Creates a directory over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool from `config` and applies pending migrations.
    ///
    /// # Errors
    ///
    /// Returns a [`RelayError::Persistence`] if the database is unreachable
    /// or a migration fails.
    pub async fn connect(config: &RelayConfig) -> Result<Self, RelayError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| RelayError::Persistence(e.to_string()))?;

        tracing::info!("directory connected to postgres");
        Ok(Self::new(pool))
    }
}

fn user_from_row((id, username, email, password_hash, created_at, is_online): UserRow) -> User {
    User {
        id: UserId::from(id),
        username,
        email,
        password_hash,
        created_at,
        is_online,
    }
}

fn message_from_row(
    (id, sender_id, receiver_id, content, timestamp, message_type): MessageRow,
) -> Message {
    Message {
        id,
        sender_id: UserId::from(sender_id),
        receiver_id: UserId::from(receiver_id),
        content,
        timestamp,
        message_type,
    }
}

#[async_trait]
impl Directory for PostgresDirectory {
    async fn create_user(&self, new_user: NewUser) -> Result<User, RelayError> {
        let user = User::from_new(new_user);
        let result = sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, created_at, is_online) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(user.id.as_str())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .bind(user.is_online)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(user),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(RelayError::Conflict),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_user(&self, user_id: &UserId) -> Result<Option<User>, RelayError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(user_from_row))
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, RelayError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(user_from_row))
    }

    async fn list_users_except(&self, user_id: &UserId) -> Result<Vec<User>, RelayError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id <> $1 ORDER BY created_at ASC"
        ))
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(user_from_row).collect())
    }

    async fn set_online(&self, user_id: &UserId, online: bool) -> Result<(), RelayError> {
        sqlx::query("UPDATE users SET is_online = $2 WHERE id = $1")
            .bind(user_id.as_str())
            .bind(online)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn create_message(
        &self,
        sender: &UserId,
        receiver: &UserId,
        content: &str,
        message_type: &str,
    ) -> Result<Message, RelayError> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
            .bind(receiver.as_str())
            .fetch_one(&self.pool)
            .await?;
        if !exists {
            return Err(RelayError::ReceiverNotFound(receiver.clone()));
        }

        let message = Message::new(sender.clone(), receiver.clone(), content, message_type);
        let inserted = sqlx::query(
            "INSERT INTO messages (id, sender_id, receiver_id, content, message_type, timestamp) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(message.id)
        .bind(message.sender_id.as_str())
        .bind(message.receiver_id.as_str())
        .bind(&message.content)
        .bind(&message.message_type)
        .bind(message.timestamp)
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(_) => Ok(message),
            // Receiver deleted between the check and the insert.
            Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
                Err(RelayError::ReceiverNotFound(receiver.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_messages(&self, a: &UserId, b: &UserId) -> Result<Vec<Message>, RelayError> {
        let limit = i64::try_from(HISTORY_LIMIT).unwrap_or(i64::MAX);
        let rows = sqlx::query_as::<_, MessageRow>(
            "SELECT id, sender_id, receiver_id, content, timestamp, message_type FROM messages \
             WHERE (sender_id = $1 AND receiver_id = $2) OR (sender_id = $2 AND receiver_id = $1) \
             ORDER BY timestamp ASC LIMIT $3",
        )
        .bind(a.as_str())
        .bind(b.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(message_from_row).collect())
    }
}
