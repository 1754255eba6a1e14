//! Message Repository Implementation
//!
//! PostgreSQL implementation of the MessageRepository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{Message, MessageRepository, Text};
use crate::shared::error::StorageError;

#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    oid: Uuid,
    chat_oid: Uuid,
    sender_oid: Uuid,
    text: String,
    created_at: DateTime<Utc>,
}

impl MessageRow {
    fn try_into_message(self) -> Result<Message, StorageError> {
        let text = Text::new(self.text)
            .map_err(|e| StorageError::Internal(format!("corrupt message row {}: {}", self.oid, e)))?;

        Ok(Message {
            oid: self.oid,
            text,
            sender_oid: self.sender_oid,
            chat_oid: self.chat_oid,
            created_at: self.created_at,
        })
    }
}

/// PostgreSQL message repository implementation.
#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn add(&self, message: &Message) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO messages (oid, chat_oid, sender_oid, text, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(message.oid)
        .bind(message.chat_oid)
        .bind(message.sender_oid)
        .bind(message.text.as_str())
        .bind(message.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_by_oid(&self, oid: Uuid) -> Result<Option<Message>, StorageError> {
        let row = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT oid, chat_oid, sender_oid, text, created_at
            FROM messages
            WHERE oid = $1
            "#,
        )
        .bind(oid)
        .fetch_optional(&self.pool)
        .await?;

        row.map(MessageRow::try_into_message).transpose()
    }

    async fn list_by_chat(&self, chat_oid: Uuid) -> Result<Vec<Message>, StorageError> {
        let rows = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT oid, chat_oid, sender_oid, text, created_at
            FROM messages
            WHERE chat_oid = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(chat_oid)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(MessageRow::try_into_message).collect()
    }
}
