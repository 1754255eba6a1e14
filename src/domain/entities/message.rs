//! Message entity and repository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::Text;
use crate::shared::error::StorageError;

/// A text message sent to a chat. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub oid: Uuid,
    pub text: Text,
    /// Author, lookup only
    pub sender_oid: Uuid,
    /// Owning chat
    pub chat_oid: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(text: Text, sender_oid: Uuid, chat_oid: Uuid) -> Self {
        Self {
            oid: Uuid::new_v4(),
            text,
            sender_oid,
            chat_oid,
            created_at: Utc::now(),
        }
    }
}

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.oid == other.oid
    }
}

impl Eq for Message {}

/// Repository trait for Message data access.
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Persist a message into its chat.
    async fn add(&self, message: &Message) -> Result<(), StorageError>;

    async fn get_by_oid(&self, oid: Uuid) -> Result<Option<Message>, StorageError>;

    /// Messages of a chat, oldest first. Unknown chats yield an empty list.
    async fn list_by_chat(&self, chat_oid: Uuid) -> Result<Vec<Message>, StorageError>;
}
