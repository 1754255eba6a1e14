use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use super::MemoryStore;
use crate::domain::{Message, MessageRepository};
use crate::shared::error::StorageError;

/// Messages live inside their chat record and go away with it.
#[derive(Clone)]
pub struct MemoryMessageRepository {
    store: Arc<MemoryStore>,
}

impl MemoryMessageRepository {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl MessageRepository for MemoryMessageRepository {
    async fn add(&self, message: &Message) -> Result<(), StorageError> {
        let mut state = self.store.state.write();
        let record = state.chats.get_mut(&message.chat_oid).ok_or_else(|| {
            StorageError::Internal(format!("chat {} does not exist", message.chat_oid))
        })?;
        record.messages.push(message.clone());
        Ok(())
    }

    async fn get_by_oid(&self, oid: Uuid) -> Result<Option<Message>, StorageError> {
        let state = self.store.state.read();
        Ok(state
            .chats
            .values()
            .flat_map(|record| record.messages.iter())
            .find(|message| message.oid == oid)
            .cloned())
    }

    async fn list_by_chat(&self, chat_oid: Uuid) -> Result<Vec<Message>, StorageError> {
        let state = self.store.state.read();
        Ok(state
            .chats
            .get(&chat_oid)
            .map(|record| record.messages.clone())
            .unwrap_or_default())
    }
}
