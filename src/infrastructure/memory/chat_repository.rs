use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use super::{ChatRecord, MemoryStore};
use crate::domain::{Chat, ChatRepository, MemberAddition};
use crate::shared::error::StorageError;

#[derive(Clone)]
pub struct MemoryChatRepository {
    store: Arc<MemoryStore>,
}

impl MemoryChatRepository {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ChatRepository for MemoryChatRepository {
    async fn add(&self, chat: &Chat) -> Result<(), StorageError> {
        self.store.state.write().chats.insert(
            chat.oid,
            ChatRecord {
                chat: chat.clone(),
                messages: Vec::new(),
            },
        );
        Ok(())
    }

    async fn get_by_oid(&self, oid: Uuid) -> Result<Option<Chat>, StorageError> {
        let state = self.store.state.read();
        Ok(state.chats.get(&oid).map(|record| record.chat.clone()))
    }

    async fn list_by_member(&self, user_oid: Uuid) -> Result<Vec<Chat>, StorageError> {
        let state = self.store.state.read();
        let mut chats: Vec<Chat> = state
            .chats
            .values()
            .filter(|record| record.chat.has_member(user_oid))
            .map(|record| record.chat.clone())
            .collect();
        chats.sort_by_key(|chat| chat.created_at);
        Ok(chats)
    }

    async fn add_member(
        &self,
        chat_oid: Uuid,
        user_oid: Uuid,
        limit: usize,
    ) -> Result<MemberAddition, StorageError> {
        let mut state = self.store.state.write();
        let Some(record) = state.chats.get_mut(&chat_oid) else {
            return Ok(MemberAddition::ChatMissing);
        };

        if record.chat.has_member(user_oid) {
            return Ok(MemberAddition::AlreadyMember);
        }
        if record.chat.member_count() >= limit {
            return Ok(MemberAddition::LimitReached);
        }
        record.chat.add_member(user_oid);
        Ok(MemberAddition::Added)
    }

    async fn remove_member_from_all(&self, user_oid: Uuid) -> Result<usize, StorageError> {
        let mut state = self.store.state.write();
        let touched = state
            .chats
            .values_mut()
            .filter(|record| record.chat.has_member(user_oid))
            .map(|record| record.chat.remove_member(user_oid))
            .filter(|removed| *removed)
            .count();
        Ok(touched)
    }

    async fn delete(&self, oid: Uuid) -> Result<bool, StorageError> {
        Ok(self.store.state.write().chats.remove(&oid).is_some())
    }
}
