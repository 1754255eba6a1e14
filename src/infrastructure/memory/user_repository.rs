use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use super::MemoryStore;
use crate::domain::{Phone, User, UserRepository};
use crate::shared::error::StorageError;

#[derive(Clone)]
pub struct MemoryUserRepository {
    store: Arc<MemoryStore>,
}

impl MemoryUserRepository {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn add(&self, user: &User) -> Result<(), StorageError> {
        let mut state = self.store.state.write();
        if state.users.iter().any(|existing| existing.phone() == user.phone()) {
            return Err(StorageError::Conflict(format!("phone {} already registered", user.phone())));
        }
        state.users.push(user.clone());
        Ok(())
    }

    async fn get_by_oid(&self, oid: Uuid) -> Result<Option<User>, StorageError> {
        let state = self.store.state.read();
        Ok(state.users.iter().find(|user| user.oid == oid).cloned())
    }

    async fn get_by_phone(&self, phone: &Phone) -> Result<Option<User>, StorageError> {
        let state = self.store.state.read();
        Ok(state.users.iter().find(|user| user.phone() == phone).cloned())
    }

    async fn list(&self, limit: usize) -> Result<Vec<User>, StorageError> {
        let state = self.store.state.read();
        Ok(state.users.iter().take(limit).cloned().collect())
    }

    async fn mark_confirmed(&self, oid: Uuid) -> Result<(), StorageError> {
        let mut state = self.store.state.write();
        if let Some(user) = state.users.iter_mut().find(|user| user.oid == oid) {
            user.confirm();
        }
        Ok(())
    }

    async fn soft_delete(&self, oid: Uuid) -> Result<bool, StorageError> {
        let mut state = self.store.state.write();
        match state.users.iter_mut().find(|user| user.oid == oid) {
            Some(user) => {
                user.block();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
