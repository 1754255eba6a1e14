//! In-Memory Repositories
//!
//! A `MemoryStore` owned by the process and shared by the three repository
//! adapters. Each store instance is isolated, so tests build their own.
//!
//! Locks are never held across an await point.

mod chat_repository;
mod message_repository;
mod user_repository;

use std::collections::HashMap;

use parking_lot::RwLock;
use uuid::Uuid;

use crate::domain::{Chat, Message, User};

pub use chat_repository::MemoryChatRepository;
pub use message_repository::MemoryMessageRepository;
pub use user_repository::MemoryUserRepository;

/// A chat together with the messages it owns.
#[derive(Debug, Clone)]
struct ChatRecord {
    chat: Chat,
    messages: Vec<Message>,
}

#[derive(Debug, Default)]
struct StoreState {
    /// Registration order
    users: Vec<User>,
    chats: HashMap<Uuid, ChatRecord>,
}

/// Backing state for the in-memory repositories.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_count(&self) -> usize {
        self.state.read().users.len()
    }

    pub fn chat_count(&self) -> usize {
        self.state.read().chats.len()
    }
}
