//! Chat entity and repository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::User;
use crate::domain::value_objects::Title;
use crate::shared::error::StorageError;

/// A conversation between members.
///
/// Members are referenced by oid; the users themselves live in the user
/// repository. Messages belong to the chat and are stored alongside it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub oid: Uuid,
    pub title: Title,
    pub created_at: DateTime<Utc>,
    members: Vec<Uuid>,
}

impl Chat {
    /// Create a chat with `creator` as its first member.
    pub fn create(title: Title, creator: &User) -> Self {
        Self {
            oid: Uuid::new_v4(),
            title,
            created_at: Utc::now(),
            members: vec![creator.oid],
        }
    }

    /// Rebuild a chat from stored parts.
    pub fn restore(oid: Uuid, title: Title, created_at: DateTime<Utc>, members: Vec<Uuid>) -> Self {
        Self {
            oid,
            title,
            created_at,
            members,
        }
    }

    /// Member oids in join order.
    pub fn members(&self) -> &[Uuid] {
        &self.members
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn has_member(&self, user_oid: Uuid) -> bool {
        self.members.contains(&user_oid)
    }

    /// Returns `false` if the user was already a member.
    pub fn add_member(&mut self, user_oid: Uuid) -> bool {
        if self.has_member(user_oid) {
            return false;
        }
        self.members.push(user_oid);
        true
    }

    pub fn remove_member(&mut self, user_oid: Uuid) -> bool {
        let before = self.members.len();
        self.members.retain(|oid| *oid != user_oid);
        self.members.len() != before
    }
}

impl PartialEq for Chat {
    fn eq(&self, other: &Self) -> bool {
        self.oid == other.oid
    }
}

impl Eq for Chat {}

/// Result of a bounded membership insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberAddition {
    Added,
    AlreadyMember,
    LimitReached,
    ChatMissing,
}

/// Repository trait for Chat data access.
#[async_trait]
pub trait ChatRepository: Send + Sync {
    async fn add(&self, chat: &Chat) -> Result<(), StorageError>;

    async fn get_by_oid(&self, oid: Uuid) -> Result<Option<Chat>, StorageError>;

    /// All chats the user is a member of.
    async fn list_by_member(&self, user_oid: Uuid) -> Result<Vec<Chat>, StorageError>;

    /// Add a member unless the chat already holds `limit` members. The check
    /// and the insert are atomic. Adding an existing member is a no-op.
    async fn add_member(
        &self,
        chat_oid: Uuid,
        user_oid: Uuid,
        limit: usize,
    ) -> Result<MemberAddition, StorageError>;

    /// Remove the user from every chat. Returns the number of chats touched.
    async fn remove_member_from_all(&self, user_oid: Uuid) -> Result<usize, StorageError>;

    /// Delete a chat together with its messages.
    async fn delete(&self, oid: Uuid) -> Result<bool, StorageError>;
}
