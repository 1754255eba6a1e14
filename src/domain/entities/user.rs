//! User entity, credentials and repository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::{Phone, Username};
use crate::shared::error::StorageError;

/// Login credentials, owned by exactly one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub phone: Phone,

    /// Argon2 PHC string
    #[serde(skip_serializing)]
    pub password_hash: String,
}

/// A registered account.
///
/// Identity is the `oid`: two values with the same `oid` are the same user
/// regardless of any other field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub oid: Uuid,
    pub username: Username,
    pub credentials: Credentials,
    pub is_confirmed: bool,
    pub is_blocked: bool,
    pub is_moderator: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// A freshly signed-up, unconfirmed user.
    pub fn new(username: Username, credentials: Credentials) -> Self {
        Self {
            oid: Uuid::new_v4(),
            username,
            credentials,
            is_confirmed: false,
            is_blocked: false,
            is_moderator: false,
            created_at: Utc::now(),
        }
    }

    pub fn phone(&self) -> &Phone {
        &self.credentials.phone
    }

    pub fn confirm(&mut self) {
        self.is_confirmed = true;
    }

    /// Soft delete: the account is kept, flagged as blocked.
    pub fn block(&mut self) {
        self.is_blocked = true;
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.oid == other.oid
    }
}

impl Eq for User {}

impl std::hash::Hash for User {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.oid.hash(state);
    }
}

/// Repository trait for User data access.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Persist a new user. Fails with `StorageError::Conflict` when the phone
    /// is already registered.
    async fn add(&self, user: &User) -> Result<(), StorageError>;

    async fn get_by_oid(&self, oid: Uuid) -> Result<Option<User>, StorageError>;

    async fn get_by_phone(&self, phone: &Phone) -> Result<Option<User>, StorageError>;

    /// First `limit` users in registration order.
    async fn list(&self, limit: usize) -> Result<Vec<User>, StorageError>;

    async fn mark_confirmed(&self, oid: Uuid) -> Result<(), StorageError>;

    /// Set `is_blocked`. Returns whether a user with that oid exists.
    async fn soft_delete(&self, oid: Uuid) -> Result<bool, StorageError>;
}
