//! Confirmation Code Caches
//!
//! In-memory and Redis implementations of `ConfirmationCodeCache`.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{debug, instrument};

use super::keys;
use crate::application::services::ConfirmationCodeCache;
use crate::domain::Phone;
use crate::shared::error::StorageError;

/// Process-local code cache. Expired entries are dropped lazily on read.
#[derive(Default)]
pub struct MemoryCodeCache {
    entries: DashMap<String, (String, Instant)>,
}

impl MemoryCodeCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConfirmationCodeCache for MemoryCodeCache {
    async fn set_with_ttl(&self, phone: &Phone, code: &str, ttl: Duration) -> Result<(), StorageError> {
        self.entries
            .insert(phone.to_string(), (code.to_string(), Instant::now() + ttl));
        Ok(())
    }

    async fn get(&self, phone: &Phone) -> Result<Option<String>, StorageError> {
        let key = phone.as_str();
        self.entries
            .remove_if(key, |_, (_, expires_at)| Instant::now() >= *expires_at);
        Ok(self.entries.get(key).map(|entry| entry.0.clone()))
    }

    async fn delete(&self, phone: &Phone) -> Result<(), StorageError> {
        self.entries.remove(phone.as_str());
        Ok(())
    }
}

/// Redis-backed code cache using `SET key code EX ttl`.
#[derive(Clone)]
pub struct RedisCodeCache {
    conn: ConnectionManager,
}

impl RedisCodeCache {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl ConfirmationCodeCache for RedisCodeCache {
    #[instrument(skip(self, code))]
    async fn set_with_ttl(&self, phone: &Phone, code: &str, ttl: Duration) -> Result<(), StorageError> {
        let mut conn = self.conn.clone();
        // EX 0 is rejected by Redis
        let seconds = ttl.as_secs().max(1);
        let _: () = conn
            .set_ex(keys::confirmation_code(phone), code, seconds)
            .await?;
        debug!(seconds, "Confirmation code stored");
        Ok(())
    }

    async fn get(&self, phone: &Phone) -> Result<Option<String>, StorageError> {
        let mut conn = self.conn.clone();
        let code: Option<String> = conn.get(keys::confirmation_code(phone)).await?;
        Ok(code)
    }

    async fn delete(&self, phone: &Phone) -> Result<(), StorageError> {
        let mut conn = self.conn.clone();
        let _: u64 = conn.del(keys::confirmation_code(phone)).await?;
        Ok(())
    }
}
