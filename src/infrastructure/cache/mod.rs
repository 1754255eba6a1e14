//! Cache Module
//!
//! Redis connection management and the confirmation-code caches.

mod code_cache;

pub use code_cache::{MemoryCodeCache, RedisCodeCache};

use redis::aio::ConnectionManager;
use redis::Client;
use tracing::{info, instrument};

use crate::config::RedisSettings;

/// Creates a Redis connection manager with automatic reconnection.
#[instrument(skip(settings), fields(url = %settings.url))]
pub async fn create_redis_client(
    settings: &RedisSettings,
) -> Result<ConnectionManager, redis::RedisError> {
    info!("Connecting to Redis...");
    let client = Client::open(settings.url.as_str())?;
    let manager = ConnectionManager::new(client).await?;
    info!("Redis connection established");
    Ok(manager)
}

/// Cache key prefixes.
pub mod keys {
    /// Prefix for pending confirmation codes (e.g., "confirmation_code:+79010000000")
    pub const CONFIRMATION_CODE: &str = "confirmation_code:";

    #[inline]
    pub fn confirmation_code(phone: impl std::fmt::Display) -> String {
        format!("{}{}", CONFIRMATION_CODE, phone)
    }
}
