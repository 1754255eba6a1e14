//! Application settings and configuration structures.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Root configuration structure containing all application settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Server configuration (host, port)
    pub server: ServerSettings,

    /// Repository backend selection
    pub storage: StorageSettings,

    /// Database configuration (PostgreSQL), required for the postgres backend
    pub database: Option<DatabaseSettings>,

    /// Confirmation-code cache configuration
    pub cache: CacheSettings,

    /// Redis configuration, required for the redis cache backend
    pub redis: Option<RedisSettings>,

    /// JWT signing settings
    pub jwt: JwtSettings,

    /// Chat limits
    pub chat: ChatSettings,

    /// Moderator behaviour
    pub moderation: ModerationSettings,

    /// CORS configuration
    pub cors: CorsSettings,

    /// WebSocket configuration
    pub websocket: WebSocketSettings,

    /// Current environment (development, staging, production)
    pub environment: String,
}

/// Server binding configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to (e.g., "0.0.0.0")
    pub host: String,

    /// Port number to listen on
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    pub backend: StorageBackend,
}

/// PostgreSQL database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// Database connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections to maintain
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection acquire timeout in seconds
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout: u64,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_acquire_timeout() -> u64 {
    5
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Memory,
    Redis,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    pub backend: CacheBackend,

    /// Lifetime of a confirmation code in seconds
    pub confirmation_code_ttl_secs: u64,
}

/// Redis configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisSettings {
    /// Redis connection URL
    pub url: String,
}

/// JWT signing configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// PEM file with the signing key
    pub private_key_path: String,

    /// PEM file with the verification key
    pub public_key_path: String,

    /// Asymmetric algorithm name, e.g. "RS256"
    pub algorithm: String,

    /// Access token expiry in minutes
    pub access_token_expiry_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatSettings {
    /// Upper bound on members per chat
    pub max_members: usize,

    /// Default page size for user listings
    pub users_page_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModerationSettings {
    /// Also remove a deleted user from every chat
    pub purge_memberships_on_block: bool,
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CorsSettings {
    /// Allowed origins (comma-separated in env)
    pub allowed_origins: Vec<String>,
}

/// WebSocket configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebSocketSettings {
    /// Maximum message size in bytes (default: 64KB)
    pub max_message_size: usize,
}

impl Settings {
    /// Load settings from environment variables and configuration files.
    ///
    /// The loading order is:
    /// 1. config/default.toml (base configuration)
    /// 2. config/{RUN_ENV}.toml (environment-specific overrides)
    /// 3. Environment variables (highest priority)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or parsed, or
    /// if the selected backend has no connection section.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let environment = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into());

        Self::builder(&environment)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // APP__SERVER__PORT=3000 -> server.port = 3000
            .add_source(
                Environment::default()
                    .prefix("APP")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors.allowed_origins")
                    .try_parsing(true),
            )
            // Map simple environment variables
            .set_override_option("server.host", std::env::var("SERVER_HOST").ok())?
            .set_override_option("server.port", std::env::var("SERVER_PORT").ok())?
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("redis.url", std::env::var("REDIS_URL").ok())?
            .set_override_option(
                "jwt.private_key_path",
                std::env::var("JWT_PRIVATE_KEY_PATH").ok(),
            )?
            .set_override_option(
                "jwt.public_key_path",
                std::env::var("JWT_PUBLIC_KEY_PATH").ok(),
            )?
            .build()?
            .try_deserialize()
            .and_then(Self::validate)
    }

    /// Defaults for every section, without any external source.
    pub fn defaults() -> Result<Self, ConfigError> {
        Self::builder("test")?
            .build()?
            .try_deserialize()
            .and_then(Self::validate)
    }

    fn builder(
        environment: &str,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("environment", environment)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("storage.backend", "memory")?
            .set_default("cache.backend", "memory")?
            .set_default("cache.confirmation_code_ttl_secs", 300)?
            .set_default("jwt.private_key_path", "keys/jwt-private.pem")?
            .set_default("jwt.public_key_path", "keys/jwt-public.pem")?
            .set_default("jwt.algorithm", "RS256")?
            .set_default("jwt.access_token_expiry_minutes", 120)?
            .set_default("chat.max_members", 256)?
            .set_default("chat.users_page_size", 10)?
            .set_default("moderation.purge_memberships_on_block", false)?
            .set_default("cors.allowed_origins", vec!["http://localhost:3000"])?
            .set_default("websocket.max_message_size", 65536_i64)
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.storage.backend == StorageBackend::Postgres && self.database.is_none() {
            return Err(ConfigError::Message(
                "storage.backend = postgres requires a [database] section".into(),
            ));
        }
        if self.cache.backend == CacheBackend::Redis && self.redis.is_none() {
            return Err(ConfigError::Message(
                "cache.backend = redis requires a [redis] section".into(),
            ));
        }
        if self.chat.max_members == 0 {
            return Err(ConfigError::Message("chat.max_members must be positive".into()));
        }
        Ok(self)
    }

    /// Get the full server address as a string.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
