//! Application Startup
//!
//! Builds the backends selected in settings, wires the mediator and serves
//! the router.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use redis::aio::ConnectionManager;
use sqlx::PgPool;
use tokio::net::TcpListener;

use crate::application::container::{build_mediator, Dependencies, HandlerOptions};
use crate::application::services::{AuthService, CodeSender, ConfirmationCodeCache, JwtKeys};
use crate::application::Mediator;
use crate::config::{CacheBackend, Settings, StorageBackend};
use crate::domain::{ChatRepository, MessageRepository, UserRepository};
use crate::infrastructure::cache::{self, MemoryCodeCache, RedisCodeCache};
use crate::infrastructure::database;
use crate::infrastructure::memory::{
    MemoryChatRepository, MemoryMessageRepository, MemoryStore, MemoryUserRepository,
};
use crate::infrastructure::repositories::{PgChatRepository, PgMessageRepository, PgUserRepository};
use crate::infrastructure::sender::LogCodeSender;
use crate::presentation::http::{handlers, routes};
use crate::presentation::middleware::{create_cors_layer, create_trace_layer};
use crate::presentation::websocket::ConnectionRegistry;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub mediator: Arc<Mediator>,
    pub registry: Arc<ConnectionRegistry>,
    pub settings: Arc<Settings>,
    /// Present with the postgres backend
    pub db: Option<PgPool>,
    /// Present with the redis cache backend
    pub redis: Option<ConnectionManager>,
}

struct Repositories {
    users: Arc<dyn UserRepository>,
    chats: Arc<dyn ChatRepository>,
    messages: Arc<dyn MessageRepository>,
    db: Option<PgPool>,
}

async fn build_repositories(settings: &Settings) -> Result<Repositories> {
    match (settings.storage.backend, &settings.database) {
        (StorageBackend::Postgres, Some(db_settings)) => {
            let pool = database::create_pool(db_settings)
                .await
                .context("Failed to create database pool")?;
            database::run_migrations(&pool)
                .await
                .context("Failed to run migrations")?;
            tracing::info!("Database connection pool created");

            Ok(Repositories {
                users: Arc::new(PgUserRepository::new(pool.clone())),
                chats: Arc::new(PgChatRepository::new(pool.clone())),
                messages: Arc::new(PgMessageRepository::new(pool.clone())),
                db: Some(pool),
            })
        }
        (StorageBackend::Postgres, None) => anyhow::bail!("postgres storage requires a [database] section"),
        (StorageBackend::Memory, _) => {
            let store = Arc::new(MemoryStore::new());
            tracing::info!("Using in-memory storage");

            Ok(Repositories {
                users: Arc::new(MemoryUserRepository::new(store.clone())),
                chats: Arc::new(MemoryChatRepository::new(store.clone())),
                messages: Arc::new(MemoryMessageRepository::new(store)),
                db: None,
            })
        }
    }
}

async fn build_code_cache(
    settings: &Settings,
) -> Result<(Arc<dyn ConfirmationCodeCache>, Option<ConnectionManager>)> {
    match (settings.cache.backend, &settings.redis) {
        (CacheBackend::Redis, Some(redis_settings)) => {
            let conn = cache::create_redis_client(redis_settings)
                .await
                .context("Failed to connect to Redis")?;
            Ok((Arc::new(RedisCodeCache::new(conn.clone())), Some(conn)))
        }
        (CacheBackend::Redis, None) => anyhow::bail!("redis cache requires a [redis] section"),
        (CacheBackend::Memory, _) => Ok((Arc::new(MemoryCodeCache::new()), None)),
    }
}

/// Build the shared state: backends, auth service and mediator.
pub async fn build_state(settings: Settings, code_sender: Arc<dyn CodeSender>) -> Result<AppState> {
    let repositories = build_repositories(&settings).await?;
    let (code_cache, redis) = build_code_cache(&settings).await?;

    let keys = JwtKeys::from_settings(&settings.jwt).context("Failed to load JWT keys")?;
    let auth = Arc::new(AuthService::new(
        keys,
        settings.jwt.access_token_expiry_minutes,
        Duration::from_secs(settings.cache.confirmation_code_ttl_secs),
        code_cache,
    ));

    let deps = Dependencies {
        users: repositories.users,
        chats: repositories.chats,
        messages: repositories.messages,
        auth,
        code_sender,
    };

    let mut state = state_from_dependencies(settings, &deps)?;
    state.db = repositories.db;
    state.redis = redis;
    Ok(state)
}

/// Wire the mediator over already-built collaborators.
pub fn state_from_dependencies(settings: Settings, deps: &Dependencies) -> Result<AppState> {
    let options = HandlerOptions {
        max_members: settings.chat.max_members,
        users_page_size: settings.chat.users_page_size,
        purge_memberships_on_block: settings.moderation.purge_memberships_on_block,
    };
    let mediator = build_mediator(deps, options)?;

    Ok(AppState {
        mediator: Arc::new(mediator),
        registry: Arc::new(ConnectionRegistry::new()),
        settings: Arc::new(settings),
        db: None,
        redis: None,
    })
}

/// Router with every route and middleware layer applied
pub fn build_router(state: AppState) -> Router {
    let cors = create_cors_layer(&state.settings.cors);

    routes::create_router(state)
        .layer(create_trace_layer())
        .layer(cors)
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        handlers::health::init_server_start();

        let addr: SocketAddr = settings
            .server_addr()
            .parse()
            .with_context(|| format!("Invalid server address {}", settings.server_addr()))?;

        let state = build_state(settings, Arc::new(LogCodeSender)).await?;
        let router = build_router(state);

        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Listening on {}", addr);

        Ok(Self { listener, router })
    }

    /// Run the server until stopped
    pub async fn run_until_stopped(self) -> Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }

    /// Get the bound address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
