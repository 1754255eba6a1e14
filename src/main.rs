//! # Chat Backend
//!
//! Entry point that initializes:
//! - Tracing/logging subsystem
//! - Configuration loading
//! - Storage and confirmation-code cache backends
//! - HTTP/WebSocket server

use anyhow::Result;
use tracing::info;

use chat_backend::config::Settings;
use chat_backend::startup::Application;

#[tokio::main]
async fn main() -> Result<()> {
    chat_backend::telemetry::init_tracing();

    info!("Starting chat backend...");

    // Load configuration from environment and config files
    let settings = Settings::load()?;
    info!(
        host = %settings.server.host,
        port = %settings.server.port,
        environment = %settings.environment,
        storage = ?settings.storage.backend,
        cache = ?settings.cache.backend,
        "Configuration loaded"
    );

    let application = Application::build(settings).await?;

    info!("Server ready to accept connections");
    application.run_until_stopped().await?;

    Ok(())
}
