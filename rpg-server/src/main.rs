use anyhow::Context;
use tracing::info;

use rpg_backend_server::{api, storage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    // ========================================================================
    // 1. Configuration from environment
    // ========================================================================
    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://rpg_dev.db?mode=rwc".to_string());
    let max_connections: u32 = std::env::var("DATABASE_MAX_CONNECTIONS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(5);
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:7070".to_string());
    let seed_on_startup: bool = std::env::var("SEED_ON_STARTUP")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(true);

    // ========================================================================
    // 2. Storage (connect, migrate, seed dialogue scripts)
    // ========================================================================
    info!("Connecting to SQLite: {}", database_url);
    let store = storage::init_storage(&database_url, max_connections, seed_on_startup)
        .await
        .context("Storage initialization failed")?;

    // ========================================================================
    // 3. HTTP API server (blocks until shutdown)
    // ========================================================================
    api::start_api_server(store, &bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!(e))
        .context("API server failed")?;

    Ok(())
}
