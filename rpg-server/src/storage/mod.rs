//! Storage Layer - SQLite persistence for the RPG demo
//!
//! Everything mutable lives in one SQLite database: accounts, player
//! progression and dialogue scripts.
//!
//! ## Usage
//! ```rust,ignore
//! // Initialize storage (connects + migrates + seeds scripts)
//! let store = init_storage("sqlite://rpg_dev.db?mode=rwc", 5, true).await?;
//!
//! // Use directly
//! let player = store.fetch_player("P1").await?;
//! let script = store.fetch_event_lines(1).await?;
//! ```

pub mod migrations;
pub mod seed_data;
pub mod sqlite;

use tracing::info;

use self::sqlite::{SqliteStore, StoreError};

/// Initialize the complete storage layer
///
/// Connects to SQLite, applies migrations, and optionally seeds the
/// starter dialogue scripts.
pub async fn init_storage(
    database_url: &str,
    max_connections: u32,
    seed: bool,
) -> Result<SqliteStore, StoreError> {
    let store = SqliteStore::new(database_url, max_connections).await?;

    if seed {
        seed_data::seed_all(&store).await?;
    }

    info!("Storage initialized");
    Ok(store)
}
