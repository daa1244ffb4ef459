//! SQLite Storage - account, player and dialogue persistence
//!
//! All mutable state lives in SQLite. Uses `sqlx` for async queries.
//!
//! ## Tables
//! - user_account (credentials, display names)
//! - player_data (progression, one row per user)
//! - event_data (dialogue script lines, one row per event_id/seq)

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use tracing::{debug, info};

use rpg_core::{CharacterClass, DialogueLine, PlayerProgress};

use super::migrations;

/// SQLite connection pool wrapper
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Migration error: {0}")]
    Migration(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Duplicate user: {0}")]
    DuplicateUser(String),
    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

/// Partial player update. `None` fields leave their column untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlayerUpdate {
    pub char_id: Option<i64>,
    pub exp: Option<i64>,
    pub parameter1: Option<i64>,
    pub parameter2: Option<i64>,
    pub parameter3: Option<i64>,
    pub parameter4: Option<i64>,
    pub current_event_id: Option<i64>,
    pub current_seq: Option<i64>,
}

impl SqliteStore {
    /// Connect to SQLite and run migrations
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        info!("SQLite connected (max_connections={})", max_connections);

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    /// Wrap an existing pool (for testing / shared pools)
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run all pending migrations
    pub async fn run_migrations(&self) -> Result<(), StoreError> {
        // Create migrations tracking table
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS _migrations (
                name TEXT PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
        )
        .execute(&self.pool)
        .await?;

        for (name, sql) in migrations::get_migrations() {
            let applied: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM _migrations WHERE name = ?1)")
                    .bind(name)
                    .fetch_one(&self.pool)
                    .await?;

            if !applied {
                info!("Running migration: {}", name);
                sqlx::raw_sql(sql)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| StoreError::Migration(format!("{}: {}", name, e)))?;

                sqlx::query("INSERT INTO _migrations (name) VALUES (?1)")
                    .bind(name)
                    .execute(&self.pool)
                    .await?;

                info!("Migration applied: {}", name);
            } else {
                debug!("Migration already applied: {}", name);
            }
        }

        Ok(())
    }

    // ========================================================================
    // Account Operations
    // ========================================================================

    /// Create an account. The hash is the 48-byte salt+key blob.
    pub async fn create_account(
        &self,
        user_id: &str,
        user_name: &str,
        password_hash: &[u8],
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "INSERT INTO user_account (user_id, user_name, password_hash) VALUES (?1, ?2, ?3)",
        )
        .bind(user_id)
        .bind(user_name)
        .bind(password_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, user_id))?;

        info!("Created account: {}", user_id);
        Ok(result.rows_affected())
    }

    /// Look up an account's display name and credential blob
    pub async fn fetch_credential(&self, user_id: &str) -> Result<Option<AccountRow>, StoreError> {
        let row = sqlx::query_as::<_, AccountRow>(
            "SELECT user_id, user_name, password_hash, created_at
             FROM user_account WHERE user_id = ?1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    // ========================================================================
    // Player Operations
    // ========================================================================

    /// Create a fresh player row for an existing account. Column defaults
    /// supply the fresh-player shape (all zero, event 1).
    pub async fn create_player(&self, user_id: &str) -> Result<u64, StoreError> {
        let result = sqlx::query("INSERT INTO player_data (user_id) VALUES (?1)")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, user_id))?;

        info!("Created player: {}", user_id);
        Ok(result.rows_affected())
    }

    /// Get one player's progression
    pub async fn fetch_player(&self, user_id: &str) -> Result<Option<PlayerProgress>, StoreError> {
        let row = sqlx::query_as::<_, PlayerRow>(
            "SELECT user_id, char_id, exp, parameter1, parameter2, parameter3, parameter4,
                    current_event_id, current_seq, updated_at
             FROM player_data WHERE user_id = ?1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(PlayerProgress::try_from).transpose()
    }

    /// Get every player's progression, ordered by user id
    pub async fn fetch_all_players(&self) -> Result<Vec<PlayerProgress>, StoreError> {
        let rows = sqlx::query_as::<_, PlayerRow>(
            "SELECT user_id, char_id, exp, parameter1, parameter2, parameter3, parameter4,
                    current_event_id, current_seq, updated_at
             FROM player_data ORDER BY user_id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PlayerProgress::try_from).collect()
    }

    /// Partially update a player. Only `Some` fields change their column;
    /// `updated_at` is always refreshed. Errors with `NotFound` when the
    /// player row does not exist.
    pub async fn update_player(
        &self,
        user_id: &str,
        update: &PlayerUpdate,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE player_data SET
                char_id          = COALESCE(?2, char_id),
                exp              = COALESCE(?3, exp),
                parameter1       = COALESCE(?4, parameter1),
                parameter2       = COALESCE(?5, parameter2),
                parameter3       = COALESCE(?6, parameter3),
                parameter4       = COALESCE(?7, parameter4),
                current_event_id = COALESCE(?8, current_event_id),
                current_seq      = COALESCE(?9, current_seq),
                updated_at       = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
             WHERE user_id = ?1",
        )
        .bind(user_id)
        .bind(update.char_id)
        .bind(update.exp)
        .bind(update.parameter1)
        .bind(update.parameter2)
        .bind(update.parameter3)
        .bind(update.parameter4)
        .bind(update.current_event_id)
        .bind(update.current_seq)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(user_id.to_string()));
        }

        debug!("Updated player: {}", user_id);
        Ok(result.rows_affected())
    }

    // ========================================================================
    // Event Operations
    // ========================================================================

    /// Get one event's dialogue script, ordered by seq. An unknown event
    /// yields an empty list, not an error.
    pub async fn fetch_event_lines(&self, event_id: i64) -> Result<Vec<DialogueLine>, StoreError> {
        let rows = sqlx::query_as::<_, EventRow>(
            "SELECT event_id, seq, speaker, text
             FROM event_data WHERE event_id = ?1 ORDER BY seq ASC",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(DialogueLine::from).collect())
    }

    /// Insert one script line, ignoring lines already present. Returns
    /// whether a row was actually written.
    pub async fn insert_event_line(&self, line: &DialogueLine) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO event_data (event_id, seq, speaker, text)
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(line.event_id)
        .bind(line.seq)
        .bind(&line.speaker)
        .bind(&line.text)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn map_unique_violation(e: sqlx::Error, user_id: &str) -> StoreError {
    if let sqlx::Error::Database(ref db) = e {
        if db.is_unique_violation() {
            return StoreError::DuplicateUser(user_id.to_string());
        }
    }
    StoreError::Sqlx(e)
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(Debug, Clone, FromRow)]
pub struct AccountRow {
    pub user_id: String,
    pub user_name: String,
    pub password_hash: Vec<u8>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, FromRow)]
pub struct PlayerRow {
    pub user_id: String,
    pub char_id: i64,
    pub exp: i64,
    pub parameter1: i64,
    pub parameter2: i64,
    pub parameter3: i64,
    pub parameter4: i64,
    pub current_event_id: i64,
    pub current_seq: i64,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, FromRow)]
pub struct EventRow {
    pub event_id: i64,
    pub seq: i64,
    pub speaker: String,
    pub text: String,
}

impl TryFrom<PlayerRow> for PlayerProgress {
    type Error = StoreError;

    fn try_from(row: PlayerRow) -> Result<Self, StoreError> {
        let class = CharacterClass::from_code(row.char_id).ok_or_else(|| {
            StoreError::Corrupt(format!(
                "unknown char_id {} for user {}",
                row.char_id, row.user_id
            ))
        })?;
        Ok(PlayerProgress {
            user_id: row.user_id,
            class,
            exp: row.exp,
            parameter1: row.parameter1,
            parameter2: row.parameter2,
            parameter3: row.parameter3,
            parameter4: row.parameter4,
            current_event_id: row.current_event_id,
            current_seq: row.current_seq,
        })
    }
}

impl From<EventRow> for DialogueLine {
    fn from(row: EventRow) -> Self {
        DialogueLine {
            event_id: row.event_id,
            seq: row.seq,
            speaker: row.speaker,
            text: row.text,
        }
    }
}
