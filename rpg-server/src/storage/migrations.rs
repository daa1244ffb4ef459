//! Database Migrations - SQLite schema for the RPG demo backend
//!
//! Three tables mirror the three record kinds the API serves: accounts
//! (credentials), player progression, and dialogue script lines.

/// SQL migration for creating all tables
pub const MIGRATION_V1: &str = r#"
-- ============================================================================
-- RPG Demo Database Schema v1
-- ============================================================================

-- ============================================================================
-- 1. Accounts
-- ============================================================================

CREATE TABLE IF NOT EXISTS user_account (
    user_id         TEXT PRIMARY KEY,
    user_name       TEXT NOT NULL,
    -- 48 bytes: 16-byte salt followed by the 32-byte derived key
    password_hash   BLOB NOT NULL,
    created_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);

-- ============================================================================
-- 2. Player Progression
-- ============================================================================

CREATE TABLE IF NOT EXISTS player_data (
    user_id          TEXT PRIMARY KEY REFERENCES user_account(user_id),
    char_id          INTEGER NOT NULL DEFAULT 0,
    exp              INTEGER NOT NULL DEFAULT 0,
    parameter1       INTEGER NOT NULL DEFAULT 0,
    parameter2       INTEGER NOT NULL DEFAULT 0,
    parameter3       INTEGER NOT NULL DEFAULT 0,
    parameter4       INTEGER NOT NULL DEFAULT 0,
    current_event_id INTEGER NOT NULL DEFAULT 1,
    current_seq      INTEGER NOT NULL DEFAULT 0,
    updated_at       TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);

-- ============================================================================
-- 3. Dialogue Scripts
-- ============================================================================

CREATE TABLE IF NOT EXISTS event_data (
    event_id  INTEGER NOT NULL,
    seq       INTEGER NOT NULL,
    speaker   TEXT NOT NULL,
    text      TEXT NOT NULL,
    PRIMARY KEY (event_id, seq)
);

CREATE INDEX IF NOT EXISTS idx_event_data_event ON event_data(event_id);
"#;

pub fn get_migrations() -> Vec<(&'static str, &'static str)> {
    vec![("v1_initial_schema", MIGRATION_V1)]
}
