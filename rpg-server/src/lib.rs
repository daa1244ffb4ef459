//! RPG Backend Server Library
//!
//! This library provides the core modules for the demo RPG backend:
//! - SQLite persistence for accounts, player progression and dialogue scripts
//! - PBKDF2 credential hashing with constant-time verification
//! - HTTP/JSON API endpoints for the game client
//! - Chat classifier proxy to an Azure OpenAI chat-completions deployment

pub mod api; // HTTP/JSON API endpoints for the game client
pub mod auth; // PBKDF2 credential hashing
pub mod llm; // Chat classifier proxy
pub mod storage; // Unified data storage (SQLite)

// Re-export commonly used types
pub use storage::sqlite::{SqliteStore, StoreError};
