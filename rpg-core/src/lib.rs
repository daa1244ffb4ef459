//! RPG Demo - Progression Core Library
//!
//! This crate provides the pure game logic shared by the backend server
//! and the flow test client:
//! - Character classes (evolution targets keyed to a dominant stat)
//! - Player progression (stat/exp accumulation, one-shot evolution)
//! - Dialogue script line types and offline fallback script
//! - Client-side dialogue session state machine
//!
//! No I/O lives here: loading scripts and persisting progress are the
//! caller's job. Everything is deterministic and synchronous.

pub mod character;
pub mod constants;
pub mod dialogue;
pub mod error;
pub mod progression;
pub mod session;

pub use character::CharacterClass;
pub use dialogue::DialogueLine;
pub use error::CoreError;
pub use progression::{EvolutionOutcome, PlayerProgress, StatDeltas};
pub use session::{GameSession, SessionPhase};
