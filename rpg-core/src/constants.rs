//! Centralized game constants for the RPG progression core.
//!
//! Eliminates magic numbers duplicated across the progression math, the
//! session state machine and the backend handlers. Per-module data (class
//! display names, fallback script text) stays in its module as the single
//! source of truth.

// =====================================================
// Evolution
// =====================================================

/// Accumulated exp at or above this value triggers class evolution
pub const EVOLUTION_THRESHOLD: i64 = 1500;

/// Dialogue event forced onto a player the moment evolution fires
pub const EVOLUTION_EVENT_ID: i64 = 999;

/// Speaker name attached to the synthetic evolution announcement line
pub const SYSTEM_SPEAKER: &str = "SYSTEM";

// =====================================================
// Fresh Player Defaults
// =====================================================

/// Dialogue event a newly created player starts on
pub const INITIAL_EVENT_ID: i64 = 1;

/// Line cursor a newly created player starts at
pub const INITIAL_SEQ: i64 = 0;

// =====================================================
// Stat Ranges
// =====================================================

/// Number of growth parameters a player carries
pub const PARAM_COUNT: usize = 4;

/// Lowest value accepted for an externally supplied parameter
pub const PARAM_MIN: i64 = 0;

/// Highest value accepted for an externally supplied parameter
pub const PARAM_MAX: i64 = 100;

// =====================================================
// Dialogue Script
// =====================================================

/// First-person placeholder speaker, rewritten to the player's id at load time
pub const SELF_SPEAKER_PLACEHOLDER: &str = "じぶん";

/// Speaker used for the offline fallback script's narrator lines
pub const FALLBACK_SPEAKER: &str = "だれか";
