//! Error type for the progression core.

/// Errors produced by the pure progression/dialogue logic.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A numeric class code that maps to no known character class.
    #[error("unknown character class code: {0}")]
    UnknownClassCode(i64),

    /// A delta list string that is not four comma-separated integers.
    #[error("invalid delta list '{0}': expected four comma-separated integers")]
    InvalidDeltaList(String),
}
