//! Character classes (evolution targets).
//!
//! A player starts as `Default` and evolves exactly once, when their
//! accumulated exp crosses the evolution threshold. The class chosen is
//! keyed to whichever growth parameter is highest at that moment: each
//! non-default class answers to one parameter slot. Codes are the stable
//! numeric values carried on the wire and in the store.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A player's character class. `Default` means "not yet evolved".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum CharacterClass {
    #[default]
    Default,
    Power,
    Imagination,
    Wisdom,
    Speed,
}

impl CharacterClass {
    /// Stable numeric code used on the wire and in the store.
    pub fn code(&self) -> i64 {
        match self {
            Self::Default => 0,
            Self::Power => 10,
            Self::Imagination => 20,
            Self::Wisdom => 30,
            Self::Speed => 40,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Default),
            10 => Some(Self::Power),
            20 => Some(Self::Imagination),
            30 => Some(Self::Wisdom),
            40 => Some(Self::Speed),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Self::Default => "Default",
            Self::Power => "Power",
            Self::Imagination => "Imagination",
            Self::Wisdom => "Wisdom",
            Self::Speed => "Speed",
        }
    }

    /// The class assigned when the given parameter slot (0-based) wins
    /// the dominant-stat comparison.
    pub fn for_dominant_param(index: usize) -> Self {
        match index {
            0 => Self::Power,
            1 => Self::Imagination,
            2 => Self::Wisdom,
            _ => Self::Speed,
        }
    }

    /// The parameter slot (0-based) this class is keyed to, if any.
    pub fn keyed_param(&self) -> Option<usize> {
        match self {
            Self::Default => None,
            Self::Power => Some(0),
            Self::Imagination => Some(1),
            Self::Wisdom => Some(2),
            Self::Speed => Some(3),
        }
    }
}

impl From<CharacterClass> for i64 {
    fn from(class: CharacterClass) -> i64 {
        class.code()
    }
}

impl TryFrom<i64> for CharacterClass {
    type Error = CoreError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or(CoreError::UnknownClassCode(code))
    }
}
