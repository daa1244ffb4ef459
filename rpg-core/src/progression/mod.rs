//! Player progression: stat growth and one-shot class evolution.
//!
//! The growth model is intentionally simple:
//! - Four parameters accumulate whatever deltas are applied to them.
//! - Exp accumulates the sum of each call's present deltas, nothing else,
//!   so exp always equals the total of every delta ever applied.
//! - The first call that leaves exp at or above [`EVOLUTION_THRESHOLD`]
//!   while the class is still `Default` assigns the class keyed to the
//!   highest parameter (ties go to the lowest slot) and forces the
//!   evolution dialogue event. The class is never reassigned afterwards.
//!
//! Persistence is the caller's concern; this module never does I/O.
//!
//! [`EVOLUTION_THRESHOLD`]: crate::constants::EVOLUTION_THRESHOLD

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::character::CharacterClass;
use crate::constants::{EVOLUTION_EVENT_ID, EVOLUTION_THRESHOLD, INITIAL_EVENT_ID, INITIAL_SEQ};
use crate::error::CoreError;

/// A player's persistent progression state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerProgress {
    pub user_id: String,
    pub class: CharacterClass,
    pub exp: i64,
    pub parameter1: i64,
    pub parameter2: i64,
    pub parameter3: i64,
    pub parameter4: i64,
    pub current_event_id: i64,
    pub current_seq: i64,
}

/// Per-call stat changes. `None` leaves the field untouched and
/// contributes nothing to exp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatDeltas {
    pub parameter1: Option<i64>,
    pub parameter2: Option<i64>,
    pub parameter3: Option<i64>,
    pub parameter4: Option<i64>,
}

/// What a single [`PlayerProgress::apply_deltas`] call produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvolutionOutcome {
    /// Stats accumulated; the class did not change.
    Unchanged,
    /// This call crossed the threshold and assigned the class.
    Evolved(CharacterClass),
}

impl EvolutionOutcome {
    pub fn evolved_now(&self) -> bool {
        matches!(self, Self::Evolved(_))
    }
}

impl StatDeltas {
    pub fn new(p1: i64, p2: i64, p3: i64, p4: i64) -> Self {
        Self {
            parameter1: Some(p1),
            parameter2: Some(p2),
            parameter3: Some(p3),
            parameter4: Some(p4),
        }
    }

    /// Sum of the present deltas. This is exactly the exp gained by one
    /// `apply_deltas` call.
    pub fn total(&self) -> i64 {
        self.as_array().iter().flatten().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.as_array().iter().all(Option::is_none)
    }

    pub fn as_array(&self) -> [Option<i64>; 4] {
        [
            self.parameter1,
            self.parameter2,
            self.parameter3,
            self.parameter4,
        ]
    }

    /// Parses a `"p1,p2,p3,p4"` list, as taken on the flow client's
    /// command line.
    pub fn parse(input: &str) -> Result<Self, CoreError> {
        let parts: Vec<&str> = input.split(',').collect();
        if parts.len() != 4 {
            return Err(CoreError::InvalidDeltaList(input.to_string()));
        }
        let mut values = [0i64; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part
                .trim()
                .parse()
                .map_err(|_| CoreError::InvalidDeltaList(input.to_string()))?;
        }
        Ok(Self::new(values[0], values[1], values[2], values[3]))
    }
}

impl PlayerProgress {
    /// A freshly created player: all stats and exp zero, class `Default`,
    /// positioned at the opening dialogue event.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            class: CharacterClass::Default,
            exp: 0,
            parameter1: 0,
            parameter2: 0,
            parameter3: 0,
            parameter4: 0,
            current_event_id: INITIAL_EVENT_ID,
            current_seq: INITIAL_SEQ,
        }
    }

    pub fn params(&self) -> [i64; 4] {
        [
            self.parameter1,
            self.parameter2,
            self.parameter3,
            self.parameter4,
        ]
    }

    /// A player has evolved iff their class left `Default`.
    pub fn has_evolved(&self) -> bool {
        self.class != CharacterClass::Default
    }

    /// 0-based slot and value of the highest parameter. Ties go to the
    /// lowest slot, so the comparison is total and deterministic:
    /// (100, 100, 50, 0) picks slot 0.
    pub fn dominant_stat(&self) -> (usize, i64) {
        let params = self.params();
        let mut best = 0;
        for (index, value) in params.iter().enumerate().skip(1) {
            if *value > params[best] {
                best = index;
            }
        }
        (best, params[best])
    }

    /// Applies one round of growth. Present deltas add to their parameter
    /// and their sum adds to exp; absent deltas touch nothing. Evolution
    /// fires at most once per player lifetime, on the call that first
    /// leaves exp at or above the threshold.
    pub fn apply_deltas(&mut self, deltas: &StatDeltas) -> EvolutionOutcome {
        if let Some(d) = deltas.parameter1 {
            self.parameter1 += d;
        }
        if let Some(d) = deltas.parameter2 {
            self.parameter2 += d;
        }
        if let Some(d) = deltas.parameter3 {
            self.parameter3 += d;
        }
        if let Some(d) = deltas.parameter4 {
            self.parameter4 += d;
        }
        self.exp += deltas.total();

        if self.exp >= EVOLUTION_THRESHOLD && !self.has_evolved() {
            let (slot, _) = self.dominant_stat();
            let class = CharacterClass::for_dominant_param(slot);
            self.class = class;
            self.current_event_id = EVOLUTION_EVENT_ID;
            debug!(
                user_id = %self.user_id,
                class = class.display_name(),
                exp = self.exp,
                "player evolved"
            );
            return EvolutionOutcome::Evolved(class);
        }
        EvolutionOutcome::Unchanged
    }
}
