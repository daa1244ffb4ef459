//! Client-side dialogue session state machine.
//!
//! `GameSession` owns everything a playing client keeps between server
//! calls: the player's progression, the loaded script buffer and the
//! line cursor. It is an owned context value passed around explicitly,
//! not a global. Nothing here persists on its own; a client decides
//! when to push `progress()` back to the server.
//!
//! The machine is defensive at the edges the original flow was loose
//! about: advancing past the last line is a no-op, and loading a new
//! script always resets the cursor.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{SELF_SPEAKER_PLACEHOLDER, SYSTEM_SPEAKER};
use crate::dialogue::DialogueLine;
use crate::progression::{EvolutionOutcome, PlayerProgress, StatDeltas};

/// Where the session currently sits in its script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// No script loaded.
    Idle,
    /// Mid-script; `advance_line` will move.
    Presenting,
    /// Cursor on the last line; `advance_line` is a no-op.
    Exhausted,
    /// Evolution fired and the evolution event's script has not been
    /// loaded yet.
    Evolved,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSession {
    progress: PlayerProgress,
    lines: Vec<DialogueLine>,
    cursor: usize,
    phase: SessionPhase,
}

impl GameSession {
    /// Starts a session from known progression state, e.g. the player
    /// record a login returned.
    pub fn new(progress: PlayerProgress) -> Self {
        Self {
            progress,
            lines: Vec::new(),
            cursor: 0,
            phase: SessionPhase::Idle,
        }
    }

    /// Starts a session for a freshly created player.
    pub fn for_new_player(user_id: impl Into<String>) -> Self {
        Self::new(PlayerProgress::new(user_id))
    }

    pub fn user_id(&self) -> &str {
        &self.progress.user_id
    }

    /// The progression state a save should persist. Saves are explicit:
    /// nothing in the session writes anywhere by itself. `current_seq`
    /// mirrors the cursor as it moves.
    pub fn progress(&self) -> &PlayerProgress {
        &self.progress
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn lines(&self) -> &[DialogueLine] {
        &self.lines
    }

    pub fn current_line(&self) -> Option<&DialogueLine> {
        self.lines.get(self.cursor)
    }

    /// Replaces the script buffer, resetting the cursor to the first
    /// line. Lines spoken by the first-person placeholder are rewritten
    /// to the player's id here, once, so reads never substitute.
    pub fn load_lines(&mut self, lines: Vec<DialogueLine>) {
        self.lines = lines;
        for line in &mut self.lines {
            if line.speaker == SELF_SPEAKER_PLACEHOLDER {
                line.speaker = self.progress.user_id.clone();
            }
        }
        self.cursor = 0;
        self.progress.current_seq = self.lines.first().map(|l| l.seq).unwrap_or(0);
        self.recompute_phase();
        debug!(
            user_id = %self.progress.user_id,
            count = self.lines.len(),
            "loaded dialogue script"
        );
    }

    /// Moves to the next line if one exists. Returns whether the cursor
    /// moved; at the last line (or with no script) this is a no-op.
    pub fn advance_line(&mut self) -> bool {
        if self.cursor + 1 >= self.lines.len() {
            return false;
        }
        self.cursor += 1;
        self.progress.current_seq = self.lines[self.cursor].seq;
        if self.phase != SessionPhase::Evolved {
            self.recompute_phase();
        }
        true
    }

    /// Applies one round of growth to the player. When this call evolves
    /// the player, a synthetic announcement line is appended to the
    /// current script and the session parks on the evolution event until
    /// its script is loaded.
    pub fn apply_deltas(&mut self, deltas: &StatDeltas) -> EvolutionOutcome {
        let outcome = self.progress.apply_deltas(deltas);
        if outcome.evolved_now() {
            let seq = self.lines.last().map(|l| l.seq + 1).unwrap_or(1);
            self.lines.push(DialogueLine::new(
                self.progress.current_event_id,
                seq,
                SYSTEM_SPEAKER,
                format!("なんと、{}は進化した！", self.progress.user_id),
            ));
            self.phase = SessionPhase::Evolved;
        }
        outcome
    }

    fn recompute_phase(&mut self) {
        self.phase = if self.lines.is_empty() {
            SessionPhase::Idle
        } else if self.cursor + 1 >= self.lines.len() {
            SessionPhase::Exhausted
        } else {
            SessionPhase::Presenting
        };
    }
}
