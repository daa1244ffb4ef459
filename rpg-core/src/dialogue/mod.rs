//! Dialogue script lines.
//!
//! A script is the ordered set of lines belonging to one event. Scripts
//! normally come from the backend's event store; [`fallback_lines`]
//! supplies the placeholder script a client shows when that fetch fails.

use serde::{Deserialize, Serialize};

use crate::constants::{FALLBACK_SPEAKER, SELF_SPEAKER_PLACEHOLDER};

/// One line of an event's dialogue script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueLine {
    pub event_id: i64,
    pub seq: i64,
    pub speaker: String,
    pub text: String,
}

impl DialogueLine {
    pub fn new(
        event_id: i64,
        seq: i64,
        speaker: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            event_id,
            seq,
            speaker: speaker.into(),
            text: text.into(),
        }
    }

    /// True when the speaker is the first-person placeholder that gets
    /// rewritten to the player's id at load time.
    pub fn is_self_placeholder(&self) -> bool {
        self.speaker == SELF_SPEAKER_PLACEHOLDER
    }
}

/// Placeholder script for when an event's lines cannot be fetched. The
/// first-person lines still carry the placeholder speaker; loading them
/// into a session performs the usual rewrite.
pub fn fallback_lines(event_id: i64) -> Vec<DialogueLine> {
    vec![
        DialogueLine::new(event_id, 1, FALLBACK_SPEAKER, format!("イベントID: {event_id}")),
        DialogueLine::new(event_id, 2, FALLBACK_SPEAKER, "ひとことめ"),
        DialogueLine::new(event_id, 3, FALLBACK_SPEAKER, "ふたことめ"),
        DialogueLine::new(event_id, 4, SELF_SPEAKER_PLACEHOLDER, "最初のセリフ"),
        DialogueLine::new(event_id, 5, SELF_SPEAKER_PLACEHOLDER, "次のセリフ"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_script_shape() {
        let lines = fallback_lines(42);
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0].text, "イベントID: 42");
        assert!(lines.iter().all(|l| l.event_id == 42));
        // Seqs are contiguous from 1.
        for (i, line) in lines.iter().enumerate() {
            assert_eq!(line.seq, i as i64 + 1);
        }
        // The last two lines are the player's own.
        assert!(lines[3].is_self_placeholder());
        assert!(lines[4].is_self_placeholder());
        assert!(!lines[0].is_self_placeholder());
    }
}
