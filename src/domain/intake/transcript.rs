//! Conversation transcript.

use serde::Serialize;

use super::field::Field;
use crate::domain::foundation::Timestamp;

/// Who authored a transcript turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    /// Text the remote participant sent.
    Participant,
    /// A value the system recorded after a definitive extraction.
    System,
}

/// One entry in the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub content: String,
    /// Field that was being collected when the turn was recorded.
    pub field: Field,
    pub at: Timestamp,
}

/// Append-only, chronologically ordered record of the exchange.
///
/// Turns are never removed; the transcript only grows for the life of the
/// session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, speaker: Speaker, field: Field, content: impl Into<String>) {
        self.turns.push(Turn {
            speaker,
            content: content.into(),
            field,
            at: Timestamp::now(),
        });
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Number of turns by `speaker` recorded while `field` was the cursor.
    pub fn count_for(&self, speaker: Speaker, field: Field) -> usize {
        self.turns
            .iter()
            .filter(|t| t.speaker == speaker && t.field == field)
            .count()
    }
}
