//! Connection protocol states.

use serde::Serialize;

use crate::domain::foundation::StateMachine;

/// Lifecycle of one intake connection.
///
/// ```text
/// Greeting ──► Collecting ──► Completed
///     │            │
///     └────────────┴────────► Aborted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolState {
    /// Session opened, first question not yet delivered.
    #[default]
    Greeting,
    /// Waiting for and processing participant answers.
    Collecting,
    /// All fields filled and the record persisted.
    Completed,
    /// Disconnect, transport error, or persistence failure.
    Aborted,
}

impl ProtocolState {
    /// Returns true while inbound messages are being processed.
    pub fn accepts_input(&self) -> bool {
        matches!(self, Self::Collecting)
    }
}

impl StateMachine for ProtocolState {
    fn can_transition_to(&self, target: &Self) -> bool {
        use ProtocolState::*;
        matches!(
            (self, target),
            (Greeting, Collecting) | (Greeting, Aborted) | (Collecting, Completed) | (Collecting, Aborted)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ProtocolState::*;
        match self {
            Greeting => vec![Collecting, Aborted],
            Collecting => vec![Completed, Aborted],
            Completed | Aborted => vec![],
        }
    }
}
