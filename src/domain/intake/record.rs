//! Completed intake record handed to the record sink.

use serde::Serialize;

use super::fields::IntakeFields;
use super::transcript::Transcript;
use crate::domain::foundation::{ConnectionId, SessionId, Timestamp};

/// Everything persisted for a completed session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntakeRecord {
    pub session_id: SessionId,
    pub connection_id: ConnectionId,
    pub started_at: Timestamp,
    pub completed_at: Timestamp,
    pub fields: IntakeFields,
    pub transcript: Transcript,
}

#[cfg(test)]
impl IntakeRecord {
    /// A completed record with every field filled, for adapter tests.
    pub fn test_fixture() -> Self {
        use super::field::Field;
        use super::transcript::Speaker;

        let mut fields = IntakeFields::new();
        let mut transcript = Transcript::new();
        for (field, value) in Field::SEQUENCE.iter().zip([
            "Sarah Connor",
            "12 Elm Street",
            "Knee pain",
            "Hurts when climbing stairs",
            "Possible meniscus strain",
        ]) {
            transcript.record(Speaker::Participant, *field, value);
            fields.fill_cursor(value);
            transcript.record(Speaker::System, *field, value);
        }

        Self {
            session_id: SessionId::new(),
            connection_id: ConnectionId::new(),
            started_at: Timestamp::now(),
            completed_at: Timestamp::now(),
            fields,
            transcript,
        }
    }
}
