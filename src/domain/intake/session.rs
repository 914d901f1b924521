//! Intake session aggregate.
//!
//! One session per connection. It owns the field set, the transcript, and
//! (implicitly, through the field set) the cursor.
//!
//! # Ingest ordering
//!
//! ```text
//! raw text ──► unwrap ──► participant turn ──► extraction ──┬─ Unclear ──► (no change)
//!                                                           ├─ Error ────► (no change)
//!                                                           └─ Value ────► fill cursor
//!                                                                          system turn
//! ```
//!
//! The participant turn is recorded before the extraction call so the
//! transcript reflects exactly what was said even when extraction fails.
//! Fields only change after a definitive value.

use super::envelope::unwrap_inbound;
use super::field::Field;
use super::fields::IntakeFields;
use super::record::IntakeRecord;
use super::transcript::{Speaker, Transcript};
use crate::domain::foundation::{ConnectionId, SessionId, Timestamp};
use crate::ports::{Extraction, ExtractionError, ExtractionRequest, FieldExtractor};

/// Result of a successful `ingest` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The value was written into `field` and the cursor advanced.
    Accepted { field: Field, value: String },
    /// Nothing usable was said; the cursor did not move.
    Unclear,
}

/// Errors from `ingest`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IngestError {
    /// Completed sessions are terminal.
    #[error("intake session is already complete")]
    SessionComplete,

    /// The extraction service failed; session fields are unchanged.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

/// Intake session aggregate.
///
/// # Invariants
///
/// - Fields are filled strictly in [`Field::SEQUENCE`] order.
/// - The transcript only grows.
/// - Once complete, no further field mutation occurs.
#[derive(Debug, Clone)]
pub struct IntakeSession {
    id: SessionId,
    connection_id: ConnectionId,
    fields: IntakeFields,
    transcript: Transcript,
    started_at: Timestamp,
}

impl IntakeSession {
    /// Creates a fresh session with all fields empty.
    pub fn new(connection_id: ConnectionId) -> Self {
        Self {
            id: SessionId::new(),
            connection_id,
            fields: IntakeFields::new(),
            transcript: Transcript::new(),
            started_at: Timestamp::now(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn connection_id(&self) -> &ConnectionId {
        &self.connection_id
    }

    pub fn fields(&self) -> &IntakeFields {
        &self.fields
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn started_at(&self) -> &Timestamp {
        &self.started_at
    }

    /// Field awaiting a value, or `None` when the session is complete.
    pub fn current_field(&self) -> Option<Field> {
        self.fields.cursor()
    }

    /// True iff every field is filled.
    pub fn is_complete(&self) -> bool {
        self.fields.is_complete()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Commands
    // ─────────────────────────────────────────────────────────────────────────

    /// Processes one inbound participant message.
    ///
    /// # Errors
    ///
    /// - `SessionComplete` if every field is already filled (nothing is recorded)
    /// - `Extraction` if the extraction service failed (only the participant
    ///   turn is recorded)
    pub async fn ingest<E>(&mut self, raw: &str, extractor: &E) -> Result<IngestOutcome, IngestError>
    where
        E: FieldExtractor + ?Sized,
    {
        let field = self.current_field().ok_or(IngestError::SessionComplete)?;

        let text = unwrap_inbound(raw);
        self.transcript.record(Speaker::Participant, field, text.as_str());

        if text.trim().is_empty() {
            return Ok(IngestOutcome::Unclear);
        }

        let request = ExtractionRequest::new(text, field, self.fields.known()).with_session(self.id);
        let value = match extractor.extract(request).await? {
            Extraction::Value(value) if !value.trim().is_empty() => value.trim().to_string(),
            _ => return Ok(IngestOutcome::Unclear),
        };

        self.fields.fill_cursor(value.as_str());
        self.transcript.record(Speaker::System, field, value.as_str());

        Ok(IngestOutcome::Accepted { field, value })
    }

    /// Builds the record for the sink. `None` until the session is complete.
    pub fn to_record(&self, completed_at: Timestamp) -> Option<IntakeRecord> {
        if !self.is_complete() {
            return None;
        }
        Some(IntakeRecord {
            session_id: self.id,
            connection_id: self.connection_id,
            started_at: self.started_at,
            completed_at,
            fields: self.fields.clone(),
            transcript: self.transcript.clone(),
        })
    }
}
