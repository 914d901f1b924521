//! RecordSink port - durable storage for completed intake records.
//!
//! Invoked exactly once per completed session. Aborted sessions are never
//! handed to the sink.

use async_trait::async_trait;

use crate::domain::foundation::SessionId;
use crate::domain::intake::IntakeRecord;

/// Errors that can occur when persisting a record.
#[derive(Debug, thiserror::Error)]
pub enum RecordSinkError {
    #[error("Record already stored for session {0}")]
    AlreadyStored(SessionId),

    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    #[error("I/O error: {0}")]
    IoError(String),
}

/// Port for persisting completed sessions.
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Durably stores the record.
    async fn store(&self, record: &IntakeRecord) -> Result<(), RecordSinkError>;
}
