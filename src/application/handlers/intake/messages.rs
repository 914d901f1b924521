//! Outbound message shapes for the intake conversation.
//!
//! Every reply is a single JSON object:
//! - ordinary turn: `{"response": "...", "isComplete": false}`
//! - completion: `{"response": "...", "isComplete": true, "data": {...}}`
//! - failure: `{"error": "...", "details": "...", "code": "...", "retryable": bool}`

use serde::Serialize;

use crate::domain::foundation::ErrorCode;
use crate::domain::intake::IntakeFields;
use crate::ports::{ExtractionError, RecordSinkError};

/// All message types sent from server to participant.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum OutboundMessage {
    /// A question, clarification, or completion acknowledgement.
    Turn(TurnMessage),

    /// Something went wrong while handling the last message.
    Error(ErrorMessage),
}

/// Conversational reply.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnMessage {
    pub response: String,
    pub is_complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<IntakeFields>,
}

/// Error notification, kept apart from conversational replies.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorMessage {
    pub error: String,
    pub details: String,
    pub code: String,
    pub retryable: bool,
}

impl OutboundMessage {
    /// A question or clarification for an unfinished session.
    pub fn question(text: impl Into<String>) -> Self {
        OutboundMessage::Turn(TurnMessage {
            response: text.into(),
            is_complete: false,
            data: None,
        })
    }

    /// Closing acknowledgement carrying the full field set.
    pub fn completed(text: impl Into<String>, fields: IntakeFields) -> Self {
        OutboundMessage::Turn(TurnMessage {
            response: text.into(),
            is_complete: true,
            data: Some(fields),
        })
    }

    /// The extraction service failed; the participant may resend.
    pub fn extraction_failed(err: &ExtractionError) -> Self {
        OutboundMessage::Error(ErrorMessage {
            error: "Failed to process your answer".to_string(),
            details: err.to_string(),
            code: err.code().to_string(),
            retryable: err.is_retryable(),
        })
    }

    /// The completed record could not be stored. Ends the session.
    pub fn persistence_failed(err: &RecordSinkError) -> Self {
        OutboundMessage::Error(ErrorMessage {
            error: "Failed to save your information".to_string(),
            details: err.to_string(),
            code: ErrorCode::PersistenceFailed.to_string(),
            retryable: false,
        })
    }

    /// A message arrived after every field was collected.
    pub fn session_complete() -> Self {
        OutboundMessage::Error(ErrorMessage {
            error: "This intake is already complete".to_string(),
            details: "No further answers are needed".to_string(),
            code: ErrorCode::SessionComplete.to_string(),
            retryable: false,
        })
    }

    /// Returns true for error notifications.
    pub fn is_error(&self) -> bool {
        matches!(self, OutboundMessage::Error(_))
    }

    /// Serializes to the wire JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
