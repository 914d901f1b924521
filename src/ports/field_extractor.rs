//! FieldExtractor port - Interface to the natural-language extraction service.
//!
//! Given raw participant text and the field currently being collected, the
//! extractor returns a normalized value for that field or an explicit
//! "unclear" signal. A service failure is a separate, typed error so the
//! conversation can tell "could not understand" apart from "could not ask".

use async_trait::async_trait;

use crate::domain::foundation::{ErrorCode, SessionId};
use crate::domain::intake::{Field, KnownFields};

/// Request for one extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRequest {
    /// Participant text, already unwrapped from any envelope.
    pub text: String,
    /// Field being collected.
    pub target_field: Field,
    /// Fields filled before this request, for disambiguation.
    pub known_fields: KnownFields,
    /// Session the text belongs to, for correlating provider logs.
    pub session_id: Option<SessionId>,
}

impl ExtractionRequest {
    pub fn new(text: impl Into<String>, target_field: Field, known_fields: KnownFields) -> Self {
        Self {
            text: text.into(),
            target_field,
            known_fields,
            session_id: None,
        }
    }

    /// Tags the request with the owning session.
    pub fn with_session(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }
}

/// Definitive result of an extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// Normalized value for the target field.
    Value(String),
    /// The text did not contain a usable value for the target field.
    Unclear,
}

impl Extraction {
    /// Builds a value result, mapping blank text to `Unclear`.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            Extraction::Unclear
        } else {
            Extraction::Value(trimmed.to_string())
        }
    }
}

/// Extraction service failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractionError {
    /// The call exceeded the configured bound.
    #[error("extraction timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// The service asked us to back off.
    #[error("extraction service rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u32 },

    /// Transient service or network failure.
    #[error("extraction service unavailable: {0}")]
    Unavailable(String),

    /// The service answered with something we could not interpret.
    #[error("invalid extraction response: {0}")]
    InvalidResponse(String),

    /// The service refused the request (credentials, request shape, policy).
    #[error("extraction request rejected: {0}")]
    Rejected(String),
}

impl ExtractionError {
    /// Returns true if the participant can usefully send their answer again.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ExtractionError::Rejected(_))
    }

    /// Error code for outbound notifications.
    pub fn code(&self) -> ErrorCode {
        match self {
            ExtractionError::Timeout { .. } => ErrorCode::ExtractionTimeout,
            ExtractionError::RateLimited { .. } => ErrorCode::RateLimited,
            _ => ErrorCode::ExtractionFailed,
        }
    }
}

/// Port for the extraction capability.
///
/// Latency is unbounded from the caller's point of view; implementations
/// that talk to a remote service should enforce their own timeout.
#[async_trait]
pub trait FieldExtractor: Send + Sync {
    /// Extracts a value for `request.target_field` from `request.text`.
    async fn extract(&self, request: ExtractionRequest) -> Result<Extraction, ExtractionError>;
}
