//! LLM-backed field extractor.
//!
//! Implements the `FieldExtractor` port on top of any `AIProvider`: builds a
//! single-field extraction prompt, bounds the call with a timeout, and turns
//! the model's reply into a value or an "unclear" signal.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::intake::Field;
use crate::ports::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, Extraction, ExtractionError,
    ExtractionRequest, FieldExtractor, FinishReason, MessageRole, RequestMetadata,
};

/// Literal the model is told to answer with when the field is missing.
pub const UNCLEAR_MARKER: &str = "UNCLEAR";

/// Longest value kept from a model reply, in characters.
pub const MAX_VALUE_CHARS: usize = 2_000;

/// Field extractor that delegates to an LLM.
pub struct LlmFieldExtractor {
    provider: Arc<dyn AIProvider>,
    timeout: Duration,
}

impl LlmFieldExtractor {
    /// Creates an extractor that gives up on the provider after `timeout`.
    pub fn new(provider: Arc<dyn AIProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    fn build_system_prompt(request: &ExtractionRequest) -> String {
        let known = if request.known_fields.is_empty() {
            "nothing yet".to_string()
        } else {
            request
                .known_fields
                .iter()
                .map(|(field, value)| format!("- {}: {}", field, value))
                .collect::<Vec<_>>()
                .join("\n")
        };

        format!(
            "You are assisting a doctor with a patient intake interview.\n\
            Extract exactly one field from the patient's latest answer.\n\n\
            Field: {field}\n\
            Meaning: {meaning}\n\n\
            Already known about the patient:\n{known}\n\n\
            Rules:\n\
            - Reply with only the value for the field, normalized and concise{hint}.\n\
            - Use what is already known to interpret the answer.\n\
            - If the answer does not contain this field, reply with exactly {unclear}.",
            field = request.target_field,
            meaning = request.target_field.description(),
            known = known,
            hint = Self::field_hint(request.target_field),
            unclear = UNCLEAR_MARKER,
        )
    }

    fn field_hint(field: Field) -> &'static str {
        match field {
            Field::Name => " (properly capitalized, no titles or filler words)",
            Field::Address => " (as the patient stated it)",
            _ => "",
        }
    }

    fn build_request(request: &ExtractionRequest) -> CompletionRequest {
        CompletionRequest::new(RequestMetadata::new(
            request.session_id,
            format!("extract-{}", request.target_field),
        ))
        .with_system_prompt(Self::build_system_prompt(request))
        .with_message(MessageRole::User, request.text.clone())
        .with_max_tokens(256)
        .with_temperature(0.0)
    }
}

/// Rejects replies the model did not finish.
///
/// A reply cut off by the token cap would otherwise be stored as a
/// definitive value.
fn ensure_finished(response: &CompletionResponse) -> Result<(), ExtractionError> {
    match response.finish_reason {
        FinishReason::Stop => Ok(()),
        FinishReason::Length => Err(ExtractionError::InvalidResponse(
            "reply was cut off at the token limit".to_string(),
        )),
        FinishReason::ContentFilter => Err(ExtractionError::Rejected(
            "reply was withheld by the content filter".to_string(),
        )),
    }
}

/// Interprets a model reply.
pub fn parse_reply(reply: &str) -> Extraction {
    let cleaned: String = reply
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect();
    let trimmed = cleaned
        .trim()
        .trim_matches(|c| matches!(c, '"' | '\'' | '`'))
        .trim();

    let bare = trimmed.trim_end_matches(|c: char| c == '.' || c == '!');
    if bare.is_empty() || bare.eq_ignore_ascii_case(UNCLEAR_MARKER) {
        return Extraction::Unclear;
    }

    Extraction::from_text(trimmed.chars().take(MAX_VALUE_CHARS).collect::<String>())
}

impl From<AIError> for ExtractionError {
    fn from(err: AIError) -> Self {
        match err {
            AIError::RateLimited { retry_after_secs } => {
                ExtractionError::RateLimited { retry_after_secs }
            }
            AIError::Timeout { timeout_secs } => ExtractionError::Timeout { timeout_secs },
            AIError::Unavailable { .. } | AIError::Network(_) => {
                ExtractionError::Unavailable(err.to_string())
            }
            AIError::Parse(_) => ExtractionError::InvalidResponse(err.to_string()),
            AIError::AuthenticationFailed
            | AIError::InvalidRequest(_)
            | AIError::ContentFiltered { .. } => ExtractionError::Rejected(err.to_string()),
        }
    }
}

#[async_trait]
impl FieldExtractor for LlmFieldExtractor {
    async fn extract(&self, request: ExtractionRequest) -> Result<Extraction, ExtractionError> {
        let completion_request = Self::build_request(&request);

        let response = tokio::time::timeout(self.timeout, self.provider.complete(completion_request))
            .await
            .map_err(|_| ExtractionError::Timeout {
                timeout_secs: self.timeout.as_secs(),
            })??;

        if let Err(e) = ensure_finished(&response) {
            tracing::warn!(
                field = %request.target_field,
                finish_reason = ?response.finish_reason,
                completion_tokens = response.usage.completion_tokens,
                "Discarding unfinished extraction reply"
            );
            return Err(e);
        }

        let extraction = parse_reply(&response.content);
        tracing::debug!(
            field = %request.target_field,
            model = %response.model,
            prompt_tokens = response.usage.prompt_tokens,
            completion_tokens = response.usage.completion_tokens,
            unclear = matches!(extraction, Extraction::Unclear),
            "Extraction finished"
        );
        Ok(extraction)
    }
}
