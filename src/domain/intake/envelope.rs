//! Inbound message unwrapping.
//!
//! Participants send either plain text or a JSON object carrying a
//! `transcript` string (speech-to-text front ends). Anything else, including
//! malformed JSON, is treated as literal text.

use serde::Deserialize;

#[derive(Deserialize)]
struct TranscriptEnvelope {
    transcript: Option<String>,
}

/// Returns the effective participant text for a raw inbound message.
pub fn unwrap_inbound(raw: &str) -> String {
    let trimmed = raw.trim_start();
    if trimmed.starts_with('{') {
        if let Ok(TranscriptEnvelope {
            transcript: Some(text),
        }) = serde_json::from_str::<TranscriptEnvelope>(raw)
        {
            return text;
        }
    }
    raw.to_string()
}
