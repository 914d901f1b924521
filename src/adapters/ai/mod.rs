//! AI Provider Adapters.
//!
//! - `OpenAIProvider` - OpenAI-compatible chat completions
//! - `MockAIProvider` - Configurable mock for testing
//! - `LlmFieldExtractor` - `FieldExtractor` built on any `AIProvider`

mod llm_field_extractor;
mod mock_provider;
mod openai_provider;

pub use llm_field_extractor::{parse_reply, LlmFieldExtractor, MAX_VALUE_CHARS, UNCLEAR_MARKER};
pub use mock_provider::{MockAIProvider, MockError, MockResponse};
pub use openai_provider::{OpenAIConfig, OpenAIProvider};
