//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `FieldExtractor` - free text + target field → value or "unclear"
//! - `AIProvider` - LLM completions backing the extractor
//! - `RecordSink` - durable storage for completed sessions
//! - `ConversationChannel` - per-connection duplex transport

mod ai_provider;
mod conversation_channel;
mod field_extractor;
mod record_sink;

pub use ai_provider::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, Message,
    MessageRole, ProviderInfo, RequestMetadata, TokenUsage,
};
pub use conversation_channel::{ChannelError, ConversationChannel};
pub use field_extractor::{Extraction, ExtractionError, ExtractionRequest, FieldExtractor};
pub use record_sink::{RecordSink, RecordSinkError};
