//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `ai` - LLM providers and the LLM-backed field extractor
//! - `storage` - Record sinks (YAML files, in-memory)
//! - `websocket` - Axum WebSocket transport for intake conversations

pub mod ai;
pub mod storage;
pub mod websocket;

pub use ai::{LlmFieldExtractor, MockAIProvider, OpenAIConfig, OpenAIProvider};
pub use storage::{FileRecordSink, InMemoryRecordSink};
pub use websocket::{websocket_router, WebSocketState};
