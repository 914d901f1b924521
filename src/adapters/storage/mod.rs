//! Storage Adapters
//!
//! Implementations of the RecordSink port for persisting completed intakes.
//!
//! ## Available Adapters
//!
//! - **FileRecordSink** - Stores each record as a YAML file on disk
//! - **InMemoryRecordSink** - Keeps records in memory (testing/development)
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::storage::{FileRecordSink, InMemoryRecordSink};
//!
//! // Production: file-based storage
//! let sink = FileRecordSink::new("./data/intakes");
//!
//! // Testing: in-memory storage
//! let sink = InMemoryRecordSink::new();
//! ```

mod file_record_sink;
mod in_memory_record_sink;

pub use file_record_sink::FileRecordSink;
pub use in_memory_record_sink::InMemoryRecordSink;
