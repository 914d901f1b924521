//! Intake module - the per-connection conversation that fills a fixed,
//! ordered set of fields from free-text answers.
//!
//! - `field` / `fields` - the ordered slots and cursor derivation
//! - `transcript` - append-only turn log
//! - `envelope` - inbound `{"transcript": ...}` unwrapping
//! - `session` - the aggregate driving one conversation
//! - `questions` - randomized prompt phrasing
//! - `protocol` - connection-level state machine
//! - `record` - what gets persisted on completion

mod envelope;
mod field;
mod fields;
mod protocol;
mod questions;
mod record;
mod session;
mod transcript;

pub use envelope::unwrap_inbound;
pub use field::Field;
pub use fields::{IntakeFields, KnownFields};
pub use protocol::ProtocolState;
pub use questions::{render as render_template, QuestionGenerator};
pub use record::IntakeRecord;
pub use session::{IngestError, IngestOutcome, IntakeSession};
pub use transcript::{Speaker, Transcript, Turn};
