//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors, state machines)
//! - `intake` - Field sequence, intake session aggregate, question phrasing

pub mod foundation;
pub mod intake;
