//! Application handlers.
//!
//! Handlers that orchestrate domain operations.

pub mod intake;
