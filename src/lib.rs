//! Intake Agent - Real-time Conversational Intake over WebSocket
//!
//! Each connected participant is walked through a fixed sequence of
//! questions (name, address, problem, description, analysis). Free-text
//! answers are turned into field values by an LLM-backed extractor, and the
//! completed record is handed to a durable sink.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
