//! WebSocket adapter for intake conversations.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  text frames   ┌──────────────────┐  receive()  ┌────────────────────────────┐
//! │ reader task  │ ─────────────► │ WebSocketChannel │ ──────────► │ IntakeConversationHandler  │
//! │ (socket rx)  │   mpsc queue   │                  │ ◄────────── │ (one loop per connection)  │
//! └──────┬───────┘                └────────┬─────────┘   send()    └────────────────────────────┘
//!        │ close / error                   │ socket tx
//!        ▼                                 ▼
//!  CancellationToken                    client
//! ```
//!
//! # Components
//!
//! - [`channel`] - `ConversationChannel` over a split socket
//! - [`handler`] - Axum upgrade handler, health probe, and router

pub mod channel;
pub mod handler;

pub use channel::WebSocketChannel;
pub use handler::{health, websocket_router, ws_handler, HealthResponse, WebSocketState};
