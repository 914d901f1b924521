//! ConversationChannel port - the duplex transport the intake loop talks over.
//!
//! The loop only needs "wait for the next text message" and "send a reply".
//! Framing, handshakes, and close frames are the adapter's business.

use async_trait::async_trait;

/// Transport failures while sending.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("connection closed")]
    Closed,

    #[error("send failed: {0}")]
    Send(String),
}

/// Duplex UTF-8 message channel for one connection.
#[async_trait]
pub trait ConversationChannel: Send {
    /// Suspends until the next inbound text message.
    ///
    /// Returns `None` once the connection is closed or unreadable.
    async fn receive(&mut self) -> Option<String>;

    /// Sends one outbound text message.
    async fn send(&mut self, text: String) -> Result<(), ChannelError>;
}
