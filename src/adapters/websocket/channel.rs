//! WebSocket-backed conversation channel.
//!
//! Inbound text frames arrive through an mpsc queue fed by the socket's
//! reader task; outbound text goes straight to the socket's sink half.

use async_trait::async_trait;
use axum::extract::ws::Message;
use futures::{Sink, SinkExt};
use tokio::sync::mpsc;

use crate::ports::{ChannelError, ConversationChannel};

/// Duplex channel over one WebSocket connection.
pub struct WebSocketChannel<S> {
    inbound: mpsc::Receiver<String>,
    sink: S,
}

impl<S> WebSocketChannel<S>
where
    S: Sink<Message> + Unpin + Send,
    S::Error: std::fmt::Display,
{
    pub fn new(inbound: mpsc::Receiver<String>, sink: S) -> Self {
        Self { inbound, sink }
    }

    /// Sends a close frame. Errors are ignored; the peer may already be gone.
    pub async fn close(&mut self) {
        let _ = self.sink.send(Message::Close(None)).await;
    }
}

#[async_trait]
impl<S> ConversationChannel for WebSocketChannel<S>
where
    S: Sink<Message> + Unpin + Send,
    S::Error: std::fmt::Display,
{
    async fn receive(&mut self) -> Option<String> {
        self.inbound.recv().await
    }

    async fn send(&mut self, text: String) -> Result<(), ChannelError> {
        self.sink
            .send(Message::Text(text))
            .await
            .map_err(|e| ChannelError::Send(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::mpsc as fmpsc;
    use futures::StreamExt;

    #[tokio::test]
    async fn receive_yields_queued_text_then_none() {
        let (tx, rx) = mpsc::channel(4);
        let (sink, _out) = fmpsc::unbounded::<Message>();
        let mut channel = WebSocketChannel::new(rx, sink);

        tx.send("hello".to_string()).await.unwrap();
        drop(tx);

        assert_eq!(channel.receive().await.as_deref(), Some("hello"));
        assert_eq!(channel.receive().await, None);
    }

    #[tokio::test]
    async fn send_writes_text_frame() {
        let (_tx, rx) = mpsc::channel(1);
        let (sink, mut out) = fmpsc::unbounded::<Message>();
        let mut channel = WebSocketChannel::new(rx, sink);

        channel.send("{\"response\":\"hi\"}".to_string()).await.unwrap();

        match out.next().await {
            Some(Message::Text(text)) => assert_eq!(text, "{\"response\":\"hi\"}"),
            other => panic!("unexpected frame: {:?}", other),
        }
    }

    #[tokio::test]
    async fn send_after_peer_gone_is_error() {
        let (_tx, rx) = mpsc::channel(1);
        let (sink, out) = fmpsc::unbounded::<Message>();
        drop(out);
        let mut channel = WebSocketChannel::new(rx, sink);

        let err = channel.send("x".to_string()).await.unwrap_err();

        assert!(matches!(err, ChannelError::Send(_)));
    }
}
