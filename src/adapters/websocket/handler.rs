//! WebSocket upgrade handler for intake connections.
//!
//! Handles the HTTP → WebSocket upgrade and manages the connection lifecycle:
//! 1. Upgrade with the configured frame size limit
//! 2. Spawn a reader that forwards text frames and watches for close
//! 3. Run the intake loop until it reaches a terminal state
//! 4. Stop the reader and close the socket

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Json, Router,
};
use futures::{Stream, StreamExt};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;

use crate::application::handlers::intake::IntakeConversationHandler;
use crate::domain::foundation::ConnectionId;

use super::channel::WebSocketChannel;

/// Inbound messages buffered per connection while the loop is busy.
/// A participant who gets further ahead than this is disconnected.
const INBOUND_BUFFER: usize = 32;

/// State required for WebSocket handling.
#[derive(Clone)]
pub struct WebSocketState {
    /// Intake loop shared by every connection.
    pub handler: Arc<IntakeConversationHandler>,
    /// Largest accepted inbound frame, in bytes.
    pub max_message_bytes: usize,
}

impl WebSocketState {
    /// Create a new WebSocket state.
    pub fn new(handler: Arc<IntakeConversationHandler>, max_message_bytes: usize) -> Self {
        Self {
            handler,
            max_message_bytes,
        }
    }
}

/// Handle WebSocket upgrade requests.
///
/// Routes: `GET /` and `GET /ws`
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<WebSocketState>) -> Response {
    let max = state.max_message_bytes;
    ws.max_message_size(max)
        .max_frame_size(max)
        .on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an established WebSocket connection.
async fn handle_socket(socket: WebSocket, state: WebSocketState) {
    let connection_id = ConnectionId::new();
    let (sender, receiver) = socket.split();
    let (inbound_tx, inbound_rx) = mpsc::channel::<String>(INBOUND_BUFFER);
    let cancel = CancellationToken::new();

    tracing::info!(connection_id = %connection_id, "Client connected");

    let reader = tokio::spawn(forward_frames(
        receiver,
        inbound_tx,
        cancel.clone(),
        connection_id,
    ));

    let mut channel = WebSocketChannel::new(inbound_rx, sender);
    let mut rng = StdRng::from_entropy();
    let final_state = state
        .handler
        .handle(connection_id, &mut channel, cancel, &mut rng)
        .await;

    reader.abort();
    channel.close().await;

    tracing::info!(
        connection_id = %connection_id,
        state = ?final_state,
        "Client disconnected"
    );
}

/// Reads frames until the socket closes, then cancels the connection.
///
/// Never waits on the intake loop, so a close frame is always seen promptly
/// even while the loop is busy with an extraction.
async fn forward_frames<St, E>(
    mut frames: St,
    inbound: mpsc::Sender<String>,
    cancel: CancellationToken,
    connection_id: ConnectionId,
) where
    St: Stream<Item = Result<Message, E>> + Unpin,
    E: std::fmt::Display,
{
    while let Some(result) = frames.next().await {
        match result {
            Ok(Message::Text(text)) => match inbound.try_send(text) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(
                        connection_id = %connection_id,
                        buffered = INBOUND_BUFFER,
                        "Inbound queue full, closing connection"
                    );
                    break;
                }
                Err(TrySendError::Closed(_)) => break,
            },
            Ok(Message::Binary(_)) => {
                tracing::warn!(
                    connection_id = %connection_id,
                    "Ignoring unsupported binary message"
                );
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                // Handled automatically by axum
            }
            Ok(Message::Close(_)) => {
                tracing::debug!(connection_id = %connection_id, "Client sent close frame");
                break;
            }
            Err(e) => {
                tracing::debug!(connection_id = %connection_id, "Receive error: {}", e);
                break;
            }
        }
    }
    cancel.cancel();
}

/// Health probe payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub active_sessions: usize,
}

/// `GET /health`
pub async fn health(State(state): State<WebSocketState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        active_sessions: state.handler.registry().active_count().await,
    })
}

/// Create the axum router for the intake service.
///
/// # Example
///
/// ```ignore
/// let app = websocket_router().with_state(state);
/// ```
pub fn websocket_router() -> Router<WebSocketState> {
    Router::new()
        .route("/", get(ws_handler))
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{LlmFieldExtractor, MockAIProvider};
    use crate::adapters::storage::InMemoryRecordSink;
    use crate::application::handlers::intake::SessionRegistry;
    use std::time::Duration;

    fn state() -> WebSocketState {
        let extractor = LlmFieldExtractor::new(
            Arc::new(MockAIProvider::new()),
            Duration::from_secs(5),
        );
        let handler = IntakeConversationHandler::new(
            Arc::new(SessionRegistry::new()),
            Arc::new(extractor),
            Arc::new(InMemoryRecordSink::new()),
        );
        WebSocketState::new(Arc::new(handler), 1024)
    }

    #[tokio::test]
    async fn health_reports_active_sessions() {
        let state = state();
        state
            .handler
            .registry()
            .open(ConnectionId::new())
            .await
            .unwrap();

        let Json(body) = health(State(state)).await;

        assert_eq!(body.status, "ok");
        assert_eq!(body.active_sessions, 1);
    }

    #[test]
    fn health_payload_is_camel_case() {
        let json = serde_json::to_value(HealthResponse {
            status: "ok",
            active_sessions: 3,
        })
        .unwrap();
        assert_eq!(json["activeSessions"], 3);
    }

    fn text_frames(count: usize) -> Vec<Result<Message, axum::Error>> {
        (0..count)
            .map(|i| Ok(Message::Text(format!("message {}", i))))
            .collect()
    }

    #[tokio::test]
    async fn close_frame_forwards_text_and_cancels() {
        let (tx, mut rx) = mpsc::channel(INBOUND_BUFFER);
        let cancel = CancellationToken::new();
        let mut frames = text_frames(2);
        frames.push(Ok(Message::Binary(vec![1, 2, 3])));
        frames.push(Ok(Message::Close(None)));

        forward_frames(futures::stream::iter(frames), tx, cancel.clone(), ConnectionId::new()).await;

        assert!(cancel.is_cancelled());
        assert_eq!(rx.recv().await.as_deref(), Some("message 0"));
        assert_eq!(rx.recv().await.as_deref(), Some("message 1"));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn close_is_seen_while_the_queue_is_full() {
        // Nothing drains the receiver, as when the loop is waiting on the extractor.
        let (tx, _rx) = mpsc::channel(INBOUND_BUFFER);
        let cancel = CancellationToken::new();
        let mut frames = text_frames(INBOUND_BUFFER);
        frames.push(Ok(Message::Close(None)));

        tokio::time::timeout(
            Duration::from_secs(1),
            forward_frames(futures::stream::iter(frames), tx, cancel.clone(), ConnectionId::new()),
        )
        .await
        .expect("reader must not wait on a full queue");

        assert!(cancel.is_cancelled());
    }

    #[tokio::test]
    async fn overflowing_the_queue_cancels_the_connection() {
        let (tx, _rx) = mpsc::channel(INBOUND_BUFFER);
        let cancel = CancellationToken::new();
        // Keep the stream open after the overflow; only the reader can end it.
        let frames = futures::stream::iter(text_frames(INBOUND_BUFFER + 1))
            .chain(futures::stream::pending());

        tokio::time::timeout(
            Duration::from_secs(1),
            forward_frames(frames, tx, cancel.clone(), ConnectionId::new()),
        )
        .await
        .expect("reader must stop once the queue overflows");

        assert!(cancel.is_cancelled());
    }

    #[tokio::test]
    async fn receive_error_cancels() {
        let (tx, _rx) = mpsc::channel(INBOUND_BUFFER);
        let cancel = CancellationToken::new();
        let frames = futures::stream::iter(vec![Err::<Message, _>("connection reset")])
            .chain(futures::stream::pending());

        forward_frames(frames, tx, cancel.clone(), ConnectionId::new()).await;

        assert!(cancel.is_cancelled());
    }

    #[test]
    fn websocket_router_creates_routes() {
        let _router: Router = websocket_router().with_state(state());
    }
}
