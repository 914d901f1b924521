//! Per-connection intake control loop.
//!
//! Drives one participant from the first question to a persisted record:
//!
//! ```text
//! Greeting ──ask first field──► Collecting ──all fields──► persist ──► Completed
//!                                   │  ▲
//!                 unclear / failure └──┘
//!
//! disconnect, cancellation, send failure, persistence failure ──► Aborted
//! ```
//!
//! The loop suspends only on the next inbound message and on the
//! extraction call. Both waits race the connection's cancellation token so a
//! dropped connection ends the loop promptly and the in-flight call is
//! dropped with it.

use std::sync::Arc;

use rand::Rng;
use tokio_util::sync::CancellationToken;

use crate::domain::foundation::{ConnectionId, StateMachine, Timestamp};
use crate::domain::intake::{
    IngestError, IngestOutcome, IntakeSession, ProtocolState, QuestionGenerator,
};
use crate::ports::{ConversationChannel, FieldExtractor, RecordSink};

use super::messages::OutboundMessage;
use super::registry::{SessionHandle, SessionRegistry};

/// Handler for intake connections.
///
/// Cheap to clone; one instance serves every connection.
#[derive(Clone)]
pub struct IntakeConversationHandler {
    registry: Arc<SessionRegistry>,
    extractor: Arc<dyn FieldExtractor>,
    sink: Arc<dyn RecordSink>,
    questions: QuestionGenerator,
}

/// Why a connection loop stopped early.
enum Stop {
    Disconnected,
    Incomplete,
    Cancelled,
    SendFailed,
}

impl IntakeConversationHandler {
    /// Creates a new handler with the given dependencies.
    pub fn new(
        registry: Arc<SessionRegistry>,
        extractor: Arc<dyn FieldExtractor>,
        sink: Arc<dyn RecordSink>,
    ) -> Self {
        Self {
            registry,
            extractor,
            sink,
            questions: QuestionGenerator::new(),
        }
    }

    /// Registry shared by every connection served by this handler.
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Runs the intake protocol for one connection until it ends.
    ///
    /// Returns the terminal state: `Completed` once the record is stored,
    /// `Aborted` otherwise. The connection's registry entry is removed on
    /// every exit path.
    pub async fn handle<C, R>(
        &self,
        connection_id: ConnectionId,
        channel: &mut C,
        cancel: CancellationToken,
        rng: &mut R,
    ) -> ProtocolState
    where
        C: ConversationChannel + ?Sized,
        R: Rng + Send + ?Sized,
    {
        let handle = match self.registry.open(connection_id).await {
            Ok(handle) => handle,
            Err(e) => {
                tracing::error!(connection_id = %connection_id, error = %e, "Refusing connection");
                return ProtocolState::Aborted;
            }
        };

        let session_id = handle.lock().await.id().clone();
        tracing::info!(
            connection_id = %connection_id,
            session_id = %session_id,
            "Intake session opened"
        );
        let final_state = self.converse(&handle, channel, &cancel, rng).await;

        self.registry.close(&connection_id).await;
        tracing::info!(
            connection_id = %connection_id,
            state = ?final_state,
            "Intake session deregistered"
        );
        final_state
    }

    /// Runs the protocol. The session is locked only while one inbound
    /// message is being processed, never while waiting for the next one.
    async fn converse<C, R>(
        &self,
        handle: &SessionHandle,
        channel: &mut C,
        cancel: &CancellationToken,
        rng: &mut R,
    ) -> ProtocolState
    where
        C: ConversationChannel + ?Sized,
        R: Rng + Send + ?Sized,
    {
        let mut state = ProtocolState::Greeting;

        let greeting = self.next_question(&*handle.lock().await, rng);
        if send(channel, &greeting).await.is_err() {
            return abort(state, Stop::SendFailed, &*handle.lock().await);
        }
        state = advance(state, ProtocolState::Collecting);

        loop {
            let raw = tokio::select! {
                biased;

                () = cancel.cancelled() => return abort(state, Stop::Cancelled, &*handle.lock().await),

                inbound = channel.receive() => match inbound {
                    Some(raw) => raw,
                    None => return abort(state, Stop::Disconnected, &*handle.lock().await),
                },
            };

            let mut session = handle.lock().await;
            let session_id = *session.id();

            let outcome = tokio::select! {
                biased;

                () = cancel.cancelled() => return abort(state, Stop::Cancelled, &session),

                outcome = session.ingest(&raw, self.extractor.as_ref()) => outcome,
            };

            let reply = match outcome {
                Ok(IngestOutcome::Accepted { field, value }) => {
                    tracing::info!(
                        session_id = %session_id,
                        field = %field,
                        value_len = value.len(),
                        "Field accepted"
                    );
                    if session.is_complete() {
                        return self.finish(state, &session, channel, rng).await;
                    }
                    self.next_question(&session, rng)
                }
                Ok(IngestOutcome::Unclear) => {
                    tracing::debug!(
                        session_id = %session_id,
                        field = ?session.current_field(),
                        "Answer unclear, asking again"
                    );
                    OutboundMessage::question(self.questions.clarification_prompt(rng))
                }
                Err(IngestError::Extraction(e)) => {
                    tracing::warn!(
                        session_id = %session_id,
                        field = ?session.current_field(),
                        error = %e,
                        retryable = e.is_retryable(),
                        "Extraction failed"
                    );
                    OutboundMessage::extraction_failed(&e)
                }
                Err(IngestError::SessionComplete) => OutboundMessage::session_complete(),
            };
            drop(session);

            if send(channel, &reply).await.is_err() {
                return abort(state, Stop::SendFailed, &*handle.lock().await);
            }
        }
    }

    /// Persists the completed session and sends the closing message.
    async fn finish<C, R>(
        &self,
        state: ProtocolState,
        session: &IntakeSession,
        channel: &mut C,
        rng: &mut R,
    ) -> ProtocolState
    where
        C: ConversationChannel + ?Sized,
        R: Rng + Send + ?Sized,
    {
        let Some(record) = session.to_record(Timestamp::now()) else {
            return abort(state, Stop::Incomplete, session);
        };

        if let Err(e) = self.sink.store(&record).await {
            tracing::error!(
                session_id = %session.id(),
                error = %e,
                "Failed to persist intake record"
            );
            // Best effort: the session ends either way.
            let _ = send(channel, &OutboundMessage::persistence_failed(&e)).await;
            return advance(state, ProtocolState::Aborted);
        }

        let known = session.fields().known();
        let closing = OutboundMessage::completed(
            self.questions.completion_message(&known, rng),
            session.fields().clone(),
        );
        if let Err(e) = send(channel, &closing).await {
            tracing::warn!(
                session_id = %session.id(),
                error = %e,
                "Record stored but completion message was not delivered"
            );
        }

        tracing::info!(
            session_id = %session.id(),
            turns = session.transcript().len(),
            "Intake completed"
        );
        advance(state, ProtocolState::Completed)
    }

    fn next_question<R>(&self, session: &IntakeSession, rng: &mut R) -> OutboundMessage
    where
        R: Rng + ?Sized,
    {
        let text = match session.current_field() {
            Some(field) => self
                .questions
                .question_for(field, &session.fields().known(), rng),
            None => self
                .questions
                .completion_message(&session.fields().known(), rng),
        };
        OutboundMessage::question(text)
    }
}

async fn send<C>(channel: &mut C, message: &OutboundMessage) -> Result<(), crate::ports::ChannelError>
where
    C: ConversationChannel + ?Sized,
{
    let json = message
        .to_json()
        .map_err(|e| crate::ports::ChannelError::Send(e.to_string()))?;
    channel.send(json).await
}

fn advance(state: ProtocolState, target: ProtocolState) -> ProtocolState {
    match state.transition_to(target) {
        Ok(next) => next,
        Err(e) => {
            tracing::error!(error = %e, "Invalid protocol transition");
            ProtocolState::Aborted
        }
    }
}

fn abort(state: ProtocolState, reason: Stop, session: &IntakeSession) -> ProtocolState {
    let reason = match reason {
        Stop::Disconnected => "disconnected",
        Stop::Incomplete => "record incomplete",
        Stop::Cancelled => "cancelled",
        Stop::SendFailed => "send failed",
    };
    tracing::info!(
        session_id = %session.id(),
        filled = session.fields().filled_count(),
        reason,
        "Intake aborted, nothing persisted"
    );
    advance(state, ProtocolState::Aborted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::InMemoryRecordSink;
    use crate::domain::intake::Field;
    use crate::ports::{ChannelError, Extraction, ExtractionError, ExtractionRequest, RecordSinkError};
    use crate::domain::intake::IntakeRecord;
    use async_trait::async_trait;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::Value;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Channel that replays scripted inbound messages, then reports closed.
    #[derive(Default)]
    struct ScriptedChannel {
        inbound: VecDeque<String>,
        outbound: Vec<String>,
        fail_sends: bool,
    }

    impl ScriptedChannel {
        fn with_inbound(messages: &[&str]) -> Self {
            Self {
                inbound: messages.iter().map(|m| m.to_string()).collect(),
                ..Default::default()
            }
        }

        fn sent(&self) -> Vec<Value> {
            self.outbound
                .iter()
                .map(|m| serde_json::from_str(m).unwrap())
                .collect()
        }
    }

    #[async_trait]
    impl ConversationChannel for ScriptedChannel {
        async fn receive(&mut self) -> Option<String> {
            self.inbound.pop_front()
        }

        async fn send(&mut self, text: String) -> Result<(), ChannelError> {
            if self.fail_sends {
                return Err(ChannelError::Closed);
            }
            self.outbound.push(text);
            Ok(())
        }
    }

    /// Extractor that replays scripted results.
    struct ScriptedExtractor {
        script: Mutex<VecDeque<Result<Extraction, ExtractionError>>>,
        requests: Mutex<Vec<ExtractionRequest>>,
    }

    impl ScriptedExtractor {
        fn new(script: Vec<Result<Extraction, ExtractionError>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn values(values: &[&str]) -> Arc<Self> {
            Self::new(
                values
                    .iter()
                    .map(|v| Ok(Extraction::Value(v.to_string())))
                    .collect(),
            )
        }
    }

    #[async_trait]
    impl FieldExtractor for ScriptedExtractor {
        async fn extract(&self, request: ExtractionRequest) -> Result<Extraction, ExtractionError> {
            self.requests.lock().unwrap().push(request);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(Extraction::Unclear))
        }
    }

    /// Extractor that never answers.
    struct StalledExtractor;

    #[async_trait]
    impl FieldExtractor for StalledExtractor {
        async fn extract(&self, _request: ExtractionRequest) -> Result<Extraction, ExtractionError> {
            futures::future::pending().await
        }
    }

    struct FailingSink;

    #[async_trait]
    impl RecordSink for FailingSink {
        async fn store(&self, _record: &IntakeRecord) -> Result<(), RecordSinkError> {
            Err(RecordSinkError::IoError("disk full".into()))
        }
    }

    const ANSWERS: [&str; 5] = [
        "Sarah Connor",
        "12 Elm Street",
        "Knee pain",
        "Hurts on stairs",
        "Possible strain",
    ];

    fn handler(
        extractor: Arc<dyn FieldExtractor>,
        sink: Arc<dyn RecordSink>,
    ) -> IntakeConversationHandler {
        IntakeConversationHandler::new(Arc::new(SessionRegistry::new()), extractor, sink)
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn is_variant_of(field: Field, text: &str, first_name: &str) -> bool {
        QuestionGenerator::variants(field)
            .iter()
            .any(|t| crate::domain::intake::render_template(t, first_name) == text)
    }

    #[tokio::test]
    async fn full_conversation_completes_and_persists() {
        let sink = InMemoryRecordSink::new();
        let handler = handler(ScriptedExtractor::values(&ANSWERS), Arc::new(sink.clone()));
        let mut channel = ScriptedChannel::with_inbound(&["a", "b", "c", "d", "e"]);

        let state = handler
            .handle(ConnectionId::new(), &mut channel, CancellationToken::new(), &mut rng())
            .await;

        assert_eq!(state, ProtocolState::Completed);
        let sent = channel.sent();
        assert_eq!(sent.len(), 6);

        let first = sent[0]["response"].as_str().unwrap();
        assert!(is_variant_of(Field::Name, first, ""));
        let second = sent[1]["response"].as_str().unwrap();
        assert!(is_variant_of(Field::Address, second, "Sarah"));

        let last = &sent[5];
        assert_eq!(last["isComplete"], Value::Bool(true));
        assert_eq!(last["data"]["name"], "Sarah Connor");
        assert_eq!(last["data"]["analysis"], "Possible strain");

        assert_eq!(sink.record_count().await, 1);
        assert_eq!(handler.registry().active_count().await, 0);
    }

    #[tokio::test]
    async fn unclear_answer_reasks_without_advancing() {
        let extractor = ScriptedExtractor::new(vec![
            Ok(Extraction::Unclear),
            Ok(Extraction::Value("Sarah".into())),
        ]);
        let handler = handler(extractor.clone(), Arc::new(InMemoryRecordSink::new()));
        let mut channel = ScriptedChannel::with_inbound(&["umm", "Sarah"]);

        let state = handler
            .handle(ConnectionId::new(), &mut channel, CancellationToken::new(), &mut rng())
            .await;

        assert_eq!(state, ProtocolState::Aborted);
        let sent = channel.sent();
        let clarification = sent[1]["response"].as_str().unwrap();
        assert!(QuestionGenerator::clarification_variants()
            .iter()
            .any(|v| *v == clarification));
        assert_eq!(sent[1]["isComplete"], Value::Bool(false));

        let requests = extractor.requests.lock().unwrap();
        assert_eq!(requests[0].target_field, Field::Name);
        assert_eq!(requests[1].target_field, Field::Name);
    }

    #[tokio::test]
    async fn extraction_failure_sends_error_and_stays_collecting() {
        let extractor = ScriptedExtractor::new(vec![
            Err(ExtractionError::Unavailable("503".into())),
            Ok(Extraction::Value("Sarah".into())),
        ]);
        let handler = handler(extractor, Arc::new(InMemoryRecordSink::new()));
        let mut channel = ScriptedChannel::with_inbound(&["Sarah", "Sarah"]);

        handler
            .handle(ConnectionId::new(), &mut channel, CancellationToken::new(), &mut rng())
            .await;

        let sent = channel.sent();
        assert_eq!(sent[1]["retryable"], Value::Bool(true));
        assert!(sent[1].get("error").is_some());
        assert!(sent[1].get("response").is_none());
        let next = sent[2]["response"].as_str().unwrap();
        assert!(is_variant_of(Field::Address, next, "Sarah"));
    }

    #[tokio::test]
    async fn disconnect_mid_conversation_persists_nothing() {
        let sink = InMemoryRecordSink::new();
        let handler = handler(ScriptedExtractor::values(&ANSWERS), Arc::new(sink.clone()));
        let mut channel = ScriptedChannel::with_inbound(&["a", "b"]);

        let state = handler
            .handle(ConnectionId::new(), &mut channel, CancellationToken::new(), &mut rng())
            .await;

        assert_eq!(state, ProtocolState::Aborted);
        assert_eq!(sink.record_count().await, 0);
        assert_eq!(handler.registry().active_count().await, 0);
    }

    #[tokio::test]
    async fn persistence_failure_reports_fatal_error() {
        let handler = handler(ScriptedExtractor::values(&ANSWERS), Arc::new(FailingSink));
        let mut channel = ScriptedChannel::with_inbound(&["a", "b", "c", "d", "e", "extra"]);

        let state = handler
            .handle(ConnectionId::new(), &mut channel, CancellationToken::new(), &mut rng())
            .await;

        assert_eq!(state, ProtocolState::Aborted);
        let sent = channel.sent();
        let last = sent.last().unwrap();
        assert_eq!(last["code"], "PERSISTENCE_FAILED");
        assert_eq!(last["retryable"], Value::Bool(false));
        assert_eq!(channel.inbound.len(), 1);
        assert_eq!(handler.registry().active_count().await, 0);
    }

    #[tokio::test]
    async fn failed_greeting_send_aborts() {
        let handler = handler(ScriptedExtractor::values(&ANSWERS), Arc::new(InMemoryRecordSink::new()));
        let mut channel = ScriptedChannel {
            fail_sends: true,
            ..ScriptedChannel::with_inbound(&["a"])
        };

        let state = handler
            .handle(ConnectionId::new(), &mut channel, CancellationToken::new(), &mut rng())
            .await;

        assert_eq!(state, ProtocolState::Aborted);
        assert_eq!(channel.inbound.len(), 1);
    }

    #[tokio::test]
    async fn cancellation_interrupts_stalled_extraction() {
        let handler = handler(Arc::new(StalledExtractor), Arc::new(InMemoryRecordSink::new()));
        let mut channel = ScriptedChannel::with_inbound(&["Sarah"]);
        let cancel = CancellationToken::new();

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let state = tokio::time::timeout(
            Duration::from_secs(5),
            handler.handle(ConnectionId::new(), &mut channel, cancel, &mut rng()),
        )
        .await
        .expect("loop should end once cancelled");

        assert_eq!(state, ProtocolState::Aborted);
        assert_eq!(handler.registry().active_count().await, 0);
    }

    #[tokio::test]
    async fn duplicate_connection_is_refused_without_touching_existing() {
        let handler = handler(ScriptedExtractor::values(&ANSWERS), Arc::new(InMemoryRecordSink::new()));
        let conn = ConnectionId::new();
        handler.registry().open(conn).await.unwrap();
        let mut channel = ScriptedChannel::with_inbound(&["a"]);

        let state = handler
            .handle(conn, &mut channel, CancellationToken::new(), &mut rng())
            .await;

        assert_eq!(state, ProtocolState::Aborted);
        assert!(channel.outbound.is_empty());
        assert!(handler.registry().get(&conn).await.is_some());
    }

    #[tokio::test]
    async fn envelope_text_reaches_extractor() {
        let extractor = ScriptedExtractor::values(&["Sarah"]);
        let handler = handler(extractor.clone(), Arc::new(InMemoryRecordSink::new()));
        let mut channel = ScriptedChannel::with_inbound(&[r#"{"transcript": "I'm Sarah"}"#]);

        handler
            .handle(ConnectionId::new(), &mut channel, CancellationToken::new(), &mut rng())
            .await;

        assert_eq!(extractor.requests.lock().unwrap()[0].text, "I'm Sarah");
    }
}
