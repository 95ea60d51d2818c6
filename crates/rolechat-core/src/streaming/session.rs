//! Session coordinator for one streamed exchange.

use std::sync::Arc;

use futures::StreamExt;
use rolechat_ai::{AiError, TokenStream};
use rolechat_traits::{ChatMessage, ChatRole, MessageStore};
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::StreamSettings;
use super::sentence_buffer::SentenceBuffer;
use super::transport::SseTransport;

/// One observation from the upstream token source.
#[derive(Debug)]
pub enum UpstreamEvent {
    Content(String),
    Error(AiError),
    Closed,
}

impl From<Option<Result<String, AiError>>> for UpstreamEvent {
    fn from(item: Option<Result<String, AiError>>) -> Self {
        match item {
            Some(Ok(text)) => UpstreamEvent::Content(text),
            Some(Err(err)) => UpstreamEvent::Error(err),
            None => UpstreamEvent::Closed,
        }
    }
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Completed,
    UpstreamFailed,
    ClientCancelled,
}

impl SessionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::UpstreamFailed => "upstream_failed",
            Self::ClientCancelled => "client_cancelled",
        }
    }
}

/// Summary of a finished session.
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub topic_id: u64,
    pub outcome: SessionOutcome,
    /// Characters received from upstream
    pub accumulated_chars: usize,
    /// The assistant message written for this session, if any
    pub persisted: Option<ChatMessage>,
}

/// Owns the buffer, transport and persistence for a single reply.
pub struct StreamSession {
    topic_id: u64,
    store: Arc<dyn MessageStore>,
    transport: SseTransport,
    buffer: SentenceBuffer,
    settings: StreamSettings,
    persisted: Option<ChatMessage>,
    persist_attempted: bool,
}

impl StreamSession {
    pub fn new(
        topic_id: u64,
        store: Arc<dyn MessageStore>,
        transport: SseTransport,
        settings: StreamSettings,
    ) -> Self {
        Self {
            topic_id,
            store,
            transport,
            buffer: SentenceBuffer::new(settings.flush_threshold),
            settings,
            persisted: None,
            persist_attempted: false,
        }
    }

    /// Drive the exchange until the upstream finishes, fails, or the client
    /// goes away (transport closed or `cancel` fired).
    pub async fn run(mut self, mut upstream: TokenStream, cancel: CancellationToken) -> SessionReport {
        let period = self.settings.heartbeat_interval();
        let mut heartbeat = interval_at(Instant::now() + period, period);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let transport = self.transport.clone();

        debug!(topic_id = self.topic_id, "Stream session started");

        let outcome = loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => break self.on_cancelled().await,
                _ = transport.closed() => break self.on_cancelled().await,
                item = upstream.next() => match UpstreamEvent::from(item) {
                    UpstreamEvent::Content(text) => self.on_content(&text),
                    UpstreamEvent::Closed => break self.on_closed().await,
                    UpstreamEvent::Error(err) => break self.on_error(err),
                },
                _ = heartbeat.tick() => {
                    self.transport.send_ping();
                }
            }
        };

        let report = SessionReport {
            topic_id: self.topic_id,
            outcome,
            accumulated_chars: self.buffer.char_count(),
            persisted: self.persisted,
        };
        info!(
            topic_id = report.topic_id,
            outcome = report.outcome.as_str(),
            chars = report.accumulated_chars,
            persisted = report.persisted.is_some(),
            "Stream session finished"
        );
        report
    }

    fn on_content(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.buffer.push(text);
        if let Some(segment) = self.buffer.consider(false) {
            self.transport.send_segment(segment);
        }
    }

    async fn on_closed(&mut self) -> SessionOutcome {
        if !self.buffer.is_empty() {
            self.persist().await;
        }
        if let Some(segment) = self.buffer.consider(true) {
            self.transport.send_segment(segment);
        }
        self.transport.send_done();
        SessionOutcome::Completed
    }

    fn on_error(&mut self, err: AiError) -> SessionOutcome {
        // Partial text is not persisted on upstream failure.
        if !self.buffer.is_empty() {
            warn!(
                topic_id = self.topic_id,
                dropped_chars = self.buffer.char_count(),
                "Dropping partial reply after upstream error"
            );
        }
        warn!(topic_id = self.topic_id, error = %err, "Upstream stream failed");
        self.transport.send_error(err.to_string());
        SessionOutcome::UpstreamFailed
    }

    async fn on_cancelled(&mut self) -> SessionOutcome {
        if self.buffer.has_unsent() {
            debug!(
                topic_id = self.topic_id,
                sent_bytes = self.buffer.flushed(),
                total_bytes = self.buffer.text().len(),
                "Client left with unsent text, persisting partial reply"
            );
            self.persist().await;
        }
        SessionOutcome::ClientCancelled
    }

    /// Write the accumulated text as the session's assistant message. Runs at
    /// most once per session; failures are logged, never sent to the client.
    async fn persist(&mut self) {
        if self.persist_attempted {
            return;
        }
        self.persist_attempted = true;

        match self
            .store
            .append_message(self.topic_id, ChatRole::Assistant, self.buffer.text())
            .await
        {
            Ok(message) => {
                debug!(topic_id = self.topic_id, message_id = message.id, "Persisted assistant reply");
                self.persisted = Some(message);
            }
            Err(err) => {
                error!(topic_id = self.topic_id, error = %err, "Failed to persist assistant reply");
            }
        }
    }
}
