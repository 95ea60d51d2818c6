//! Deterministic mock LLM client for tests and offline development.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::{Duration, sleep};

use crate::error::AiError;

use super::{CompletionRequest, LlmClient, TokenStream};

/// Characters per fragment when echoing without a script.
const ECHO_CHUNK_CHARS: usize = 4;

/// What a scripted step produces.
#[derive(Debug, Clone)]
pub enum MockStepKind {
    /// Emit a content fragment.
    Token(String),
    /// Fail the stream with an upstream error.
    Error(String),
    /// Never produce anything further; the stream stays open.
    Pending,
}

/// Scripted stream step with optional delay.
#[derive(Debug, Clone)]
pub struct MockStep {
    pub delay_ms: u64,
    pub kind: MockStepKind,
}

impl MockStep {
    pub fn token(text: impl Into<String>) -> Self {
        Self {
            delay_ms: 0,
            kind: MockStepKind::Token(text.into()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            delay_ms: 0,
            kind: MockStepKind::Error(message.into()),
        }
    }

    pub fn pending() -> Self {
        Self {
            delay_ms: 0,
            kind: MockStepKind::Pending,
        }
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }
}

/// A mock client driven by per-request scripts.
///
/// Each call to `complete_stream` consumes the next queued script. When the
/// queue is empty the client echoes the last user message in small fragments.
/// Requests are only kept after [`MockLlmClient::with_recording`].
#[derive(Debug, Clone, Default)]
pub struct MockLlmClient {
    model: String,
    scripts: Arc<Mutex<VecDeque<Vec<MockStep>>>>,
    requests: Option<Arc<Mutex<Vec<CompletionRequest>>>>,
}

impl MockLlmClient {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    /// Create a client whose first stream follows `steps`.
    pub fn from_steps(model: impl Into<String>, steps: Vec<MockStep>) -> Self {
        Self {
            model: model.into(),
            scripts: Arc::new(Mutex::new(VecDeque::from([steps]))),
            requests: None,
        }
    }

    /// Record every request for [`MockLlmClient::requests`].
    pub fn with_recording(mut self) -> Self {
        self.requests = Some(Arc::default());
        self
    }

    /// Queue a script for a later stream.
    pub async fn push_script(&self, steps: Vec<MockStep>) {
        self.scripts.lock().await.push_back(steps);
    }

    /// Requests received so far, oldest first. Empty unless recording.
    pub async fn requests(&self) -> Vec<CompletionRequest> {
        match &self.requests {
            Some(requests) => requests.lock().await.clone(),
            None => Vec::new(),
        }
    }

    fn echo_steps(request: &CompletionRequest) -> Vec<MockStep> {
        let text = request
            .last_user_text()
            .map(|content| format!("mock-echo: {}", content))
            .unwrap_or_else(|| "mock-ok".to_string());

        let chars: Vec<char> = text.chars().collect();
        chars
            .chunks(ECHO_CHUNK_CHARS)
            .map(|chunk| MockStep::token(chunk.iter().collect::<String>()))
            .collect()
    }
}

impl LlmClient for MockLlmClient {
    fn provider(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn complete_stream(&self, request: CompletionRequest) -> TokenStream {
        let scripts = self.scripts.clone();
        let requests = self.requests.clone();

        Box::pin(async_stream::stream! {
            let steps = match scripts.lock().await.pop_front() {
                Some(steps) => steps,
                None => Self::echo_steps(&request),
            };
            if let Some(requests) = &requests {
                requests.lock().await.push(request);
            }

            for step in steps {
                if step.delay_ms > 0 {
                    sleep(Duration::from_millis(step.delay_ms)).await;
                }
                match step.kind {
                    MockStepKind::Token(text) => yield Ok(text),
                    MockStepKind::Error(message) => {
                        yield Err(AiError::Llm(message));
                        return;
                    }
                    MockStepKind::Pending => {
                        std::future::pending::<()>().await;
                    }
                }
            }
        })
    }
}
