//! Incremental delivery of one streamed reply.
//!
//! - `sentence_buffer` - flush policy over accumulated fragments
//! - `frame` / `transport` - event-stream framing and the client channel
//! - `session` - the per-exchange event loop tying them to the upstream

pub mod frame;
pub mod sentence_buffer;
pub mod session;
pub mod transport;

use std::time::Duration;

use serde::Deserialize;

pub use frame::{DONE_SENTINEL, SseFrame};
pub use sentence_buffer::{DEFAULT_FLUSH_THRESHOLD, SentenceBuffer, escape_newlines};
pub use session::{SessionOutcome, SessionReport, StreamSession, UpstreamEvent};
pub use transport::{SseBody, SseTransport, sse_headers};

pub const DEFAULT_HEARTBEAT_SECS: u64 = 10;
pub const DEFAULT_HISTORY_LIMIT: usize = 30;

/// Tunables for streamed replies.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StreamSettings {
    /// Seconds between keep-alive comments
    pub heartbeat_secs: u64,
    /// Unsent characters that force a flush
    pub flush_threshold: usize,
    /// Persisted messages included in the prompt
    pub history_limit: usize,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            heartbeat_secs: DEFAULT_HEARTBEAT_SECS,
            flush_threshold: DEFAULT_FLUSH_THRESHOLD,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl StreamSettings {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs.max(1))
    }
}
