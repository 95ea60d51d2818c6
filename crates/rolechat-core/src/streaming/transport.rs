//! Client-facing event-stream transport.

use bytes::Bytes;
use http::header::{CACHE_CONTROL, CONNECTION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use super::frame::SseFrame;

/// Response headers for a streamed reply, set before any frame is written.
pub fn sse_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/event-stream; charset=utf-8"),
    );
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache, no-transform"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(
        HeaderName::from_static("x-accel-buffering"),
        HeaderValue::from_static("no"),
    );
    headers
}

/// Body side of the transport: every encoded frame, in send order.
pub type SseBody = UnboundedReceiverStream<Bytes>;

/// Sending half of a streamed response.
///
/// Frames are queued without waiting on the client, so a slow reader never
/// stalls the upstream. Once the body is dropped (client gone) sends fail
/// and [`SseTransport::closed`] resolves.
#[derive(Debug, Clone)]
pub struct SseTransport {
    tx: mpsc::UnboundedSender<Bytes>,
}

impl SseTransport {
    pub fn channel() -> (Self, SseBody) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, UnboundedReceiverStream::new(rx))
    }

    /// Queue a frame. Returns `false` when the client has gone away.
    pub fn send(&self, frame: SseFrame) -> bool {
        self.tx.send(frame.encode()).is_ok()
    }

    pub fn send_segment(&self, segment: String) -> bool {
        self.send(SseFrame::Data(segment))
    }

    pub fn send_done(&self) -> bool {
        self.send(SseFrame::Done)
    }

    pub fn send_error(&self, message: impl Into<String>) -> bool {
        self.send(SseFrame::Error(message.into()))
    }

    pub fn send_ping(&self) -> bool {
        self.send(SseFrame::Ping)
    }

    /// Resolves once the client side of the stream has been dropped.
    pub async fn closed(&self) {
        self.tx.closed().await
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
