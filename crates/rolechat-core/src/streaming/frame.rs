//! Event-stream wire framing.

use bytes::Bytes;

/// Sentinel payload that closes a successful stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// One unit written to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseFrame {
    /// Already-escaped reply text
    Data(String),
    /// Successful end of reply
    Done,
    /// Terminal upstream failure
    Error(String),
    /// Comment-only keep-alive
    Ping,
}

impl SseFrame {
    pub fn encode(&self) -> Bytes {
        match self {
            SseFrame::Data(text) => Bytes::from(format!("data: {}\n\n", text)),
            SseFrame::Done => Bytes::from(format!("data: {}\n\n", DONE_SENTINEL)),
            SseFrame::Error(message) => Bytes::from(format!(
                "event: error\ndata: {}\n\n",
                single_line(message)
            )),
            SseFrame::Ping => Bytes::from_static(b": ping\n\n"),
        }
    }
}

fn single_line(message: &str) -> String {
    message.replace("\r\n", " ").replace(['\n', '\r'], " ")
}
