//! Line-oriented decoding of upstream `text/event-stream` bodies.

use serde::Deserialize;

/// Splits a chunked byte body into lines.
///
/// Buffers raw bytes until a `\n` arrives so multi-byte characters split
/// across network chunks decode intact.
#[derive(Debug, Default)]
pub(crate) struct LineDecoder {
    buf: Vec<u8>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return every line it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let rest = self.buf.split_off(pos + 1);
            let line = std::mem::replace(&mut self.buf, rest);
            lines.push(decode_line(&line[..pos]));
        }
        lines
    }

    /// Flush a trailing line that lacked a terminator.
    pub fn finish(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.buf);
        Some(decode_line(&line))
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// What a single upstream line means for the token stream.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum DataLine {
    /// Not a data line, or a data line with nothing to emit
    Skip,
    /// `data: [DONE]`
    Done,
    /// Text fragments to forward, in order
    Text(Vec<String>),
}

#[derive(Deserialize)]
struct StreamResponse {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Deserialize, Default)]
struct StreamDelta {
    content: Option<String>,
}

/// Interpret one line of the upstream body.
///
/// Payloads that are not JSON are forwarded verbatim as text.
pub(crate) fn parse_line(line: &str) -> DataLine {
    if line.trim().is_empty() {
        return DataLine::Skip;
    }
    let Some(payload) = line.strip_prefix("data:") else {
        return DataLine::Skip;
    };
    let payload = payload.trim();
    if payload == "[DONE]" {
        return DataLine::Done;
    }
    if payload.is_empty() {
        return DataLine::Skip;
    }

    match serde_json::from_str::<StreamResponse>(payload) {
        Ok(parsed) => {
            let texts: Vec<String> = parsed
                .choices
                .into_iter()
                .filter_map(|c| c.delta.content)
                .filter(|c| !c.is_empty())
                .collect();
            if texts.is_empty() {
                DataLine::Skip
            } else {
                DataLine::Text(texts)
            }
        }
        Err(_) => DataLine::Text(vec![payload.to_string()]),
    }
}
