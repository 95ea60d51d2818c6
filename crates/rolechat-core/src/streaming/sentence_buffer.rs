//! Flush policy for streamed reply text.

/// Default number of unsent characters that forces a flush.
pub const DEFAULT_FLUSH_THRESHOLD: usize = 12;

/// Characters that end a clause or sentence and trigger an early flush.
const BOUNDARY_CHARS: [char; 10] = ['。', '！', '？', '!', '?', '，', ',', '；', ';', '\n'];

/// Accumulates reply fragments and decides when unsent text goes out.
///
/// `flushed` is a byte offset into `text` that only moves forward and never
/// passes `text.len()`.
#[derive(Debug)]
pub struct SentenceBuffer {
    text: String,
    flushed: usize,
    threshold: usize,
}

impl Default for SentenceBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_FLUSH_THRESHOLD)
    }
}

impl SentenceBuffer {
    pub fn new(threshold: usize) -> Self {
        Self {
            text: String::new(),
            flushed: 0,
            threshold: threshold.max(1),
        }
    }

    pub fn push(&mut self, fragment: &str) {
        self.text.push_str(fragment);
    }

    /// Return the unsent segment if it should be sent now, escaped for the
    /// wire, and advance the cursor past it.
    pub fn consider(&mut self, force: bool) -> Option<String> {
        let unsent = &self.text[self.flushed..];
        if unsent.is_empty() {
            return None;
        }

        if !force && !self.ready(unsent) {
            return None;
        }

        let segment = escape_newlines(unsent);
        self.flushed = self.text.len();
        Some(segment)
    }

    fn ready(&self, unsent: &str) -> bool {
        if unsent.chars().count() >= self.threshold {
            return true;
        }
        unsent
            .chars()
            .next_back()
            .is_some_and(|c| BOUNDARY_CHARS.contains(&c))
    }

    /// Everything accumulated so far, sent or not.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Byte offset of the first unsent character.
    pub fn flushed(&self) -> usize {
        self.flushed
    }

    pub fn has_unsent(&self) -> bool {
        self.flushed < self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Accumulated length in characters.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Replace raw line breaks with the two-character sequence `\n`.
///
/// `\r\n` and a lone `\r` count as one break, so no CR reaches a `data:` line.
pub fn escape_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n").replace('\n', "\\n")
}
