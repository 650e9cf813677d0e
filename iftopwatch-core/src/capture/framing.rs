//! Framing engine for the scrolling iftop output
//!
//! iftop output arrives in chunks that are not aligned to lines, let alone
//! to reports. [`FrameBuffer`] accumulates the chunks and cuts complete
//! reports out of them: a report starts at the header marker and ends at the
//! separator marker. Everything before the last separator seen is dropped
//! once the reports in it have been emitted.

use std::sync::Arc;

use super::grammar::Grammar;

/// Accumulates raw output and yields complete frames
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    grammar: Arc<Grammar>,
    buffer: String,
}

impl FrameBuffer {
    /// Creates an empty buffer using `grammar` for its markers
    #[must_use]
    pub fn new(grammar: Arc<Grammar>) -> Self {
        Self {
            grammar,
            buffer: String::new(),
        }
    }

    /// Creates an empty buffer for the built-in iftop grammar
    #[must_use]
    pub fn iftop() -> Self {
        Self::new(Grammar::iftop())
    }

    /// Appends `chunk` and returns every frame completed by it, in order.
    ///
    /// A frame is the text from a header marker up to (excluding) the
    /// following separator. When no header precedes the last separator the
    /// buffer is kept as is and nothing is returned.
    pub fn ingest(&mut self, chunk: &str) -> Vec<String> {
        self.buffer.push_str(chunk);

        let Some(begin) = self.buffer.find(self.grammar.header_marker()) else {
            return Vec::new();
        };
        let Some(end) = self.buffer.rfind(self.grammar.frame_separator()) else {
            return Vec::new();
        };
        if begin >= end {
            return Vec::new();
        }

        let frames: Vec<String> = self.buffer[begin..end]
            .split(self.grammar.frame_separator())
            .filter(|candidate| self.grammar.is_frame_start(candidate))
            .map(str::to_owned)
            .collect();

        // Keep the last separator so a stale header before it can never pair up again
        self.buffer.drain(..end);

        tracing::trace!(
            frames = frames.len(),
            buffered = self.buffer.len(),
            "Framed iftop output"
        );
        frames
    }

    /// Unconsumed text
    #[must_use]
    pub fn pending(&self) -> &str {
        &self.buffer
    }

    /// Length of the unconsumed text in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true if nothing is buffered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Discards all buffered text
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
