//! Framing and parsing combined into one push-based stage
//!
//! The session reader feeds decoded output chunks into a [`StreamPipeline`]
//! and forwards whatever comes out. Offline replays (`iftopwatch parse`) use
//! the same stage, so live and recorded output take the same path.

use std::sync::Arc;

use super::framing::FrameBuffer;
use super::grammar::Grammar;
use super::parser::{EntryParser, ParseError};
use super::snapshot::Snapshot;
use crate::tracing::field_names;

/// Longest unfinished line carried over between chunks
const TAIL_LIMIT: usize = 512;

/// One result of feeding a chunk into the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutput {
    /// A frame parsed successfully
    Snapshot(Snapshot),
    /// A frame was cut out but did not parse
    MalformedFrame(ParseError),
    /// iftop reported that the capture device does not exist; contains the
    /// offending output line
    DeviceNotFound(String),
}

/// Frame buffer plus entry parser plus device error detection
#[derive(Debug, Clone)]
pub struct StreamPipeline {
    frames: FrameBuffer,
    parser: EntryParser,
    marker: String,
    /// Unfinished last line of the previous chunks
    tail: String,
    terminated: bool,
}

impl StreamPipeline {
    /// Creates a pipeline for `grammar`
    #[must_use]
    pub fn new(grammar: Arc<Grammar>) -> Self {
        Self {
            marker: grammar.device_error_marker().to_string(),
            frames: FrameBuffer::new(Arc::clone(&grammar)),
            parser: EntryParser::new(grammar),
            tail: String::new(),
            terminated: false,
        }
    }

    /// Creates a pipeline for the built-in iftop grammar
    #[must_use]
    pub fn iftop() -> Self {
        Self::new(Grammar::iftop())
    }

    /// Feeds one chunk of output.
    ///
    /// Once a device error has been reported the pipeline is terminated and
    /// every later chunk is ignored.
    pub fn ingest(&mut self, chunk: &str) -> Vec<PipelineOutput> {
        if self.terminated {
            return Vec::new();
        }

        if let Some(line) = self.device_error(chunk) {
            tracing::warn!(line = %line, "Capture device not found");
            self.terminated = true;
            self.frames.clear();
            self.tail.clear();
            return vec![PipelineOutput::DeviceNotFound(line)];
        }
        self.remember_tail(chunk);

        self.frames
            .ingest(chunk)
            .iter()
            .map(|frame| match self.parser.parse(frame) {
                Ok(snapshot) => {
                    tracing::debug!(
                        { field_names::FLOW_COUNT } = snapshot.flow_count(),
                        "Parsed iftop frame"
                    );
                    PipelineOutput::Snapshot(snapshot)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Dropping malformed iftop frame");
                    PipelineOutput::MalformedFrame(e)
                }
            })
            .collect()
    }

    /// Returns true once a device error has been seen
    #[must_use]
    pub const fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Bytes held in the frame buffer
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.frames.len()
    }

    /// Looks for the device marker in the previous tail plus `chunk` and
    /// returns the output line that contains it
    fn device_error(&self, chunk: &str) -> Option<String> {
        let window = format!("{}{chunk}", self.tail);
        let at = window.find(&self.marker)?;

        let start = window[..at].rfind('\n').map_or(0, |i| i + 1);
        let end = window[at..].find('\n').map_or(window.len(), |i| at + i);
        Some(window[start..end].trim().to_string())
    }

    /// Keeps the unfinished last line of the stream, so a marker split
    /// across chunks is still seen and reported with its whole line
    fn remember_tail(&mut self, chunk: &str) {
        self.tail.push_str(chunk);
        if let Some(newline) = self.tail.rfind('\n') {
            self.tail.drain(..=newline);
        }

        let keep = TAIL_LIMIT.max(self.marker.len());
        if self.tail.len() > keep {
            let mut cut = self.tail.len() - keep;
            while !self.tail.is_char_boundary(cut) {
                cut += 1;
            }
            self.tail.drain(..cut);
        }
    }
}
