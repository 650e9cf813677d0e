//! The per-session reader thread

use std::io::{ErrorKind, Read};

use chrono::Utc;
use tokio::sync::mpsc;

use super::control::ControlChannel;
use super::session::{SessionEvent, SessionState, SharedProcess, SharedState, shutdown_process};
use crate::capture::{PipelineOutput, StreamPipeline};
use crate::error::SessionError;
use crate::tracing::span_names;

/// Size of a single pty read
const READ_BUFFER_SIZE: usize = 4096;

/// Incremental UTF-8 decoder
///
/// Holds back an incomplete multi-byte sequence at the end of a read until
/// the rest of it arrives. Invalid bytes become U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    /// Creates an empty decoder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes `bytes` together with whatever was held back
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);

        let mut text = String::with_capacity(self.pending.len());
        let mut rest = self.pending.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    text.push_str(valid);
                    rest = &[];
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    text.push_str(&String::from_utf8_lossy(valid));
                    match e.error_len() {
                        Some(len) => {
                            text.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        None => {
                            rest = after;
                            break;
                        }
                    }
                }
            }
        }

        self.pending = rest.to_vec();
        text
    }

    /// Number of bytes held back
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

/// Reads pty output, runs it through the pipeline and publishes events
pub(crate) struct ReaderWorker {
    pub(crate) reader: Box<dyn Read + Send>,
    pub(crate) pipeline: StreamPipeline,
    pub(crate) events: mpsc::Sender<SessionEvent>,
    pub(crate) state: SharedState,
    pub(crate) control: ControlChannel,
    pub(crate) process: SharedProcess,
}

impl ReaderWorker {
    /// Runs until end of output, a device error, or a closed event channel
    pub(crate) fn run(mut self) {
        let mut decoder = Utf8Decoder::new();
        let mut buf = [0u8; READ_BUFFER_SIZE];

        loop {
            let n = match self.reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    // Linux reports EIO on the master once the child side closes
                    tracing::debug!(error = %e, "pty read ended");
                    break;
                }
            };

            let text = decoder.decode(&buf[..n]);
            let outputs = {
                let _span =
                    crate::trace_operation_debug!(span_names::FRAME_PARSE, bytes = n).entered();
                self.pipeline.ingest(&text)
            };

            for output in outputs {
                let fatal = matches!(output, PipelineOutput::DeviceNotFound(_));
                let event = match output {
                    PipelineOutput::Snapshot(snapshot) => SessionEvent::Snapshot {
                        snapshot,
                        received_at: Utc::now(),
                    },
                    PipelineOutput::MalformedFrame(e) => SessionEvent::MalformedFrame(e),
                    PipelineOutput::DeviceNotFound(line) => {
                        SessionEvent::Error(SessionError::DeviceNotFound(line))
                    }
                };

                if self.events.blocking_send(event).is_err() {
                    tracing::debug!("Event receiver dropped, stopping session");
                    self.terminate();
                    return;
                }
                if fatal {
                    let exit_code = self.terminate();
                    let _ = self.events.blocking_send(SessionEvent::Stopped { exit_code });
                    return;
                }
            }
        }

        let exit_code = self.reap();
        self.state.advance(SessionState::Terminated);
        tracing::info!(exit_code, "iftop session ended");
        let _ = self.events.blocking_send(SessionEvent::Stopped { exit_code });
    }

    /// Kills the process and marks the session terminated
    fn terminate(&self) -> Option<u32> {
        self.control.detach();
        let exit_code = shutdown_process(&self.process);
        self.state.advance(SessionState::Terminated);
        exit_code
    }

    /// Collects the exit code of a process that ended on its own
    fn reap(&self) -> Option<u32> {
        self.control.detach();
        let handle = super::lock(&self.process).take();
        handle.and_then(|mut handle| match handle.wait() {
            Ok(code) => Some(code),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to reap iftop");
                None
            }
        })
    }
}
