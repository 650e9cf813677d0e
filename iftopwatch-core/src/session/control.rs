//! Keystroke control of a running iftop

use std::fmt;
use std::io::Write;
use std::sync::{Arc, Mutex};

use super::lock;
use crate::tracing::{field_names, span_names};

/// A display toggle or literal input for iftop
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ControlAction {
    /// Aggregate flows by source host (`s`)
    ToggleSourceAggregation,
    /// Aggregate flows by destination host (`d`)
    ToggleDestinationAggregation,
    /// Switch DNS resolution on or off (`n`)
    ToggleDnsResolution,
    /// Show or hide ports (`p`)
    TogglePortDisplay,
    /// Text forwarded verbatim
    Keystroke(String),
}

impl ControlAction {
    /// The exact bytes written to the process for this action
    #[must_use]
    pub fn keys(&self) -> &str {
        match self {
            Self::ToggleSourceAggregation => "s",
            Self::ToggleDestinationAggregation => "d",
            Self::ToggleDnsResolution => "n",
            Self::TogglePortDisplay => "p",
            Self::Keystroke(text) => text,
        }
    }
}

type SharedWriter = Arc<Mutex<Option<Box<dyn Write + Send>>>>;

/// Fire-and-forget writer to the process input
///
/// Clones share the same writer. Sending while nothing is attached does
/// nothing, and write failures are logged but never returned.
#[derive(Clone, Default)]
pub struct ControlChannel {
    writer: SharedWriter,
}

impl fmt::Debug for ControlChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlChannel")
            .field("attached", &self.is_attached())
            .finish()
    }
}

impl ControlChannel {
    /// Creates a detached channel
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes subsequent sends to `writer`
    pub fn attach(&self, writer: Box<dyn Write + Send>) {
        *lock(&self.writer) = Some(writer);
    }

    /// Drops the writer; later sends are no-ops
    pub fn detach(&self) {
        lock(&self.writer).take();
    }

    /// Returns true while a writer is attached
    #[must_use]
    pub fn is_attached(&self) -> bool {
        lock(&self.writer).is_some()
    }

    /// Writes the keys for `action` as a single write
    pub fn send(&self, action: &ControlAction) {
        let keys = action.keys();
        let mut guard = lock(&self.writer);
        let Some(writer) = guard.as_mut() else {
            tracing::debug!(keys, "No process attached, ignoring control input");
            return;
        };

        let _span = crate::trace_operation_debug!(span_names::CONTROL_SEND, keys).entered();
        if let Err(e) = writer
            .write_all(keys.as_bytes())
            .and_then(|()| writer.flush())
        {
            tracing::warn!(error = %e, { field_names::KEYS } = keys, "Failed to write control input");
        }
    }
}
