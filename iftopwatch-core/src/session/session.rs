//! The iftop session facade

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::control::{ControlAction, ControlChannel};
use super::lock;
use super::pty::{NativePtyHost, ProcessHandle, PtyHost, SpawnRequest};
use super::reader::ReaderWorker;
use super::version::probe_version;
use crate::capture::{ParseError, Snapshot, StreamPipeline};
use crate::error::{SessionError, SessionResult};
use crate::settings::SessionSettings;
use crate::tracing::{field_names, span_names};

/// Events buffered between the reader thread and the caller
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Lifecycle of an [`IftopSession`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum SessionState {
    /// Created, nothing run yet
    Idle = 0,
    /// The binary reported a supported version
    VersionChecked = 1,
    /// iftop is running and output is being parsed
    Running = 2,
    /// Ended; a session never leaves this state
    Terminated = 3,
}

impl SessionState {
    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::VersionChecked,
            2 => Self::Running,
            _ => Self::Terminated,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::VersionChecked => write!(f, "version-checked"),
            Self::Running => write!(f, "running"),
            Self::Terminated => write!(f, "terminated"),
        }
    }
}

/// Something that happened in a running session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A complete report was parsed
    Snapshot {
        /// The parsed report
        snapshot: Snapshot,
        /// When the report was parsed
        received_at: DateTime<Utc>,
    },
    /// A report was cut out but could not be parsed; the session goes on
    MalformedFrame(ParseError),
    /// A fatal error ended the session
    Error(SessionError),
    /// The session ended; always the last event
    Stopped {
        /// Exit code, if the process was reaped normally
        exit_code: Option<u32>,
    },
}

/// Session state shared with the reader thread
#[derive(Debug, Clone)]
pub(crate) struct SharedState(Arc<AtomicU8>);

impl SharedState {
    fn new() -> Self {
        Self(Arc::new(AtomicU8::new(SessionState::Idle as u8)))
    }

    pub(crate) fn get(&self) -> SessionState {
        SessionState::from_u8(self.0.load(Ordering::SeqCst))
    }

    /// Moves to `next` unless already terminated; returns whether it moved
    pub(crate) fn advance(&self, next: SessionState) -> bool {
        self.0
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                (current != SessionState::Terminated as u8).then_some(next as u8)
            })
            .is_ok()
    }
}

/// The running child, shared between the facade and the reader thread
pub(crate) type SharedProcess = Arc<Mutex<Option<Box<dyn ProcessHandle>>>>;

/// Kills and reaps the process if it is still held; returns its exit code
pub(crate) fn shutdown_process(process: &SharedProcess) -> Option<u32> {
    let mut handle = lock(process).take()?;
    let pid = handle.process_id();
    if let Err(e) = handle.kill() {
        // Already exited on its own, the wait below still reaps it
        tracing::debug!(error = %e, pid, "Failed to kill iftop");
    }
    match handle.wait() {
        Ok(code) => Some(code),
        Err(e) => {
            tracing::warn!(error = %e, pid, "Failed to reap iftop");
            None
        }
    }
}

/// One monitored iftop process
///
/// ```no_run
/// use iftopwatch_core::{ControlAction, IftopSession, SessionEvent, SessionSettings};
///
/// let mut session = IftopSession::new(SessionSettings::new("eth0"));
/// let mut events = session.start()?;
/// session.send(&ControlAction::ToggleDnsResolution);
/// while let Some(event) = events.blocking_recv() {
///     if let SessionEvent::Snapshot { snapshot, .. } = event {
///         println!("{} flows", snapshot.flow_count());
///     }
/// }
/// # Ok::<(), iftopwatch_core::SessionError>(())
/// ```
pub struct IftopSession {
    settings: SessionSettings,
    host: Arc<dyn PtyHost>,
    state: SharedState,
    control: ControlChannel,
    process: SharedProcess,
    version: Option<String>,
}

impl fmt::Debug for IftopSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IftopSession")
            .field("interface", &self.settings.interface)
            .field("state", &self.state())
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl IftopSession {
    /// Creates an idle session that runs iftop in a native pty
    #[must_use]
    pub fn new(settings: SessionSettings) -> Self {
        Self::with_host(settings, Arc::new(NativePtyHost))
    }

    /// Creates an idle session that runs processes through `host`
    #[must_use]
    pub fn with_host(settings: SessionSettings, host: Arc<dyn PtyHost>) -> Self {
        Self {
            settings,
            host,
            state: SharedState::new(),
            control: ControlChannel::new(),
            process: Arc::new(Mutex::new(None)),
            version: None,
        }
    }

    /// Checks the iftop version, spawns it and starts parsing its output
    ///
    /// Events arrive on the returned receiver until [`SessionEvent::Stopped`].
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidState`] if the session is not idle.
    /// Version and spawn failures are returned as well and leave the session
    /// terminated.
    pub fn start(&mut self) -> SessionResult<mpsc::Receiver<SessionEvent>> {
        let state = self.state();
        if state != SessionState::Idle {
            return Err(SessionError::InvalidState(state));
        }

        let _span = crate::trace_operation!(
            span_names::SESSION_START,
            { field_names::INTERFACE } = %self.settings.interface,
            { field_names::BINARY } = %self.settings.binary
        )
        .entered();

        match self.launch() {
            Ok(events) => Ok(events),
            Err(e) => {
                tracing::error!(error = %e, "Failed to start iftop session");
                self.control.detach();
                shutdown_process(&self.process);
                self.state.advance(SessionState::Terminated);
                Err(e)
            }
        }
    }

    fn launch(&mut self) -> SessionResult<mpsc::Receiver<SessionEvent>> {
        self.settings
            .validate()
            .map_err(|e| SessionError::Spawn(e.to_string()))?;

        let version = probe_version(
            self.host.as_ref(),
            &self.settings.binary,
            &self.settings.supported_versions,
        )?;
        self.version = Some(version);
        self.state.advance(SessionState::VersionChecked);

        let request = SpawnRequest::iftop(&self.settings);
        let process = self.host.spawn(&request).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SessionError::ExecutableNotFound(self.settings.binary.clone())
            } else {
                SessionError::Spawn(e.to_string())
            }
        })?;

        tracing::info!({ field_names::PID } = process.handle.process_id(), "iftop running");
        self.control.attach(process.writer);
        *lock(&self.process) = Some(process.handle);

        let (events, receiver) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        self.state.advance(SessionState::Running);

        let worker = ReaderWorker {
            reader: process.reader,
            pipeline: StreamPipeline::iftop(),
            events,
            state: self.state.clone(),
            control: self.control.clone(),
            process: Arc::clone(&self.process),
        };
        std::thread::Builder::new()
            .name(format!("iftop-reader-{}", self.settings.interface))
            .spawn(move || worker.run())
            .map_err(|e| SessionError::Spawn(e.to_string()))?;

        Ok(receiver)
    }

    /// Sends a control action; a no-op unless the session is running
    pub fn send(&self, action: &ControlAction) {
        self.control.send(action);
    }

    /// Forwards `text` to iftop verbatim
    pub fn send_keystroke(&self, text: impl Into<String>) {
        self.send(&ControlAction::Keystroke(text.into()));
    }

    /// Toggles aggregation by source host
    pub fn toggle_source_aggregation(&self) {
        self.send(&ControlAction::ToggleSourceAggregation);
    }

    /// Toggles aggregation by destination host
    pub fn toggle_destination_aggregation(&self) {
        self.send(&ControlAction::ToggleDestinationAggregation);
    }

    /// Toggles DNS resolution
    pub fn toggle_dns_resolution(&self) {
        self.send(&ControlAction::ToggleDnsResolution);
    }

    /// Toggles port display
    pub fn toggle_port_display(&self) {
        self.send(&ControlAction::TogglePortDisplay);
    }

    /// Kills iftop and terminates the session
    ///
    /// The reader thread notices the closed terminal and publishes
    /// [`SessionEvent::Stopped`]. Calling this more than once is harmless.
    pub fn stop(&mut self) {
        let was = self.state();
        if lock(&self.process).is_none() {
            self.control.detach();
            self.state.advance(SessionState::Terminated);
            return;
        }

        let _span = crate::trace_operation!(span_names::SESSION_END, state = %was).entered();
        self.control.detach();
        let exit_code = shutdown_process(&self.process);
        self.state.advance(SessionState::Terminated);
        tracing::info!(exit_code, "iftop session stopped");
    }

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.get()
    }

    /// Version reported by the probe, once it has run
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// The settings this session was created with
    #[must_use]
    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// A handle to the control channel, usable from other threads
    #[must_use]
    pub fn control(&self) -> ControlChannel {
        self.control.clone()
    }
}

impl Drop for IftopSession {
    fn drop(&mut self) {
        self.stop();
    }
}
