//! `iftopwatch` Core Library
//!
//! Runs `iftop` in text mode inside a pseudo-terminal and turns its scrolling
//! output into typed snapshots of per-connection bandwidth.
//!
//! # Crate Structure
//!
//! - [`units`] - Normalization of magnitudes such as `1.2Mb` and `4.8KB`
//! - [`capture`] - Grammar, framing, and parsing of iftop reports
//! - [`session`] - Version gate, pty process, reader thread, and control keys
//! - [`settings`] - Session settings and their TOML file
//! - [`error`] - Fatal session errors
//! - [`tracing`] - Structured logging setup

#![warn(missing_docs)]

pub mod capture;
pub mod error;
pub mod session;
pub mod settings;
pub mod tracing;
pub mod units;

pub use capture::{
    EntryParser, FlowRecord, FrameBuffer, Grammar, GrammarError, GrammarSpec, IntervalRates,
    ParseError, ParseResult, PipelineOutput, Snapshot, StreamPipeline, Totals,
};
pub use error::{SessionError, SessionResult};
pub use session::{
    ControlAction, ControlChannel, IftopSession, NativePtyHost, ProcessHandle, PtyHost,
    PtyProcess, SessionEvent, SessionState, SpawnRequest,
};
pub use settings::{SessionSettings, SettingsError, SettingsResult, TerminalSettings};
pub use tracing::{
    TracingConfig, TracingError, TracingLevel, TracingOutput, TracingResult, init_tracing,
};
pub use units::{Quantity, UnitError, UnitKind, UnitResult, to_numeric};
