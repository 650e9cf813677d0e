//! Session error types

use thiserror::Error;

use crate::session::SessionState;

/// Fatal errors of an iftop session
///
/// Every variant ends the session. Malformed frames are not fatal and are
/// reported through [`crate::capture::ParseError`] instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The version probe did not report a supported version
    #[error("Unsupported iftop version {}, supported: {}", .found.as_deref().unwrap_or("<unknown>"), .supported.join(", "))]
    UnsupportedVersion {
        /// Version reported by the binary, if the banner could be read
        found: Option<String>,
        /// The allow-list the probe was checked against
        supported: Vec<String>,
    },

    /// The iftop binary could not be found
    #[error("iftop executable not found: {0}")]
    ExecutableNotFound(String),

    /// iftop reported that the capture interface does not exist
    #[error("Capture device not found: {0}")]
    DeviceNotFound(String),

    /// The pty or the child process could not be set up
    #[error("Failed to spawn iftop: {0}")]
    Spawn(String),

    /// `start()` was called on a session that is no longer idle
    #[error("Session cannot be started from state {0}")]
    InvalidState(SessionState),
}

/// Result type for session operations
pub type SessionResult<T> = std::result::Result<T, SessionError>;
