//! CLI error types and exit codes.

use iftopwatch_core::SessionError;

/// Exit codes for CLI operations
pub mod exit_codes {
    /// General error - settings, I/O, or output errors
    pub const GENERAL_ERROR: i32 = 1;
    /// iftop could not be run or its output could not be parsed
    pub const SESSION_FAILURE: i32 = 2;
}

/// CLI error type
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Settings error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The iftop session failed
    #[error("{0}")]
    Session(#[from] SessionError),

    /// Captured output could not be parsed
    #[error("Capture error: {0}")]
    Capture(String),

    /// Writing results failed
    #[error("Output error: {0}")]
    Output(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<iftopwatch_core::SettingsError> for CliError {
    fn from(err: iftopwatch_core::SettingsError) -> Self {
        Self::Config(err.to_string())
    }
}

impl CliError {
    /// Returns the appropriate exit code for this error type.
    ///
    /// - 1: General error (settings, output, IO)
    /// - 2: Session or capture failure
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Session(_) | Self::Capture(_) => exit_codes::SESSION_FAILURE,
            Self::Config(_) | Self::Output(_) | Self::Io(_) => exit_codes::GENERAL_ERROR,
        }
    }
}
