//! Session settings
//!
//! Stored as TOML (by default in `~/.config/iftopwatch/config.toml`):
//!
//! ```toml
//! interface = "eth0"
//! max_rows = 20
//!
//! [terminal]
//! cols = 160
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Binary looked up on `PATH` when no path is configured
pub const DEFAULT_BINARY: &str = "iftop";

/// Capture filter excluding broadcast and multicast traffic
pub const DEFAULT_FILTER: &str =
    "not ether host ff:ff:ff:ff:ff:ff and not net 239.0.0.0/8 and not net 224.0.0.0/8";

/// Rows per report when not configured
pub const DEFAULT_MAX_ROWS: u16 = 10;

/// Upper bound for the row limit
pub const MAX_ROWS: u16 = 500;

/// iftop versions whose text output is known to match the grammar
pub const SUPPORTED_VERSIONS: &[&str] = &["1.0pre4"];

/// Default pty width
pub const TERMINAL_COLS: u16 = 120;

/// Default pty height
pub const TERMINAL_ROWS: u16 = 60;

/// Default `TERM` for the pty
pub const TERMINAL_NAME: &str = "xterm-color";

/// Errors raised while loading settings
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file could not be read
    #[error("Failed to read settings from {path}: {source}")]
    Io {
        /// File that was read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid TOML for [`SessionSettings`]
    #[error("Invalid settings: {0}")]
    Parse(#[from] toml::de::Error),

    /// No capture interface was given
    #[error("No capture interface configured")]
    MissingInterface,
}

/// Result type for settings operations
pub type SettingsResult<T> = std::result::Result<T, SettingsError>;

/// Geometry and terminal type of the pty iftop runs in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalSettings {
    /// Columns (default: 120)
    #[serde(default = "default_cols")]
    pub cols: u16,
    /// Rows (default: 60)
    #[serde(default = "default_rows")]
    pub rows: u16,
    /// Value of `TERM` (default: `xterm-color`)
    #[serde(default = "default_term")]
    pub term: String,
}

const fn default_cols() -> u16 {
    TERMINAL_COLS
}

const fn default_rows() -> u16 {
    TERMINAL_ROWS
}

fn default_term() -> String {
    TERMINAL_NAME.to_string()
}

impl Default for TerminalSettings {
    fn default() -> Self {
        Self {
            cols: default_cols(),
            rows: default_rows(),
            term: default_term(),
        }
    }
}

/// Everything needed to run one iftop session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    /// iftop binary, a name resolved on `PATH` or a path
    #[serde(default = "default_binary")]
    pub binary: String,
    /// Capture interface, passed as `-i`
    #[serde(default)]
    pub interface: String,
    /// Rows per report, passed as `-L` (1–500, default: 10)
    #[serde(default = "default_max_rows")]
    pub max_rows: u16,
    /// pcap filter expression, passed as `-f`
    #[serde(default = "default_filter")]
    pub filter: String,
    /// Versions accepted by the version probe
    #[serde(default = "default_supported_versions")]
    pub supported_versions: Vec<String>,
    /// pty settings
    #[serde(default)]
    pub terminal: TerminalSettings,
}

fn default_binary() -> String {
    DEFAULT_BINARY.to_string()
}

const fn default_max_rows() -> u16 {
    DEFAULT_MAX_ROWS
}

fn default_filter() -> String {
    DEFAULT_FILTER.to_string()
}

fn default_supported_versions() -> Vec<String> {
    SUPPORTED_VERSIONS.iter().map(ToString::to_string).collect()
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            interface: String::new(),
            max_rows: default_max_rows(),
            filter: default_filter(),
            supported_versions: default_supported_versions(),
            terminal: TerminalSettings::default(),
        }
    }
}

impl SessionSettings {
    /// Creates default settings for `interface`
    #[must_use]
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            ..Self::default()
        }
    }

    /// Sets the iftop binary
    #[must_use]
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Sets the row limit
    #[must_use]
    pub const fn with_max_rows(mut self, max_rows: u16) -> Self {
        self.max_rows = max_rows;
        self
    }

    /// Sets the capture filter
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    /// Replaces the version allow-list
    #[must_use]
    pub fn with_supported_versions<I, S>(mut self, versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.supported_versions = versions.into_iter().map(Into::into).collect();
        self
    }

    /// Returns the row limit clamped to 1–500
    #[must_use]
    pub const fn effective_max_rows(&self) -> u16 {
        if self.max_rows == 0 {
            1
        } else if self.max_rows > MAX_ROWS {
            MAX_ROWS
        } else {
            self.max_rows
        }
    }

    /// Command line for text mode: `-i <iface> -t -L <rows> -p -f <filter> -N`
    #[must_use]
    pub fn spawn_args(&self) -> Vec<String> {
        vec![
            "-i".to_string(),
            self.interface.clone(),
            "-t".to_string(),
            "-L".to_string(),
            self.effective_max_rows().to_string(),
            "-p".to_string(),
            "-f".to_string(),
            self.filter.clone(),
            "-N".to_string(),
        ]
    }

    /// Checks that the settings can start a session
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::MissingInterface`] if no interface is set.
    pub fn validate(&self) -> SettingsResult<()> {
        if self.interface.trim().is_empty() {
            return Err(SettingsError::MissingInterface);
        }
        Ok(())
    }

    /// Parses settings from TOML
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Parse`] on invalid TOML or field types.
    pub fn from_toml_str(text: &str) -> SettingsResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Loads settings from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> SettingsResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "Loaded session settings");
        Ok(settings)
    }

    /// Loads the default settings file if it exists, defaults otherwise
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_default() -> SettingsResult<Self> {
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// `<config dir>/iftopwatch/config.toml`
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("iftopwatch").join("config.toml"))
    }
}
