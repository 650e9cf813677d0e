//! The iftop text-mode grammar, held as data
//!
//! Markers and patterns live in a [`GrammarSpec`] value; [`Grammar`] is the
//! compiled form shared by the framing engine and the entry parser. All
//! patterns are applied to text with carriage returns already removed.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Start of every report: the table header line
pub const HEADER_MARKER: &str = "   # Host name";

/// End of every report: a run of 92 `=` characters
pub const FRAME_SEPARATOR: &str =
    "============================================================================================";

/// Text iftop (via libpcap) prints when the capture interface does not exist
pub const DEVICE_NOT_FOUND_MARKER: &str = "No such device";

/// A rate magnitude, always in bits
const RATE: &str = r"([0-9.]+[KMGT]?b)";

/// A cumulative magnitude, always in bytes
const BYTES: &str = r"([0-9.]+[KMGT]?B)";

/// Errors raised while compiling a grammar
#[derive(Debug, Error)]
pub enum GrammarError {
    /// One of the patterns is not a valid regex
    #[error("Invalid {field} pattern: {source}")]
    InvalidPattern {
        /// Name of the offending field
        field: &'static str,
        /// The regex compilation error
        #[source]
        source: regex::Error,
    },

    /// A literal marker is empty
    #[error("Marker '{0}' must not be empty")]
    EmptyMarker(&'static str),
}

/// Markers and patterns describing one iftop report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarSpec {
    /// Literal that starts a report
    pub header_marker: String,
    /// Literal that ends a report
    pub frame_separator: String,
    /// Literal that signals a missing capture device
    pub device_error_marker: String,
    /// Regex the first non-blank line of a report must match
    pub table_header: String,
    /// Regex for the rule lines between table and summary sections
    pub section_rule: String,
    /// Regex for the row index that starts every flow row
    pub row_index: String,
    /// Regex for one flow row body (source line plus destination line)
    pub flow_row: String,
    /// Regex for the send/receive/combined rate summary
    pub rate_summary: String,
    /// Regex for the peak and cumulative summary
    pub peak_summary: String,
}

impl GrammarSpec {
    /// The grammar of `iftop -t` (tested against 1.0pre4)
    #[must_use]
    pub fn iftop() -> Self {
        Self {
            header_marker: HEADER_MARKER.to_string(),
            frame_separator: FRAME_SEPARATOR.to_string(),
            device_error_marker: DEVICE_NOT_FOUND_MARKER.to_string(),
            table_header: r"^ {3,4}# Host".to_string(),
            // iftop draws 92 dashes; wider rules are accepted as well
            section_rule: r"(?m)^-{92,}[ \t]*$".to_string(),
            row_index: r"(?m)^(?: {3}\d| {2}\d{2}| \d{3}|\d{4}) ".to_string(),
            flow_row: format!(
                r"^(\S+)\s+=>\s+{RATE}\s+{RATE}\s+{RATE}\s+{BYTES}[ \t]*\n[ \t]+(\S+)\s+<=\s+{RATE}\s+{RATE}\s+{RATE}\s+{BYTES}\s*$"
            ),
            rate_summary: format!(
                r"Total send rate:\s+{RATE}\s+{RATE}\s+{RATE}\s+Total receive rate:\s+{RATE}\s+{RATE}\s+{RATE}\s+Total send and receive rate:\s+{RATE}\s+{RATE}\s+{RATE}"
            ),
            peak_summary: format!(
                r"Peak rate \(sent/received/total\):\s+{RATE}\s+{RATE}\s+{RATE}\s+Cumulative \(sent/received/total\):\s+{BYTES}\s+{BYTES}\s+{BYTES}"
            ),
        }
    }
}

impl Default for GrammarSpec {
    fn default() -> Self {
        Self::iftop()
    }
}

/// Built-in iftop grammar, compiled once per process
static IFTOP_GRAMMAR: LazyLock<Arc<Grammar>> = LazyLock::new(|| {
    Arc::new(Grammar::compile(GrammarSpec::iftop()).expect("built-in iftop grammar is valid"))
});

/// A compiled [`GrammarSpec`]
#[derive(Debug, Clone)]
pub struct Grammar {
    spec: GrammarSpec,
    table_header: Regex,
    section_rule: Regex,
    row_index: Regex,
    flow_row: Regex,
    rate_summary: Regex,
    peak_summary: Regex,
}

impl Grammar {
    /// Compiles all patterns of `spec`
    ///
    /// # Errors
    ///
    /// Returns [`GrammarError`] if a marker is empty or a pattern does not compile.
    pub fn compile(spec: GrammarSpec) -> Result<Self, GrammarError> {
        for (field, marker) in [
            ("header_marker", &spec.header_marker),
            ("frame_separator", &spec.frame_separator),
            ("device_error_marker", &spec.device_error_marker),
        ] {
            if marker.is_empty() {
                return Err(GrammarError::EmptyMarker(field));
            }
        }

        let compile = |field: &'static str, pattern: &str| {
            Regex::new(pattern).map_err(|source| GrammarError::InvalidPattern { field, source })
        };

        Ok(Self {
            table_header: compile("table_header", &spec.table_header)?,
            section_rule: compile("section_rule", &spec.section_rule)?,
            row_index: compile("row_index", &spec.row_index)?,
            flow_row: compile("flow_row", &spec.flow_row)?,
            rate_summary: compile("rate_summary", &spec.rate_summary)?,
            peak_summary: compile("peak_summary", &spec.peak_summary)?,
            spec,
        })
    }

    /// Shared handle to the built-in iftop grammar
    #[must_use]
    pub fn iftop() -> Arc<Self> {
        Arc::clone(&IFTOP_GRAMMAR)
    }

    /// The source spec
    #[must_use]
    pub fn spec(&self) -> &GrammarSpec {
        &self.spec
    }

    /// Literal that starts a report
    #[must_use]
    pub fn header_marker(&self) -> &str {
        &self.spec.header_marker
    }

    /// Literal that ends a report
    #[must_use]
    pub fn frame_separator(&self) -> &str {
        &self.spec.frame_separator
    }

    /// Literal that signals a missing capture device
    #[must_use]
    pub fn device_error_marker(&self) -> &str {
        &self.spec.device_error_marker
    }

    /// Returns true if the first non-blank line of `candidate` is a table header
    #[must_use]
    pub fn is_frame_start(&self, candidate: &str) -> bool {
        candidate
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .find(|line| !line.trim().is_empty())
            .is_some_and(|line| self.table_header.is_match(line))
    }

    pub(crate) fn section_rule(&self) -> &Regex {
        &self.section_rule
    }

    pub(crate) fn row_index(&self) -> &Regex {
        &self.row_index
    }

    pub(crate) fn flow_row(&self) -> &Regex {
        &self.flow_row
    }

    pub(crate) fn rate_summary(&self) -> &Regex {
        &self.rate_summary
    }

    pub(crate) fn peak_summary(&self) -> &Regex {
        &self.peak_summary
    }
}
