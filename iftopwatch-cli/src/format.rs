//! Snapshot output formatting.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use iftopwatch_core::Snapshot;
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::error::CliError;

/// A snapshot as printed by the CLI
#[derive(Debug, Serialize)]
pub struct SnapshotRecord<'a> {
    /// When the snapshot was parsed (live sessions only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received_at: Option<DateTime<Utc>>,
    /// The snapshot itself
    #[serde(flatten)]
    pub snapshot: &'a Snapshot,
}

/// Formats one snapshot for stdout
///
/// # Errors
///
/// Returns `CliError::Output` if JSON serialization fails.
pub fn format_snapshot(record: &SnapshotRecord<'_>, format: OutputFormat) -> Result<String, CliError> {
    match format {
        OutputFormat::Json => serde_json::to_string(record)
            .map_err(|e| CliError::Output(format!("Failed to serialize snapshot: {e}"))),
        OutputFormat::Text => Ok(format_text(record)),
    }
}

/// Formats a snapshot as a summary line followed by one line per flow
#[must_use]
pub fn format_text(record: &SnapshotRecord<'_>) -> String {
    let snapshot = record.snapshot;
    let mut output = String::new();

    if let Some(at) = record.received_at {
        let _ = write!(output, "{} ", at.format("%H:%M:%S"));
    }
    let _ = writeln!(
        output,
        "{} flows  send {}  receive {}  total {}  cumulative {}",
        snapshot.flow_count(),
        human_rate(snapshot.send.last_2s),
        human_rate(snapshot.receive.last_2s),
        human_rate(snapshot.combined.last_2s),
        human_bytes(snapshot.cumulative.total),
    );

    let source_width = snapshot
        .flows
        .iter()
        .map(|f| f.source.len())
        .max()
        .unwrap_or(0);
    let destination_width = snapshot
        .flows
        .iter()
        .map(|f| f.destination.len())
        .max()
        .unwrap_or(0);

    for flow in &snapshot.flows {
        let _ = writeln!(
            output,
            "  {:<source_width$} => {:<destination_width$}  {:>10} {:>10}  {:>8}",
            flow.source,
            flow.destination,
            human_rate(flow.sent.last_2s),
            human_rate(flow.received.last_2s),
            human_bytes(flow.total_cumulative()),
        );
    }

    output.trim_end().to_string()
}

/// Formats bits per second with decimal prefixes, as iftop does
#[must_use]
pub fn human_rate(bits: u64) -> String {
    format!("{}b", scaled(bits))
}

/// Formats a byte count with decimal prefixes
#[must_use]
pub fn human_bytes(bytes: u64) -> String {
    format!("{}B", scaled(bytes))
}

fn scaled(value: u64) -> String {
    const PREFIXES: [(u64, &str); 4] = [
        (1_000_000_000_000, "T"),
        (1_000_000_000, "G"),
        (1_000_000, "M"),
        (1_000, "K"),
    ];

    PREFIXES
        .iter()
        .find(|(factor, _)| value >= *factor)
        .map_or_else(
            || value.to_string(),
            |(factor, prefix)| format!("{:.2}{prefix}", value as f64 / *factor as f64),
        )
}
