//! Live session command.

use std::io::Write;
use std::path::Path;

use iftopwatch_core::{ControlAction, IftopSession, SessionEvent};

use crate::cli::{OutputFormat, Toggle};
use crate::error::CliError;
use crate::format::{SnapshotRecord, format_snapshot};
use crate::util::{load_settings, override_with};

/// Parameters for the watch command
pub struct WatchParams<'a> {
    pub interface: Option<String>,
    pub max_rows: Option<u16>,
    pub filter: Option<String>,
    pub binary: Option<String>,
    pub toggles: &'a [Toggle],
    pub keys: Option<&'a str>,
    pub format: OutputFormat,
    pub count: Option<usize>,
}

/// Watch command handler
pub fn cmd_watch(config_path: Option<&Path>, params: WatchParams<'_>) -> Result<(), CliError> {
    let mut settings = load_settings(config_path)?;
    override_with(&mut settings.interface, params.interface);
    override_with(&mut settings.max_rows, params.max_rows);
    override_with(&mut settings.filter, params.filter);
    override_with(&mut settings.binary, params.binary);
    settings.validate()?;

    let mut session = IftopSession::new(settings);
    let mut events = session.start()?;

    for &toggle in params.toggles {
        session.send(&ControlAction::from(toggle));
    }
    if let Some(keys) = params.keys {
        session.send_keystroke(keys);
    }

    let mut stdout = std::io::stdout().lock();
    let mut printed = 0usize;

    while let Some(event) = events.blocking_recv() {
        match event {
            SessionEvent::Snapshot {
                snapshot,
                received_at,
            } => {
                let record = SnapshotRecord {
                    received_at: Some(received_at),
                    snapshot: &snapshot,
                };
                writeln!(stdout, "{}", format_snapshot(&record, params.format)?)?;
                stdout.flush()?;

                printed += 1;
                if params.count.is_some_and(|limit| printed >= limit) {
                    tracing::debug!(printed, "Snapshot limit reached");
                    session.stop();
                    break;
                }
            }
            SessionEvent::MalformedFrame(e) => {
                tracing::warn!(error = %e, "Skipping malformed report");
            }
            SessionEvent::Error(e) => return Err(e.into()),
            SessionEvent::Stopped { exit_code } => {
                tracing::info!(exit_code, "iftop exited");
                break;
            }
        }
    }

    Ok(())
}
