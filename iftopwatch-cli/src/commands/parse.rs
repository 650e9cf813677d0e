//! Offline transcript parsing command.

use std::io::{Read, Write};
use std::path::Path;

use iftopwatch_core::session::Utf8Decoder;
use iftopwatch_core::{PipelineOutput, SessionError, StreamPipeline};

use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::format::{SnapshotRecord, format_snapshot};

/// Parse command handler
pub fn cmd_parse(
    input: &Path,
    format: OutputFormat,
    chunk_size: usize,
    strict: bool,
) -> Result<(), CliError> {
    let bytes = read_input(input)?;

    let mut pipeline = StreamPipeline::iftop();
    let mut decoder = Utf8Decoder::new();
    let mut stdout = std::io::stdout().lock();
    let mut parsed = 0usize;
    let mut malformed = 0usize;

    for chunk in bytes.chunks(chunk_size.max(1)) {
        for output in pipeline.ingest(&decoder.decode(chunk)) {
            match output {
                PipelineOutput::Snapshot(snapshot) => {
                    let record = SnapshotRecord {
                        received_at: None,
                        snapshot: &snapshot,
                    };
                    writeln!(stdout, "{}", format_snapshot(&record, format)?)?;
                    parsed += 1;
                }
                PipelineOutput::MalformedFrame(e) => {
                    if strict {
                        return Err(CliError::Capture(format!(
                            "frame {} is malformed: {e}",
                            parsed + malformed + 1
                        )));
                    }
                    malformed += 1;
                }
                PipelineOutput::DeviceNotFound(line) => {
                    return Err(SessionError::DeviceNotFound(line).into());
                }
            }
        }
    }
    stdout.flush()?;

    tracing::info!(parsed, malformed, pending = pipeline.buffered_len(), "Transcript parsed");
    Ok(())
}

fn read_input(input: &Path) -> Result<Vec<u8>, CliError> {
    let mut bytes = Vec::new();
    if input == Path::new("-") {
        std::io::stdin().lock().read_to_end(&mut bytes)?;
    } else {
        bytes = std::fs::read(input)
            .map_err(|e| CliError::Capture(format!("Failed to read {}: {e}", input.display())))?;
    }
    Ok(bytes)
}
