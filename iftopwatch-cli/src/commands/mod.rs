//! Command handler modules for the CLI.

mod check;
mod parse;
mod watch;

use std::path::Path;

use crate::cli::Commands;
use crate::error::CliError;

/// Dispatch a CLI command to the appropriate handler.
pub fn dispatch(config_path: Option<&Path>, command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Watch {
            interface,
            max_rows,
            filter,
            binary,
            toggle,
            keys,
            format,
            count,
        } => watch::cmd_watch(
            config_path,
            watch::WatchParams {
                interface,
                max_rows,
                filter,
                binary,
                toggles: &toggle,
                keys: keys.as_deref(),
                format,
                count,
            },
        ),
        Commands::Parse {
            input,
            format,
            chunk_size,
            strict,
        } => parse::cmd_parse(&input, format, chunk_size as usize, strict),
        Commands::Check { binary } => check::cmd_check(config_path, binary),
    }
}
