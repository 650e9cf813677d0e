//! Version check command.

use std::path::Path;

use iftopwatch_core::NativePtyHost;
use iftopwatch_core::session::probe_version;

use crate::error::CliError;
use crate::util::{load_settings, override_with};

/// Check command handler
pub fn cmd_check(config_path: Option<&Path>, binary: Option<String>) -> Result<(), CliError> {
    let mut settings = load_settings(config_path)?;
    override_with(&mut settings.binary, binary);

    let version = probe_version(
        &NativePtyHost,
        &settings.binary,
        &settings.supported_versions,
    )?;
    println!("{}: iftop {version} (supported)", settings.binary);
    Ok(())
}
