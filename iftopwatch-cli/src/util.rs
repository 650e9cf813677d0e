//! Shared utility functions used across command modules.

use std::path::Path;

use iftopwatch_core::SessionSettings;

use crate::error::CliError;

/// Loads settings from `--config`, or the default settings file if present
pub fn load_settings(config_path: Option<&Path>) -> Result<SessionSettings, CliError> {
    let settings = match config_path {
        Some(path) => SessionSettings::load(path)?,
        None => SessionSettings::load_default()?,
    };
    Ok(settings)
}

/// Applies `value` to `target` if given
pub fn override_with<T>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}
