//! iftop version gate

use std::io;
use std::sync::LazyLock;

use regex::Regex;

use super::pty::PtyHost;
use crate::error::{SessionError, SessionResult};
use crate::tracing::{field_names, span_names};

/// `iftop -h` prints its usage followed by this line
static VERSION_BANNER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"iftop, version (\S+)\r?\n").expect("VERSION_BANNER regex is valid")
});

/// Extracts the version token from `iftop -h` output
#[must_use]
pub fn parse_version_banner(output: &str) -> Option<&str> {
    VERSION_BANNER
        .captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Checks probe output against the allow-list and returns the version
///
/// # Errors
///
/// Returns [`SessionError::UnsupportedVersion`] if there is no banner or the
/// version is not listed.
pub fn check_version(output: &str, supported: &[String]) -> SessionResult<String> {
    let found = parse_version_banner(output);
    match found {
        Some(version) if supported.iter().any(|s| s == version) => Ok(version.to_string()),
        _ => Err(SessionError::UnsupportedVersion {
            found: found.map(ToString::to_string),
            supported: supported.to_vec(),
        }),
    }
}

/// Runs `<binary> -h` through `host` and checks the reported version
///
/// # Errors
///
/// Returns [`SessionError::ExecutableNotFound`] if the binary does not exist
/// and [`SessionError::UnsupportedVersion`] for any other failure.
pub fn probe_version(host: &dyn PtyHost, binary: &str, supported: &[String]) -> SessionResult<String> {
    let _span = crate::trace_operation!(span_names::VERSION_PROBE, binary).entered();

    let output = host.probe(binary, &["-h"]).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            SessionError::ExecutableNotFound(binary.to_string())
        } else {
            tracing::warn!(error = %e, "Version probe failed");
            SessionError::UnsupportedVersion {
                found: None,
                supported: supported.to_vec(),
            }
        }
    })?;

    let version = check_version(&output, supported)?;
    tracing::info!({ field_names::VERSION } = %version, "Detected supported iftop version");
    Ok(version)
}
