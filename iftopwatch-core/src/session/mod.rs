//! Running iftop and driving it
//!
//! [`IftopSession`] gates on the iftop version, runs the process in a pty
//! through a [`PtyHost`], and publishes [`SessionEvent`]s from a dedicated
//! reader thread. [`ControlChannel`] turns display toggles into keystrokes.

mod control;
mod pty;
mod reader;
#[allow(clippy::module_inception)]
mod session;
mod version;

use std::sync::{Mutex, MutexGuard, PoisonError};

pub use control::{ControlAction, ControlChannel};
pub use pty::{NativePtyHost, ProcessHandle, PtyHost, PtyProcess, SpawnRequest};
pub use reader::Utf8Decoder;
pub use session::{EVENT_CHANNEL_CAPACITY, IftopSession, SessionEvent, SessionState};
pub use version::{check_version, parse_version_banner, probe_version};

/// Locks `mutex`, recovering the data if a holder panicked
pub(crate) fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
