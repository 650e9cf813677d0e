//! Pseudo-terminal hosting of the iftop process
//!
//! iftop only produces its text-mode output when attached to a terminal, so
//! the process runs inside a pty. The [`PtyHost`] trait is the seam between
//! the session and the operating system; tests substitute a scripted host.

use std::fmt;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use portable_pty::{Child, ChildKiller, CommandBuilder, MasterPty, PtySize, native_pty_system};

use crate::settings::SessionSettings;

/// Everything needed to launch a process in a pty
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnRequest {
    /// Program name or path
    pub program: String,
    /// Arguments
    pub args: Vec<String>,
    /// Terminal width
    pub cols: u16,
    /// Terminal height
    pub rows: u16,
    /// Value of `TERM`
    pub term: String,
    /// Working directory, inherited when `None`
    pub cwd: Option<PathBuf>,
}

impl SpawnRequest {
    /// Text-mode iftop as configured by `settings`, started in `$HOME`
    #[must_use]
    pub fn iftop(settings: &SessionSettings) -> Self {
        Self {
            program: settings.binary.clone(),
            args: settings.spawn_args(),
            cols: settings.terminal.cols,
            rows: settings.terminal.rows,
            term: settings.terminal.term.clone(),
            cwd: dirs::home_dir(),
        }
    }
}

/// Lifecycle control of a spawned process
pub trait ProcessHandle: Send {
    /// OS process id, if known
    fn process_id(&self) -> Option<u32>;

    /// Terminates the process
    ///
    /// # Errors
    ///
    /// Returns the OS error if the signal could not be delivered.
    fn kill(&mut self) -> io::Result<()>;

    /// Blocks until the process exits and returns its exit code
    ///
    /// # Errors
    ///
    /// Returns the OS error if the process could not be reaped.
    fn wait(&mut self) -> io::Result<u32>;
}

/// A process running in a pty
pub struct PtyProcess {
    /// Terminal output
    pub reader: Box<dyn Read + Send>,
    /// Terminal input
    pub writer: Box<dyn Write + Send>,
    /// The child itself
    pub handle: Box<dyn ProcessHandle>,
}

impl fmt::Debug for PtyProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PtyProcess")
            .field("pid", &self.handle.process_id())
            .finish_non_exhaustive()
    }
}

/// Runs programs, either plainly (for probes) or inside a pty
pub trait PtyHost: Send + Sync {
    /// Runs `program` to completion and returns its stdout
    ///
    /// # Errors
    ///
    /// Returns [`io::ErrorKind::NotFound`] if the program does not exist, or
    /// any other error from launching it.
    fn probe(&self, program: &str, args: &[&str]) -> io::Result<String>;

    /// Starts `request` inside a new pty
    ///
    /// # Errors
    ///
    /// Returns [`io::ErrorKind::NotFound`] if the program does not exist, or
    /// any other error from setting up the pty.
    fn spawn(&self, request: &SpawnRequest) -> io::Result<PtyProcess>;
}

/// [`PtyHost`] backed by the operating system's pty implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct NativePtyHost;

impl PtyHost for NativePtyHost {
    fn probe(&self, program: &str, args: &[&str]) -> io::Result<String> {
        let output = Command::new(program).args(args).output()?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn spawn(&self, request: &SpawnRequest) -> io::Result<PtyProcess> {
        let program = resolve_program(&request.program)?;

        let pair = native_pty_system()
            .openpty(PtySize {
                rows: request.rows,
                cols: request.cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(pty_error)?;

        let mut cmd = CommandBuilder::new(&program);
        cmd.args(&request.args);
        for (key, value) in std::env::vars_os() {
            cmd.env(key, value);
        }
        cmd.env("TERM", &request.term);
        if let Some(cwd) = &request.cwd {
            cmd.cwd(cwd);
        }

        let child = pair.slave.spawn_command(cmd).map_err(pty_error)?;
        // The child holds its own copy; ours would keep the pty open after exit
        drop(pair.slave);

        let reader = pair.master.try_clone_reader().map_err(pty_error)?;
        let writer = pair.master.take_writer().map_err(pty_error)?;

        tracing::debug!(
            program = %program.display(),
            pid = child.process_id(),
            "Spawned process in pty"
        );

        Ok(PtyProcess {
            reader,
            writer,
            handle: Box::new(NativeProcess {
                child,
                _master: pair.master,
            }),
        })
    }
}

/// A pty child plus the master side that keeps its terminal alive
struct NativeProcess {
    child: Box<dyn Child + Send + Sync>,
    _master: Box<dyn MasterPty + Send>,
}

impl ProcessHandle for NativeProcess {
    fn process_id(&self) -> Option<u32> {
        self.child.process_id()
    }

    fn kill(&mut self) -> io::Result<()> {
        ChildKiller::kill(self.child.as_mut())
    }

    fn wait(&mut self) -> io::Result<u32> {
        self.child.wait().map(|status| status.exit_code())
    }
}

fn pty_error(e: impl fmt::Display) -> io::Error {
    io::Error::other(e.to_string())
}

/// Resolves `program` the way a shell would, so a missing binary is reported
/// as [`io::ErrorKind::NotFound`] before a pty is opened
fn resolve_program(program: &str) -> io::Result<PathBuf> {
    let not_found = || io::Error::new(io::ErrorKind::NotFound, format!("{program}: not found"));

    if program.contains(std::path::MAIN_SEPARATOR) {
        let path = Path::new(program);
        return if path.is_file() {
            Ok(path.to_path_buf())
        } else {
            Err(not_found())
        };
    }

    std::env::var_os("PATH")
        .and_then(|paths| {
            std::env::split_paths(&paths)
                .map(|dir| dir.join(program))
                .find(|candidate| candidate.is_file())
        })
        .ok_or_else(not_found)
}
