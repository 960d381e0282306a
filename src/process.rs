//! Centralized command execution with consistent error handling.
//!
//! Every collaborator tool (dpkg-query, dpkg-repack, apt-ftparchive,
//! debootstrap) goes through [`Cmd`], so failures always surface as
//! [`Error::ToolNotFound`] or [`Error::ToolFailed`] with the captured stderr.
//!
//! Privilege is not ambient state. A [`Privilege`] value is threaded to every
//! call site that needs root and decides there whether the command runs
//! directly or under `fakeroot`/`fakechroot`.

use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use tracing::debug;

use crate::config::Tools;
use crate::error::{Error, Result};

/// Result of a command execution.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit status of the command.
    pub status: ExitStatus,
    /// Captured stdout as a string.
    pub stdout: String,
    /// Captured stderr as a string.
    pub stderr: String,
}

impl CommandResult {
    /// Returns true if the command exited successfully.
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Get the exit code, or -1 if terminated by signal.
    pub fn code(&self) -> i32 {
        self.status.code().unwrap_or(-1)
    }

    /// Get stdout, trimmed of whitespace.
    pub fn stdout_trimmed(&self) -> &str {
        self.stdout.trim()
    }
}

/// Builder for configuring command execution.
#[derive(Debug, Clone)]
pub struct Cmd {
    program: String,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
}

impl Cmd {
    pub fn new(program: impl AsRef<str>) -> Self {
        Self {
            program: program.as_ref().to_string(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<str>) -> Self {
        self.args.push(arg.as_ref().to_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for arg in args {
            self.args.push(arg.as_ref().to_string());
        }
        self
    }

    /// Add a path as an argument.
    pub fn arg_path(mut self, path: &Path) -> Self {
        self.args.push(path.to_string_lossy().into_owned());
        self
    }

    /// Set the working directory.
    pub fn dir(mut self, dir: &Path) -> Self {
        self.current_dir = Some(dir.to_path_buf());
        self
    }

    /// Run this command as the first argument of `wrapper`.
    ///
    /// `Cmd::new("dpkg-repack").arg("bash").wrapped_by("fakeroot")` runs
    /// `fakeroot dpkg-repack bash` in the same working directory.
    pub fn wrapped_by(self, wrapper: impl AsRef<str>) -> Self {
        let mut args = Vec::with_capacity(self.args.len() + 1);
        args.push(self.program);
        args.extend(self.args);
        Self {
            program: wrapper.as_ref().to_string(),
            args,
            current_dir: self.current_dir,
        }
    }

    /// The command line as it would be typed, for logging.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(ref dir) = self.current_dir {
            cmd.current_dir(dir);
        }
        cmd
    }

    fn spawn_error(&self, source: std::io::Error) -> Error {
        Error::ToolNotFound {
            program: self.program.clone(),
            source,
        }
    }

    /// Run the command and capture output.
    pub fn run(self) -> Result<CommandResult> {
        debug!("running: {}", self.display());

        let output = self
            .command()
            .stdin(Stdio::null())
            .output()
            .map_err(|e| self.spawn_error(e))?;

        let result = CommandResult {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !result.success() {
            return Err(Error::ToolFailed {
                program: self.program,
                code: result.code(),
                stderr: result.stderr,
            });
        }

        Ok(result)
    }

    /// Run the command with inherited stdio.
    ///
    /// Output goes directly to the terminal. Used for the installer, whose
    /// progress the user should see as it happens.
    pub fn run_interactive(self) -> Result<ExitStatus> {
        debug!("running: {}", self.display());

        let status = self
            .command()
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| self.spawn_error(e))?;

        if !status.success() {
            return Err(Error::ToolFailed {
                program: self.program,
                code: status.code().unwrap_or(-1),
                stderr: String::new(),
            });
        }

        Ok(status)
    }
}

/// How root-requiring commands are executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Privilege {
    /// The process is root; commands run as they are.
    Root,
    /// Root is simulated with `fakeroot` (and `fakechroot` for chroot-based tools).
    Simulated { fakeroot: String, fakechroot: String },
}

impl Privilege {
    /// Pick the strategy for the current effective user.
    pub fn for_current_user(tools: &Tools) -> Self {
        if is_root() {
            Privilege::Root
        } else {
            Privilege::simulated(tools)
        }
    }

    pub fn simulated(tools: &Tools) -> Self {
        Privilege::Simulated {
            fakeroot: tools.fakeroot.clone(),
            fakechroot: tools.fakechroot.clone(),
        }
    }

    pub fn is_simulated(&self) -> bool {
        matches!(self, Privilege::Simulated { .. })
    }

    /// Wrap a command that needs root ownership semantics.
    pub fn wrap(&self, cmd: Cmd) -> Cmd {
        match self {
            Privilege::Root => cmd,
            Privilege::Simulated { fakeroot, .. } => cmd.wrapped_by(fakeroot),
        }
    }

    /// Wrap a command that also calls chroot(2).
    pub fn wrap_chroot(&self, cmd: Cmd) -> Cmd {
        match self {
            Privilege::Root => cmd,
            Privilege::Simulated {
                fakeroot,
                fakechroot,
            } => cmd.wrapped_by(fakeroot).wrapped_by(fakechroot),
        }
    }
}

/// True when the effective user id is 0.
pub fn is_root() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}

/// Check if a program exists in PATH.
///
/// Returns the full path if found, None otherwise.
pub fn which(program: &str) -> Option<String> {
    which::which(program)
        .ok()
        .map(|path| path.to_string_lossy().into_owned())
}

// =============================================================================
// Tests
// =============================================================================
