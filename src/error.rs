//! Error type shared by every pipeline stage.

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Something the run needs is missing before any work starts.
    #[error("{0}")]
    Precondition(String),

    #[error("unable to resolve dependency of {package}: {group}")]
    UnresolvedDependency { package: String, group: String },

    #[error("package not found on host: {0}")]
    UnknownPackage(String),

    /// The resolved set must carry exactly one concrete architecture besides `all`.
    #[error("expected exactly one concrete architecture, found {}", describe_arches(.found))]
    ArchitectureCount { found: Vec<String> },

    #[error("failed to execute '{program}'. Is it installed?")]
    ToolNotFound {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' failed (exit code {code}){}", stderr_suffix(.stderr))]
    ToolFailed {
        program: String,
        code: i32,
        stderr: String,
    },

    #[error("malformed package query line {line:?}: {reason}")]
    MalformedQuery { line: String, reason: String },

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Attach the path an I/O operation was working on.
pub trait IoContext<T> {
    fn with_path(self, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> IoContext<T> for std::result::Result<T, std::io::Error> {
    fn with_path(self, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|source| Error::Io {
            path: path.as_ref().to_path_buf(),
            source,
        })
    }
}

fn describe_arches(found: &[String]) -> String {
    if found.is_empty() {
        "none".to_string()
    } else {
        found.join(", ")
    }
}

// Keeps the one-line error contract: only the last stderr line is shown.
fn stderr_suffix(stderr: &str) -> String {
    match stderr.trim().lines().last() {
        Some(line) if !line.trim().is_empty() => format!(": {}", line.trim()),
        _ => String::new(),
    }
}
