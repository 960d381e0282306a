//! Per-run scratch directory for the synthesized repository.
//!
//! The directory is created fresh under a parent (usually `$TMPDIR`) and is
//! removed when the [`ScratchDir`] is dropped, whichever way the run ends.

use std::fs;
use std::path::Path;

use tempfile::TempDir;
use tracing::{debug, warn};

use crate::error::{IoContext, Result};

const PREFIX: &str = "hoststrap.";

/// A uniquely named directory that is deleted on drop.
#[derive(Debug)]
pub struct ScratchDir {
    dir: Option<TempDir>,
}

impl ScratchDir {
    /// Create a new, empty scratch directory inside `parent`.
    pub fn create(parent: &Path) -> Result<Self> {
        fs::create_dir_all(parent).with_path(parent)?;
        let dir = tempfile::Builder::new()
            .prefix(PREFIX)
            .tempdir_in(parent)
            .with_path(parent)?;
        debug!("created scratch directory {}", dir.path().display());
        Ok(Self { dir: Some(dir) })
    }

    pub fn path(&self) -> &Path {
        match self.dir {
            Some(ref dir) => dir.path(),
            None => Path::new(""),
        }
    }

    /// Remove the directory now, reporting failures instead of ignoring them.
    pub fn close(mut self) -> Result<()> {
        if let Some(dir) = self.dir.take() {
            let path = dir.path().to_path_buf();
            dir.close().with_path(&path)?;
            debug!("removed scratch directory {}", path.display());
        }
        Ok(())
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                warn!("failed to remove {}: {}", path.display(), e);
            }
        }
    }
}
