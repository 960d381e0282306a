//! Restores the target directory when the installer fails.
//!
//! The guard records what the target held when it was armed and, after a
//! failed install, removes only what appeared since. Cleanup stays on the
//! target's filesystem and never descends into mount points.

use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

/// Armed until [`TargetGuard::commit`]; on drop it removes every entry
/// added to the target since arming, and the target itself if it did not
/// exist before.
#[derive(Debug)]
pub struct TargetGuard {
    path: PathBuf,
    existed: bool,
    /// Top-level entries present when the guard was armed.
    kept: HashSet<OsString>,
    armed: bool,
}

impl TargetGuard {
    pub fn new(path: &Path) -> Self {
        let kept: HashSet<OsString> = match fs::read_dir(path) {
            Ok(entries) => entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.file_name())
                .collect(),
            Err(_) => HashSet::new(),
        };
        if !kept.is_empty() {
            warn!(
                "{} entries appeared in {} since preflight, they will be kept",
                kept.len(),
                path.display()
            );
        }

        Self {
            path: path.to_path_buf(),
            existed: path.exists(),
            kept,
            armed: true,
        }
    }

    /// Keep whatever is in the target.
    pub fn commit(mut self) {
        self.armed = false;
    }

    fn restore(&self) {
        let entries = match fs::read_dir(&self.path) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return,
            Err(e) => {
                warn!("cannot restore {}: {}", self.path.display(), e);
                return;
            }
        };

        let mut left = 0;
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("skipping: {}", e);
                    left += 1;
                    continue;
                }
            };
            if self.kept.contains(&entry.file_name()) {
                continue;
            }
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            left += if is_dir {
                remove_tree(&entry.path())
            } else {
                remove_entry(&entry.path(), false)
            };
        }

        if left > 0 {
            warn!(
                "{} entries could not be removed from {}",
                left,
                self.path.display()
            );
            return;
        }
        if !self.existed {
            if let Err(e) = fs::remove_dir(&self.path) {
                warn!("failed to remove {}: {}", self.path.display(), e);
            }
        }
        debug!("restored {}", self.path.display());
    }
}

impl Drop for TargetGuard {
    fn drop(&mut self) {
        if self.armed {
            self.restore();
        }
    }
}

/// Remove the directory `dir` and its contents without crossing into other
/// filesystems. Symlinks are removed, never followed.
///
/// Returns the number of entries that could not be removed.
pub fn remove_tree(dir: &Path) -> usize {
    let mut left = 0;
    let entries = WalkDir::new(dir)
        .follow_root_links(false)
        .same_file_system(true)
        .contents_first(true);

    for entry in entries {
        match entry {
            Ok(entry) => left += remove_entry(entry.path(), entry.file_type().is_dir()),
            Err(e) => {
                debug!("skipping: {}", e);
                left += 1;
            }
        }
    }
    left
}

fn remove_entry(path: &Path, is_dir: bool) -> usize {
    let removed = if is_dir {
        fs::remove_dir(path)
    } else {
        fs::remove_file(path)
    };
    match removed {
        Ok(()) => 0,
        Err(e) => {
            debug!("cannot remove {}: {}", path.display(), e);
            1
        }
    }
}
