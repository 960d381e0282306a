//! Environment checks (privilege, target directory).

use std::fs;
use std::path::Path;

use super::types::CheckResult;

/// Root is required unless the user opted into privilege simulation.
pub fn check_privilege(is_root: bool, allow_unprivileged: bool) -> CheckResult {
    match (is_root, allow_unprivileged) {
        (true, _) => CheckResult::pass("privilege"),
        (false, true) => CheckResult::warn("privilege", "not root, using fakeroot/fakechroot"),
        (false, false) => CheckResult::fail(
            "privilege",
            "must be run as root (or pass --unprivileged)",
        ),
    }
}

/// The target must not exist, or be an empty directory.
pub fn check_target(target: &Path) -> CheckResult {
    let name = "target";
    let shown = target.display();

    let metadata = match fs::symlink_metadata(target) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return CheckResult::pass_with(name, &format!("{} will be created", shown));
        }
        Err(e) => return CheckResult::fail(name, &format!("cannot stat {}: {}", shown, e)),
    };

    if !metadata.is_dir() {
        return CheckResult::fail(name, &format!("{} exists and is not a directory", shown));
    }

    match fs::read_dir(target) {
        Ok(mut entries) => {
            if entries.next().is_none() {
                CheckResult::pass_with(name, &format!("{} is empty", shown))
            } else {
                CheckResult::fail(name, &format!("{} is not empty", shown))
            }
        }
        Err(e) => CheckResult::fail(name, &format!("cannot read {}: {}", shown, e)),
    }
}
