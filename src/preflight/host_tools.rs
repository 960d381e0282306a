//! Host tool availability checks.

use crate::config::Tools;
use crate::process;

use super::types::CheckResult;

/// Check that every collaborator the run will start is on PATH.
///
/// `build` adds the tools needed past resolution; `simulated` adds the
/// privilege simulation wrappers.
pub fn check_host_tools(tools: &Tools, build: bool, simulated: bool) -> Vec<CheckResult> {
    let mut required: Vec<(&str, &str)> = vec![
        (tools.dpkg.as_str(), "dpkg"),
        (tools.dpkg_query.as_str(), "dpkg"),
    ];

    if build {
        required.extend([
            (tools.dpkg_repack.as_str(), "dpkg-repack"),
            (tools.apt_ftparchive.as_str(), "apt-utils"),
            (tools.debootstrap.as_str(), "debootstrap"),
        ]);
        if simulated {
            required.extend([
                (tools.fakeroot.as_str(), "fakeroot"),
                (tools.fakechroot.as_str(), "fakechroot"),
            ]);
        }
    }

    required
        .into_iter()
        .map(|(tool, package)| check_tool_exists(tool, package))
        .collect()
}

fn check_tool_exists(tool: &str, package: &str) -> CheckResult {
    match process::which(tool) {
        Some(path) => CheckResult::pass_with(tool, &path),
        None => CheckResult::fail(tool, &format!("not found, install '{}'", package)),
    }
}
