//! Preflight checks.
//!
//! Everything that can be known to fail before the run allocates anything:
//! missing tools, missing privilege, an unusable target directory.

mod environment;
mod host_tools;
mod types;

use std::path::Path;

use tracing::info;

use crate::config::Tools;
use crate::error::{Error, Result};
use crate::process;

pub use environment::{check_privilege, check_target};
pub use host_tools::check_host_tools;
pub use types::{CheckResult, CheckStatus, PreflightReport};

/// What the upcoming run needs.
#[derive(Debug, Clone, Copy)]
pub enum Requirements<'a> {
    /// Load and resolve only.
    Query,
    /// The full pipeline into `target`.
    Build {
        target: &'a Path,
        /// Non-root operation through fakeroot/fakechroot is allowed.
        allow_unprivileged: bool,
    },
}

/// Run all preflight checks.
pub fn run_preflight(tools: &Tools, req: Requirements<'_>) -> PreflightReport {
    let checks = match req {
        Requirements::Query => check_host_tools(tools, false, false),
        Requirements::Build {
            target,
            allow_unprivileged,
        } => {
            let is_root = process::is_root();
            let mut checks = check_host_tools(tools, true, !is_root && allow_unprivileged);
            checks.push(check_privilege(is_root, allow_unprivileged));
            checks.push(check_target(target));
            checks
        }
    };

    PreflightReport { checks }
}

/// Turn a report into `Ok` or a single-line precondition error.
pub fn into_result(report: &PreflightReport) -> Result<()> {
    if report.all_passed() {
        return Ok(());
    }

    let failures: Vec<String> = report.failures().map(CheckResult::summary).collect();
    Err(Error::Precondition(failures.join("; ")))
}

/// Run preflight and fail if any check fails.
pub fn run_preflight_or_fail(tools: &Tools, req: Requirements<'_>) -> Result<()> {
    let report = run_preflight(tools, req);
    report.log();
    into_result(&report)?;

    info!(
        "preflight passed ({} checks, {} warnings)",
        report.checks.len(),
        report.warn_count()
    );
    Ok(())
}
