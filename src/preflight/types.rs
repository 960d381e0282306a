//! Preflight check types and report.

use tracing::{debug, info};

/// Result of a single preflight check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub details: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    /// Check passed.
    Pass,
    /// Check failed - the run cannot start.
    Fail,
    /// Check passed but with a warning.
    Warn,
}

impl CheckResult {
    pub fn pass(name: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Pass,
            details: None,
        }
    }

    pub fn pass_with(name: &str, details: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Pass,
            details: Some(details.to_string()),
        }
    }

    pub fn fail(name: &str, details: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Fail,
            details: Some(details.to_string()),
        }
    }

    pub fn warn(name: &str, details: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warn,
            details: Some(details.to_string()),
        }
    }

    /// `name: details`, or just the name.
    pub fn summary(&self) -> String {
        match &self.details {
            Some(details) => format!("{}: {}", self.name, details),
            None => self.name.clone(),
        }
    }
}

/// Results of all preflight checks.
#[derive(Debug, Default)]
pub struct PreflightReport {
    pub checks: Vec<CheckResult>,
}

impl PreflightReport {
    /// Returns true if no check failed.
    pub fn all_passed(&self) -> bool {
        !self.checks.iter().any(|c| c.status == CheckStatus::Fail)
    }

    pub fn failures(&self) -> impl Iterator<Item = &CheckResult> {
        self.checks
            .iter()
            .filter(|c| c.status == CheckStatus::Fail)
    }

    pub fn warn_count(&self) -> usize {
        self.checks
            .iter()
            .filter(|c| c.status == CheckStatus::Warn)
            .count()
    }

    /// Log every check. Passes go to debug, warnings and failures to info;
    /// failures reach the user through [`super::into_result`].
    pub fn log(&self) {
        for check in &self.checks {
            match check.status {
                CheckStatus::Pass => debug!("preflight [PASS] {}", check.summary()),
                CheckStatus::Warn => info!("preflight [WARN] {}", check.summary()),
                CheckStatus::Fail => info!("preflight [FAIL] {}", check.summary()),
            }
        }
    }
}
