//! Configuration management for hoststrap.
//!
//! Reads configuration from environment variables. A `.env` file in the
//! working directory is loaded into the environment first (see `main.rs`),
//! so real environment variables take precedence over it.

use std::collections::HashMap;
use std::path::PathBuf;

/// Names of the external collaborator programs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tools {
    /// Reports the native architecture (`dpkg --print-architecture`).
    pub dpkg: String,
    /// Host package database query.
    pub dpkg_query: String,
    /// Rebuilds a .deb from an installed package.
    pub dpkg_repack: String,
    /// Index and release generator.
    pub apt_ftparchive: String,
    /// The installer.
    pub debootstrap: String,
    pub fakeroot: String,
    pub fakechroot: String,
}

impl Default for Tools {
    fn default() -> Self {
        Self {
            dpkg: "dpkg".to_string(),
            dpkg_query: "dpkg-query".to_string(),
            dpkg_repack: "dpkg-repack".to_string(),
            apt_ftparchive: "apt-ftparchive".to_string(),
            debootstrap: "debootstrap".to_string(),
            fakeroot: "fakeroot".to_string(),
            fakechroot: "fakechroot".to_string(),
        }
    }
}

/// Hoststrap configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub tools: Tools,
    /// Directory the per-run scratch repository is created in.
    pub scratch_parent: PathBuf,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn load() -> Self {
        Self::from_vars(&std::env::vars().collect())
    }

    /// Build configuration from a key/value map, falling back to defaults.
    pub fn from_vars(vars: &HashMap<String, String>) -> Self {
        let defaults = Tools::default();
        let tool = |key: &str, default: String| {
            vars.get(key)
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .unwrap_or(default)
        };

        let tools = Tools {
            dpkg: tool("HOSTSTRAP_DPKG", defaults.dpkg),
            dpkg_query: tool("HOSTSTRAP_DPKG_QUERY", defaults.dpkg_query),
            dpkg_repack: tool("HOSTSTRAP_DPKG_REPACK", defaults.dpkg_repack),
            apt_ftparchive: tool("HOSTSTRAP_APT_FTPARCHIVE", defaults.apt_ftparchive),
            debootstrap: tool("HOSTSTRAP_DEBOOTSTRAP", defaults.debootstrap),
            fakeroot: tool("HOSTSTRAP_FAKEROOT", defaults.fakeroot),
            fakechroot: tool("HOSTSTRAP_FAKECHROOT", defaults.fakechroot),
        };

        let scratch_parent = ["HOSTSTRAP_TMPDIR", "TMPDIR"]
            .iter()
            .filter_map(|key| vars.get(*key))
            .find(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);

        Self {
            tools,
            scratch_parent,
        }
    }

    /// Print configuration for debugging.
    pub fn print(&self) {
        eprintln!("Configuration:");
        eprintln!("  HOSTSTRAP_DPKG: {}", self.tools.dpkg);
        eprintln!("  HOSTSTRAP_DPKG_QUERY: {}", self.tools.dpkg_query);
        eprintln!("  HOSTSTRAP_DPKG_REPACK: {}", self.tools.dpkg_repack);
        eprintln!("  HOSTSTRAP_APT_FTPARCHIVE: {}", self.tools.apt_ftparchive);
        eprintln!("  HOSTSTRAP_DEBOOTSTRAP: {}", self.tools.debootstrap);
        eprintln!("  HOSTSTRAP_FAKEROOT: {}", self.tools.fakeroot);
        eprintln!("  HOSTSTRAP_FAKECHROOT: {}", self.tools.fakechroot);
        eprintln!("  HOSTSTRAP_TMPDIR: {}", self.scratch_parent.display());
    }
}
