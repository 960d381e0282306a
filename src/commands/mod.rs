//! CLI command handlers.
//!
//! - `build` - the full pipeline into a target directory
//! - `resolve` - resolve and print the package set only (`--dry-run`)

pub mod build;
pub mod resolve;

pub use build::{build_from_catalog, cmd_build, BuildOptions};
pub use resolve::{cmd_resolve, package_list, resolve_catalog};
