//! Resolve command - print the package set a run would install.

use std::io::Write;

use crate::catalog::{self, Catalog};
use crate::config::Config;
use crate::error::{IoContext, Result};
use crate::preflight::{self, Requirements};
use crate::resolver::{self, ResolvedSet};
use crate::timing::Timer;

/// Resolve the essential set plus `include` over `catalog`.
pub fn resolve_catalog(catalog: &Catalog, include: &[String]) -> Result<ResolvedSet> {
    let timer = Timer::start("resolve");
    let seeds = resolver::seeds(catalog, include)?;
    let resolved = resolver::resolve(catalog, &seeds)?;
    timer.finish();
    Ok(resolved)
}

/// Qualified names of `resolved`, sorted by name.
pub fn package_list(catalog: &Catalog, resolved: &ResolvedSet) -> Vec<String> {
    let mut names: Vec<String> = resolved
        .packages(catalog)
        .map(|p| p.qualified_name())
        .collect();
    names.sort();
    names
}

/// Execute the dry run: load, resolve and print, build nothing.
pub fn cmd_resolve(include: &[String], config: &Config) -> Result<()> {
    preflight::run_preflight_or_fail(&config.tools, Requirements::Query)?;

    let timer = Timer::start("load");
    let catalog = catalog::load_host_catalog(&config.tools)?;
    timer.finish();

    let resolved = resolve_catalog(&catalog, include)?;

    let mut stdout = std::io::stdout().lock();
    for name in package_list(&catalog, &resolved) {
        writeln!(stdout, "{}", name).with_path("<stdout>")?;
    }
    Ok(())
}
