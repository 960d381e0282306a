//! Build command - the full load, resolve, build, bootstrap pipeline.

use std::path::PathBuf;

use tracing::info;

use crate::bootstrap::Bootstrap;
use crate::catalog::{self, Catalog};
use crate::config::Config;
use crate::error::Result;
use crate::preflight::{self, Requirements};
use crate::process::Privilege;
use crate::repository::RepositoryBuilder;
use crate::scratch::ScratchDir;
use crate::target::TargetGuard;
use crate::timing::Timer;

use super::resolve::resolve_catalog;

/// What the user asked for.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub target: PathBuf,
    /// Extra packages on top of the essential set.
    pub include: Vec<String>,
    pub unprivileged: bool,
}

/// Execute the build command.
pub fn cmd_build(opts: &BuildOptions, config: &Config) -> Result<()> {
    preflight::run_preflight_or_fail(
        &config.tools,
        Requirements::Build {
            target: &opts.target,
            allow_unprivileged: opts.unprivileged,
        },
    )?;
    let privilege = Privilege::for_current_user(&config.tools);

    let timer = Timer::start("load");
    let catalog = catalog::load_host_catalog(&config.tools)?;
    timer.finish();

    build_from_catalog(&catalog, opts, config, &privilege)
}

/// Everything after loading: resolve, build the repository, bootstrap.
///
/// The scratch repository is removed on every return path.
pub fn build_from_catalog(
    catalog: &Catalog,
    opts: &BuildOptions,
    config: &Config,
    privilege: &Privilege,
) -> Result<()> {
    let resolved = resolve_catalog(catalog, &opts.include)?;

    let scratch = ScratchDir::create(&config.scratch_parent)?;

    let timer = Timer::start("build");
    let repo = RepositoryBuilder::new(scratch.path(), &config.tools, privilege)
        .build(catalog, &resolved)?;
    timer.finish();

    let timer = Timer::start("bootstrap");
    let guard = TargetGuard::new(&opts.target);
    Bootstrap::new(&config.tools, privilege)
        .include(&opts.include)
        .run(&repo, &opts.target)?;
    guard.commit();
    timer.finish();

    scratch.close()?;
    info!("bootstrapped {}", opts.target.display());
    Ok(())
}
