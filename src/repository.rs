//! Local repository synthesis.
//!
//! Turns a [`ResolvedSet`] into a flat apt repository that debootstrap can
//! use as a mirror:
//!
//! ```text
//! <root>/
//!   apt-ftparchive.conf
//!   cache/
//!   pool/main/*.deb               (dpkg-repack)
//!   dists/unstable/main/binary-<arch>/Packages{,.gz}
//!   dists/unstable/main/binary-all/Packages{,.gz}
//!   dists/unstable/Release
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::catalog::{Catalog, Package};
use crate::config::Tools;
use crate::error::{Error, IoContext, Result};
use crate::process::{Cmd, Privilege};
use crate::resolver::ResolvedSet;

/// Distribution name of the synthesized repository.
pub const SUITE: &str = "unstable";
/// The only component of the synthesized repository.
pub const COMPONENT: &str = "main";

const CONFIG_NAME: &str = "apt-ftparchive.conf";

/// A populated repository on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub root: PathBuf,
    /// The one concrete architecture served besides `all`.
    pub architecture: String,
}

impl Repository {
    fn new(root: &Path, architecture: &str) -> Self {
        Self {
            root: root.to_path_buf(),
            architecture: architecture.to_string(),
        }
    }

    /// Mirror URL handed to the installer.
    pub fn url(&self) -> String {
        format!("file://{}", self.root.display())
    }

    pub fn pool_dir(&self) -> PathBuf {
        self.root.join("pool").join(COMPONENT)
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.root.join("cache")
    }

    pub fn dist_dir(&self) -> PathBuf {
        self.root.join("dists").join(SUITE)
    }

    pub fn binary_dir(&self, arch: &str) -> PathBuf {
        self.dist_dir()
            .join(COMPONENT)
            .join(format!("binary-{}", arch))
    }

    pub fn release_path(&self) -> PathBuf {
        self.dist_dir().join("Release")
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_NAME)
    }
}

/// The single concrete architecture among `packages`.
///
/// `all` packages are ignored. Zero or several concrete architectures mean
/// the host package set is inconsistent.
pub fn concrete_architecture<'a, I>(packages: I) -> Result<String>
where
    I: IntoIterator<Item = &'a Package>,
{
    let mut found: Vec<String> = Vec::new();
    for package in packages {
        if !package.is_arch_all() && !found.contains(&package.architecture) {
            found.push(package.architecture.clone());
        }
    }

    if found.len() == 1 {
        return Ok(found.remove(0));
    }
    found.sort();
    Err(Error::ArchitectureCount { found })
}

/// apt-ftparchive configuration for one `unstable/main` tree.
pub fn render_ftparchive_config(root: &Path, arch: &str) -> String {
    let root = root.display();
    format!(
        r#"Dir {{
    ArchiveDir "{root}";
    CacheDir "{root}/cache";
}};

Default {{
    Packages::Compress ". gzip";
}};

TreeDefault {{
    Directory "pool/$(SECTION)";
}};

Tree "dists/{suite}" {{
    Sections "{component}";
    Architectures "{arch} all";
}};

APT::FTPArchive::Release {{
    Origin "hoststrap";
    Label "hoststrap";
    Suite "{suite}";
    Codename "{suite}";
    Components "{component}";
    Architectures "{arch} all";
}};
"#,
        suite = SUITE,
        component = COMPONENT,
    )
}

/// Builds a [`Repository`] under `root`.
pub struct RepositoryBuilder<'a> {
    root: PathBuf,
    tools: &'a Tools,
    privilege: &'a Privilege,
}

impl<'a> RepositoryBuilder<'a> {
    pub fn new(root: &Path, tools: &'a Tools, privilege: &'a Privilege) -> Self {
        Self {
            root: root.to_path_buf(),
            tools,
            privilege,
        }
    }

    /// Repackage, index and describe the resolved packages.
    ///
    /// The architecture check runs first, so an inconsistent set fails
    /// before any external tool is started.
    pub fn build(&self, catalog: &Catalog, resolved: &ResolvedSet) -> Result<Repository> {
        let arch = concrete_architecture(resolved.packages(catalog))?;
        let repo = Repository::new(&self.root, &arch);
        info!(
            "building {} repository with {} packages in {}",
            arch,
            resolved.len(),
            repo.root.display()
        );

        let pool = repo.pool_dir();
        fs::create_dir_all(&pool).with_path(&pool)?;
        self.repack(&repo, catalog, resolved)?;

        let config = repo.config_path();
        fs::write(&config, render_ftparchive_config(&repo.root, &arch)).with_path(&config)?;

        // apt-ftparchive does not create these itself
        for dir in [
            repo.cache_dir(),
            repo.binary_dir(&arch),
            repo.binary_dir(crate::catalog::ARCH_ALL),
        ] {
            fs::create_dir_all(&dir).with_path(&dir)?;
        }

        self.generate_index(&repo)?;
        self.generate_release(&repo)?;

        Ok(repo)
    }

    /// One dpkg-repack call for the whole set, writing into the pool.
    fn repack(&self, repo: &Repository, catalog: &Catalog, resolved: &ResolvedSet) -> Result<()> {
        let pool = repo.pool_dir();
        let tokens: Vec<String> = resolved
            .packages(catalog)
            .map(Package::qualified_name)
            .collect();

        let cmd = Cmd::new(&self.tools.dpkg_repack)
            .arg("--deb-option=-Znone")
            .args(&tokens)
            .dir(&pool);
        self.privilege.wrap(cmd).run()?;

        let built = count_debs(&pool);
        if built != tokens.len() {
            warn!(
                "expected {} packages in {}, found {}",
                tokens.len(),
                pool.display(),
                built
            );
        } else {
            debug!("repacked {} packages", built);
        }
        Ok(())
    }

    fn generate_index(&self, repo: &Repository) -> Result<()> {
        Cmd::new(&self.tools.apt_ftparchive)
            .arg("--no-contents")
            .arg("generate")
            .arg_path(&repo.config_path())
            .dir(&repo.root)
            .run()?;
        Ok(())
    }

    fn generate_release(&self, repo: &Repository) -> Result<()> {
        let release = repo.release_path();
        // apt-ftparchive will not replace a Release left by an earlier attempt
        if release.exists() {
            fs::remove_file(&release).with_path(&release)?;
        }

        let result = Cmd::new(&self.tools.apt_ftparchive)
            .arg("-c")
            .arg_path(&repo.config_path())
            .arg("release")
            .arg_path(&repo.dist_dir())
            .dir(&repo.root)
            .run()?;

        fs::write(&release, result.stdout).with_path(&release)?;
        Ok(())
    }
}

fn count_debs(dir: &Path) -> usize {
    WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "deb"))
        .count()
}
