//! Hands the synthesized repository to debootstrap.

use std::path::Path;

use tracing::info;

use crate::config::Tools;
use crate::error::Result;
use crate::process::{Cmd, Privilege};
use crate::repository::{Repository, SUITE};

/// A configured debootstrap invocation.
pub struct Bootstrap<'a> {
    tools: &'a Tools,
    privilege: &'a Privilege,
    include: Vec<String>,
}

impl<'a> Bootstrap<'a> {
    pub fn new(tools: &'a Tools, privilege: &'a Privilege) -> Self {
        Self {
            tools,
            privilege,
            include: Vec::new(),
        }
    }

    /// Extra packages to install on top of the required set.
    pub fn include(mut self, packages: &[String]) -> Self {
        self.include.extend(packages.iter().cloned());
        self
    }

    /// The full command line, including any privilege wrapper.
    ///
    /// The repository is unsigned, so signature checks are disabled.
    pub fn command(&self, repo: &Repository, target: &Path) -> Cmd {
        let mut cmd = Cmd::new(&self.tools.debootstrap).arg("--no-check-gpg");
        if self.privilege.is_simulated() {
            cmd = cmd.arg("--variant=fakechroot");
        }
        if !self.include.is_empty() {
            cmd = cmd.arg(format!("--include={}", self.include.join(",")));
        }
        let cmd = cmd.arg(SUITE).arg_path(target).arg(repo.url());

        self.privilege.wrap_chroot(cmd)
    }

    /// Run debootstrap with its output on the terminal.
    pub fn run(&self, repo: &Repository, target: &Path) -> Result<()> {
        info!("bootstrapping {} from {}", target.display(), repo.url());
        self.command(repo, target).run_interactive()?;
        Ok(())
    }
}
