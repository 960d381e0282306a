//! Host package catalog.
//!
//! Loads every package installed on the host for the native architecture (or
//! `all`) from the dpkg database and indexes it for dependency resolution.
//!
//! Packages live in an arena addressed by [`PackageId`]. Lookup by name is
//! two-level: real package names first, then the virtual names introduced by
//! `Provides:`. An alias never allocates a second [`Package`].

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::config::Tools;
use crate::error::{Error, Result};
use crate::process::Cmd;

/// Architecture tag of architecture-independent packages.
pub const ARCH_ALL: &str = "all";

/// `dpkg-query -W` format: one package per line, tab-separated.
///
/// Six metadata fields, then the package's dpkg state. Without a pattern
/// `dpkg-query -W` also lists packages whose files are gone (`config-files`,
/// `half-installed`); the state field lets the loader drop them.
pub const QUERY_FORMAT: &str = "${Package}\\t${Architecture}\\t${Essential}\\t${Provides}\\t\
                                ${Depends}\\t${Pre-Depends}\\t${db:Status-Status}\\n";

/// dpkg states in which a package's files are not (fully) on disk.
const ABSENT_STATES: &[&str] = &["not-installed", "config-files", "half-installed"];

/// Index of a package inside its [`Catalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageId(usize);

/// One installed package as known to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub name: String,
    pub architecture: String,
    pub essential: bool,
    /// OR-groups in declared order; any one alternative satisfies a group.
    pub dependencies: Vec<Vec<String>>,
}

impl Package {
    pub fn new(name: impl Into<String>, architecture: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            architecture: architecture.into(),
            essential: false,
            dependencies: Vec::new(),
        }
    }

    pub fn essential(mut self) -> Self {
        self.essential = true;
        self
    }

    /// Add one OR-group of alternatives.
    pub fn depends_on<I, S>(mut self, alternatives: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies
            .push(alternatives.into_iter().map(Into::into).collect());
        self
    }

    pub fn is_arch_all(&self) -> bool {
        self.architecture == ARCH_ALL
    }

    /// `name` for `all` packages, `name:arch` otherwise.
    pub fn qualified_name(&self) -> String {
        if self.is_arch_all() {
            self.name.clone()
        } else {
            format!("{}:{}", self.name, self.architecture)
        }
    }
}

/// Packages indexed by identity, real name and provided name.
#[derive(Debug, Default)]
pub struct Catalog {
    packages: Vec<Package>,
    by_identity: HashMap<(String, String), PackageId>,
    by_name: HashMap<String, PackageId>,
    aliases: HashMap<String, PackageId>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a package and the virtual names it provides.
    ///
    /// A second record with the same `(name, architecture)` or the same real
    /// name is dropped and the existing id returned. A virtual name keeps the
    /// first package that claimed it.
    pub fn insert<I, S>(&mut self, package: Package, provides: I) -> PackageId
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let identity = (package.name.clone(), package.architecture.clone());
        if let Some(&id) = self.by_identity.get(&identity) {
            warn!("duplicate package record {}:{}", identity.0, identity.1);
            return id;
        }
        if let Some(&id) = self.by_name.get(&package.name) {
            warn!(
                "ignoring {}:{}, already have {}",
                package.name,
                package.architecture,
                self.get(id).qualified_name()
            );
            return id;
        }

        let id = PackageId(self.packages.len());
        self.by_identity.insert(identity, id);
        self.by_name.insert(package.name.clone(), id);

        for alias in provides {
            let alias = alias.into();
            if alias == package.name {
                continue;
            }
            match self.aliases.get(&alias) {
                Some(&owner) => debug!(
                    "{} already provided by {}, not by {}",
                    alias,
                    self.get(owner).name,
                    package.name
                ),
                None => {
                    self.aliases.insert(alias, id);
                }
            }
        }

        self.packages.push(package);
        id
    }

    /// Resolve a real or provided name.
    pub fn lookup(&self, name: &str) -> Option<PackageId> {
        self.by_name
            .get(name)
            .or_else(|| self.aliases.get(name))
            .copied()
    }

    /// Get a package by id.
    ///
    /// Ids are only handed out by this catalog, so indexing cannot go out of
    /// bounds for ids obtained from it.
    pub fn get(&self, id: PackageId) -> &Package {
        &self.packages[id.0]
    }

    /// Ids of every package flagged essential, in insertion order.
    pub fn essential(&self) -> Vec<PackageId> {
        self.iter()
            .filter(|(_, p)| p.essential)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PackageId, &Package)> {
        self.packages
            .iter()
            .enumerate()
            .map(|(i, p)| (PackageId(i), p))
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Bare package name of a relation token: `libc6 (>= 2.36)` -> `libc6`.
fn relation_name(token: &str) -> &str {
    let token = token.trim();
    let end = token
        .find(|c: char| c.is_whitespace() || c == '(' || c == '[')
        .unwrap_or(token.len());
    &token[..end]
}

/// Parse a Depends-style field into OR-groups.
///
/// Version constraints and architecture restrictions are discarded, and the
/// `:any` multiarch qualifier is stripped.
pub fn parse_dependencies(field: &str) -> Vec<Vec<String>> {
    let field = field.replace(":any", "");
    field
        .split(',')
        .map(|group| {
            group
                .split('|')
                .map(relation_name)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .filter(|group| !group.is_empty())
        .collect()
}

/// Parse a Provides field into its virtual names.
pub fn parse_provides(field: &str) -> Vec<String> {
    field
        .split(',')
        .map(relation_name)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// One parsed line of host query output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRecord {
    pub package: Package,
    pub provides: Vec<String>,
    /// dpkg state, when the line carries one.
    pub status: Option<String>,
}

impl QueryRecord {
    /// Whether the package's files are on disk, so it can be repacked.
    /// Lines without a state are taken as installed.
    pub fn is_unpacked(&self) -> bool {
        self.status
            .as_deref()
            .map_or(true, |status| !ABSENT_STATES.contains(&status))
    }
}

/// Parse one line of [`QUERY_FORMAT`] output.
///
/// The trailing state field is optional; a six-field line is accepted too.
pub fn parse_query_line(line: &str) -> Result<QueryRecord> {
    let mut fields: Vec<&str> = line.split('\t').collect();
    let status = if fields.len() == 7 {
        fields.pop().map(|s| s.trim().to_string())
    } else {
        None
    };
    let &[name, architecture, essential, provides, depends, pre_depends] = fields.as_slice() else {
        return Err(Error::MalformedQuery {
            line: line.to_string(),
            reason: format!("expected 6 or 7 tab-separated fields, got {}", fields.len()),
        });
    };

    if name.is_empty() || architecture.is_empty() {
        return Err(Error::MalformedQuery {
            line: line.to_string(),
            reason: "empty package name or architecture".to_string(),
        });
    }

    let relations: Vec<&str> = [depends, pre_depends]
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    let package = Package {
        name: name.to_string(),
        architecture: architecture.to_string(),
        essential: essential.trim() == "yes",
        dependencies: parse_dependencies(&relations.join(", ")),
    };

    Ok(QueryRecord {
        package,
        provides: parse_provides(provides),
        status: status.filter(|s| !s.is_empty()),
    })
}

/// Build a catalog from raw query output, keeping only unpacked `native`
/// and `all` packages.
pub fn parse_query_output(output: &str, native: &str) -> Result<Catalog> {
    let mut catalog = Catalog::new();
    let mut foreign = 0usize;

    for line in output.lines().filter(|l| !l.trim().is_empty()) {
        let record = parse_query_line(line)?;
        if !record.is_unpacked() {
            debug!(
                "skipping {}:{} ({})",
                record.package.name,
                record.package.architecture,
                record.status.as_deref().unwrap_or_default()
            );
            continue;
        }
        if record.package.architecture != native && !record.package.is_arch_all() {
            foreign += 1;
            continue;
        }
        catalog.insert(record.package, record.provides);
    }

    if foreign > 0 {
        debug!("skipped {} packages of foreign architectures", foreign);
    }
    Ok(catalog)
}

// =============================================================================
// Host queries
// =============================================================================

/// The host's native architecture tag, e.g. `amd64`.
pub fn native_architecture(tools: &Tools) -> Result<String> {
    let result = Cmd::new(&tools.dpkg).arg("--print-architecture").run()?;
    let arch = result.stdout_trimmed();
    if arch.is_empty() {
        return Err(Error::Precondition(format!(
            "'{} --print-architecture' printed nothing",
            tools.dpkg
        )));
    }
    Ok(arch.to_string())
}

/// Query the host package database and build the catalog.
pub fn load_host_catalog(tools: &Tools) -> Result<Catalog> {
    let native = native_architecture(tools)?;
    let result = Cmd::new(&tools.dpkg_query)
        .args(["-W", "-f", QUERY_FORMAT])
        .run()?;

    let catalog = parse_query_output(&result.stdout, &native)?;
    info!(
        "loaded {} packages for {} ({} essential)",
        catalog.len(),
        native,
        catalog.essential().len()
    );
    Ok(catalog)
}
