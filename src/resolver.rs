//! Dependency closure over a [`Catalog`].
//!
//! Each OR-group is satisfied by its first alternative the catalog knows,
//! either by real name or through a provided virtual name. Version
//! constraints are not consulted: a present alternative is taken even when
//! its version would not satisfy the relation.
//!
//! Resolution is an explicit work-list loop over package ids. Membership in
//! the resolved set is checked before a package is (re)queued, which is what
//! terminates dependency cycles.

use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::catalog::{Catalog, Package, PackageId};
use crate::error::{Error, Result};

/// The installation closure: unique package ids, ordered by catalog position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedSet {
    members: BTreeSet<PackageId>,
}

impl ResolvedSet {
    pub fn contains(&self, id: PackageId) -> bool {
        self.members.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = PackageId> + '_ {
        self.members.iter().copied()
    }

    /// The resolved packages as stored in `catalog`.
    pub fn packages<'a>(&'a self, catalog: &'a Catalog) -> impl Iterator<Item = &'a Package> + 'a {
        self.ids().map(move |id| catalog.get(id))
    }

    fn insert(&mut self, id: PackageId) -> bool {
        self.members.insert(id)
    }
}

impl FromIterator<PackageId> for ResolvedSet {
    fn from_iter<T: IntoIterator<Item = PackageId>>(iter: T) -> Self {
        Self {
            members: iter.into_iter().collect(),
        }
    }
}

/// First alternative of `group` that the catalog can resolve.
pub fn resolve_group(catalog: &Catalog, group: &[String]) -> Option<PackageId> {
    group.iter().find_map(|name| catalog.lookup(name))
}

/// Seed packages for a run: every essential package plus `include`.
pub fn seeds(catalog: &Catalog, include: &[String]) -> Result<Vec<PackageId>> {
    let mut seeds = catalog.essential();
    for name in include {
        let id = catalog
            .lookup(name)
            .ok_or_else(|| Error::UnknownPackage(name.clone()))?;
        seeds.push(id);
    }
    Ok(seeds)
}

/// Compute the dependency closure of `seeds`.
///
/// Every package in the result has each of its OR-groups satisfied by a
/// package that is also in the result. Fails on the first group none of
/// whose alternatives are in the catalog.
pub fn resolve(catalog: &Catalog, seeds: &[PackageId]) -> Result<ResolvedSet> {
    let mut resolved = ResolvedSet::default();
    let mut worklist: Vec<PackageId> = seeds.to_vec();

    while let Some(id) = worklist.pop() {
        if resolved.contains(id) {
            continue;
        }
        let package = catalog.get(id);

        for group in &package.dependencies {
            let dep = resolve_group(catalog, group).ok_or_else(|| Error::UnresolvedDependency {
                package: package.name.clone(),
                group: group.join(" | "),
            })?;
            debug!(
                "{} -> {} (via {})",
                package.name,
                catalog.get(dep).name,
                group.join(" | ")
            );
            if !resolved.contains(dep) {
                worklist.push(dep);
            }
        }

        resolved.insert(id);
    }

    info!(
        "resolved {} packages from {} seeds",
        resolved.len(),
        seeds.len()
    );
    Ok(resolved)
}
