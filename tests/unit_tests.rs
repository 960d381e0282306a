//! Resolution scenarios over parsed host package data.
//!
//! These exercise the catalog and resolver together without starting any
//! external tool.

mod helpers;

use helpers::{ESSENTIAL_CLOSURE, HOST_PACKAGES};
use hoststrap::catalog::{parse_query_output, Catalog, Package};
use hoststrap::commands::{package_list, resolve_catalog};
use hoststrap::resolver::{resolve, seeds};
use hoststrap::Error;

const NONE: [&str; 0] = [];

fn host_catalog() -> Catalog {
    parse_query_output(&HOST_PACKAGES.join("\n"), "amd64").unwrap()
}

#[test]
fn test_essential_closure_of_host() {
    let catalog = host_catalog();
    let resolved = resolve_catalog(&catalog, &[]).unwrap();
    assert_eq!(package_list(&catalog, &resolved), ESSENTIAL_CLOSURE);
}

#[test]
fn test_virtual_dependency_through_provides() {
    let catalog = host_catalog();
    let resolved = resolve_catalog(&catalog, &["tzdata".to_string()]).unwrap();
    let names = package_list(&catalog, &resolved);

    assert!(names.contains(&"tzdata".to_string()));
    assert!(names.contains(&"cdebconf:amd64".to_string()));
}

#[test]
fn test_include_by_virtual_name_picks_first_provider() {
    let catalog = host_catalog();
    let resolved = resolve_catalog(&catalog, &["editor".to_string()]).unwrap();
    let names = package_list(&catalog, &resolved);

    assert!(names.contains(&"vim:amd64".to_string()));
    assert!(!names.contains(&"nano:amd64".to_string()));
}

#[test]
fn test_alias_and_real_name_resolve_to_one_entry() {
    let catalog = host_catalog();
    let resolved =
        resolve_catalog(&catalog, &["editor".to_string(), "vim".to_string()]).unwrap();
    let names = package_list(&catalog, &resolved);

    assert_eq!(names.iter().filter(|n| n.starts_with("vim:")).count(), 1);
}

#[test]
fn test_foreign_architecture_never_resolved() {
    let catalog = host_catalog();
    let resolved = resolve_catalog(&catalog, &[]).unwrap();
    assert!(resolved.packages(&catalog).all(|p| p.architecture != "i386"));
}

#[test]
fn test_provider_not_used_when_real_package_exists() {
    let mut catalog = Catalog::new();
    let a = catalog.insert(Package::new("A", "amd64").essential().depends_on(["B"]), NONE);
    catalog.insert(Package::new("B", "amd64"), NONE);
    catalog.insert(Package::new("C", "amd64"), ["B"]);

    let resolved = resolve(&catalog, &seeds(&catalog, &[]).unwrap()).unwrap();
    let mut names: Vec<_> = resolved.packages(&catalog).map(|p| p.name.as_str()).collect();
    names.sort();

    assert!(resolved.contains(a));
    assert_eq!(names, ["A", "B"]);
}

#[test]
fn test_missing_first_alternative_falls_through() {
    let mut catalog = Catalog::new();
    let a = catalog.insert(Package::new("A", "amd64").depends_on(["X", "Y"]), NONE);
    catalog.insert(Package::new("Y", "amd64"), NONE);

    let resolved = resolve(&catalog, &[a]).unwrap();
    let names: Vec<_> = resolved.packages(&catalog).map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["A", "Y"]);
}

#[test]
fn test_cycle_yields_both() {
    let mut catalog = Catalog::new();
    let a = catalog.insert(Package::new("A", "amd64").depends_on(["B"]), NONE);
    let b = catalog.insert(Package::new("B", "amd64").depends_on(["A"]), NONE);

    let resolved = resolve(&catalog, &[a]).unwrap();
    assert_eq!(resolved.len(), 2);
    assert!(resolved.contains(a) && resolved.contains(b));
}

#[test]
fn test_unsatisfiable_group_from_query_output() {
    let catalog = parse_query_output(
        "init\tamd64\tyes\t\tsystemd-sysv | sysvinit-core | runit-init\t\n",
        "amd64",
    )
    .unwrap();

    let err = resolve_catalog(&catalog, &[]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "unable to resolve dependency of init: systemd-sysv | sysvinit-core | runit-init"
    );
    assert!(matches!(err, Error::UnresolvedDependency { .. }));
}
