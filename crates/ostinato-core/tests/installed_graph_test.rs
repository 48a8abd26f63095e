//! Loading a project's manifests and checking its links against the
//! installed versions.

use ostinato_core::{ErrorCode, PackageNode, Stability, VersionParser, load_installed, load_package};
use ostinato_test_utils::prelude::*;
use pretty_assertions::assert_eq;

fn installed() -> Vec<PackageNode> {
    load_installed(&Fixtures::installed_json().to_string()).unwrap()
}

fn find<'a>(packages: &'a [PackageNode], name: &str, alias: bool) -> &'a PackageNode {
    packages
        .iter()
        .find(|p| p.name == name && p.is_alias() == alias)
        .unwrap()
}

#[test]
fn branch_alias_yields_a_second_package() {
    let packages = installed();
    assert_eq!(packages.len(), 5);

    let branch = find(&packages, "acme/log", false);
    let alias = find(&packages, "acme/log", true);
    assert!(branch.version.is_branch());
    assert_eq!(alias.version.to_string(), "1.9999999.9999999.9999999-dev");
    assert_eq!(alias.alias_of.as_ref(), Some(&branch.version));
}

#[test]
fn requirements_are_satisfied_by_the_alias_only() {
    let packages = installed();
    let parser = VersionParser::new();
    let http = find(&packages, "acme/http", false);
    let constraint = http.requires[0].parsed_constraint(&parser).unwrap();

    assert!(constraint.matches(&find(&packages, "acme/log", true).version));
    assert!(!constraint.matches(&find(&packages, "acme/log", false).version));
}

#[test]
fn root_requirements_accept_installed_versions() {
    let root = load_package(&Fixtures::app_composer_json().to_string()).unwrap();
    let packages = installed();
    let parser = VersionParser::new();

    for link in root.dependency_links(true) {
        let Some(target) = packages.iter().find(|p| p.name == link.target && !p.is_alias()) else {
            assert_eq!(link.target, "php");
            continue;
        };
        let constraint = link.parsed_constraint(&parser).unwrap();
        assert!(constraint.matches(&target.version), "{link} rejects {target}");
    }
    assert!(parser.cache().contains("^1.0@beta"));
}

#[test]
fn root_stability_flags() {
    let root = load_package(&Fixtures::app_composer_json().to_string()).unwrap();
    let filter = root.stability_filter(Stability::Stable);
    let packages = installed();

    assert!(filter.is_acceptable("acme/testing", &find(&packages, "acme/testing", false).version));
    assert!(!filter.is_acceptable("acme/log", &find(&packages, "acme/log", false).version));
}

#[test]
fn invalid_versions_carry_error_codes() {
    let err = load_installed(r#"[{"name": "a/b", "version": "not a version"}]"#).unwrap_err();
    assert_eq!(err.code(), ErrorCode::E0405);
    assert!(!err.suggestions().is_empty());
}
