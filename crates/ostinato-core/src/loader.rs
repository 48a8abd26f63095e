//! Decoding package declarations from `composer.json` and `installed.json`.

use sonic_rs::{JsonContainerTrait, JsonValueTrait, Value};
use std::path::Path;
use tracing::{debug, warn};

use crate::autoload::AutoloadRules;
use crate::error::{Error, Result};
use crate::package::{LinkKind, PackageNode};

/// Name given to a root package that declares none.
const ROOT_PLACEHOLDER_NAME: &str = "__root__";

/// Version given to a root package that declares none.
const ROOT_PLACEHOLDER_VERSION: &str = "1.0.0+no-version-set";

const LINK_SECTIONS: [LinkKind; 5] = [
    LinkKind::Require,
    LinkKind::RequireDev,
    LinkKind::Replace,
    LinkKind::Provide,
    LinkKind::Conflict,
];

/// Decode a root `composer.json` document.
///
/// A missing name or version gets a placeholder, as for an unpublished
/// project.
///
/// # Errors
/// Returns an error on invalid JSON or an invalid declared version.
pub fn load_package(json: &str) -> Result<PackageNode> {
    let value: Value = sonic_rs::from_str(json)?;
    decode(&value, Some((ROOT_PLACEHOLDER_NAME, ROOT_PLACEHOLDER_VERSION)))
}

/// Decode one package object of an `installed.json` document.
///
/// # Errors
/// Returns an error if `name` or `version` is missing or invalid.
pub fn package_from_value(value: &Value) -> Result<PackageNode> {
    decode(value, None)
}

/// Decode an `installed.json` document: either a bare array of packages or
/// an object with a `packages` array.
///
/// Branch installs with an `extra.branch-alias` entry for their version are
/// followed by their alias package.
///
/// # Errors
/// Returns an error on invalid JSON or an invalid package entry.
pub fn load_installed(json: &str) -> Result<Vec<PackageNode>> {
    let value: Value = sonic_rs::from_str(json)?;
    let entries = value
        .as_array()
        .or_else(|| value.get("packages").and_then(|p| p.as_array()))
        .ok_or_else(|| {
            Error::invalid_package("installed.json", "expected an array of packages")
        })?;

    let mut packages = Vec::with_capacity(entries.len());
    for entry in entries.iter() {
        let package = package_from_value(entry)?;
        let alias = match package.branch_alias_version() {
            Some(version) => {
                let pretty = package
                    .branch_aliases
                    .get(&package.pretty_version)
                    .cloned()
                    .unwrap_or_else(|| version.to_string());
                Some(package.alias(&pretty)?)
            }
            None => None,
        };
        packages.push(package);
        packages.extend(alias);
    }
    debug!(count = packages.len(), "loaded installed packages");
    Ok(packages)
}

/// Read and decode an `installed.json` file.
///
/// # Errors
/// Returns an error if the file cannot be read or decoded.
pub fn load_installed_file(path: &Path) -> Result<Vec<PackageNode>> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    load_installed(&content)
}

fn decode(value: &Value, placeholders: Option<(&str, &str)>) -> Result<PackageNode> {
    if value.as_object().is_none() {
        return Err(Error::invalid_package("<unnamed>", "package declaration must be an object"));
    }

    let name = match (value.get("name").and_then(|v| v.as_str()), placeholders) {
        (Some(name), _) => name,
        (None, Some((name, _))) => name,
        (None, None) => return Err(Error::missing_field("<unnamed>", "name")),
    };
    let version = match (value.get("version").and_then(|v| v.as_str()), placeholders) {
        (Some(version), _) => version,
        (None, Some((_, version))) => version,
        (None, None) => return Err(Error::missing_field(name, "version")),
    };

    let mut package = PackageNode::new(name, version)?;

    for kind in LINK_SECTIONS {
        let Some(section) = value.get(kind.as_str()) else {
            continue;
        };
        let Some(links) = section.as_object() else {
            warn!(package = name, section = kind.as_str(), "link section is not an object, skipping");
            continue;
        };
        for (target, constraint) in links {
            match constraint.as_str() {
                Some(constraint) => package.add_link(target, constraint, kind),
                None => warn!(package = name, target, "link constraint is not a string, skipping"),
            }
        }
    }

    if let Some(package_type) = value.get("type").and_then(|v| v.as_str()) {
        package.package_type = package_type.to_string();
    }
    if let Some(target_dir) = value.get("target-dir").and_then(|v| v.as_str()) {
        package.target_dir = Some(target_dir.to_string());
    }
    if let Some(autoload) = value.get("autoload") {
        package.autoload = AutoloadRules::from_value(autoload);
    }
    if let Some(autoload) = value.get("autoload-dev") {
        package.dev_autoload = AutoloadRules::from_value(autoload);
    }

    if let Some(aliases) = value
        .get("extra")
        .and_then(|extra| extra.get("branch-alias"))
        .and_then(|aliases| aliases.as_object())
    {
        for (branch, alias) in aliases {
            if let Some(alias) = alias.as_str() {
                package.branch_aliases.insert(branch.to_string(), alias.to_string());
            }
        }
    }

    Ok(package)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AutoloadEntry, AutoloadType, ErrorCode};
    use pretty_assertions::assert_eq;

    #[test]
    fn root_gets_placeholders() {
        let root = load_package(r#"{"require": {"acme/foo": "^1.0"}}"#).unwrap();
        assert_eq!(root.name, "__root__");
        assert_eq!(root.version.to_string(), "1.0.0.0");
        assert_eq!(root.requires.len(), 1);
    }

    #[test]
    fn decodes_full_declaration() {
        let pkg = load_package(
            r#"{
                "name": "Acme/Widget",
                "version": "1.2.0",
                "type": "composer-plugin",
                "target-dir": "Acme/Widget",
                "require": {"php": ">=8.1", "acme/core": "self.version"},
                "require-dev": {"phpunit/phpunit": "^10"},
                "replace": {"acme/old-widget": "*"},
                "provide": {"psr/container-implementation": "1.0"},
                "conflict": {"acme/broken": "<1.0"},
                "autoload": {"psr-0": {"Acme\\Widget": ""}},
                "autoload-dev": {"classmap": ["tests/"]},
                "extra": {"branch-alias": {"dev-main": "1.x-dev"}}
            }"#,
        )
        .unwrap();

        assert_eq!(pkg.name, "acme/widget");
        assert_eq!(pkg.package_type, "composer-plugin");
        assert_eq!(pkg.target_dir.as_deref(), Some("Acme/Widget"));
        assert_eq!(pkg.requires[1].constraint, "1.2.0");
        assert_eq!(pkg.dev_requires.len(), 1);
        assert_eq!(pkg.replaces[0].target, "acme/old-widget");
        assert_eq!(pkg.provides.len(), 1);
        assert_eq!(pkg.conflicts.len(), 1);
        assert!(matches!(
            pkg.autoload.get(AutoloadType::Psr0),
            Some(AutoloadEntry::Namespaces(_))
        ));
        assert!(pkg.dev_autoload.get(AutoloadType::Classmap).is_some());
        assert_eq!(pkg.branch_aliases.get("dev-main").map(String::as_str), Some("1.x-dev"));
    }

    #[test]
    fn wrongly_typed_links_are_skipped() {
        let pkg = load_package(
            r#"{"name": "a/b", "version": "1.0", "require": ["x/y"], "require-dev": {"x/z": 1}}"#,
        )
        .unwrap();
        assert!(pkg.requires.is_empty());
        assert!(pkg.dev_requires.is_empty());
    }

    #[test]
    fn installed_accepts_both_layouts() {
        let bare = load_installed(r#"[{"name": "a/b", "version": "1.0.0"}]"#).unwrap();
        let wrapped =
            load_installed(r#"{"packages": [{"name": "a/b", "version": "1.0.0"}], "dev": true}"#)
                .unwrap();
        assert_eq!(bare, wrapped);
    }

    #[test]
    fn installed_branch_gets_alias_package() {
        let packages = load_installed(
            r#"[{"name": "a/b", "version": "dev-main", "extra": {"branch-alias": {"dev-main": "2.x-dev"}}}]"#,
        )
        .unwrap();
        assert_eq!(packages.len(), 2);
        assert!(!packages[0].is_alias());
        assert!(packages[1].is_alias());
        assert_eq!(packages[1].pretty_version, "2.x-dev");
    }

    #[test]
    fn installed_requires_name_and_version() {
        let err = load_installed(r#"[{"version": "1.0.0"}]"#).unwrap_err();
        assert_eq!(err.code(), ErrorCode::E0402);

        let err = load_installed(r#"[{"name": "a/b"}]"#).unwrap_err();
        assert_eq!(err.code(), ErrorCode::E0402);

        let err = load_installed(r#"{"dev": true}"#).unwrap_err();
        assert_eq!(err.code(), ErrorCode::E0401);
    }

    #[test]
    fn invalid_json_is_reported() {
        let err = load_installed("{").unwrap_err();
        assert_eq!(err.code(), ErrorCode::E0403);
    }

    #[test]
    fn reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("installed.json");
        std::fs::write(&path, r#"[{"name": "a/b", "version": "1.0.0"}]"#).unwrap();
        assert_eq!(load_installed_file(&path).unwrap().len(), 1);

        let err = load_installed_file(&dir.path().join("missing.json")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::E0501);
    }
}
