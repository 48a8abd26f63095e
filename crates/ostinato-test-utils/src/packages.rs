//! Shorthand constructors for package nodes.

use ostinato_core::{AutoloadRules, AutoloadType, PackageNode};

/// A `library` package at `version`.
///
/// # Panics
/// Panics if `version` is not a valid version.
#[must_use]
pub fn package(name: &str, version: &str) -> PackageNode {
    PackageNode::new(name, version).expect("valid fixture version")
}

/// A `1.0.0` package requiring each of `requires` with `*`.
#[must_use]
pub fn package_requiring(name: &str, requires: &[&str]) -> PackageNode {
    requires
        .iter()
        .fold(package(name, "1.0.0"), |pkg, target| pkg.with_require(target, "*"))
}

/// Autoload rules with a single PSR-4 prefix.
#[must_use]
pub fn psr4(prefix: &str, path: &str) -> AutoloadRules {
    AutoloadRules::new().with_namespace(AutoloadType::Psr4, prefix, [path])
}

/// Autoload rules with a single PSR-0 prefix.
#[must_use]
pub fn psr0(prefix: &str, path: &str) -> AutoloadRules {
    AutoloadRules::new().with_namespace(AutoloadType::Psr0, prefix, [path])
}

/// Autoload rules with plain paths of one type.
#[must_use]
pub fn paths(ty: AutoloadType, paths: &[&str]) -> AutoloadRules {
    AutoloadRules::new().with_paths(ty, paths.iter().copied())
}

/// Package names in order.
#[must_use]
pub fn names<'a>(packages: impl IntoIterator<Item = &'a PackageNode>) -> Vec<String> {
    packages.into_iter().map(|p| p.name.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builds_requiring_packages() {
        let pkg = package_requiring("a/a", &["b/b", "c/c"]);
        assert_eq!(pkg.requires.len(), 2);
        assert_eq!(pkg.requires[1].target, "c/c");
    }

    #[test]
    fn builds_rules() {
        assert!(psr4("App\\", "src/").get(AutoloadType::Psr4).is_some());
        assert!(paths(AutoloadType::Files, &["a.php"]).get(AutoloadType::Files).is_some());
    }
}
