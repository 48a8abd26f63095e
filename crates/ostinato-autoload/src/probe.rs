//! Filesystem queries made while resolving autoload paths.

use ahash::AHashSet;
use std::path::PathBuf;

/// Answers filesystem questions about paths relative to the project root.
pub trait PathProbe {
    /// Whether the path exists and can be read.
    fn is_readable(&self, path: &str) -> bool;

    /// Absolute path with `.`/`..` resolved and `/` separators, or `None`
    /// when the path does not exist.
    fn resolve(&self, path: &str) -> Option<String>;
}

/// Probe backed by the real filesystem.
#[derive(Debug, Clone)]
pub struct FsProbe {
    root: PathBuf,
}

impl FsProbe {
    /// Probe paths relative to `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl PathProbe for FsProbe {
    fn is_readable(&self, path: &str) -> bool {
        std::fs::metadata(self.root.join(path)).is_ok()
    }

    fn resolve(&self, path: &str) -> Option<String> {
        let resolved = std::fs::canonicalize(self.root.join(path)).ok()?;
        Some(resolved.to_string_lossy().replace('\\', "/"))
    }
}

/// In-memory probe over a fixed set of paths.
///
/// Registering a path makes its parent directories exist too.
#[derive(Debug, Clone, Default)]
pub struct StaticProbe {
    root: String,
    paths: AHashSet<String>,
}

impl StaticProbe {
    /// Empty probe rooted at `root` (an absolute path).
    #[must_use]
    pub fn new(root: &str) -> Self {
        Self {
            root: root.trim_end_matches('/').to_string(),
            paths: AHashSet::new(),
        }
    }

    /// Register an existing path.
    #[must_use]
    pub fn with_path(mut self, path: &str) -> Self {
        self.insert(path);
        self
    }

    /// Register an existing path.
    pub fn insert(&mut self, path: &str) {
        let Some(normalized) = normalize(path) else {
            return;
        };
        let mut current = normalized.as_str();
        while !current.is_empty() {
            self.paths.insert(current.to_string());
            current = current.rfind('/').map_or("", |idx| &current[..idx]);
        }
    }
}

/// Lexically resolve `.` and `..` components. `None` when the path climbs
/// above the root.
fn normalize(path: &str) -> Option<String> {
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split(['/', '\\']) {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            part => parts.push(part),
        }
    }
    Some(parts.join("/"))
}

impl PathProbe for StaticProbe {
    fn is_readable(&self, path: &str) -> bool {
        normalize(path).is_some_and(|p| p.is_empty() || self.paths.contains(&p))
    }

    fn resolve(&self, path: &str) -> Option<String> {
        let normalized = normalize(path)?;
        if normalized.is_empty() {
            Some(self.root.clone())
        } else if self.paths.contains(&normalized) {
            Some(format!("{}/{normalized}", self.root))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("a/b/../c", Some("a/c"))]
    #[test_case("./a//b/", Some("a/b"))]
    #[test_case("a\\b", Some("a/b"))]
    #[test_case("..", None)]
    #[test_case("", Some(""))]
    fn lexical_normalization(input: &str, expected: Option<&str>) {
        assert_eq!(normalize(input).as_deref(), expected);
    }

    #[test]
    fn static_probe_knows_parents() {
        let probe = StaticProbe::new("/project/").with_path("vendor/acme/lib/src/Foo.php");
        assert!(probe.is_readable("vendor/acme/lib/src/Foo.php"));
        assert!(probe.is_readable("vendor/acme"));
        assert!(probe.is_readable(""));
        assert!(!probe.is_readable("vendor/other"));
        assert_eq!(
            probe.resolve("vendor/acme/lib/src/../").as_deref(),
            Some("/project/vendor/acme/lib")
        );
        assert_eq!(probe.resolve("./").as_deref(), Some("/project"));
        assert_eq!(probe.resolve("missing"), None);
    }

    #[test]
    fn fs_probe_reads_disk() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("vendor/acme/lib")).unwrap();
        std::fs::write(dir.path().join("vendor/acme/lib/a.php"), "<?php").unwrap();

        let probe = FsProbe::new(dir.path());
        assert!(probe.is_readable("vendor/acme/lib/a.php"));
        assert!(!probe.is_readable("vendor/acme/lib/b.php"));

        let resolved = probe.resolve("vendor/acme/lib/../lib").unwrap();
        assert!(resolved.ends_with("/vendor/acme/lib"));
        assert!(!resolved.contains('\\'));
        assert_eq!(probe.resolve("nope"), None);
    }
}
