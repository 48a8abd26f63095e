//! Resolution of declared autoload rules to project-relative paths.

use ahash::{AHashMap, AHashSet};
use ostinato_config::AutoloadSettings;
use ostinato_core::{AutoloadEntry, AutoloadRules, AutoloadType};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::{debug, trace, warn};

use crate::error::{AutoloadError, Result};
use crate::package_map::{PackageMap, PackageMapEntry};
use crate::probe::PathProbe;

/// Leading `./` and `../` segments of a quoted exclude pattern.
static UPDIR_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^((?:(?:\\\.){1,2}/)+)").expect("valid exclude regex")
});

static REPEATED_SLASHES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/+").expect("valid exclude regex"));

/// Paths registered for one namespace prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespacePaths {
    /// Namespace prefix, e.g. `Acme\Http\`.
    pub namespace: String,
    /// Project-relative paths, in package map order.
    pub paths: Vec<String>,
}

/// A file loaded on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoloadFile {
    /// Stable identifier, unique per package and declared path.
    pub identifier: String,
    /// Project-relative path.
    pub path: String,
}

/// Resolved autoload paths of a whole package map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Autoloads {
    /// PSR-0 prefixes, most specific first.
    #[serde(rename = "psr-0")]
    pub psr0: Vec<NamespacePaths>,
    /// PSR-4 prefixes, most specific first.
    #[serde(rename = "psr-4")]
    pub psr4: Vec<NamespacePaths>,
    /// Directories and files to scan for classes.
    pub classmap: Vec<String>,
    /// Files to include, dependencies first.
    pub files: Vec<AutoloadFile>,
    /// Regex sources of paths excluded from class scanning.
    pub exclude_from_classmap: Vec<String>,
}

impl Autoloads {
    /// Paths registered for a PSR-4 prefix.
    #[must_use]
    pub fn psr4_paths(&self, namespace: &str) -> Option<&[String]> {
        find_namespace(&self.psr4, namespace)
    }

    /// Paths registered for a PSR-0 prefix.
    #[must_use]
    pub fn psr0_paths(&self, namespace: &str) -> Option<&[String]> {
        find_namespace(&self.psr0, namespace)
    }

    /// All exclude patterns combined into one regex, or `None` if there are
    /// none.
    ///
    /// # Errors
    /// Returns an error if the combined pattern does not compile.
    pub fn classmap_exclusion(&self) -> Result<Option<Regex>> {
        if self.exclude_from_classmap.is_empty() {
            return Ok(None);
        }
        let pattern = format!("({})", self.exclude_from_classmap.join("|"));
        Regex::new(&pattern)
            .map(Some)
            .map_err(|source| AutoloadError::ExcludePattern { pattern, source })
    }
}

fn find_namespace<'a>(entries: &'a [NamespacePaths], namespace: &str) -> Option<&'a [String]> {
    entries
        .iter()
        .find(|entry| entry.namespace == namespace)
        .map(|entry| entry.paths.as_slice())
}

/// Join a declared path onto an install path. The root package has an
/// empty install path.
#[must_use]
pub fn join_path(install_path: &str, path: &str) -> String {
    if install_path.is_empty() {
        if path.is_empty() {
            ".".to_string()
        } else {
            path.to_string()
        }
    } else {
        format!("{install_path}/{path}")
    }
}

/// Identifier of a `files` entry: the first 32 hex digits of the blake3
/// hash of `<package>:<path>`.
#[must_use]
pub fn file_identifier(package_name: &str, path: &str) -> String {
    let hash = blake3::hash(format!("{package_name}:{path}").as_bytes());
    hash.to_hex()[..32].to_string()
}

/// Remove a leading `target-dir` from a root package path, with either
/// slash style matching.
fn strip_target_dir(target_dir: &str, path: &str) -> String {
    let trimmed = path.trim_start_matches(['\\', '/']);
    let pattern = target_dir
        .split(['/', '\\'])
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"[\\/]");
    match Regex::new(&format!("^{pattern}")) {
        Ok(re) => re
            .replace(trimmed, "")
            .trim_start_matches(['\\', '/'])
            .to_string(),
        Err(err) => {
            warn!(target_dir, error = %err, "cannot strip target-dir from path");
            trimmed.to_string()
        }
    }
}

/// One declared path, with the prefix it was declared under.
struct Declared<'a> {
    namespace: Option<&'a str>,
    path: &'a str,
}

/// Turns declared autoload rules into project-relative paths.
pub struct AutoloadPathResolver<'p> {
    probe: &'p dyn PathProbe,
    dev_mode: bool,
    target_dir_compat: bool,
}

impl std::fmt::Debug for AutoloadPathResolver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoloadPathResolver")
            .field("dev_mode", &self.dev_mode)
            .field("target_dir_compat", &self.target_dir_compat)
            .finish()
    }
}

impl<'p> AutoloadPathResolver<'p> {
    /// Resolver in dev mode with the target-dir shim enabled.
    #[must_use]
    pub fn new(probe: &'p dyn PathProbe) -> Self {
        Self {
            probe,
            dev_mode: true,
            target_dir_compat: true,
        }
    }

    /// Resolver configured from settings.
    #[must_use]
    pub fn from_settings(probe: &'p dyn PathProbe, settings: &AutoloadSettings) -> Self {
        Self {
            probe,
            dev_mode: settings.dev_mode,
            target_dir_compat: settings.target_dir_compat,
        }
    }

    /// Merge the root's `autoload-dev` rules.
    #[must_use]
    pub fn with_dev_mode(mut self, dev_mode: bool) -> Self {
        self.dev_mode = dev_mode;
        self
    }

    /// Rewrite unreadable classmap/files paths of `target-dir` packages.
    #[must_use]
    pub fn with_target_dir_compat(mut self, enabled: bool) -> Self {
        self.target_dir_compat = enabled;
        self
    }

    /// Resolve every autoload type, sorting the map with `weights`. The root
    /// package is the map's first entry, so it is not passed separately.
    #[must_use]
    pub fn parse_autoloads(
        &self,
        package_map: &PackageMap,
        weights: &AHashMap<String, i64>,
    ) -> Autoloads {
        let sorted = package_map.sorted(weights);
        self.parse_with_order(package_map, &sorted)
    }

    /// Resolve every autoload type. Namespace prefixes follow the map order
    /// (root first); the other types follow `sorted`, which must end with
    /// the root.
    #[must_use]
    pub fn parse_with_order(&self, package_map: &PackageMap, sorted: &[&PackageMapEntry]) -> Autoloads {
        let root = package_map.root().package.name.as_str();
        let unsorted: Vec<&PackageMapEntry> = package_map.entries().iter().collect();

        let autoloads = Autoloads {
            psr0: self.namespaces(&unsorted, AutoloadType::Psr0, root),
            psr4: self.namespaces(&unsorted, AutoloadType::Psr4, root),
            classmap: self.paths(sorted, AutoloadType::Classmap, root),
            files: self.files(sorted, root),
            exclude_from_classmap: self.paths(sorted, AutoloadType::ExcludeFromClassmap, root),
        };
        debug!(
            psr0 = autoloads.psr0.len(),
            psr4 = autoloads.psr4.len(),
            classmap = autoloads.classmap.len(),
            files = autoloads.files.len(),
            exclude = autoloads.exclude_from_classmap.len(),
            "resolved autoloads"
        );
        autoloads
    }

    fn namespaces(&self, entries: &[&PackageMapEntry], ty: AutoloadType, root: &str) -> Vec<NamespacePaths> {
        let mut prefixes: BTreeMap<String, Vec<String>> = BTreeMap::new();
        self.walk(entries, ty, root, |_, declared, relative| {
            prefixes
                .entry(declared.namespace.unwrap_or_default().to_string())
                .or_default()
                .push(relative);
        });
        // Reverse key order puts `Foo\Bar\` ahead of `Foo\`.
        prefixes
            .into_iter()
            .rev()
            .map(|(namespace, paths)| NamespacePaths { namespace, paths })
            .collect()
    }

    fn paths(&self, entries: &[&PackageMapEntry], ty: AutoloadType, root: &str) -> Vec<String> {
        let mut paths = Vec::new();
        self.walk(entries, ty, root, |_, _, relative| paths.push(relative));
        paths
    }

    fn files(&self, entries: &[&PackageMapEntry], root: &str) -> Vec<AutoloadFile> {
        let mut seen = AHashSet::new();
        let mut files = Vec::new();
        self.walk(entries, AutoloadType::Files, root, |name, declared, relative| {
            let identifier = file_identifier(name, declared.path);
            if seen.insert(identifier.clone()) {
                files.push(AutoloadFile {
                    identifier,
                    path: relative,
                });
            }
        });
        files
    }

    /// Visit every usable declared path of `ty`, in `entries` order, with
    /// the target-dir shim applied. `visit` receives the package name, the
    /// declared path after the shim and the resolved path.
    fn walk<F>(&self, entries: &[&PackageMapEntry], ty: AutoloadType, root: &str, mut visit: F)
    where
        F: FnMut(&str, &Declared<'_>, String),
    {
        for entry in entries {
            let package = &entry.package;
            let is_root = package.name == root;
            let rules: Cow<'_, AutoloadRules> = if is_root && self.dev_mode {
                Cow::Owned(package.autoload.merged_with(&package.dev_autoload))
            } else {
                Cow::Borrowed(&package.autoload)
            };

            let declared: Vec<Declared<'_>> = match (rules.get(ty), ty.is_namespaced()) {
                (None, _) => continue,
                (Some(AutoloadEntry::Namespaces(prefixes)), true) => prefixes
                    .iter()
                    .flat_map(|(prefix, paths)| {
                        paths.iter().map(move |path| Declared {
                            namespace: Some(prefix.as_str()),
                            path: path.as_str(),
                        })
                    })
                    .collect(),
                (Some(AutoloadEntry::Paths(paths)), false) => paths
                    .iter()
                    .map(|path| Declared {
                        namespace: None,
                        path: path.as_str(),
                    })
                    .collect(),
                (Some(AutoloadEntry::Malformed { found }), _) => {
                    warn!(package = %package.name, autoload_type = %ty, found = %found, "skipping malformed autoload entry");
                    continue;
                }
                (Some(_), _) => {
                    warn!(package = %package.name, autoload_type = %ty, "skipping autoload entry of the wrong shape");
                    continue;
                }
            };

            let target_dir = package.target_dir.as_deref().filter(|dir| !dir.is_empty());
            let install_path = match target_dir {
                Some(dir) if !is_root => entry
                    .install_path
                    .strip_suffix(&format!("/{dir}"))
                    .unwrap_or(&entry.install_path),
                _ => entry.install_path.as_str(),
            };

            for item in declared {
                let mut path = Cow::Borrowed(item.path);
                if let Some(dir) = target_dir {
                    if self.target_dir_compat
                        && !ty.is_namespaced()
                        && !self.probe.is_readable(&join_path(install_path, &path))
                    {
                        path = if is_root {
                            Cow::Owned(strip_target_dir(dir, &path))
                        } else {
                            Cow::Owned(format!("{dir}/{path}"))
                        };
                        trace!(package = %package.name, from = item.path, to = %path, "applied target-dir shim");
                    }
                }

                let relative = if ty == AutoloadType::ExcludeFromClassmap {
                    match self.exclude_pattern(install_path, &path) {
                        Some(pattern) => pattern,
                        None => continue,
                    }
                } else {
                    join_path(install_path, &path)
                };

                let declared = Declared {
                    namespace: item.namespace,
                    path: &path,
                };
                visit(&package.name, &declared, relative);
            }
        }
    }

    /// Regex source for an exclude-from-classmap path: `**` matches across
    /// directories, `*` within one, and leading `./`/`../` are resolved
    /// against the install path.
    fn exclude_pattern(&self, install_path: &str, path: &str) -> Option<String> {
        let normalized = path.replace('\\', "/");
        let quoted = regex::escape(normalized.trim_matches('/'));
        let quoted = REPEATED_SLASHES.replace_all(&quoted, "/");
        let pattern = quoted.replace(r"\*\*", ".+?").replace(r"\*", "[^/]+?");

        let (updir, rest) = match UPDIR_PREFIX.find(&pattern) {
            Some(m) => (m.as_str().replace(r"\.", "."), &pattern[m.end()..]),
            None => (String::new(), pattern.as_str()),
        };
        let base = if install_path.is_empty() {
            updir
        } else {
            format!("{install_path}/{updir}")
        };

        let Some(resolved) = self.probe.resolve(&base) else {
            debug!(path, base = %base, "exclude-from-classmap base does not exist, skipping");
            return None;
        };
        Some(format!("{}/{rest}($|/)", regex::escape(&resolved)))
    }
}
