//! The package map: every autoloadable package with its install path.

use ahash::{AHashMap, AHashSet};
use ostinato_core::{AutoloadEntry, AutoloadType, PackageNode};
use std::collections::VecDeque;
use tracing::debug;

use crate::error::{AutoloadError, Result};
use crate::sorter::PackageSorter;

/// Decides where a package is installed, relative to the project root.
pub trait InstallPathResolver {
    /// Install path of a non-root package.
    fn install_path(&self, package: &PackageNode) -> String;
}

impl<F> InstallPathResolver for F
where
    F: Fn(&PackageNode) -> String,
{
    fn install_path(&self, package: &PackageNode) -> String {
        self(package)
    }
}

/// Standard library layout: `<vendor-dir>/<name>[/<target-dir>]`.
#[derive(Debug, Clone)]
pub struct VendorInstallPaths {
    vendor_dir: String,
}

impl VendorInstallPaths {
    /// Layout under `vendor_dir`.
    #[must_use]
    pub fn new(vendor_dir: &str) -> Self {
        Self {
            vendor_dir: vendor_dir.trim_end_matches('/').to_string(),
        }
    }
}

impl InstallPathResolver for VendorInstallPaths {
    fn install_path(&self, package: &PackageNode) -> String {
        let base = format!("{}/{}", self.vendor_dir, package.pretty_name);
        match package.target_dir.as_deref() {
            Some(target_dir) if !target_dir.is_empty() => format!("{base}/{target_dir}"),
            _ => base,
        }
    }
}

/// A package and where it lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageMapEntry {
    /// The package.
    pub package: PackageNode,
    /// Install path; empty for the root package.
    pub install_path: String,
}

/// Root package first, then installed packages in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageMap {
    entries: Vec<PackageMapEntry>,
}

impl PackageMap {
    /// Build the map. Alias packages are left out since they share the
    /// files of the package they alias.
    #[must_use]
    pub fn build(
        root: &PackageNode,
        installed: &[PackageNode],
        resolver: &dyn InstallPathResolver,
    ) -> Self {
        let mut entries = Vec::with_capacity(installed.len() + 1);
        entries.push(PackageMapEntry {
            package: root.clone(),
            install_path: String::new(),
        });
        for package in installed {
            if package.is_alias() {
                debug!(package = %package.name, version = %package.pretty_version, "skipping alias package");
                continue;
            }
            entries.push(PackageMapEntry {
                install_path: resolver.install_path(package),
                package: package.clone(),
            });
        }
        Self { entries }
    }

    /// The root entry.
    #[must_use]
    pub fn root(&self) -> &PackageMapEntry {
        &self.entries[0]
    }

    /// All entries, root first.
    #[must_use]
    pub fn entries(&self) -> &[PackageMapEntry] {
        &self.entries
    }

    /// Installed entries, without the root.
    #[must_use]
    pub fn installed(&self) -> &[PackageMapEntry] {
        &self.entries[1..]
    }

    /// Number of entries including the root.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false: the root is always present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entry for a package name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PackageMapEntry> {
        self.entries.iter().find(|entry| entry.package.name == name)
    }

    /// Drop the named packages. The root is always kept.
    #[must_use]
    pub fn without_dev_packages(&self, dev_names: &AHashSet<String>) -> Self {
        let mut entries = Vec::with_capacity(self.entries.len());
        entries.push(self.entries[0].clone());
        entries.extend(
            self.installed()
                .iter()
                .filter(|entry| !dev_names.contains(&entry.package.name))
                .cloned(),
        );
        debug!(
            removed = self.entries.len() - entries.len(),
            "filtered dev packages from package map"
        );
        Self { entries }
    }

    /// Installed entries in dependency order, followed by the root.
    #[must_use]
    pub fn sorted(&self, weights: &AHashMap<String, i64>) -> Vec<&PackageMapEntry> {
        self.sorted_indices(weights)
            .into_iter()
            .map(|idx| &self.entries[idx])
            .collect()
    }

    /// Indices into [`Self::entries`] in dependency order; the root (index
    /// 0) comes last.
    #[must_use]
    pub fn sorted_indices(&self, weights: &AHashMap<String, i64>) -> Vec<usize> {
        let packages: Vec<&PackageNode> = self.installed().iter().map(|e| &e.package).collect();
        let mut order: Vec<usize> = PackageSorter::sorted_indices(&packages, weights)
            .into_iter()
            .map(|idx| idx + 1)
            .collect();
        order.push(0);
        order
    }

    /// Reject autoload rules no generator can honor: psr-4 combined with
    /// `target-dir`, and psr-4 prefixes without a trailing `\`.
    ///
    /// # Errors
    /// Returns the first offending package.
    pub fn validate(&self, dev_mode: bool) -> Result<()> {
        for (idx, entry) in self.entries.iter().enumerate() {
            let package = &entry.package;
            let rules = if idx == 0 && dev_mode {
                package.autoload.merged_with(&package.dev_autoload)
            } else {
                package.autoload.clone()
            };
            let Some(AutoloadEntry::Namespaces(prefixes)) = rules.get(AutoloadType::Psr4) else {
                continue;
            };
            if package.target_dir.as_deref().is_some_and(|dir| !dir.is_empty()) {
                return Err(AutoloadError::invalid_rules(
                    &package.pretty_name,
                    "psr-4 autoloading is incompatible with the target-dir property, remove the target-dir",
                ));
            }
            if let Some((prefix, _)) = prefixes
                .iter()
                .find(|(prefix, _)| !prefix.is_empty() && !prefix.ends_with('\\'))
            {
                return Err(AutoloadError::invalid_rules(
                    &package.pretty_name,
                    format!(
                        "psr-4 namespace prefixes must end with a namespace separator, '{prefix}' does not, use '{prefix}\\'"
                    ),
                ));
            }
        }
        Ok(())
    }
}

/// Names of installed packages reachable only through the root's
/// `require-dev` links.
#[must_use]
pub fn dev_package_names(root: &PackageNode, installed: &[PackageNode]) -> AHashSet<String> {
    let mut providers: AHashMap<&str, Vec<&PackageNode>> = AHashMap::new();
    for package in installed {
        for name in package.names() {
            providers.entry(name).or_default().push(package);
        }
    }

    let mut production: AHashSet<&str> = AHashSet::new();
    let mut queue: VecDeque<&str> = root.requires.iter().map(|l| l.target.as_str()).collect();
    while let Some(target) = queue.pop_front() {
        let Some(candidates) = providers.get(target) else {
            continue;
        };
        for package in candidates {
            if production.insert(package.name.as_str()) {
                queue.extend(package.requires.iter().map(|l| l.target.as_str()));
            }
        }
    }

    installed
        .iter()
        .filter(|package| !production.contains(package.name.as_str()))
        .map(|package| package.name.clone())
        .collect()
}
