//! Compute-once autoload pipeline: package map, dependency order, paths.

use ahash::{AHashMap, AHashSet};
use ostinato_config::AutoloadSettings;
use ostinato_core::{Error as CoreError, PackageNode, Stability, load_installed_file, load_package};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::package_map::{
    InstallPathResolver, PackageMap, PackageMapEntry, VendorInstallPaths, dev_package_names,
};
use crate::probe::{FsProbe, PathProbe};
use crate::resolver::{AutoloadPathResolver, Autoloads};

/// Everything needed to write an autoloader, computed once at construction.
#[derive(Debug, Clone)]
pub struct AutoloadPlan {
    package_map: PackageMap,
    order: Vec<usize>,
    autoloads: Autoloads,
    dev_packages: AHashSet<String>,
    unstable: Vec<String>,
    prerelease: Vec<String>,
}

/// Sort weights for the installed packages, from explicit weights and
/// priority package types.
#[must_use]
pub fn package_weights(settings: &AutoloadSettings, installed: &[PackageNode]) -> AHashMap<String, i64> {
    installed
        .iter()
        .filter_map(|package| {
            settings
                .weight_of(&package.name, &package.package_type)
                .map(|weight| (package.name.clone(), weight))
        })
        .collect()
}

impl AutoloadPlan {
    /// Build the plan for a root package and its installed packages.
    ///
    /// # Errors
    /// Returns an error if a package declares autoload rules that cannot be
    /// honored.
    pub fn new(
        root: &PackageNode,
        installed: &[PackageNode],
        paths: &dyn InstallPathResolver,
        probe: &dyn PathProbe,
        settings: &AutoloadSettings,
    ) -> Result<Self> {
        let dev_packages = dev_package_names(root, installed);
        let mut package_map = PackageMap::build(root, installed, paths);
        if !settings.dev_mode {
            package_map = package_map.without_dev_packages(&dev_packages);
        }
        package_map.validate(settings.dev_mode)?;

        let weights = package_weights(settings, installed);
        let order = package_map.sorted_indices(&weights);
        let sorted: Vec<&PackageMapEntry> =
            order.iter().map(|idx| &package_map.entries()[*idx]).collect();

        let autoloads =
            AutoloadPathResolver::from_settings(probe, settings).parse_with_order(&package_map, &sorted);

        let filter = root.stability_filter(settings.minimum_stability);
        let (unstable, accepted): (Vec<&PackageMapEntry>, Vec<&PackageMapEntry>) = package_map
            .installed()
            .iter()
            .partition(|entry| !filter.is_acceptable(&entry.package.name, &entry.package.version));
        let unstable: Vec<String> = unstable.iter().map(|e| e.package.name.clone()).collect();
        for name in &unstable {
            warn!(package = %name, minimum = %settings.minimum_stability, "installed package is below the minimum stability");
        }

        // With prefer-stable, an accepted pre-release means no stable release satisfied the root.
        let prerelease: Vec<String> = if settings.prefer_stable {
            accepted
                .iter()
                .filter(|entry| entry.package.version.stability() != Stability::Stable)
                .map(|entry| entry.package.name.clone())
                .collect()
        } else {
            Vec::new()
        };
        for name in &prerelease {
            info!(package = %name, "prefer-stable is set but a pre-release is installed");
        }

        info!(
            packages = package_map.len(),
            dev_packages = dev_packages.len(),
            dev_mode = settings.dev_mode,
            "built autoload plan"
        );
        Ok(Self {
            package_map,
            order,
            autoloads,
            dev_packages,
            unstable,
            prerelease,
        })
    }

    /// Build the plan for a project on disk: `composer.json` at the project
    /// root and `<vendor-dir>/composer/installed.json`. A missing
    /// `installed.json` means nothing is installed.
    ///
    /// # Errors
    /// Returns an error if a manifest cannot be read or decoded.
    pub fn load(project_dir: &Path, settings: &AutoloadSettings) -> Result<Self> {
        let manifest_path = project_dir.join("composer.json");
        let manifest = std::fs::read_to_string(&manifest_path)
            .map_err(|e| CoreError::io(&manifest_path, e))?;
        let root = load_package(&manifest)?;

        let installed_path = project_dir
            .join(&settings.vendor_dir)
            .join("composer")
            .join("installed.json");
        let installed = if installed_path.exists() {
            load_installed_file(&installed_path)?
        } else {
            debug!(path = %installed_path.display(), "no installed.json, assuming no packages");
            Vec::new()
        };

        let paths = VendorInstallPaths::new(&settings.vendor_dir);
        let probe = FsProbe::new(project_dir);
        Self::new(&root, &installed, &paths, &probe, settings)
    }

    /// The package map, root first.
    #[must_use]
    pub fn package_map(&self) -> &PackageMap {
        &self.package_map
    }

    /// Entries in dependency order, root last.
    pub fn sorted_entries(&self) -> impl Iterator<Item = &PackageMapEntry> {
        self.order.iter().map(|idx| &self.package_map.entries()[*idx])
    }

    /// The resolved autoload paths.
    #[must_use]
    pub fn autoloads(&self) -> &Autoloads {
        &self.autoloads
    }

    /// Installed packages only required for development.
    #[must_use]
    pub fn dev_packages(&self) -> &AHashSet<String> {
        &self.dev_packages
    }

    /// Installed packages whose version the root's stability rules reject.
    #[must_use]
    pub fn unstable_packages(&self) -> &[String] {
        &self.unstable
    }

    /// Installed pre-releases the stability rules accept. Only collected
    /// when `prefer-stable` is set; empty otherwise.
    #[must_use]
    pub fn prerelease_packages(&self) -> &[String] {
        &self.prerelease
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::StaticProbe;
    use ostinato_core::{AutoloadRules, AutoloadType};
    use pretty_assertions::assert_eq;

    fn pkg(name: &str, version: &str) -> PackageNode {
        PackageNode::new(name, version).unwrap()
    }

    fn names(plan: &AutoloadPlan) -> Vec<&str> {
        plan.sorted_entries().map(|e| e.package.name.as_str()).collect()
    }

    #[test]
    fn plan_in_dev_and_production_mode() {
        let root = pkg("acme/app", "1.0.0")
            .with_require("acme/lib", "^1.0")
            .with_dev_require("acme/testing", "^1.0");
        let installed = vec![
            pkg("acme/testing", "1.0.0")
                .with_autoload(AutoloadRules::new().with_paths(AutoloadType::Files, ["t.php"])),
            pkg("acme/lib", "1.2.0")
                .with_autoload(AutoloadRules::new().with_paths(AutoloadType::Files, ["l.php"])),
        ];
        let probe = StaticProbe::new("/p");
        let paths = VendorInstallPaths::new("vendor");

        let dev = AutoloadPlan::new(&root, &installed, &paths, &probe, &AutoloadSettings::default())
            .unwrap();
        assert_eq!(names(&dev), ["acme/testing", "acme/lib", "acme/app"]);
        assert_eq!(dev.autoloads().files.len(), 2);
        assert!(dev.dev_packages().contains("acme/testing"));

        let settings = AutoloadSettings {
            dev_mode: false,
            ..AutoloadSettings::default()
        };
        let prod = AutoloadPlan::new(&root, &installed, &paths, &probe, &settings).unwrap();
        assert_eq!(names(&prod), ["acme/lib", "acme/app"]);
        assert_eq!(prod.autoloads().files[0].path, "vendor/acme/lib/l.php");
    }

    #[test]
    fn priority_types_load_first() {
        let root = pkg("acme/app", "1.0.0");
        let installed = vec![
            pkg("acme/lib", "1.0.0"),
            pkg("acme/plugin", "1.0.0").with_type("composer-plugin"),
        ];
        let plan = AutoloadPlan::new(
            &root,
            &installed,
            &VendorInstallPaths::new("vendor"),
            &StaticProbe::new("/p"),
            &AutoloadSettings::default(),
        )
        .unwrap();
        assert_eq!(names(&plan), ["acme/plugin", "acme/lib", "acme/app"]);
    }

    #[test]
    fn unstable_installs_are_reported() {
        let root = pkg("acme/app", "1.0.0")
            .with_require("acme/beta", "^2.0@beta")
            .with_require("acme/dev", "^1.0");
        let installed = vec![pkg("acme/beta", "2.0.0-beta1"), pkg("acme/dev", "dev-main")];
        let plan = AutoloadPlan::new(
            &root,
            &installed,
            &VendorInstallPaths::new("vendor"),
            &StaticProbe::new("/p"),
            &AutoloadSettings::default(),
        )
        .unwrap();
        assert_eq!(plan.unstable_packages(), ["acme/dev"]);
        assert!(plan.prerelease_packages().is_empty());
    }

    #[test]
    fn prefer_stable_reports_accepted_prereleases() {
        let root = pkg("acme/app", "1.0.0")
            .with_require("acme/beta", "^2.0@beta")
            .with_require("acme/lib", "^1.0")
            .with_require("acme/dev", "^1.0");
        let installed = vec![
            pkg("acme/beta", "2.0.0-beta1"),
            pkg("acme/lib", "1.2.0"),
            pkg("acme/dev", "dev-main"),
        ];
        let settings = AutoloadSettings {
            prefer_stable: true,
            ..AutoloadSettings::default()
        };
        let plan = AutoloadPlan::new(
            &root,
            &installed,
            &VendorInstallPaths::new("vendor"),
            &StaticProbe::new("/p"),
            &settings,
        )
        .unwrap();
        assert_eq!(plan.unstable_packages(), ["acme/dev"]);
        assert_eq!(plan.prerelease_packages(), ["acme/beta"]);
    }

    #[test]
    fn invalid_rules_fail_the_plan() {
        let root = pkg("acme/app", "1.0.0").with_autoload(
            AutoloadRules::new().with_namespace(AutoloadType::Psr4, "App", ["src/"]),
        );
        let err = AutoloadPlan::new(
            &root,
            &[],
            &VendorInstallPaths::new("vendor"),
            &StaticProbe::new("/p"),
            &AutoloadSettings::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("namespace separator"));
    }
}
