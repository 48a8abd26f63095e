//! Autoload settings and their `composer.json` source.

use ostinato_semver::Stability;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{ConfigError, Result};

/// Package types that are installed, and therefore ordered, ahead of others.
const DEFAULT_PRIORITY_TYPES: [&str; 2] = ["composer-plugin", "composer-installer"];

/// Settings consumed by the package sorter and the autoload resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct AutoloadSettings {
    /// Vendor directory, relative to the project root.
    pub vendor_dir: String,
    /// Include `require-dev` packages and the root `autoload-dev` rules.
    pub dev_mode: bool,
    /// Lowest stability accepted without an explicit flag.
    pub minimum_stability: Stability,
    /// Stable releases are expected; accepted pre-release installs are
    /// reported by the autoload plan.
    pub prefer_stable: bool,
    /// Rewrite classmap/files paths of packages that declare a `target-dir`.
    pub target_dir_compat: bool,
    /// Package types given a leading sort weight.
    pub priority_types: Vec<String>,
    /// Explicit sort weights by package name; lower sorts first.
    pub package_weights: BTreeMap<String, i64>,
}

impl Default for AutoloadSettings {
    fn default() -> Self {
        Self {
            vendor_dir: "vendor".to_string(),
            dev_mode: true,
            minimum_stability: Stability::Stable,
            prefer_stable: false,
            target_dir_compat: true,
            priority_types: DEFAULT_PRIORITY_TYPES.iter().map(|t| (*t).to_string()).collect(),
            package_weights: BTreeMap::new(),
        }
    }
}

/// The parts of a `composer.json` manifest that feed the settings.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
struct ManifestView {
    minimum_stability: Option<String>,
    prefer_stable: Option<bool>,
    config: Option<ConfigSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
struct ConfigSection {
    vendor_dir: Option<String>,
}

impl AutoloadSettings {
    /// Settings read from a `composer.json` document on top of the defaults.
    ///
    /// # Errors
    /// Returns an error on invalid JSON or an unknown `minimum-stability`.
    pub fn from_composer_json(json: &str) -> Result<Self> {
        Self::from_manifest_str(json, Path::new("composer.json"))
    }

    /// Settings read from a `composer.json` file on top of the defaults.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or decoded.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        Self::from_manifest_str(&content, path)
    }

    fn from_manifest_str(json: &str, path: &Path) -> Result<Self> {
        let manifest: ManifestView =
            sonic_rs::from_str(json).map_err(|e| ConfigError::json(PathBuf::from(path), &e))?;

        let mut settings = Self::default();
        if let Some(raw) = manifest.minimum_stability.as_deref() {
            settings.minimum_stability = parse_stability("minimum-stability", raw)?;
        }
        if let Some(prefer_stable) = manifest.prefer_stable {
            settings.prefer_stable = prefer_stable;
        }
        if let Some(vendor_dir) = manifest.config.and_then(|c| c.vendor_dir) {
            settings.vendor_dir = vendor_dir.trim_end_matches(['/', '\\']).to_string();
        }

        debug!(
            path = %path.display(),
            minimum_stability = %settings.minimum_stability,
            vendor_dir = %settings.vendor_dir,
            "loaded autoload settings"
        );
        Ok(settings)
    }

    /// Sort weight for a package: an explicit weight wins, then a priority
    /// type gets a weight ahead of every input index.
    #[must_use]
    pub fn weight_of(&self, name: &str, package_type: &str) -> Option<i64> {
        if let Some(weight) = self.package_weights.get(name) {
            return Some(*weight);
        }
        self.priority_types
            .iter()
            .position(|ty| ty == package_type)
            .map(|idx| idx as i64 - self.priority_types.len() as i64)
    }
}

/// Parse a stability name for the named field.
pub(crate) fn parse_stability(field: &str, raw: &str) -> Result<Stability> {
    Stability::parse(raw).ok_or_else(|| {
        ConfigError::invalid_value(
            field,
            format!("unknown stability '{raw}'"),
            "use one of dev, alpha, beta, RC or stable",
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults() {
        let settings = AutoloadSettings::default();
        assert_eq!(settings.vendor_dir, "vendor");
        assert!(settings.dev_mode);
        assert_eq!(settings.minimum_stability, Stability::Stable);
        assert!(!settings.prefer_stable);
        assert!(settings.target_dir_compat);
        assert_eq!(settings.priority_types, ["composer-plugin", "composer-installer"]);
    }

    #[test]
    fn reads_manifest_fields() {
        let settings = AutoloadSettings::from_composer_json(
            r#"{
                "name": "acme/app",
                "minimum-stability": "beta",
                "prefer-stable": true,
                "config": {"vendor-dir": "lib/vendor/", "sort-packages": true}
            }"#,
        )
        .unwrap();
        assert_eq!(settings.minimum_stability, Stability::Beta);
        assert!(settings.prefer_stable);
        assert_eq!(settings.vendor_dir, "lib/vendor");
        assert!(settings.dev_mode);
    }

    #[test]
    fn empty_manifest_keeps_defaults() {
        assert_eq!(
            AutoloadSettings::from_composer_json("{}").unwrap(),
            AutoloadSettings::default()
        );
    }

    #[test]
    fn unknown_stability_is_rejected() {
        let err = AutoloadSettings::from_composer_json(r#"{"minimum-stability": "gamma"}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "minimum-stability"));
    }

    #[test]
    fn invalid_json_is_reported() {
        let err = AutoloadSettings::from_composer_json("{").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidJson { .. }));
    }

    #[test]
    fn reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("composer.json");
        std::fs::write(&path, r#"{"minimum-stability": "dev"}"#).unwrap();
        let settings = AutoloadSettings::from_file(&path).unwrap();
        assert_eq!(settings.minimum_stability, Stability::Dev);

        let err = AutoloadSettings::from_file(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn weights() {
        let mut settings = AutoloadSettings::default();
        settings.package_weights.insert("acme/first".to_string(), -10);

        assert_eq!(settings.weight_of("acme/first", "library"), Some(-10));
        assert_eq!(settings.weight_of("acme/plugin", "composer-plugin"), Some(-2));
        assert_eq!(settings.weight_of("acme/installer", "composer-installer"), Some(-1));
        assert_eq!(settings.weight_of("acme/lib", "library"), None);
    }

    #[test]
    fn serde_uses_kebab_case() {
        let json = sonic_rs::to_string(&AutoloadSettings::default()).unwrap();
        assert!(json.contains("\"vendor-dir\":\"vendor\""));
        assert!(json.contains("\"minimum-stability\":\"stable\""));

        let back: AutoloadSettings = sonic_rs::from_str(r#"{"dev-mode": false}"#).unwrap();
        assert!(!back.dev_mode);
        assert_eq!(back.vendor_dir, "vendor");
    }
}
