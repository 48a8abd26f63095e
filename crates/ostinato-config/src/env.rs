//! Environment variable overrides.

use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::settings::{AutoloadSettings, parse_stability};

/// Environment variables that override autoload settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OstinatoEnvVar {
    /// Vendor directory.
    VendorDir,
    /// Disable dev mode (Composer's `--no-dev`).
    NoDev,
    /// Enable or disable dev mode.
    DevMode,
    /// Minimum stability.
    MinimumStability,
    /// Toggle the `target-dir` path shim.
    TargetDirCompat,
}

impl OstinatoEnvVar {
    /// Every recognized variable, in the order overrides are applied.
    pub const ALL: [Self; 5] = [
        Self::VendorDir,
        Self::NoDev,
        Self::DevMode,
        Self::MinimumStability,
        Self::TargetDirCompat,
    ];

    /// Variable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::VendorDir => "COMPOSER_VENDOR_DIR",
            Self::NoDev => "COMPOSER_NO_DEV",
            Self::DevMode => "OSTINATO_DEV_MODE",
            Self::MinimumStability => "OSTINATO_MINIMUM_STABILITY",
            Self::TargetDirCompat => "OSTINATO_TARGET_DIR_COMPAT",
        }
    }
}

fn parse_bool(var: OstinatoEnvVar, raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::env(
            var.as_str(),
            format!("expected a boolean, got '{other}'"),
        )),
    }
}

/// Overrides collected from the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    vars: Vec<(OstinatoEnvVar, String)>,
}

impl EnvOverrides {
    /// Collect overrides from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Collect overrides through a lookup function.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let vars = OstinatoEnvVar::ALL
            .into_iter()
            .filter_map(|var| lookup(var.as_str()).map(|value| (var, value)))
            .collect();
        Self { vars }
    }

    /// Whether no variable was set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Raw value of a variable, if it was set.
    #[must_use]
    pub fn get(&self, var: OstinatoEnvVar) -> Option<&str> {
        self.vars
            .iter()
            .find(|(v, _)| *v == var)
            .map(|(_, value)| value.as_str())
    }

    /// Apply the overrides. `OSTINATO_DEV_MODE` wins over `COMPOSER_NO_DEV`.
    ///
    /// # Errors
    /// Returns an error for a malformed boolean or stability value.
    pub fn apply_to(&self, settings: &mut AutoloadSettings) -> Result<()> {
        for (var, value) in &self.vars {
            debug!(var = var.as_str(), value = %value, "applying environment override");
            match var {
                OstinatoEnvVar::VendorDir => {
                    if !value.is_empty() {
                        settings.vendor_dir = value.trim_end_matches(['/', '\\']).to_string();
                    }
                }
                OstinatoEnvVar::NoDev => {
                    if parse_bool(*var, value)? {
                        settings.dev_mode = false;
                    }
                }
                OstinatoEnvVar::DevMode => settings.dev_mode = parse_bool(*var, value)?,
                OstinatoEnvVar::MinimumStability => {
                    settings.minimum_stability = parse_stability(var.as_str(), value)?;
                }
                OstinatoEnvVar::TargetDirCompat => {
                    settings.target_dir_compat = parse_bool(*var, value)?;
                }
            }
        }
        Ok(())
    }
}

impl AutoloadSettings {
    /// Apply the process environment on top of these settings.
    ///
    /// # Errors
    /// Returns an error for a malformed variable.
    pub fn with_env(mut self) -> Result<Self> {
        EnvOverrides::from_env().apply_to(&mut self)?;
        Ok(self)
    }
}
