//! Temporary project directories for integration tests.

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tempfile::{TempDir, tempdir};

/// A temporary project directory, removed on drop.
#[derive(Debug)]
pub struct TempProject {
    dir: TempDir,
}

impl TempProject {
    /// Create a new temporary project builder.
    #[must_use]
    pub fn builder() -> TempProjectBuilder {
        TempProjectBuilder::default()
    }

    /// Root directory of the project.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Create a file relative to the project root.
    pub fn create_file(&self, relative_path: &str, content: &str) -> Result<PathBuf> {
        let path = self.dir.path().join(relative_path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        std::fs::write(&path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(path)
    }
}

/// Builder for [`TempProject`].
#[derive(Debug, Default)]
pub struct TempProjectBuilder {
    composer_json: Option<Value>,
    installed_json: Option<Value>,
    vendor_dir: Option<String>,
    files: Vec<(String, String)>,
}

impl TempProjectBuilder {
    /// Write this `composer.json`.
    #[must_use]
    pub fn with_composer_json(mut self, content: Value) -> Self {
        self.composer_json = Some(content);
        self
    }

    /// Write this `installed.json` under the vendor directory.
    #[must_use]
    pub fn with_installed_json(mut self, content: Value) -> Self {
        self.installed_json = Some(content);
        self
    }

    /// Vendor directory for `installed.json` (default `vendor`).
    #[must_use]
    pub fn with_vendor_dir(mut self, vendor_dir: &str) -> Self {
        self.vendor_dir = Some(vendor_dir.to_string());
        self
    }

    /// Create a file with the given content.
    #[must_use]
    pub fn with_file(mut self, relative_path: &str, content: &str) -> Self {
        self.files.push((relative_path.to_string(), content.to_string()));
        self
    }

    /// Create the project on disk.
    pub fn build(self) -> Result<TempProject> {
        let project = TempProject {
            dir: tempdir().context("failed to create temp dir")?,
        };
        if let Some(manifest) = &self.composer_json {
            project.create_file("composer.json", &serde_json::to_string_pretty(manifest)?)?;
        }
        if let Some(installed) = &self.installed_json {
            let vendor = self.vendor_dir.as_deref().unwrap_or("vendor");
            project.create_file(
                &format!("{vendor}/composer/installed.json"),
                &serde_json::to_string_pretty(installed)?,
            )?;
        }
        for (path, content) in &self.files {
            project.create_file(path, content)?;
        }
        Ok(project)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::Fixtures;

    #[test]
    fn writes_manifests_and_files() {
        let project = TempProject::builder()
            .with_composer_json(Fixtures::app_composer_json())
            .with_installed_json(Fixtures::installed_json())
            .with_file("src/helpers.php", "<?php")
            .build()
            .unwrap();

        assert!(project.path().join("composer.json").is_file());
        assert!(project.path().join("vendor/composer/installed.json").is_file());
        assert!(project.path().join("src/helpers.php").is_file());
    }
}
