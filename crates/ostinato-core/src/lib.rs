//! Core types for the Ostinato package graph.
//!
//! This crate provides the types shared by the autoload pipeline:
//! - Package nodes and their links
//! - Autoload declarations
//! - Loading packages from `composer.json` and `installed.json` documents
//! - Error types

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod autoload;
pub mod error;
mod loader;
mod package;

pub use autoload::{AutoloadEntry, AutoloadRules, AutoloadType};
pub use error::{Error, ErrorCode, Result};
pub use loader::{load_installed, load_installed_file, load_package, package_from_value};
pub use package::{Link, LinkKind, PackageNode};

// Re-export commonly used types
pub use ahash::{AHashMap, AHashSet};
pub use ostinato_semver::{Stability, Version, VersionParser};
