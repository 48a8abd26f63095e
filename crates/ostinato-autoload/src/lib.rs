//! Package ordering and autoload path resolution for Ostinato.
//!
//! The pipeline runs in three steps:
//! - [`PackageMap::build`] pairs every installed package with its install path
//! - [`PackageSorter`] orders packages so dependencies load first
//! - [`AutoloadPathResolver`] turns declared autoload rules into paths
//!
//! [`AutoloadPlan`] runs all three once and keeps the results.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod error;
mod package_map;
mod plan;
mod probe;
mod resolver;
mod sorter;

pub use error::{AutoloadError, Result};
pub use package_map::{
    InstallPathResolver, PackageMap, PackageMapEntry, VendorInstallPaths, dev_package_names,
};
pub use plan::{AutoloadPlan, package_weights};
pub use probe::{FsProbe, PathProbe, StaticProbe};
pub use resolver::{
    AutoloadFile, AutoloadPathResolver, Autoloads, NamespacePaths, file_identifier, join_path,
};
pub use sorter::PackageSorter;
