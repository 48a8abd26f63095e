//! Testing utilities for Ostinato.
//!
//! # Modules
//!
//! - [`fixtures`]: `composer.json` and `installed.json` documents
//! - [`packages`]: shorthand constructors for package nodes
//! - [`temp_project`]: temporary project directories on disk
//! - [`proptest_strategies`]: strategies for versions, constraints and names

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod fixtures;
pub mod packages;
pub mod proptest_strategies;
pub mod temp_project;

/// Re-export commonly used testing utilities.
pub mod prelude {
    pub use crate::fixtures::Fixtures;
    pub use crate::packages::*;
    pub use crate::temp_project::TempProject;

    pub use proptest::prelude::*;
}
