//! Composer-compatible version handling for Ostinato.
//!
//! This crate provides:
//! - Version normalization (`1.0-beta2` becomes `1.0.0.0-beta2`)
//! - Constraint parsing and matching (`^1.2 || ~2.0.1`, `1.0 - 2.0`)
//! - A per-session constraint cache
//! - Stability flag extraction and filtering
//! - Requirement bumping to the installed version

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod bump;
mod cache;
mod constraint;
mod error;
mod parser;
mod stability;
mod version;

pub use bump::VersionBumper;
pub use cache::ConstraintCache;
pub use constraint::{Constraint, Operator, VersionConstraint};
pub use error::{Result, VersionError};
pub use parser::VersionParser;
pub use stability::{StabilityFilter, extract_stability_flag};
pub use version::{BRANCH_SEGMENT, Modifier, ModifierKind, Stability, Version};
