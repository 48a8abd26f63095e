//! Settings that steer package ordering and autoload resolution.
//!
//! Settings are layered:
//! 1. Built-in defaults ([`AutoloadSettings::default`])
//! 2. The project's `composer.json` (`minimum-stability`, `prefer-stable`, `config`)
//! 3. Environment variables ([`EnvOverrides`])

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod env;
mod error;
mod settings;

pub use env::{EnvOverrides, OstinatoEnvVar};
pub use error::{ConfigError, Result};
pub use settings::AutoloadSettings;
