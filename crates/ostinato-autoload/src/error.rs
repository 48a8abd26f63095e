//! Errors raised while building an autoload plan.

use thiserror::Error;

/// Autoload plan error.
#[derive(Error, Debug)]
pub enum AutoloadError {
    /// A package declaration or the installed set could not be loaded.
    #[error(transparent)]
    Core(#[from] ostinato_core::Error),

    /// The settings could not be loaded.
    #[error(transparent)]
    Config(#[from] ostinato_config::ConfigError),

    /// A package declares autoload rules that cannot be honored.
    #[error("invalid autoload rules in '{package}': {message}")]
    InvalidRules {
        /// Package name.
        package: String,
        /// What is wrong.
        message: String,
    },

    /// An exclude-from-classmap pattern did not compile.
    #[error("invalid exclude-from-classmap pattern '{pattern}': {source}")]
    ExcludePattern {
        /// Generated regex source.
        pattern: String,
        /// Compile failure.
        source: regex::Error,
    },
}

impl AutoloadError {
    /// Create an invalid rules error.
    #[must_use]
    pub fn invalid_rules(package: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRules {
            package: package.into(),
            message: message.into(),
        }
    }
}

/// Result type for autoload operations.
pub type Result<T> = std::result::Result<T, AutoloadError>;
