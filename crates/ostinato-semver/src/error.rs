//! Errors raised while normalizing versions and parsing constraints.

use thiserror::Error;

/// Result alias for version operations.
pub type Result<T, E = VersionError> = std::result::Result<T, E>;

/// Failure to understand a version or constraint string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    /// The input matches none of the recognized version grammars.
    #[error("invalid version string \"{input}\": {reason}")]
    InvalidVersion {
        /// The raw input.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The constraint expression is malformed.
    #[error("could not parse version constraint \"{input}\" at \"{fragment}\": {reason}")]
    InvalidConstraint {
        /// The full constraint expression.
        input: String,
        /// The offending part of the expression.
        fragment: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl VersionError {
    pub(crate) fn invalid_version(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidVersion {
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_constraint(
        input: impl Into<String>,
        fragment: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidConstraint {
            input: input.into(),
            fragment: fragment.into(),
            reason: reason.into(),
        }
    }

    /// The part of the input that caused the failure.
    #[must_use]
    pub fn fragment(&self) -> &str {
        match self {
            Self::InvalidVersion { input, .. } => input,
            Self::InvalidConstraint { fragment, .. } => fragment,
        }
    }
}
