//! Error types for settings loading.

// False positive warnings from thiserror macro expansion
#![allow(unused_assignments)]

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Settings error type with rich diagnostics.
#[derive(Error, Debug, Diagnostic)]
pub enum ConfigError {
    /// Manifest file not found.
    #[error("manifest not found: {path}")]
    #[diagnostic(code(config::not_found), help("create the file or check the path"))]
    NotFound {
        /// Path that was not found.
        path: PathBuf,
    },

    /// Invalid JSON syntax.
    #[error("invalid JSON in {path}: {message}")]
    #[diagnostic(
        code(config::invalid_json),
        help("check JSON syntax at line {line}, column {column}")
    )]
    InvalidJson {
        /// File path.
        path: PathBuf,
        /// Error message.
        message: String,
        /// Line number (1-indexed).
        line: usize,
        /// Column number (1-indexed).
        column: usize,
    },

    /// Invalid field value.
    #[error("invalid value for '{field}': {message}")]
    #[diagnostic(code(config::invalid_value), help("{hint}"))]
    InvalidValue {
        /// Field name.
        field: String,
        /// Error message.
        message: String,
        /// Help hint.
        hint: String,
    },

    /// Environment variable error.
    #[error("invalid environment variable {var}: {message}")]
    #[diagnostic(code(config::env_error))]
    EnvError {
        /// Variable name.
        var: String,
        /// Error message.
        message: String,
    },

    /// IO error.
    #[error("IO error at {path}: {message}")]
    #[diagnostic(code(config::io_error))]
    Io {
        /// File path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Permission denied.
    #[error("permission denied: {path}")]
    #[diagnostic(code(config::permission_denied), help("check file permissions"))]
    PermissionDenied {
        /// File path.
        path: PathBuf,
    },
}

impl ConfigError {
    /// Create an IO error with context.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            _ => Self::Io {
                path,
                message: err.to_string(),
            },
        }
    }

    /// Create a JSON parse error with location.
    #[must_use]
    pub fn json(path: impl Into<PathBuf>, err: &sonic_rs::Error) -> Self {
        Self::InvalidJson {
            path: path.into(),
            message: err.to_string(),
            line: err.line(),
            column: err.column(),
        }
    }

    /// Create an invalid value error.
    #[must_use]
    pub fn invalid_value(
        field: impl Into<String>,
        message: impl Into<String>,
        hint: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
            hint: hint.into(),
        }
    }

    /// Create an environment variable error.
    #[must_use]
    pub fn env(var: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EnvError {
            var: var.into(),
            message: message.into(),
        }
    }
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;
    use miette::Diagnostic;

    #[test]
    fn io_kinds_are_classified() {
        let err = ConfigError::io("/nope", std::io::Error::from(std::io::ErrorKind::NotFound));
        assert!(matches!(err, ConfigError::NotFound { .. }));

        let err = ConfigError::io(
            "/root",
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        assert!(matches!(err, ConfigError::PermissionDenied { .. }));

        let err = ConfigError::io("/x", std::io::Error::other("disk on fire"));
        assert!(err.to_string().contains("disk on fire"));
    }

    #[test]
    fn json_error_keeps_location() {
        let err = sonic_rs::from_str::<sonic_rs::Value>("{\n  \"a\": }").unwrap_err();
        let err = ConfigError::json("composer.json", &err);
        match err {
            ConfigError::InvalidJson { line, path, .. } => {
                assert!(line >= 1);
                assert_eq!(path, PathBuf::from("composer.json"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn diagnostics_carry_codes() {
        let err = ConfigError::invalid_value("minimum-stability", "unknown", "use dev or stable");
        assert_eq!(
            err.code().map(|c| c.to_string()).as_deref(),
            Some("config::invalid_value")
        );
        assert_eq!(
            err.help().map(|h| h.to_string()).as_deref(),
            Some("use dev or stable")
        );
    }
}
