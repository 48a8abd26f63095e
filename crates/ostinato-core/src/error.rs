//! Error types for Ostinato operations.
//!
//! Each error has:
//! - A unique error code (e.g., E0401) for easy reference and searching
//! - A clear error message explaining what went wrong
//! - Suggestions for how to fix the issue

use ostinato_semver::VersionError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Error codes for Ostinato errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Declaration errors (E04xx)
    /// Invalid package declaration
    E0401,
    /// Missing required field
    E0402,
    /// Invalid JSON syntax
    E0403,
    /// Invalid version constraint format
    E0404,
    /// Invalid version string
    E0405,

    // IO errors (E05xx)
    /// File not found
    E0501,
    /// Permission denied
    E0502,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::E0401 => "E0401",
            Self::E0402 => "E0402",
            Self::E0403 => "E0403",
            Self::E0404 => "E0404",
            Self::E0405 => "E0405",
            Self::E0501 => "E0501",
            Self::E0502 => "E0502",
        }
    }

    /// Get a brief title for this error code.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::E0401 => "Invalid package",
            Self::E0402 => "Missing required field",
            Self::E0403 => "JSON syntax error",
            Self::E0404 => "Invalid version constraint",
            Self::E0405 => "Invalid version",
            Self::E0501 => "File not found",
            Self::E0502 => "Permission denied",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Wrapper to make `ErrorCode` usable as a source.
#[derive(Debug)]
pub struct ErrorCodeSource(pub ErrorCode);

impl fmt::Display for ErrorCodeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.as_str())
    }
}

impl std::error::Error for ErrorCodeSource {}

/// Main error type for Ostinato.
#[derive(Error, Debug)]
pub enum Error {
    /// A package declaration is unusable.
    #[error("[{code}] invalid package '{package}': {message}")]
    InvalidPackage {
        /// Error code.
        #[source]
        code: ErrorCodeSource,
        /// Package name, or a placeholder when the name itself is missing.
        package: String,
        /// Error message.
        message: String,
        /// Suggestions for fixing.
        suggestions: Vec<String>,
    },

    /// A version or constraint string could not be parsed.
    #[error("[{code}] {source}")]
    Version {
        /// Error code.
        code: ErrorCodeSource,
        /// Underlying parse failure.
        source: VersionError,
        /// Suggestions for fixing.
        suggestions: Vec<String>,
    },

    /// JSON error.
    #[error("[E0403] json error: {0}")]
    Json(#[from] sonic_rs::Error),

    /// IO error.
    #[error("[{code}] io error at {path}: {message}")]
    Io {
        /// Error code.
        #[source]
        code: ErrorCodeSource,
        /// File path.
        path: PathBuf,
        /// Error message.
        message: String,
        /// Suggestions for fixing.
        suggestions: Vec<String>,
    },
}

impl Error {
    /// Get the error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidPackage { code, .. } | Self::Version { code, .. } | Self::Io { code, .. } => {
                code.0
            }
            Self::Json(_) => ErrorCode::E0403,
        }
    }

    /// Get suggestions for fixing this error.
    #[must_use]
    pub fn suggestions(&self) -> &[String] {
        match self {
            Self::InvalidPackage { suggestions, .. }
            | Self::Version { suggestions, .. }
            | Self::Io { suggestions, .. } => suggestions,
            Self::Json(_) => &[],
        }
    }

    /// Create an invalid package error.
    #[must_use]
    pub fn invalid_package(package: impl Into<String>, message: impl Into<String>) -> Self {
        let package = package.into();
        Self::InvalidPackage {
            code: ErrorCodeSource(ErrorCode::E0401),
            suggestions: vec![
                format!("Check the composer.json of '{package}'"),
                "Validate the file against the composer.json schema".to_string(),
            ],
            package,
            message: message.into(),
        }
    }

    /// Create a missing field error.
    #[must_use]
    pub fn missing_field(package: impl Into<String>, field: &str) -> Self {
        let package = package.into();
        Self::InvalidPackage {
            code: ErrorCodeSource(ErrorCode::E0402),
            suggestions: vec![format!("Add a \"{field}\" entry to the package declaration")],
            package,
            message: format!("missing required field \"{field}\""),
        }
    }

    /// Create an IO error with context.
    #[must_use]
    #[allow(clippy::needless_pass_by_value)]
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        let (code, suggestions) = match err.kind() {
            std::io::ErrorKind::PermissionDenied => (
                ErrorCode::E0502,
                vec![format!("Check permissions on {}", path.display())],
            ),
            _ => (
                ErrorCode::E0501,
                vec![
                    format!("Verify that {} exists", path.display()),
                    "Run the install step before generating autoload files".to_string(),
                ],
            ),
        };
        Self::Io {
            code: ErrorCodeSource(code),
            path,
            message: err.to_string(),
            suggestions,
        }
    }

    /// Format the error with suggestions for display.
    #[must_use]
    pub fn display_with_suggestions(&self) -> String {
        let mut output = format!("{self}");
        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
            output.push_str("\n\nSuggestions:");
            for suggestion in suggestions {
                output.push_str(&format!("\n  - {suggestion}"));
            }
        }
        output
    }
}

impl From<VersionError> for Error {
    fn from(source: VersionError) -> Self {
        let (code, suggestions) = match &source {
            VersionError::InvalidVersion { .. } => (
                ErrorCode::E0405,
                vec!["Use a version like 1.2.3, 1.2.3-beta1 or dev-<branch>".to_string()],
            ),
            VersionError::InvalidConstraint { fragment, .. } => (
                ErrorCode::E0404,
                vec![
                    format!("Check the constraint near \"{fragment}\""),
                    "Use constraints like ^1.2, ~1.2.3, >=1.0 <2.0 or 1.0 || 2.0".to_string(),
                ],
            ),
        };
        Self::Version {
            code: ErrorCodeSource(code),
            source,
            suggestions,
        }
    }
}

/// Result type for Ostinato operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use ostinato_semver::VersionParser;

    #[test]
    fn test_error_codes() {
        assert_eq!(ErrorCode::E0404.as_str(), "E0404");
        assert_eq!(ErrorCode::E0401.title(), "Invalid package");
    }

    #[test]
    fn test_invalid_package_error() {
        let err = Error::invalid_package("acme/foo", "psr-4 prefixes must end with \\\\");
        assert_eq!(err.code(), ErrorCode::E0401);
        assert!(!err.suggestions().is_empty());
        assert!(err.to_string().starts_with("[E0401] invalid package 'acme/foo'"));
    }

    #[test]
    fn test_version_errors_map_to_codes() {
        let err: Error = VersionParser::normalize("nope").unwrap_err().into();
        assert_eq!(err.code(), ErrorCode::E0405);

        let err: Error = VersionParser::new().parse_constraints("(1.0").unwrap_err().into();
        assert_eq!(err.code(), ErrorCode::E0404);
        assert!(err.suggestions()[0].contains('('));
    }

    #[test]
    fn test_io_error_code_detection() {
        let missing = Error::io("/nope", std::io::Error::from(std::io::ErrorKind::NotFound));
        assert_eq!(missing.code(), ErrorCode::E0501);

        let denied = Error::io("/root", std::io::Error::from(std::io::ErrorKind::PermissionDenied));
        assert_eq!(denied.code(), ErrorCode::E0502);
    }

    #[test]
    fn test_display_with_suggestions() {
        let err = Error::missing_field("<unnamed>", "name");
        let display = err.display_with_suggestions();
        assert!(display.contains("Suggestions:"));
        assert!(display.contains("\"name\""));
    }
}
