//! Errors raised while locating, reading and validating manifests.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading a manifest document.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// No document exists for the name in this version.
    #[error("No manifest named '{name}' exists for API version {version}.")]
    NotFound {
        /// The API version searched.
        version: String,
        /// The canonical document name.
        name: String,
    },

    /// The document exists but could not be read.
    #[error("Failed to read manifest '{name}' at {}: {source}", path.display())]
    Io {
        /// The canonical document name.
        name: String,
        /// The file that failed.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The document is not a valid manifest.
    #[error("Manifest '{name}' for API version {version} is malformed: {reason}")]
    Malformed {
        /// The API version.
        version: String,
        /// The canonical document name.
        name: String,
        /// What was wrong.
        reason: String,
    },

    /// An operation declares the same parameter twice.
    #[error("Operation '{operation}' of '{resource}' declares parameter '{parameter}' more than once.")]
    DuplicateParameter {
        /// The canonical resource name.
        resource: String,
        /// The operation.
        operation: String,
        /// The repeated parameter.
        parameter: String,
    },

    /// A URI placeholder has no matching path parameter.
    #[error("Operation '{operation}' of '{resource}' uses '{{{parameter}}}' in its URI without declaring it as a path parameter.")]
    UndeclaredPathParameter {
        /// The canonical resource name.
        resource: String,
        /// The operation.
        operation: String,
        /// The placeholder name.
        parameter: String,
    },
}
