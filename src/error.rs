//! Error types for the Stripe API client.
//!
//! This module contains the configuration error type and the unified
//! [`ClientError`] returned by resolution, executor construction, invocation
//! and iteration.
//!
//! # Error Handling
//!
//! Configuration constructors return `Result<T, ConfigError>` to enable
//! fail-fast validation. Everything that happens after the client is built
//! returns [`ClientError`]:
//!
//! - Resolution and manifest problems (`UndefinedOperation`, `Manifest`) are
//!   local configuration mistakes and are never retried.
//! - Transport problems (`Http`) are passed through unmodified from the
//!   HTTP layer.
//!
//! # Example
//!
//! ```rust
//! use stripe_api::{ApiKey, ConfigError};
//!
//! let result = ApiKey::new("");
//! assert!(matches!(result, Err(ConfigError::EmptyApiKey)));
//! ```

use thiserror::Error;

use crate::clients::HttpError;
use crate::manifest::{ErrorKind, ManifestError, ParameterType};

/// Errors that can occur during client configuration.
///
/// Each variant provides a clear, actionable error message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// API key cannot be empty.
    #[error("API key cannot be empty. Please provide a valid Stripe secret key.")]
    EmptyApiKey,

    /// API version is invalid.
    #[error("Invalid API version '{version}'. Expected format: 'YYYY-MM-DD' (e.g., '2014-07-26').")]
    InvalidApiVersion {
        /// The invalid version string that was provided.
        version: String,
    },

    /// A required field is missing.
    #[error("Missing required field: '{field}'. This field must be set before building the configuration.")]
    MissingRequiredField {
        /// The name of the missing field.
        field: &'static str,
    },

    /// Base URL override is invalid.
    #[error("Invalid base URL '{url}'. Please provide a URL with scheme (e.g., 'https://api.stripe.com').")]
    InvalidBaseUrl {
        /// The invalid URL that was provided.
        url: String,
    },

    /// Two options that select the same thing were both set.
    #[error("Options '{first}' and '{second}' cannot be used together. Set only one of them.")]
    ConflictingOptions {
        /// The first option.
        first: &'static str,
        /// The second option.
        second: &'static str,
    },
}

/// Unified error type for manifest resolution, dispatch and invocation.
///
/// # Example
///
/// ```rust
/// use stripe_api::ClientError;
///
/// let error = ClientError::UndefinedOperation {
///     name: "widgets".to_string(),
/// };
/// assert_eq!(error.to_string(), "Undefined method [widgets] called.");
/// ```
#[derive(Debug, Error)]
pub enum ClientError {
    /// The symbolic name does not correspond to any manifest.
    #[error("Undefined method [{name}] called.")]
    UndefinedOperation {
        /// The symbolic name exactly as it was requested.
        name: String,
    },

    /// The resource manifest exists but does not define the operation.
    #[error("Operation '{operation}' is not defined for resource '{resource}'.")]
    UndefinedCommand {
        /// The canonical resource name.
        resource: String,
        /// The operation that was requested.
        operation: String,
    },

    /// A parameter declared as required was not supplied.
    #[error("Missing required parameter '{parameter}' for operation '{operation}'.")]
    MissingParameter {
        /// The operation being invoked.
        operation: String,
        /// The missing parameter.
        parameter: String,
    },

    /// A declared parameter was supplied with the wrong JSON type.
    #[error("Parameter '{parameter}' for operation '{operation}' must be of type {expected}.")]
    InvalidParameter {
        /// The operation being invoked.
        operation: String,
        /// The offending parameter.
        parameter: String,
        /// The type declared by the manifest.
        expected: ParameterType,
    },

    /// The call arguments could not be interpreted.
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Why the arguments were rejected.
        reason: String,
    },

    /// The API answered with a body the client could not interpret.
    #[error("Unexpected response from operation '{operation}': {reason}")]
    UnexpectedResponse {
        /// The operation that produced the response.
        operation: String,
        /// What was wrong with the body.
        reason: String,
    },

    /// A manifest could not be found, read or parsed.
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// An HTTP-level error occurred.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ClientError {
    /// Returns `true` if the error was caused by a missing manifest document.
    #[must_use]
    pub const fn is_manifest_not_found(&self) -> bool {
        matches!(self, Self::Manifest(ManifestError::NotFound { .. }))
    }

    /// Returns the semantic error kind for API responses, if any.
    #[must_use]
    pub const fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Http(HttpError::Response(e)) => Some(e.kind),
            _ => None,
        }
    }

    /// Returns the request ID if available.
    ///
    /// Useful for debugging and error reporting.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        match self {
            Self::Http(HttpError::Response(e)) => e.request_id.as_deref(),
            Self::Http(HttpError::MaxRetries(e)) => e.request_id.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_api_key_error_message() {
        let error = ConfigError::EmptyApiKey;
        let message = error.to_string();
        assert!(message.contains("API key cannot be empty"));
        assert!(message.contains("Stripe secret key"));
    }

    #[test]
    fn test_invalid_api_version_error_message() {
        let error = ConfigError::InvalidApiVersion {
            version: "2014-13-01".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("2014-13-01"));
        assert!(message.contains("YYYY-MM-DD"));
    }

    #[test]
    fn test_conflicting_options_error_message() {
        let error = ConfigError::ConflictingOptions {
            first: "manifest_path",
            second: "manifest_source",
        };
        assert_eq!(
            error.to_string(),
            "Options 'manifest_path' and 'manifest_source' cannot be used together. Set only one of them."
        );
    }

    #[test]
    fn test_undefined_operation_carries_requested_name() {
        let error = ClientError::UndefinedOperation {
            name: "widgetsIterator".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Undefined method [widgetsIterator] called."
        );
    }

    #[test]
    fn test_is_manifest_not_found() {
        let error = ClientError::Manifest(ManifestError::NotFound {
            version: "2014-07-26".to_string(),
            name: "Widgets".to_string(),
        });
        assert!(error.is_manifest_not_found());

        let error = ClientError::UndefinedOperation {
            name: "widgets".to_string(),
        };
        assert!(!error.is_manifest_not_found());
    }

    #[test]
    fn test_invalid_parameter_message_names_expected_type() {
        let error = ClientError::InvalidParameter {
            operation: "create".to_string(),
            parameter: "amount".to_string(),
            expected: ParameterType::Integer,
        };
        assert_eq!(
            error.to_string(),
            "Parameter 'amount' for operation 'create' must be of type integer."
        );
    }

    #[test]
    fn test_error_implements_std_error() {
        let error = ConfigError::EmptyApiKey;
        let _: &dyn std::error::Error = &error;

        let error = ClientError::InvalidArguments {
            reason: "test".to_string(),
        };
        let _: &dyn std::error::Error = &error;
    }
}
