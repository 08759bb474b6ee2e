//! HTTP-specific error types for the Stripe API client.
//!
//! This module contains error types for HTTP operations, including response
//! errors, retry exhaustion, and request validation failures.
//!
//! # Error Handling
//!
//! - [`HttpResponseError`]: Non-2xx HTTP responses, classified with the
//!   resource's [`ErrorTable`]
//! - [`MaxHttpRetriesExceededError`]: When retry attempts are exhausted
//! - [`InvalidHttpRequestError`]: When a request fails validation before sending
//! - [`HttpError`]: Unified error type encompassing all HTTP-related errors
//!
//! # Example
//!
//! ```rust,ignore
//! use stripe_api::{ClientError, HttpError};
//!
//! match charges.invoke("retrieve", json!({"id": "ch_123"})).await {
//!     Ok(charge) => println!("Charge: {}", charge["id"]),
//!     Err(ClientError::Http(HttpError::Response(e))) => {
//!         println!("API error {} ({}): {}", e.code, e.kind, e.message);
//!     }
//!     Err(e) => println!("Failed: {e}"),
//! }
//! ```

use thiserror::Error;

use crate::clients::http_response::HttpResponse;
use crate::manifest::{ErrorKind, ErrorTable};

/// Error returned when an HTTP request receives a non-successful response.
///
/// The `kind` and `message` come from the manifest error table when it has
/// an entry for the status code; otherwise the kind is derived from the
/// status and Stripe's `error.type`, and the message is the API's own.
///
/// # Example
///
/// ```rust
/// use stripe_api::clients::HttpResponseError;
/// use stripe_api::ErrorKind;
///
/// let error = HttpResponseError {
///     code: 404,
///     kind: ErrorKind::NotFound,
///     message: "No such charge: ch_123".to_string(),
///     error_type: Some("invalid_request_error".to_string()),
///     error_code: None,
///     param: Some("id".to_string()),
///     request_id: Some("req_abc".to_string()),
/// };
///
/// assert_eq!(error.to_string(), "No such charge: ch_123");
/// ```
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HttpResponseError {
    /// The HTTP status code of the response.
    pub code: u16,
    /// Semantic classification of the failure.
    pub kind: ErrorKind,
    /// Human readable message.
    pub message: String,
    /// Stripe `error.type`, when the body carried one.
    pub error_type: Option<String>,
    /// Stripe `error.code`, when the body carried one.
    pub error_code: Option<String>,
    /// Stripe `error.param`, when the body carried one.
    pub param: Option<String>,
    /// Request ID for error reporting (from the `Request-Id` header).
    pub request_id: Option<String>,
}

impl HttpResponseError {
    /// Classifies a non-2xx response.
    ///
    /// `errors` is the merged error table of the resource that issued the
    /// request, if known.
    #[must_use]
    pub fn from_response(response: &HttpResponse, errors: Option<&ErrorTable>) -> Self {
        let error = response.body.get("error");
        let field = |name: &str| {
            error
                .and_then(|e| e.get(name))
                .and_then(serde_json::Value::as_str)
                .map(String::from)
        };

        let error_type = field("type");
        let api_message = field("message")
            .or_else(|| error.and_then(serde_json::Value::as_str).map(String::from))
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| format!("Request failed with status {}.", response.code));

        let (kind, message) = match errors.and_then(|table| table.get(response.code)) {
            Some(spec) => (spec.kind, spec.render(&api_message, response.code)),
            None => {
                let kind = error_type
                    .as_deref()
                    .and_then(ErrorKind::from_stripe_type)
                    .unwrap_or_else(|| ErrorKind::from_status(response.code));
                (kind, api_message)
            }
        };

        Self {
            code: response.code,
            kind,
            message,
            error_type,
            error_code: field("code"),
            param: field("param"),
            request_id: response.request_id().map(String::from),
        }
    }
}

/// Error returned when maximum retry attempts have been exhausted.
///
/// This error is raised when a request continues to fail with 429 or 5xx
/// responses after all configured retry attempts have been made.
#[derive(Debug, Error)]
#[error("Exceeded maximum retry count of {tries}. Last message: {message}")]
pub struct MaxHttpRetriesExceededError {
    /// The HTTP status code of the last response.
    pub code: u16,
    /// The number of tries that were attempted.
    pub tries: u32,
    /// Message from the last response.
    pub message: String,
    /// Request ID of the last response.
    pub request_id: Option<String>,
}

/// Error returned when an HTTP request fails validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidHttpRequestError {
    /// A request body was provided without specifying the body type.
    #[error("Cannot set a body without also setting body_type.")]
    MissingBodyType,

    /// A header name contains characters not allowed in HTTP headers.
    #[error("Invalid header name '{name}'.")]
    InvalidHeader {
        /// The rejected header name.
        name: String,
    },

    /// The request URL is not absolute.
    #[error("Invalid request URL '{url}'. Expected an absolute http(s) URL.")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
    },
}

/// Unified error type for all HTTP-related errors.
///
/// This is the error produced by every [`Transport`](crate::clients::Transport)
/// and is passed through unmodified by executors and iterators.
#[derive(Debug, Error)]
pub enum HttpError {
    /// An HTTP response error (non-2xx status code).
    #[error(transparent)]
    Response(#[from] HttpResponseError),

    /// Maximum retry attempts exhausted.
    #[error(transparent)]
    MaxRetries(#[from] MaxHttpRetriesExceededError),

    /// Request validation failed.
    #[error(transparent)]
    InvalidRequest(#[from] InvalidHttpRequestError),

    /// Network or connection error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}
