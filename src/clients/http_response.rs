//! HTTP response types for the Stripe API client.
//!
//! This module provides the [`HttpResponse`] type with parsed access to the
//! Stripe-specific response headers.

use std::collections::HashMap;

/// An HTTP response from the Stripe API.
///
/// Header names are stored lower-cased; a header may carry several values.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    /// The HTTP status code.
    pub code: u16,
    /// Response headers (headers may have multiple values).
    pub headers: HashMap<String, Vec<String>>,
    /// The parsed response body.
    pub body: serde_json::Value,
    /// Seconds to wait before retrying (from `Retry-After` header).
    pub retry_request_after: Option<f64>,
}

impl HttpResponse {
    /// Creates a new `HttpResponse`, parsing the `Retry-After` header.
    #[must_use]
    pub fn new(code: u16, headers: HashMap<String, Vec<String>>, body: serde_json::Value) -> Self {
        let retry_request_after = headers
            .get("retry-after")
            .and_then(|values| values.first())
            .and_then(|value| value.trim().parse::<f64>().ok())
            .filter(|secs| secs.is_finite() && *secs >= 0.0);

        Self {
            code,
            headers,
            body,
            retry_request_after,
        }
    }

    /// Returns `true` if the response status code is in the 2xx range.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.code >= 200 && self.code <= 299
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Returns the `Request-Id` header value, if present.
    ///
    /// Include this ID when reporting problems to Stripe.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.header("request-id")
    }

    /// Returns the API version the server used to answer the request.
    #[must_use]
    pub fn stripe_version(&self) -> Option<&str> {
        self.header("stripe-version")
    }

    /// Returns the server's retry hint from the `Stripe-Should-Retry` header.
    ///
    /// `None` when the header is absent or not a boolean.
    #[must_use]
    pub fn should_retry(&self) -> Option<bool> {
        match self.header("stripe-should-retry")? {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }
}
