//! HTTP request types for the Stripe API client.
//!
//! This module provides the [`HttpRequest`] type and its builder, plus the
//! Stripe-style parameter flattening used for query strings and form bodies.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::clients::errors::InvalidHttpRequestError;
use crate::manifest::ErrorTable;

/// HTTP methods supported by manifest operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// HTTP GET method for retrieving resources.
    Get,
    /// HTTP POST method for creating and updating resources.
    Post,
    /// HTTP PUT method for replacing resources.
    Put,
    /// HTTP DELETE method for removing resources.
    Delete,
}

impl HttpMethod {
    /// Returns `true` for methods whose parameters travel in the body.
    #[must_use]
    pub const fn sends_body(self) -> bool {
        matches!(self, Self::Post | Self::Put)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
            Self::Put => write!(f, "PUT"),
            Self::Delete => write!(f, "DELETE"),
        }
    }
}

/// Content type for HTTP request bodies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// Form encoding (`application/x-www-form-urlencoded`), Stripe's default.
    #[default]
    Form,
    /// JSON content type (`application/json`).
    Json,
}

impl DataType {
    /// Returns the MIME type string for this data type.
    #[must_use]
    pub const fn as_content_type(&self) -> &'static str {
        match self {
            Self::Form => "application/x-www-form-urlencoded",
            Self::Json => "application/json",
        }
    }

    /// Serializes a body for this content type.
    #[must_use]
    pub fn encode(&self, body: &Value) -> String {
        match self {
            Self::Form => form_encode(body),
            Self::Json => body.to_string(),
        }
    }
}

/// Flattens a JSON object into Stripe-style key/value pairs.
///
/// Nested objects use bracket notation (`metadata[order]=6735`) and arrays
/// are indexed (`items[0][plan]=gold`). `null` becomes an empty string,
/// which Stripe treats as "unset".
///
/// # Example
///
/// ```rust
/// use stripe_api::clients::flatten_params;
/// use serde_json::json;
///
/// let pairs = flatten_params(&json!({"amount": 400, "metadata": {"order": "6735"}}));
/// assert_eq!(pairs, vec![
///     ("amount".to_string(), "400".to_string()),
///     ("metadata[order]".to_string(), "6735".to_string()),
/// ]);
/// ```
#[must_use]
pub fn flatten_params(value: &Value) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    if let Value::Object(map) = value {
        for (key, value) in map {
            flatten_into(key.clone(), value, &mut pairs);
        }
    }
    pairs
}

fn flatten_into(prefix: String, value: &Value, pairs: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, value) in map {
                flatten_into(format!("{prefix}[{key}]"), value, pairs);
            }
        }
        Value::Array(items) => {
            for (index, value) in items.iter().enumerate() {
                flatten_into(format!("{prefix}[{index}]"), value, pairs);
            }
        }
        Value::String(s) => pairs.push((prefix, s.clone())),
        Value::Null => pairs.push((prefix, String::new())),
        other => pairs.push((prefix, other.to_string())),
    }
}

/// Encodes a JSON object as `application/x-www-form-urlencoded`.
#[must_use]
pub fn form_encode(value: &Value) -> String {
    flatten_params(value)
        .iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(value)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn is_valid_header_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b))
}

/// An HTTP request ready to be handed to a [`Transport`](crate::clients::Transport).
///
/// Requests are fully resolved: the URL is absolute and the headers include
/// authentication. Use [`HttpRequest::builder`] to construct them.
///
/// # Example
///
/// ```rust
/// use stripe_api::clients::{HttpRequest, HttpMethod, DataType};
/// use serde_json::json;
///
/// let request = HttpRequest::builder(HttpMethod::Post, "https://api.stripe.com/v1/charges")
///     .body(json!({"amount": 400, "currency": "usd"}))
///     .body_type(DataType::Form)
///     .header("Idempotency-Key", "k1")
///     .build()
///     .unwrap();
///
/// assert_eq!(request.encoded_body().unwrap(), "amount=400&currency=usd");
/// ```
#[derive(Clone, Debug)]
pub struct HttpRequest {
    /// The HTTP method for this request.
    pub http_method: HttpMethod,
    /// The absolute URL for this request.
    pub url: String,
    /// Flattened query parameters, in order.
    pub query: Vec<(String, String)>,
    /// The request body, if any.
    pub body: Option<Value>,
    /// The content type of the body.
    pub body_type: Option<DataType>,
    /// Headers to send with the request.
    pub headers: HashMap<String, String>,
    /// Number of times to attempt the request (default: 1).
    pub tries: u32,
    /// Error table used to classify non-2xx responses.
    pub errors: Option<Arc<ErrorTable>>,
}

impl HttpRequest {
    /// Creates a new builder for constructing an `HttpRequest`.
    #[must_use]
    pub fn builder(method: HttpMethod, url: impl Into<String>) -> HttpRequestBuilder {
        HttpRequestBuilder::new(method, url)
    }

    /// Validates the request, ensuring it meets all requirements.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidHttpRequestError`] if:
    /// - `body` is `Some` but `body_type` is `None`
    /// - `url` is not an absolute http(s) URL
    /// - a header name is not a valid HTTP token
    pub fn verify(&self) -> Result<(), InvalidHttpRequestError> {
        if self.body.is_some() && self.body_type.is_none() {
            return Err(InvalidHttpRequestError::MissingBodyType);
        }

        if !(self.url.starts_with("http://") || self.url.starts_with("https://")) {
            return Err(InvalidHttpRequestError::InvalidUrl {
                url: self.url.clone(),
            });
        }

        if let Some(name) = self.headers.keys().find(|name| !is_valid_header_name(name)) {
            return Err(InvalidHttpRequestError::InvalidHeader { name: name.clone() });
        }

        Ok(())
    }

    /// Returns the serialized body, if the request has one.
    #[must_use]
    pub fn encoded_body(&self) -> Option<String> {
        let body = self.body.as_ref()?;
        Some(self.body_type.unwrap_or_default().encode(body))
    }

    /// Returns the value of a header, matching the name case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Builder for constructing [`HttpRequest`] instances.
#[derive(Debug)]
pub struct HttpRequestBuilder {
    http_method: HttpMethod,
    url: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
    body_type: Option<DataType>,
    headers: HashMap<String, String>,
    tries: u32,
    errors: Option<Arc<ErrorTable>>,
}

impl HttpRequestBuilder {
    fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            http_method: method,
            url: url.into(),
            query: Vec::new(),
            body: None,
            body_type: None,
            headers: HashMap::new(),
            tries: 1,
            errors: None,
        }
    }

    /// Sets the request body.
    ///
    /// When setting a body, you must also set the body type via [`body_type`](Self::body_type).
    #[must_use]
    pub fn body(mut self, body: impl Into<Value>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets the content type of the request body.
    #[must_use]
    pub const fn body_type(mut self, body_type: DataType) -> Self {
        self.body_type = Some(body_type);
        self
    }

    /// Appends flattened query parameters.
    #[must_use]
    pub fn query(mut self, pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    /// Adds a single query parameter.
    #[must_use]
    pub fn query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Replaces all headers at once.
    #[must_use]
    pub fn headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    /// Adds a single header.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Sets the number of times to attempt the request.
    ///
    /// Default is 1 (no retries).
    #[must_use]
    pub const fn tries(mut self, tries: u32) -> Self {
        self.tries = tries;
        self
    }

    /// Attaches the error table used to classify failures.
    #[must_use]
    pub fn errors(mut self, errors: Arc<ErrorTable>) -> Self {
        self.errors = Some(errors);
        self
    }

    /// Builds the [`HttpRequest`], validating it in the process.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidHttpRequestError`] if the request fails validation.
    pub fn build(self) -> Result<HttpRequest, InvalidHttpRequestError> {
        let request = HttpRequest {
            http_method: self.http_method,
            url: self.url,
            query: self.query,
            body: self.body,
            body_type: self.body_type,
            headers: self.headers,
            tries: self.tries.max(1),
            errors: self.errors,
        };
        request.verify()?;
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const URL: &str = "https://api.stripe.com/v1/charges";

    #[test]
    fn test_http_method_deserializes_uppercase() {
        let method: HttpMethod = serde_json::from_value(json!("DELETE")).unwrap();
        assert_eq!(method, HttpMethod::Delete);
        assert_eq!(method.to_string(), "DELETE");
        assert!(serde_json::from_value::<HttpMethod>(json!("PATCH")).is_err());
    }

    #[test]
    fn test_sends_body() {
        assert!(HttpMethod::Post.sends_body());
        assert!(HttpMethod::Put.sends_body());
        assert!(!HttpMethod::Get.sends_body());
        assert!(!HttpMethod::Delete.sends_body());
    }

    #[test]
    fn test_data_type_content_type() {
        assert_eq!(
            DataType::Form.as_content_type(),
            "application/x-www-form-urlencoded"
        );
        assert_eq!(DataType::Json.as_content_type(), "application/json");
    }

    #[test]
    fn test_flatten_params_nested() {
        let pairs = flatten_params(&json!({
            "customer": "cus_1",
            "items": [{"plan": "gold", "quantity": 2}],
            "metadata": {"order": "6735"},
            "capture": false,
            "description": null
        }));

        assert_eq!(
            pairs,
            vec![
                ("capture".to_string(), "false".to_string()),
                ("customer".to_string(), "cus_1".to_string()),
                ("description".to_string(), String::new()),
                ("items[0][plan]".to_string(), "gold".to_string()),
                ("items[0][quantity]".to_string(), "2".to_string()),
                ("metadata[order]".to_string(), "6735".to_string()),
            ]
        );
    }

    #[test]
    fn test_form_encode_escapes_keys_and_values() {
        let encoded = form_encode(&json!({"metadata": {"note": "a b&c"}}));
        assert_eq!(encoded, "metadata%5Bnote%5D=a%20b%26c");
    }

    #[test]
    fn test_builder_creates_valid_get_request() {
        let request = HttpRequest::builder(HttpMethod::Get, URL)
            .query_param("limit", "3")
            .build()
            .unwrap();

        assert_eq!(request.http_method, HttpMethod::Get);
        assert_eq!(request.url, URL);
        assert_eq!(request.query, vec![("limit".to_string(), "3".to_string())]);
        assert!(request.body.is_none());
        assert_eq!(request.tries, 1);
        assert!(request.errors.is_none());
    }

    #[test]
    fn test_post_without_body_is_allowed() {
        let request = HttpRequest::builder(HttpMethod::Post, format!("{URL}/ch_1/capture"))
            .build()
            .unwrap();
        assert!(request.encoded_body().is_none());
    }

    #[test]
    fn test_verify_requires_body_type_when_body_present() {
        let result = HttpRequest::builder(HttpMethod::Post, URL)
            .body(json!({"amount": 1}))
            .build();

        assert!(matches!(result, Err(InvalidHttpRequestError::MissingBodyType)));
    }

    #[test]
    fn test_verify_rejects_relative_url() {
        let result = HttpRequest::builder(HttpMethod::Get, "/v1/charges").build();
        assert!(matches!(result, Err(InvalidHttpRequestError::InvalidUrl { .. })));
    }

    #[test]
    fn test_verify_rejects_invalid_header_name() {
        let result = HttpRequest::builder(HttpMethod::Get, URL)
            .header("Bad Header", "x")
            .build();
        assert!(matches!(
            result,
            Err(InvalidHttpRequestError::InvalidHeader { name }) if name == "Bad Header"
        ));
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let request = HttpRequest::builder(HttpMethod::Get, URL)
            .header("Stripe-Version", "2014-07-26")
            .build()
            .unwrap();
        assert_eq!(request.header("stripe-version"), Some("2014-07-26"));
        assert_eq!(request.header("Accept"), None);
    }

    #[test]
    fn test_json_body_encoding() {
        let request = HttpRequest::builder(HttpMethod::Post, URL)
            .body(json!({"amount": 400}))
            .body_type(DataType::Json)
            .build()
            .unwrap();
        assert_eq!(request.encoded_body().unwrap(), r#"{"amount":400}"#);
    }
}
