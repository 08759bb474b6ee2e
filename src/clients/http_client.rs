//! HTTP transport for Stripe API communication.
//!
//! This module provides the [`Transport`] seam executors send requests
//! through, and [`HttpClient`], the `reqwest`-based default implementation
//! with automatic retry handling.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use crate::clients::errors::{HttpError, HttpResponseError, MaxHttpRetriesExceededError};
use crate::clients::http_request::{HttpMethod, HttpRequest};
use crate::clients::http_response::HttpResponse;

/// Fixed retry wait time in seconds, used when no `Retry-After` is given.
pub const RETRY_WAIT_TIME: u64 = 1;

/// Longest wait between retries in seconds, whatever `Retry-After` says.
pub const MAX_RETRY_WAIT_TIME: u64 = 60;

/// SDK version from Cargo.toml.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Sends fully built requests and returns parsed responses.
///
/// Implementations should return `Err(HttpError::Response(_))` for non-2xx
/// responses, using [`HttpResponseError::from_response`] with the request's
/// error table. Executors also classify any non-2xx response a transport
/// hands back as `Ok`.
///
/// # Example
///
/// ```rust
/// use std::collections::HashMap;
/// use std::future::Future;
/// use stripe_api::clients::{HttpError, HttpRequest, HttpResponse, Transport};
/// use serde_json::json;
///
/// struct Canned;
///
/// impl Transport for Canned {
///     fn send(
///         &self,
///         _request: HttpRequest,
///     ) -> impl Future<Output = Result<HttpResponse, HttpError>> + Send {
///         async { Ok(HttpResponse::new(200, HashMap::new(), json!({"object": "balance"}))) }
///     }
/// }
/// ```
pub trait Transport: Send + Sync + 'static {
    /// Sends one request, including any transport-level retries.
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, HttpError>> + Send;
}

/// HTTP client for making requests to the Stripe API.
///
/// The client handles:
/// - Request validation and body encoding
/// - Automatic retry logic for 429 and 5xx responses, honoring
///   `Stripe-Should-Retry` and `Retry-After`
/// - Classification of failures into [`HttpResponseError`]
///
/// Authentication and default headers are attached by the executor that
/// builds each [`HttpRequest`], so a single `HttpClient` can serve any
/// number of executors.
///
/// # Thread Safety
///
/// `HttpClient` is `Send + Sync`, making it safe to share across async tasks.
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: reqwest::Client,
    timeout: Option<Duration>,
}

// Verify HttpClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<HttpClient>();
};

impl HttpClient {
    /// Creates a new HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Network`] if the TLS backend cannot be initialized.
    pub fn new(timeout: Option<Duration>) -> Result<Self, HttpError> {
        let mut builder = reqwest::Client::builder().use_rustls_tls();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            timeout,
        })
    }

    /// Returns the request timeout, if one is configured.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Sends an HTTP request to the Stripe API.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if:
    /// - Request validation fails (`InvalidRequest`)
    /// - Network error occurs (`Network`)
    /// - Non-2xx response received (`Response`)
    /// - Max retries exceeded (`MaxRetries`)
    pub async fn request(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        request.verify()?;

        let mut headers = request.headers.clone();
        let body = request.encoded_body();
        if body.is_some() {
            if let Some(body_type) = &request.body_type {
                headers.insert(
                    "Content-Type".to_string(),
                    body_type.as_content_type().to_string(),
                );
            }
        }

        let mut tries: u32 = 0;
        loop {
            tries += 1;

            let mut req_builder = match request.http_method {
                HttpMethod::Get => self.client.get(&request.url),
                HttpMethod::Post => self.client.post(&request.url),
                HttpMethod::Put => self.client.put(&request.url),
                HttpMethod::Delete => self.client.delete(&request.url),
            };

            for (key, value) in &headers {
                req_builder = req_builder.header(key, value);
            }

            if !request.query.is_empty() {
                req_builder = req_builder.query(&request.query);
            }

            if let Some(body) = &body {
                req_builder = req_builder.body(body.clone());
            }

            let res = req_builder.send().await?;

            let code = res.status().as_u16();
            let res_headers = Self::parse_response_headers(res.headers());
            let body_text = res.text().await.unwrap_or_default();

            let body = if body_text.is_empty() {
                serde_json::json!({})
            } else {
                serde_json::from_str(&body_text)
                    .unwrap_or_else(|_| serde_json::json!({ "raw_body": body_text }))
            };

            let response = HttpResponse::new(code, res_headers, body);

            if let (Some(sent), Some(used)) =
                (request.header("Stripe-Version"), response.stripe_version())
            {
                if sent != used {
                    tracing::warn!(
                        "Request to {} asked for API version {} but was answered with {}",
                        request.url,
                        sent,
                        used
                    );
                }
            }

            if response.is_ok() {
                return Ok(response);
            }

            let error = HttpResponseError::from_response(&response, request.errors.as_deref());

            if !Self::is_retryable(&response) {
                return Err(HttpError::Response(error));
            }

            if tries >= request.tries {
                if request.tries == 1 {
                    return Err(HttpError::Response(error));
                }
                return Err(HttpError::MaxRetries(MaxHttpRetriesExceededError {
                    code,
                    tries: request.tries,
                    message: error.message,
                    request_id: error.request_id,
                }));
            }

            let delay = Self::calculate_retry_delay(&response);
            tracing::warn!(
                "Retrying {} {} after status {} (attempt {} of {}), waiting {:?}",
                request.http_method,
                request.url,
                code,
                tries,
                request.tries,
                delay
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// Parses response headers into a `HashMap`.
    fn parse_response_headers(
        headers: &reqwest::header::HeaderMap,
    ) -> HashMap<String, Vec<String>> {
        let mut result: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in headers {
            let key = name.as_str().to_lowercase();
            let value = value.to_str().unwrap_or_default().to_string();
            result.entry(key).or_default().push(value);
        }
        result
    }

    /// The server's `Stripe-Should-Retry` hint wins over the status code.
    fn is_retryable(response: &HttpResponse) -> bool {
        response
            .should_retry()
            .unwrap_or(response.code == 429 || response.code >= 500)
    }

    fn calculate_retry_delay(response: &HttpResponse) -> Duration {
        let max = Duration::from_secs(MAX_RETRY_WAIT_TIME);
        response
            .retry_request_after
            .map_or(Duration::from_secs(RETRY_WAIT_TIME), |secs| {
                Duration::try_from_secs_f64(secs).map_or(max, |delay| delay.min(max))
            })
    }
}

impl Transport for HttpClient {
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, HttpError>> + Send {
        self.request(request)
    }
}
