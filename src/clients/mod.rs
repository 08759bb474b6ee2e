//! HTTP client types for Stripe API communication.
//!
//! This module provides the transport layer executors send their requests
//! through. It handles request encoding, retry logic, Stripe-specific header
//! parsing and the classification of failed responses.
//!
//! # Overview
//!
//! - [`Transport`]: The seam between executors and the network
//! - [`HttpClient`]: The default `reqwest`-based transport
//! - [`HttpRequest`]: A fully resolved request
//! - [`HttpResponse`]: A parsed response from the API
//! - [`HttpMethod`]: Supported HTTP methods (GET, POST, PUT, DELETE)
//! - [`DataType`]: Content types for request bodies
//!
//! # Retry Behavior
//!
//! - **429 (Rate Limited)** and **5xx**: Retried, waiting `Retry-After`
//!   seconds (capped at [`MAX_RETRY_WAIT_TIME`]) if present, otherwise 1 second
//! - **`Stripe-Should-Retry`**: When present, decides on its own
//! - **Other errors (4xx)**: Returned immediately
//!
//! The default `tries` is 1, meaning no automatic retries.

mod errors;
mod http_client;
mod http_request;
mod http_response;

pub use errors::{
    HttpError, HttpResponseError, InvalidHttpRequestError, MaxHttpRetriesExceededError,
};
pub use http_client::{HttpClient, Transport, MAX_RETRY_WAIT_TIME, RETRY_WAIT_TIME, SDK_VERSION};
pub use http_request::{
    flatten_params, form_encode, DataType, HttpMethod, HttpRequest, HttpRequestBuilder,
};
pub use http_response::HttpResponse;
