//! # Stripe API Rust Client
//!
//! A manifest-driven client for the Stripe REST API. Resources, operations,
//! parameters, error mappings and pagination conventions are declared in
//! versioned JSON manifests; the client resolves any symbolic name at call
//! time into an executor for that resource or a lazy iterator over its list
//! operation.
//!
//! ## Overview
//!
//! This crate provides:
//! - Type-safe configuration via [`ClientConfig`] and [`ClientConfigBuilder`]
//! - Manifest loading and caching per API version via [`manifest::ManifestStore`]
//! - Symbolic name resolution via [`OperationResolver`] (`charges`,
//!   `chargesIterator`)
//! - Transport-bound resource executors via [`ClientFactory`] and [`Executor`]
//! - Lazy cursor pagination via [`ResourceIterator`]
//! - Async HTTP transport with retry logic via [`HttpClient`]
//!
//! ## Quick Start
//!
//! ```rust
//! use stripe_api::{StripeClient, ApiVersion};
//!
//! let mut client = StripeClient::new("sk_test_123").unwrap();
//! assert_eq!(client.api_version(), &ApiVersion::V2014_07_26);
//!
//! client.set_headers([("Stripe-Account", "acct_123")]);
//!
//! let charges = client.resource("charges").unwrap();
//! assert!(charges.describe("create").is_some());
//! ```
//!
//! ## Dynamic Dispatch
//!
//! ```rust,ignore
//! use stripe_api::{StripeClient, Dispatch};
//! use serde_json::json;
//!
//! let client = StripeClient::new("sk_test_123")?;
//!
//! match client.call("chargesIterator", vec![json!({"customer": "cus_123"}), json!({"limit": 25})])? {
//!     Dispatch::Iterator(mut charges) => {
//!         while let Some(charge) = charges.next().await {
//!             println!("{}", charge?["id"]);
//!         }
//!     }
//!     Dispatch::Executor(_) => unreachable!(),
//! }
//! ```
//!
//! ## Custom Manifests
//!
//! Manifests are read from the copies bundled with the crate unless a
//! manifest path is configured, in which case documents are read from
//! `<path>/<version>/<Resource>.json`.

pub mod client;
pub mod clients;
pub mod config;
pub mod error;
pub mod factory;
pub mod iterator;
pub mod manifest;
pub mod resolver;

// Re-export public types at crate root for convenience
pub use client::{Dispatch, StripeClient, StripeClientBuilder};
pub use config::{ApiKey, ApiVersion, ClientConfig, ClientConfigBuilder};
pub use error::{ClientError, ConfigError};
pub use factory::{ClientFactory, Command, Executor};
pub use iterator::{IteratorOptions, ResourceIterator};
pub use manifest::{ErrorKind, ManifestError};
pub use resolver::{OperationResolver, ResolvedOperation};

// Re-export HTTP client types
pub use clients::{
    DataType, HttpClient, HttpError, HttpMethod, HttpRequest, HttpRequestBuilder, HttpResponse,
    HttpResponseError, InvalidHttpRequestError, MaxHttpRetriesExceededError, Transport,
};
