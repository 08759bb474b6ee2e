//! Configuration types for the Stripe API client.
//!
//! # Overview
//!
//! The main types in this module are:
//!
//! - [`ClientConfig`]: The configuration held by the client facade
//! - [`ClientConfigBuilder`]: A builder for constructing [`ClientConfig`] instances
//! - [`ApiKey`]: A validated API key newtype with masked debug output
//! - [`ApiVersion`]: The Stripe API version to use
//!
//! # Example
//!
//! ```rust
//! use stripe_api::{ClientConfig, ApiKey, ApiVersion};
//!
//! let config = ClientConfig::builder()
//!     .api_key(ApiKey::new("sk_test_123").unwrap())
//!     .api_version(ApiVersion::V2014_07_26)
//!     .header("Stripe-Account", "acct_123")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.headers().get("Stripe-Version").unwrap(), "2014-07-26");
//! ```

mod newtypes;
mod version;

pub use newtypes::ApiKey;
pub use version::ApiVersion;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::clients::SDK_VERSION;
use crate::error::ConfigError;

/// Name of the header carrying the API version.
pub const VERSION_HEADER: &str = "Stripe-Version";

/// Returns the default user agent sent with every request.
#[must_use]
pub fn default_user_agent() -> String {
    format!("Stripe-Rust/{SDK_VERSION}")
}

/// Inserts a header, dropping any existing header whose name differs only
/// in case. HTTP header names are case-insensitive.
fn merge_header(headers: &mut HashMap<String, String>, key: String, value: String) {
    headers.retain(|existing, _| !existing.eq_ignore_ascii_case(&key));
    headers.insert(key, value);
}

/// Configuration for the Stripe API client.
///
/// Holds the API key, protocol version, user agent and the additional
/// headers sent with every request. Header names are unique ignoring case:
/// a later write for the same name overrides the earlier value and its
/// spelling.
///
/// Executors take a snapshot of this configuration when they are built;
/// changing the configuration afterwards never affects an existing executor.
///
/// # Thread Safety
///
/// `ClientConfig` is `Clone`, `Send`, and `Sync`.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    api_key: ApiKey,
    api_version: ApiVersion,
    user_agent: String,
    headers: HashMap<String, String>,
    manifest_path: Option<PathBuf>,
    base_url: Option<String>,
    tries: u32,
    timeout: Option<Duration>,
}

impl ClientConfig {
    /// Creates a new builder for constructing a `ClientConfig`.
    #[must_use]
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Returns the API key.
    #[must_use]
    pub const fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    /// Replaces the API key.
    pub fn set_api_key(&mut self, api_key: ApiKey) {
        self.api_key = api_key;
    }

    /// Returns the API version.
    #[must_use]
    pub const fn api_version(&self) -> &ApiVersion {
        &self.api_version
    }

    /// Sets the API version and rewrites the `Stripe-Version` header.
    pub fn set_api_version(&mut self, version: ApiVersion) {
        merge_header(
            &mut self.headers,
            VERSION_HEADER.to_string(),
            version.to_string(),
        );
        self.api_version = version;
    }

    /// Returns the user agent.
    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Sets the user agent.
    pub fn set_user_agent(&mut self, user_agent: impl Into<String>) {
        self.user_agent = user_agent.into();
    }

    /// Returns the additional headers sent with every request.
    #[must_use]
    pub const fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Merges headers into the configuration.
    ///
    /// New names are added and existing names are overwritten, comparing
    /// names case-insensitively. All other headers are preserved.
    pub fn set_headers<I, K, V>(&mut self, headers: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in headers {
            merge_header(&mut self.headers, key.into(), value.into());
        }
    }

    /// Returns the manifest root directory, if one is configured.
    ///
    /// `None` means the manifests bundled with the crate are used.
    #[must_use]
    pub fn manifest_path(&self) -> Option<&Path> {
        self.manifest_path.as_deref()
    }

    /// Sets the manifest root directory.
    pub fn set_manifest_path(&mut self, path: impl Into<PathBuf>) {
        self.manifest_path = Some(path.into());
    }

    /// Returns the base URL override, if configured.
    #[must_use]
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// Returns how many times a request is attempted on 429/5xx responses.
    #[must_use]
    pub const fn tries(&self) -> u32 {
        self.tries
    }

    /// Returns the transport timeout, if configured.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

// Verify ClientConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ClientConfig>();
};

/// Builder for constructing [`ClientConfig`] instances.
///
/// The only required field is `api_key`.
///
/// # Defaults
///
/// - `api_version`: [`ApiVersion::default()`] (`2014-07-26`)
/// - `user_agent`: `Stripe-Rust/<crate version>`
/// - `headers`: only `Stripe-Version`
/// - `manifest_path`: `None` (bundled manifests)
/// - `base_url`: `None` (taken from the manifest)
/// - `tries`: 1 (no retries)
/// - `timeout`: `None`
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    api_key: Option<ApiKey>,
    api_version: Option<ApiVersion>,
    user_agent: Option<String>,
    headers: Vec<(String, String)>,
    manifest_path: Option<PathBuf>,
    base_url: Option<String>,
    tries: Option<u32>,
    timeout: Option<Duration>,
}

impl ClientConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key (required).
    #[must_use]
    pub fn api_key(mut self, key: ApiKey) -> Self {
        self.api_key = Some(key);
        self
    }

    /// Sets the API version.
    #[must_use]
    pub fn api_version(mut self, version: ApiVersion) -> Self {
        self.api_version = Some(version);
        self
    }

    /// Sets the user agent.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Adds a single header. Later calls for the same key win.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Sets the manifest root directory.
    #[must_use]
    pub fn manifest_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest_path = Some(path.into());
        self
    }

    /// Overrides the base URL declared by the manifests.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the number of attempts for requests answered with 429 or 5xx.
    #[must_use]
    pub const fn tries(mut self, tries: u32) -> Self {
        self.tries = Some(tries);
        self
    }

    /// Sets the transport timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the [`ClientConfig`].
    ///
    /// The `Stripe-Version` header is derived from the API version unless it
    /// was set explicitly through [`header`](Self::header).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredField`] if `api_key` is not set,
    /// or [`ConfigError::InvalidBaseUrl`] if the base URL has no scheme.
    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        let api_key = self
            .api_key
            .ok_or(ConfigError::MissingRequiredField { field: "api_key" })?;

        let base_url = self
            .base_url
            .map(|url| {
                let url = url.trim().trim_end_matches('/').to_string();
                if url.starts_with("http://") || url.starts_with("https://") {
                    Ok(url)
                } else {
                    Err(ConfigError::InvalidBaseUrl { url })
                }
            })
            .transpose()?;

        let api_version = self.api_version.unwrap_or_default();

        let mut headers = HashMap::new();
        headers.insert(VERSION_HEADER.to_string(), api_version.to_string());
        for (key, value) in self.headers {
            merge_header(&mut headers, key, value);
        }

        Ok(ClientConfig {
            api_key,
            api_version,
            user_agent: self.user_agent.unwrap_or_else(default_user_agent),
            headers,
            manifest_path: self.manifest_path,
            base_url,
            tries: self.tries.unwrap_or(1).max(1),
            timeout: self.timeout,
        })
    }
}
