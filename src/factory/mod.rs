//! Building transport-bound executors for resources.
//!
//! [`ClientFactory`] turns a [`ResolvedOperation`] into an [`Executor`]: the
//! resource's merged manifest plus a snapshot of the authentication and
//! default headers, bound to a [`Transport`]. Building never touches the
//! network.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use stripe_api::{ClientConfig, ApiKey, ClientFactory, HttpClient, ResolvedOperation};
//! use stripe_api::manifest::ManifestStore;
//! use serde_json::json;
//!
//! let store = ManifestStore::bundled();
//! let config = ClientConfig::builder()
//!     .api_key(ApiKey::new("sk_test_123")?)
//!     .build()?;
//!
//! let factory = ClientFactory::new(&store, &config);
//! let charges = factory.build(
//!     &ResolvedOperation::classify("charges"),
//!     Arc::new(HttpClient::new(None)?),
//! )?;
//!
//! let charge = charges.invoke("retrieve", json!({"id": "ch_123"})).await?;
//! ```

mod request;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{Map, Value};

use crate::clients::{HttpClient, HttpError, HttpResponseError, Transport};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::manifest::{Manifest, ManifestStore, OperationSpec, ServiceMetadata};
use crate::resolver::ResolvedOperation;
use request::{build_request, RequestContext};

/// Returns the headers every request of `config` carries.
///
/// `Authorization` (HTTP Basic with the API key as user name and an empty
/// password), `Accept` and `User-Agent` come first; configured headers then
/// override them, matching names case-insensitively.
#[must_use]
pub fn default_headers(config: &ClientConfig) -> HashMap<String, String> {
    let credentials = STANDARD.encode(format!("{}:", config.api_key().as_ref()));

    let mut headers = HashMap::new();
    headers.insert("Authorization".to_string(), format!("Basic {credentials}"));
    headers.insert("Accept".to_string(), "application/json".to_string());
    headers.insert("User-Agent".to_string(), config.user_agent().to_string());

    for (key, value) in config.headers() {
        headers.retain(|existing, _| !existing.eq_ignore_ascii_case(key));
        headers.insert(key.clone(), value.clone());
    }

    headers
}

/// Builds [`Executor`]s from resolved operations.
#[derive(Debug)]
pub struct ClientFactory<'a> {
    store: &'a ManifestStore,
    config: &'a ClientConfig,
}

impl<'a> ClientFactory<'a> {
    /// Creates a factory reading manifests from `store` with `config`.
    #[must_use]
    pub const fn new(store: &'a ManifestStore, config: &'a ClientConfig) -> Self {
        Self { store, config }
    }

    /// Builds an executor for the resource behind `resolved`.
    ///
    /// Iterator resolutions build the executor of their base resource.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Manifest`] if the manifest does not exist or
    /// cannot be loaded.
    pub fn build<T: Transport>(
        &self,
        resolved: &ResolvedOperation,
        transport: Arc<T>,
    ) -> Result<Executor<T>, ClientError> {
        let manifest = self
            .store
            .load(self.config.api_version(), resolved.resource())?;

        let base_url = self
            .config
            .base_url()
            .unwrap_or(manifest.service.base_url.as_str())
            .to_string();

        tracing::debug!(
            "Built executor for {} (API version {}) against {}",
            manifest.name,
            self.config.api_version(),
            base_url
        );

        Ok(Executor {
            manifest,
            headers: Arc::new(default_headers(self.config)),
            base_url: Arc::from(base_url),
            tries: self.config.tries(),
            transport,
        })
    }
}

/// A transport-bound client for one resource.
///
/// Holds the resource's merged manifest and a snapshot of the headers taken
/// when it was built; later configuration changes never reach an existing
/// executor. Cloning is cheap.
pub struct Executor<T: Transport = HttpClient> {
    manifest: Arc<Manifest>,
    headers: Arc<HashMap<String, String>>,
    base_url: Arc<str>,
    tries: u32,
    transport: Arc<T>,
}

impl<T: Transport> Clone for Executor<T> {
    fn clone(&self) -> Self {
        Self {
            manifest: Arc::clone(&self.manifest),
            headers: Arc::clone(&self.headers),
            base_url: Arc::clone(&self.base_url),
            tries: self.tries,
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T: Transport> fmt::Debug for Executor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("resource", &self.manifest.name)
            .field("version", &self.manifest.version)
            .field("base_url", &self.base_url)
            .field("operations", &self.manifest.operations.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl<T: Transport> Executor<T> {
    /// Returns the canonical resource name.
    #[must_use]
    pub fn resource(&self) -> &str {
        &self.manifest.name
    }

    /// Returns the merged manifest this executor is driven by.
    #[must_use]
    pub const fn manifest(&self) -> &Arc<Manifest> {
        &self.manifest
    }

    /// Returns the service metadata.
    #[must_use]
    pub fn service(&self) -> &ServiceMetadata {
        &self.manifest.service
    }

    /// Returns the header snapshot sent with every request.
    #[must_use]
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Returns the base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the names of the operations this resource supports.
    pub fn operations(&self) -> impl Iterator<Item = &str> {
        self.manifest.operation_names()
    }

    /// Returns the spec of an operation.
    #[must_use]
    pub fn describe(&self, operation: &str) -> Option<&OperationSpec> {
        self.manifest.operation(operation)
    }

    /// Returns a reusable command for `operation` with `params`.
    ///
    /// `params` must be a JSON object or `null`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::UndefinedCommand`] if the resource has no such
    /// operation, or [`ClientError::InvalidArguments`] if `params` is not an
    /// object.
    pub fn command(&self, operation: &str, params: Value) -> Result<Command<T>, ClientError> {
        if self.describe(operation).is_none() {
            return Err(ClientError::UndefinedCommand {
                resource: self.manifest.name.clone(),
                operation: operation.to_string(),
            });
        }

        let params = match params {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(ClientError::InvalidArguments {
                    reason: format!(
                        "parameters for '{operation}' must be an object, got {other}"
                    ),
                })
            }
        };

        Ok(Command {
            executor: self.clone(),
            operation: operation.to_string(),
            params,
        })
    }

    /// Invokes `operation` once and returns the response body.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the operation is unknown, a parameter is
    /// missing or mistyped, or the request fails.
    pub async fn invoke(&self, operation: &str, params: Value) -> Result<Value, ClientError> {
        self.command(operation, params)?.execute().await
    }

    async fn send(
        &self,
        operation: &str,
        params: &Map<String, Value>,
    ) -> Result<Value, ClientError> {
        let spec = self
            .describe(operation)
            .ok_or_else(|| ClientError::UndefinedCommand {
                resource: self.manifest.name.clone(),
                operation: operation.to_string(),
            })?;

        let context = RequestContext {
            base_url: &self.base_url,
            headers: &self.headers,
            encoding: self.manifest.service.request_encoding,
            tries: self.tries,
            errors: &self.manifest.errors,
        };
        let request = build_request(spec, params, &context)?;

        tracing::debug!(
            "Invoking {}.{}: {} {}",
            self.manifest.name,
            operation,
            request.http_method,
            request.url
        );

        let response = self.transport.send(request).await?;
        if !response.is_ok() {
            return Err(HttpError::Response(HttpResponseError::from_response(
                &response,
                Some(&self.manifest.errors),
            ))
            .into());
        }

        Ok(response.body)
    }
}

/// An operation of an executor bound to its call parameters.
///
/// Commands can be executed any number of times, optionally with some
/// parameters overridden; the bound parameters themselves never change.
pub struct Command<T: Transport = HttpClient> {
    executor: Executor<T>,
    operation: String,
    params: Map<String, Value>,
}

impl<T: Transport> Clone for Command<T> {
    fn clone(&self) -> Self {
        Self {
            executor: self.executor.clone(),
            operation: self.operation.clone(),
            params: self.params.clone(),
        }
    }
}

impl<T: Transport> fmt::Debug for Command<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("resource", &self.executor.resource())
            .field("operation", &self.operation)
            .field("params", &self.params)
            .finish()
    }
}

impl<T: Transport> Command<T> {
    /// Returns the operation name.
    #[must_use]
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Returns the bound parameters.
    #[must_use]
    pub const fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    /// Returns the executor the command runs on.
    #[must_use]
    pub const fn executor(&self) -> &Executor<T> {
        &self.executor
    }

    /// Runs the command with its bound parameters.
    ///
    /// # Errors
    ///
    /// See [`Executor::invoke`].
    pub async fn execute(&self) -> Result<Value, ClientError> {
        self.executor.send(&self.operation, &self.params).await
    }

    /// Runs the command with `overrides` replacing same-named parameters.
    ///
    /// # Errors
    ///
    /// See [`Executor::invoke`].
    pub async fn execute_with(&self, overrides: Map<String, Value>) -> Result<Value, ClientError> {
        let mut params = self.params.clone();
        params.extend(overrides);
        self.executor.send(&self.operation, &params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiKey, VERSION_HEADER};

    fn config() -> ClientConfig {
        ClientConfig::builder()
            .api_key(ApiKey::new("sk_test_123").unwrap())
            .header("Stripe-Account", "acct_1")
            .build()
            .unwrap()
    }

    fn executor(config: &ClientConfig, name: &str) -> Result<Executor, ClientError> {
        let store = ManifestStore::bundled();
        let transport = Arc::new(HttpClient::new(None).unwrap());
        ClientFactory::new(&store, config).build(&ResolvedOperation::classify(name), transport)
    }

    #[test]
    fn test_default_headers() {
        let headers = default_headers(&config());

        assert_eq!(headers.get("Authorization").unwrap(), "Basic c2tfdGVzdF8xMjM6");
        assert_eq!(headers.get("Accept").unwrap(), "application/json");
        assert!(headers.get("User-Agent").unwrap().starts_with("Stripe-Rust/"));
        assert_eq!(headers.get(VERSION_HEADER).unwrap(), "2014-07-26");
        assert_eq!(headers.get("Stripe-Account").unwrap(), "acct_1");
    }

    #[test]
    fn test_configured_headers_win_case_insensitively() {
        let config = ClientConfig::builder()
            .api_key(ApiKey::new("sk_test_123").unwrap())
            .header("accept", "text/plain")
            .build()
            .unwrap();

        let headers = default_headers(&config);

        assert!(headers.get("Accept").is_none());
        assert_eq!(headers.get("accept").unwrap(), "text/plain");
    }

    #[test]
    fn test_lowercase_version_header_is_sent_once() {
        for _ in 0..50 {
            let config = ClientConfig::builder()
                .api_key(ApiKey::new("sk_test_123").unwrap())
                .header("stripe-version", "2015-10-16")
                .build()
                .unwrap();

            let headers = default_headers(&config);
            let versions: Vec<_> = headers
                .iter()
                .filter(|(key, _)| key.eq_ignore_ascii_case(VERSION_HEADER))
                .collect();

            assert_eq!(versions.len(), 1);
            assert_eq!(versions[0].1, "2015-10-16");
        }
    }

    #[test]
    fn test_build_direct_executor() {
        let charges = executor(&config(), "charges").unwrap();

        assert_eq!(charges.resource(), "Charges");
        assert_eq!(charges.base_url(), "https://api.stripe.com");
        assert!(charges.describe("create").is_some());
        assert!(charges.operations().any(|op| op == "all"));
        assert_eq!(charges.headers().get(VERSION_HEADER).unwrap(), "2014-07-26");
    }

    #[test]
    fn test_build_iterator_uses_base_resource() {
        let customers = executor(&config(), "customersIterator").unwrap();
        assert_eq!(customers.resource(), "Customers");
    }

    #[test]
    fn test_build_missing_manifest() {
        let error = executor(&config(), "widgets").unwrap_err();
        assert!(error.is_manifest_not_found());
    }

    #[test]
    fn test_base_url_override() {
        let config = ClientConfig::builder()
            .api_key(ApiKey::new("sk_test_123").unwrap())
            .base_url("http://localhost:12111")
            .build()
            .unwrap();

        let charges = executor(&config, "charges").unwrap();
        assert_eq!(charges.base_url(), "http://localhost:12111");
    }

    #[test]
    fn test_command_validation() {
        let charges = executor(&config(), "charges").unwrap();

        assert!(matches!(
            charges.command("explode", Value::Null),
            Err(ClientError::UndefinedCommand { resource, operation })
                if resource == "Charges" && operation == "explode"
        ));
        assert!(matches!(
            charges.command("all", serde_json::json!([1, 2])),
            Err(ClientError::InvalidArguments { .. })
        ));

        let command = charges.command("all", serde_json::json!({"limit": 2})).unwrap();
        assert_eq!(command.operation(), "all");
        assert_eq!(command.params().get("limit").unwrap(), 2);
        assert_eq!(command.executor().resource(), "Charges");
    }
}
