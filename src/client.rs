//! The dynamic Stripe client facade.
//!
//! [`StripeClient`] owns the configuration and the manifest store and
//! accepts any symbolic operation name at call time:
//!
//! - `call("charges", args)` returns a [`Dispatch::Executor`] for the
//!   `Charges` resource.
//! - `call("chargesIterator", [params, options])` returns a
//!   [`Dispatch::Iterator`] over the `all` operation of `Charges`.
//!
//! # Example
//!
//! ```rust,ignore
//! use stripe_api::StripeClient;
//! use serde_json::json;
//!
//! let client = StripeClient::new("sk_test_123")?;
//!
//! let charges = client.resource("charges")?;
//! let charge = charges
//!     .invoke("create", json!({"amount": 400, "currency": "usd", "card": "tok_visa"}))
//!     .await?;
//!
//! let mut customers = client
//!     .call("customersIterator", vec![json!({"limit": 10})])?
//!     .into_iterator()
//!     .unwrap();
//! while let Some(customer) = customers.next().await {
//!     println!("{}", customer?["email"]);
//! }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::clients::{HttpClient, Transport};
use crate::config::{ApiKey, ApiVersion, ClientConfig, ClientConfigBuilder};
use crate::error::{ClientError, ConfigError};
use crate::factory::{ClientFactory, Executor};
use crate::iterator::{IteratorOptions, ResourceIterator};
use crate::manifest::{ManifestSource, ManifestStore};
use crate::resolver::{OperationResolver, ResolvedOperation, ITERATOR_SUFFIX, LIST_OPERATION};

/// The result of a dynamic call.
#[derive(Debug)]
pub enum Dispatch<T: Transport = HttpClient> {
    /// A resource executor, for names without the iterator suffix.
    Executor(Executor<T>),
    /// A lazy iterator, for names with the iterator suffix.
    Iterator(ResourceIterator<T>),
}

impl<T: Transport> Dispatch<T> {
    /// Returns `true` for iterator dispatches.
    #[must_use]
    pub const fn is_iterator(&self) -> bool {
        matches!(self, Self::Iterator(_))
    }

    /// Returns the executor, if this is a direct dispatch.
    #[must_use]
    pub fn into_executor(self) -> Option<Executor<T>> {
        match self {
            Self::Executor(executor) => Some(executor),
            Self::Iterator(_) => None,
        }
    }

    /// Returns the iterator, if this is an iterator dispatch.
    #[must_use]
    pub fn into_iterator(self) -> Option<ResourceIterator<T>> {
        match self {
            Self::Iterator(iterator) => Some(iterator),
            Self::Executor(_) => None,
        }
    }
}

/// Client for the Stripe API driven by manifest documents.
///
/// Configuration changes made through the setters apply to executors and
/// iterators created afterwards; those already created keep the headers
/// they were built with.
///
/// # Thread Safety
///
/// `StripeClient` is `Send + Sync`. Calls take `&self`; setters take
/// `&mut self`, so mutations are serialized by the borrow checker.
#[derive(Debug)]
pub struct StripeClient<T: Transport = HttpClient> {
    config: ClientConfig,
    store: ManifestStore,
    transport: Arc<T>,
}

// Verify StripeClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<StripeClient>();
};

impl StripeClient {
    /// Creates a client with the default version, bundled manifests and
    /// the default HTTP transport.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if the key is empty, or
    /// [`ClientError::Http`] if the HTTP client cannot be created.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ClientError> {
        Self::builder().api_key(ApiKey::new(api_key)?).build()
    }

    /// Creates a builder.
    #[must_use]
    pub fn builder() -> StripeClientBuilder {
        StripeClientBuilder::default()
    }
}

impl<T: Transport> StripeClient<T> {
    /// Creates a client from a configuration and a transport.
    ///
    /// Manifests are read from the configured manifest path, or the bundled
    /// ones if none is set.
    #[must_use]
    pub fn with_transport(config: ClientConfig, transport: Arc<T>) -> Self {
        let store = config
            .manifest_path()
            .map_or_else(ManifestStore::bundled, ManifestStore::from_path);
        Self {
            config,
            store,
            transport,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the manifest store.
    #[must_use]
    pub const fn store(&self) -> &ManifestStore {
        &self.store
    }

    /// Returns the transport.
    #[must_use]
    pub const fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Returns the API key.
    #[must_use]
    pub const fn api_key(&self) -> &ApiKey {
        self.config.api_key()
    }

    /// Replaces the API key.
    pub fn set_api_key(&mut self, api_key: ApiKey) {
        self.config.set_api_key(api_key);
    }

    /// Returns the API version.
    #[must_use]
    pub const fn api_version(&self) -> &ApiVersion {
        self.config.api_version()
    }

    /// Sets the API version, which also rewrites the `Stripe-Version` header.
    pub fn set_api_version(&mut self, version: ApiVersion) {
        self.config.set_api_version(version);
    }

    /// Returns the user agent.
    #[must_use]
    pub fn user_agent(&self) -> &str {
        self.config.user_agent()
    }

    /// Sets the user agent.
    pub fn set_user_agent(&mut self, user_agent: impl Into<String>) {
        self.config.set_user_agent(user_agent);
    }

    /// Returns the configured headers.
    #[must_use]
    pub const fn headers(&self) -> &HashMap<String, String> {
        self.config.headers()
    }

    /// Merges headers: new keys are added, existing keys overwritten.
    pub fn set_headers<I, K, V>(&mut self, headers: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.config.set_headers(headers);
    }

    /// Returns the manifest root directory, if one is configured.
    #[must_use]
    pub fn manifest_path(&self) -> Option<&Path> {
        self.config.manifest_path()
    }

    /// Reads manifests from `path` from now on.
    ///
    /// The manifest cache starts over empty.
    pub fn set_manifest_path(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        self.store = ManifestStore::from_path(&path);
        self.config.set_manifest_path(path);
    }

    /// Returns a resolver for the current API version.
    #[must_use]
    pub fn resolver(&self) -> OperationResolver<'_> {
        OperationResolver::new(&self.store, self.config.api_version())
    }

    fn factory(&self) -> ClientFactory<'_> {
        ClientFactory::new(&self.store, &self.config)
    }

    /// Dispatches a symbolic operation name.
    ///
    /// For iterator names (`chargesIterator`), `arguments[0]` holds the list
    /// parameters and `arguments[1]` the [`IteratorOptions`]; both may be
    /// omitted. Direct names ignore `arguments`, since the returned executor
    /// takes its parameters per invocation.
    ///
    /// # Errors
    ///
    /// - [`ClientError::UndefinedOperation`] if no manifest backs the name
    /// - [`ClientError::InvalidArguments`] for malformed iterator arguments
    /// - [`ClientError::Manifest`] if the manifest cannot be loaded
    pub fn call(&self, name: &str, arguments: Vec<Value>) -> Result<Dispatch<T>, ClientError> {
        let resolved = self.resolver().resolve(name)?;
        let executor = self.factory().build(&resolved, Arc::clone(&self.transport))?;

        match resolved {
            ResolvedOperation::Direct { .. } => Ok(Dispatch::Executor(executor)),
            ResolvedOperation::Iterator { list_operation, .. } => {
                if arguments.len() > 2 {
                    return Err(ClientError::InvalidArguments {
                        reason: format!(
                            "'{name}' takes at most 2 arguments (parameters, options), got {}",
                            arguments.len()
                        ),
                    });
                }
                let mut arguments = arguments.into_iter();
                let params = arguments.next().unwrap_or(Value::Null);
                let options = IteratorOptions::from_value(&arguments.next().unwrap_or(Value::Null))?;

                let command = executor.command(list_operation, params)?;
                Ok(Dispatch::Iterator(ResourceIterator::new(command, options)))
            }
        }
    }

    /// Returns the executor for a resource.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::UndefinedOperation`] if no manifest exists.
    pub fn resource(&self, name: &str) -> Result<Executor<T>, ClientError> {
        let resolved = ResolvedOperation::Direct {
            name: name.to_string(),
        };
        if !self.store.exists(self.config.api_version(), name) {
            return Err(ClientError::UndefinedOperation {
                name: name.to_string(),
            });
        }
        self.factory().build(&resolved, Arc::clone(&self.transport))
    }

    /// Returns an iterator over a resource's list operation.
    ///
    /// `name` may be given with or without the iterator suffix.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::UndefinedOperation`] if no manifest exists,
    /// [`ClientError::UndefinedCommand`] if the resource cannot be listed, or
    /// [`ClientError::InvalidArguments`] if `params` is not an object.
    pub fn iterator(
        &self,
        name: &str,
        params: Value,
        options: IteratorOptions,
    ) -> Result<ResourceIterator<T>, ClientError> {
        let resource = name
            .strip_suffix(ITERATOR_SUFFIX)
            .filter(|stem| !stem.is_empty())
            .unwrap_or(name);
        let executor = self.resource(resource)?;
        let command = executor.command(LIST_OPERATION, params)?;
        Ok(ResourceIterator::new(command, options))
    }
}

/// Builder for [`StripeClient`].
///
/// Wraps [`ClientConfigBuilder`] and adds the manifest source.
#[derive(Debug, Default)]
pub struct StripeClientBuilder {
    config: ClientConfigBuilder,
    source: Option<Arc<dyn ManifestSource>>,
}

impl StripeClientBuilder {
    /// Sets the API key (required).
    #[must_use]
    pub fn api_key(mut self, key: ApiKey) -> Self {
        self.config = self.config.api_key(key);
        self
    }

    /// Sets the API version (default `2014-07-26`).
    #[must_use]
    pub fn api_version(mut self, version: ApiVersion) -> Self {
        self.config = self.config.api_version(version);
        self
    }

    /// Sets the user agent.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config = self.config.user_agent(user_agent);
        self
    }

    /// Adds a header sent with every request.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config = self.config.header(key, value);
        self
    }

    /// Reads manifests from `<path>/<version>/<Name>.json`.
    #[must_use]
    pub fn manifest_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config = self.config.manifest_path(path);
        self
    }

    /// Overrides the base URL declared by the manifests.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config = self.config.base_url(url);
        self
    }

    /// Sets the number of attempts for 429/5xx responses.
    #[must_use]
    pub fn tries(mut self, tries: u32) -> Self {
        self.config = self.config.tries(tries);
        self
    }

    /// Sets the HTTP timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.timeout(timeout);
        self
    }

    /// Reads manifests from a custom source.
    ///
    /// Cannot be combined with [`manifest_path`](Self::manifest_path).
    #[must_use]
    pub fn manifest_source(mut self, source: impl ManifestSource + 'static) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    /// Builds a client using the default HTTP transport.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] for invalid configuration, including
    /// setting both a manifest path and a manifest source, or
    /// [`ClientError::Http`] if the HTTP client cannot be created.
    pub fn build(self) -> Result<StripeClient, ClientError> {
        let config = self.config.build()?;
        let store = Self::store(&config, self.source)?;
        let transport = Arc::new(HttpClient::new(config.timeout())?);
        Ok(StripeClient {
            config,
            store,
            transport,
        })
    }

    /// Builds a client sending requests through `transport`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] for invalid configuration, including
    /// setting both a manifest path and a manifest source.
    pub fn build_with_transport<T: Transport>(
        self,
        transport: Arc<T>,
    ) -> Result<StripeClient<T>, ClientError> {
        let config = self.config.build()?;
        let store = Self::store(&config, self.source)?;
        Ok(StripeClient {
            config,
            store,
            transport,
        })
    }

    fn store(
        config: &ClientConfig,
        source: Option<Arc<dyn ManifestSource>>,
    ) -> Result<ManifestStore, ConfigError> {
        match (config.manifest_path(), source) {
            (Some(_), Some(_)) => Err(ConfigError::ConflictingOptions {
                first: "manifest_path",
                second: "manifest_source",
            }),
            (Some(path), None) => Ok(ManifestStore::from_path(path)),
            (None, Some(source)) => Ok(ManifestStore::from_shared(source)),
            (None, None) => Ok(ManifestStore::bundled()),
        }
    }
}
