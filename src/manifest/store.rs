//! Loading and memoizing manifests.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use crate::config::ApiVersion;
use crate::manifest::document::{BaseManifest, Manifest};
use crate::manifest::errors::ManifestError;
use crate::manifest::source::{is_document_name, BundledSource, FileSystemSource, ManifestSource};

/// Name of the base document shared by every resource of a version.
///
/// It is reserved: no resource can be named after it.
pub const BASE_MANIFEST: &str = "Manifest";

/// Normalizes a symbolic resource name to its document name.
///
/// The first character is upper-cased and the rest is kept as is, so
/// `charges` becomes `Charges` and `invoiceItems` becomes `InvoiceItems`.
///
/// # Example
///
/// ```rust
/// use stripe_api::manifest::canonical_name;
///
/// assert_eq!(canonical_name("invoiceItems"), "InvoiceItems");
/// assert_eq!(canonical_name("Charges"), "Charges");
/// ```
#[must_use]
pub fn canonical_name(name: &str) -> String {
    let mut chars = name.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

#[derive(Debug, Default)]
struct VersionCache {
    base: Option<Arc<BaseManifest>>,
    resources: HashMap<String, Arc<Manifest>>,
}

/// Loads, parses and memoizes manifests per API version.
///
/// Every document is read from its source at most once for the lifetime of
/// the store; later loads return the same `Arc`. Each version has its own
/// lock, so loading `2014-07-26` never waits on another version.
///
/// # Example
///
/// ```rust
/// use stripe_api::{ApiVersion, manifest::ManifestStore};
///
/// let store = ManifestStore::bundled();
/// let charges = store.load(&ApiVersion::default(), "charges").unwrap();
///
/// assert_eq!(charges.name, "Charges");
/// assert!(charges.operation("all").is_some());
/// ```
#[derive(Debug)]
pub struct ManifestStore {
    source: Arc<dyn ManifestSource>,
    scopes: Mutex<HashMap<String, Arc<Mutex<VersionCache>>>>,
}

// Verify ManifestStore is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ManifestStore>();
};

impl ManifestStore {
    /// Creates a store reading from `source`.
    #[must_use]
    pub fn new(source: impl ManifestSource + 'static) -> Self {
        Self::from_shared(Arc::new(source))
    }

    /// Creates a store reading from an already shared source.
    #[must_use]
    pub fn from_shared(source: Arc<dyn ManifestSource>) -> Self {
        Self {
            source,
            scopes: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a store over the manifests bundled with the crate.
    #[must_use]
    pub fn bundled() -> Self {
        Self::new(BundledSource)
    }

    /// Creates a store reading `<root>/<version>/<Name>.json`.
    #[must_use]
    pub fn from_path(root: impl Into<PathBuf>) -> Self {
        Self::new(FileSystemSource::new(root))
    }

    /// Returns the underlying source.
    #[must_use]
    pub fn source(&self) -> &Arc<dyn ManifestSource> {
        &self.source
    }

    fn scope(&self, version: &str) -> Arc<Mutex<VersionCache>> {
        let mut scopes = self.scopes.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(scopes.entry(version.to_string()).or_default())
    }

    /// Returns `true` if a resource manifest exists for the symbolic name.
    ///
    /// Does not parse the document. The reserved base name is never a
    /// resource, and neither is anything but letters, digits and underscores.
    #[must_use]
    pub fn exists(&self, version: &ApiVersion, resource_name: &str) -> bool {
        let name = canonical_name(resource_name);
        if !is_document_name(&name) || name == BASE_MANIFEST {
            return false;
        }

        let scope = self.scope(version.as_str());
        let cached = scope
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .resources
            .contains_key(&name);

        cached || self.source.exists(version.as_str(), &name)
    }

    /// Returns the base manifest of `version`, loading it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError`] if the base document is missing or invalid.
    pub fn load_base(&self, version: &ApiVersion) -> Result<Arc<BaseManifest>, ManifestError> {
        let scope = self.scope(version.as_str());
        let mut cache = scope.lock().unwrap_or_else(PoisonError::into_inner);
        self.base_locked(version.as_str(), &mut cache)
    }

    fn base_locked(
        &self,
        version: &str,
        cache: &mut VersionCache,
    ) -> Result<Arc<BaseManifest>, ManifestError> {
        if let Some(base) = &cache.base {
            return Ok(Arc::clone(base));
        }

        let text = self.source.read(version, BASE_MANIFEST)?;
        let base = Arc::new(BaseManifest::parse(version, BASE_MANIFEST, &text)?);
        tracing::debug!("Loaded base manifest for API version {}", version);

        cache.base = Some(Arc::clone(&base));
        Ok(base)
    }

    /// Returns the merged manifest of a resource, loading it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::NotFound`] if no document exists for the
    /// canonical name, or another [`ManifestError`] if the resource or base
    /// document cannot be read or is invalid. Failed loads are not cached.
    pub fn load(
        &self,
        version: &ApiVersion,
        resource_name: &str,
    ) -> Result<Arc<Manifest>, ManifestError> {
        let version = version.as_str();
        let name = canonical_name(resource_name);
        if !is_document_name(&name) || name == BASE_MANIFEST {
            return Err(ManifestError::NotFound {
                version: version.to_string(),
                name,
            });
        }

        let scope = self.scope(version);
        let mut cache = scope.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(manifest) = cache.resources.get(&name) {
            return Ok(Arc::clone(manifest));
        }

        if !self.source.exists(version, &name) {
            return Err(ManifestError::NotFound {
                version: version.to_string(),
                name,
            });
        }

        let base = self.base_locked(version, &mut cache)?;
        let text = self.source.read(version, &name)?;
        let manifest = Arc::new(Manifest::parse(version, &name, &text, &base)?);
        tracing::debug!(
            "Loaded manifest {} for API version {} ({} operations)",
            name,
            version,
            manifest.operations.len()
        );

        cache.resources.insert(name, Arc::clone(&manifest));
        Ok(manifest)
    }
}

impl Default for ManifestStore {
    fn default() -> Self {
        Self::bundled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::InMemorySource;
    use serde_json::json;

    const VERSION: &str = "2014-07-26";

    fn source() -> InMemorySource {
        InMemorySource::new()
            .with_document(
                VERSION,
                BASE_MANIFEST,
                json!({
                    "name": "Stripe",
                    "baseUrl": "https://api.stripe.com",
                    "errors": {"500": {"kind": "api"}}
                })
                .to_string(),
            )
            .with_document(
                VERSION,
                "InvoiceItems",
                json!({
                    "operations": {
                        "all": {"httpMethod": "GET", "uri": "/v1/invoiceitems"}
                    }
                })
                .to_string(),
            )
    }

    #[test]
    fn test_canonical_name() {
        assert_eq!(canonical_name("charges"), "Charges");
        assert_eq!(canonical_name("invoiceItems"), "InvoiceItems");
        assert_eq!(canonical_name("Charges"), "Charges");
        assert_eq!(canonical_name(""), "");
        assert_eq!(canonical_name("édition"), "Édition");
    }

    #[test]
    fn test_load_normalizes_and_caches() {
        let store = ManifestStore::new(source());
        let version = ApiVersion::default();

        let first = store.load(&version, "invoiceItems").unwrap();
        let second = store.load(&version, "InvoiceItems").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.name, "InvoiceItems");
        assert_eq!(first.errors.len(), 1);
    }

    #[test]
    fn test_base_name_is_not_a_resource() {
        let store = ManifestStore::new(source());
        let version = ApiVersion::default();

        assert!(!store.exists(&version, "manifest"));
        assert!(matches!(
            store.load(&version, "manifest"),
            Err(ManifestError::NotFound { .. })
        ));
        assert!(store.load_base(&version).is_ok());
    }

    #[test]
    fn test_missing_manifest_is_not_found() {
        let store = ManifestStore::new(source());
        let version = ApiVersion::default();

        assert!(!store.exists(&version, "widgets"));
        assert!(matches!(
            store.load(&version, "widgets"),
            Err(ManifestError::NotFound { name, version }) if name == "Widgets" && version == VERSION
        ));
        assert!(!store.exists(&version, ""));
    }

    #[test]
    fn test_versions_are_isolated() {
        let store = ManifestStore::new(source());
        let other: ApiVersion = "2015-10-16".parse().unwrap();

        assert!(store.exists(&ApiVersion::default(), "invoiceItems"));
        assert!(!store.exists(&other, "invoiceItems"));
        assert!(matches!(
            store.load_base(&other),
            Err(ManifestError::NotFound { .. })
        ));
    }

    #[test]
    fn test_bundled_store_loads_every_document() {
        let store = ManifestStore::bundled();
        let version = ApiVersion::default();

        for name in BundledSource::names(VERSION) {
            if name == BASE_MANIFEST {
                continue;
            }
            let manifest = store
                .load(&version, name)
                .unwrap_or_else(|e| panic!("{name} failed to load: {e}"));
            assert!(!manifest.operations.is_empty(), "{name} has no operations");
            assert!(!manifest.errors.is_empty(), "{name} has no errors");
        }
    }
}
