//! Classification of symbolic names into direct and iterator calls.
//!
//! A symbolic name is either a resource (`charges`) or a resource followed
//! by the literal suffix `Iterator` (`chargesIterator`), which asks for a
//! lazy iterator over that resource's list operation.

use crate::config::ApiVersion;
use crate::error::ClientError;
use crate::manifest::ManifestStore;

/// Suffix marking an iterator request.
pub const ITERATOR_SUFFIX: &str = "Iterator";

/// Operation iterated by iterator requests.
pub const LIST_OPERATION: &str = "all";

/// The outcome of resolving a symbolic name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolvedOperation {
    /// A resource executor was requested.
    Direct {
        /// Resource name as written by the caller.
        name: String,
    },
    /// An iterator over the resource's list operation was requested.
    Iterator {
        /// Resource name with the suffix removed.
        name: String,
        /// The operation to iterate.
        list_operation: &'static str,
    },
}

impl ResolvedOperation {
    /// Classifies a name without checking any manifest.
    ///
    /// Only a trailing `Iterator` with a non-empty stem counts: `Iterator`
    /// alone and names containing it elsewhere are direct.
    ///
    /// # Example
    ///
    /// ```rust
    /// use stripe_api::ResolvedOperation;
    ///
    /// assert_eq!(
    ///     ResolvedOperation::classify("chargesIterator"),
    ///     ResolvedOperation::Iterator { name: "charges".to_string(), list_operation: "all" }
    /// );
    /// assert_eq!(
    ///     ResolvedOperation::classify("charges"),
    ///     ResolvedOperation::Direct { name: "charges".to_string() }
    /// );
    /// ```
    #[must_use]
    pub fn classify(symbolic_name: &str) -> Self {
        match symbolic_name.strip_suffix(ITERATOR_SUFFIX) {
            Some(stem) if !stem.is_empty() => Self::Iterator {
                name: stem.to_string(),
                list_operation: LIST_OPERATION,
            },
            _ => Self::Direct {
                name: symbolic_name.to_string(),
            },
        }
    }

    /// Returns the resource name whose manifest backs this operation.
    #[must_use]
    pub fn resource(&self) -> &str {
        match self {
            Self::Direct { name } | Self::Iterator { name, .. } => name,
        }
    }

    /// Returns `true` for iterator resolutions.
    #[must_use]
    pub const fn is_iterator(&self) -> bool {
        matches!(self, Self::Iterator { .. })
    }
}

/// Resolves symbolic names against the manifests of one API version.
#[derive(Debug)]
pub struct OperationResolver<'a> {
    store: &'a ManifestStore,
    version: &'a ApiVersion,
}

impl<'a> OperationResolver<'a> {
    /// Creates a resolver over `store` for `version`.
    #[must_use]
    pub const fn new(store: &'a ManifestStore, version: &'a ApiVersion) -> Self {
        Self { store, version }
    }

    /// Classifies `symbolic_name` and checks that its manifest exists.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::UndefinedOperation`] carrying the name exactly
    /// as requested (suffix included) when no manifest exists.
    pub fn resolve(&self, symbolic_name: &str) -> Result<ResolvedOperation, ClientError> {
        let resolved = ResolvedOperation::classify(symbolic_name);

        if !self.store.exists(self.version, resolved.resource()) {
            return Err(ClientError::UndefinedOperation {
                name: symbolic_name.to_string(),
            });
        }

        Ok(resolved)
    }
}
