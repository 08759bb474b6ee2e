//! Where manifest documents come from.
//!
//! A [`ManifestSource`] answers "does `<version>/<Name>` exist" and "give me
//! its text". The store layers parsing and caching on top.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::manifest::errors::ManifestError;

/// Storage of raw manifest documents, keyed by version and canonical name.
pub trait ManifestSource: Send + Sync + fmt::Debug {
    /// Returns `true` if a document exists.
    fn exists(&self, version: &str, name: &str) -> bool;

    /// Returns the document text.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::NotFound`] if the document does not exist, or
    /// [`ManifestError::Io`] if it cannot be read.
    fn read(&self, version: &str, name: &str) -> Result<String, ManifestError>;
}

/// Returns `true` if `name` can name a document: ASCII letters, digits and
/// underscores only, so it never leaves its version directory.
pub(crate) fn is_document_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

fn not_found(version: &str, name: &str) -> ManifestError {
    ManifestError::NotFound {
        version: version.to_string(),
        name: name.to_string(),
    }
}

/// Reads documents from `<root>/<version>/<Name>.json`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileSystemSource {
    root: PathBuf,
}

impl FileSystemSource {
    /// Creates a source rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the path a document is expected at.
    #[must_use]
    pub fn path_for(&self, version: &str, name: &str) -> PathBuf {
        self.root.join(version).join(format!("{name}.json"))
    }
}

impl ManifestSource for FileSystemSource {
    fn exists(&self, version: &str, name: &str) -> bool {
        is_document_name(name) && self.path_for(version, name).is_file()
    }

    fn read(&self, version: &str, name: &str) -> Result<String, ManifestError> {
        if !is_document_name(name) {
            return Err(not_found(version, name));
        }
        let path = self.path_for(version, name);
        std::fs::read_to_string(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                not_found(version, name)
            } else {
                ManifestError::Io {
                    name: name.to_string(),
                    path,
                    source,
                }
            }
        })
    }
}

macro_rules! bundled {
    ($version:literal: $($name:literal),+ $(,)?) => {
        &[$(($version, $name, include_str!(concat!("../../manifests/", $version, "/", $name, ".json")))),+]
    };
}

/// Documents compiled into the crate, under `(version, name, text)`.
const BUNDLED: &[(&str, &str, &str)] = bundled!("2014-07-26":
    "Manifest",
    "Account",
    "Balance",
    "Cards",
    "Charges",
    "Coupons",
    "Customers",
    "Events",
    "InvoiceItems",
    "Invoices",
    "Plans",
    "Refunds",
    "Subscriptions",
    "Tokens",
);

/// The manifests shipped with the crate.
///
/// This is the default source: it needs no files at run time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BundledSource;

impl BundledSource {
    /// Returns the versions that have bundled documents.
    #[must_use]
    pub fn versions() -> Vec<&'static str> {
        let mut versions: Vec<&str> = BUNDLED.iter().map(|(version, _, _)| *version).collect();
        versions.dedup();
        versions
    }

    /// Returns the bundled document names of `version`.
    #[must_use]
    pub fn names(version: &str) -> Vec<&'static str> {
        BUNDLED
            .iter()
            .filter(|(v, _, _)| *v == version)
            .map(|(_, name, _)| *name)
            .collect()
    }

    fn find(version: &str, name: &str) -> Option<&'static str> {
        BUNDLED
            .iter()
            .find(|(v, n, _)| *v == version && *n == name)
            .map(|(_, _, text)| *text)
    }
}

impl ManifestSource for BundledSource {
    fn exists(&self, version: &str, name: &str) -> bool {
        Self::find(version, name).is_some()
    }

    fn read(&self, version: &str, name: &str) -> Result<String, ManifestError> {
        Self::find(version, name)
            .map(String::from)
            .ok_or_else(|| not_found(version, name))
    }
}

/// Documents held in memory, for tests and custom APIs.
///
/// # Example
///
/// ```rust
/// use stripe_api::manifest::{InMemorySource, ManifestSource};
///
/// let source = InMemorySource::new()
///     .with_document("2014-07-26", "Widgets", r#"{"operations": {}}"#);
/// assert!(source.exists("2014-07-26", "Widgets"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemorySource {
    documents: HashMap<(String, String), String>,
}

impl InMemorySource {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a document.
    pub fn insert(&mut self, version: impl Into<String>, name: impl Into<String>, text: impl Into<String>) {
        self.documents
            .insert((version.into(), name.into()), text.into());
    }

    /// Adds a document, builder style.
    #[must_use]
    pub fn with_document(
        mut self,
        version: impl Into<String>,
        name: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        self.insert(version, name, text);
        self
    }
}

impl ManifestSource for InMemorySource {
    fn exists(&self, version: &str, name: &str) -> bool {
        self.documents
            .contains_key(&(version.to_string(), name.to_string()))
    }

    fn read(&self, version: &str, name: &str) -> Result<String, ManifestError> {
        self.documents
            .get(&(version.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| not_found(version, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_source_has_default_version() {
        assert_eq!(BundledSource::versions(), vec!["2014-07-26"]);
        let names = BundledSource::names("2014-07-26");
        assert!(names.contains(&"Manifest"));
        assert!(names.contains(&"Charges"));
        assert!(names.contains(&"InvoiceItems"));
    }

    #[test]
    fn test_bundled_source_lookup() {
        let source = BundledSource;
        assert!(source.exists("2014-07-26", "Charges"));
        assert!(!source.exists("2014-07-26", "Widgets"));
        assert!(!source.exists("2020-01-01", "Charges"));
        assert!(source.read("2014-07-26", "Charges").unwrap().contains("operations"));
        assert!(matches!(
            source.read("2014-07-26", "Widgets"),
            Err(ManifestError::NotFound { .. })
        ));
    }

    #[test]
    fn test_file_system_source_layout() {
        let source = FileSystemSource::new("/srv/manifests");
        assert_eq!(
            source.path_for("2014-07-26", "Charges"),
            PathBuf::from("/srv/manifests/2014-07-26/Charges.json")
        );
    }

    #[test]
    fn test_file_system_source_reads_documents() {
        let root = std::env::temp_dir().join(format!("stripe-api-source-{}", std::process::id()));
        std::fs::create_dir_all(root.join("2014-07-26")).unwrap();
        std::fs::write(root.join("2014-07-26/Widgets.json"), r#"{"operations": {}}"#).unwrap();

        let source = FileSystemSource::new(&root);
        assert!(source.exists("2014-07-26", "Widgets"));
        assert!(!source.exists("2014-07-26", "Gadgets"));
        assert_eq!(
            source.read("2014-07-26", "Widgets").unwrap(),
            r#"{"operations": {}}"#
        );
        assert!(matches!(
            source.read("2014-07-26", "Gadgets"),
            Err(ManifestError::NotFound { name, .. }) if name == "Gadgets"
        ));

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_document_names_are_identifiers() {
        assert!(is_document_name("Charges"));
        assert!(is_document_name("InvoiceItems"));
        assert!(is_document_name("Balance_2"));
        assert!(!is_document_name(""));
        assert!(!is_document_name("../Charges"));
        assert!(!is_document_name("Charges.json"));
        assert!(!is_document_name("a/b"));
        assert!(!is_document_name("Chärges"));
    }

    #[test]
    fn test_in_memory_source() {
        let mut source = InMemorySource::new();
        source.insert("2014-07-26", "Widgets", "{}");

        assert!(source.exists("2014-07-26", "Widgets"));
        assert!(!source.exists("2014-07-26", "widgets"));
        assert_eq!(source.read("2014-07-26", "Widgets").unwrap(), "{}");
    }
}
