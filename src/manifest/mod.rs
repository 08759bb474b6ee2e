//! Manifest documents describing the Stripe REST resources.
//!
//! A manifest declares, per API version, the operations of one resource:
//! HTTP method, URI template, parameters, response shape, error mapping and
//! pagination conventions. The client is driven entirely by these
//! documents, so supporting a new resource is a matter of adding one.
//!
//! # Overview
//!
//! - [`ManifestStore`]: Loads and memoizes merged manifests
//! - [`ManifestSource`]: Where documents come from ([`BundledSource`],
//!   [`FileSystemSource`], [`InMemorySource`])
//! - [`Manifest`]: A resource manifest merged with its version's base document
//! - [`ErrorTable`]: Status code to [`ErrorKind`] mapping

mod document;
mod error_table;
mod errors;
mod source;
mod store;

pub use document::{
    placeholders, BaseManifest, CursorSource, Manifest, OperationSpec, PaginationPolicy,
    ParameterLocation, ParameterSpec, ParameterType, ResponseShape, ServiceMetadata,
};
pub use error_table::{ErrorKind, ErrorSpec, ErrorTable};
pub use errors::ManifestError;
pub use source::{BundledSource, FileSystemSource, InMemorySource, ManifestSource};
pub use store::{canonical_name, ManifestStore, BASE_MANIFEST};
