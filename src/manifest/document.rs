//! Manifest document model and parsing.
//!
//! Documents are JSON. The base document (`Manifest.json`) carries service
//! metadata and the common error table; each resource document carries its
//! operations plus optional error, pagination and service overrides.
//!
//! ```json
//! {
//!   "operations": {
//!     "retrieve": {
//!       "httpMethod": "GET",
//!       "uri": "/v1/charges/{id}",
//!       "parameters": [{ "name": "id", "type": "string", "required": true }],
//!       "response": { "object": "charge" }
//!     }
//!   }
//! }
//! ```

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::clients::{DataType, HttpMethod};
use crate::manifest::error_table::ErrorTable;
use crate::manifest::errors::ManifestError;

/// JSON type a parameter value must have.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    /// A JSON string.
    String,
    /// A JSON integer.
    Integer,
    /// Any JSON number.
    Number,
    /// A JSON boolean.
    Boolean,
    /// A JSON object (sent with bracket notation).
    Object,
    /// A JSON array (sent with indexed bracket notation).
    Array,
    /// No type constraint.
    Any,
}

impl ParameterType {
    /// Returns `true` if `value` has this type.
    #[must_use]
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
            Self::Any => true,
        }
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
            Self::Any => "any",
        };
        f.write_str(name)
    }
}

/// Where a parameter travels in the request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    /// Substituted into the URI template.
    Path,
    /// Sent in the query string.
    Query,
    /// Sent in the request body.
    Body,
}

/// A declared operation parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParameterSpec {
    /// Parameter name.
    pub name: String,
    /// Expected JSON type.
    pub param_type: ParameterType,
    /// Whether the caller must supply it.
    pub required: bool,
    /// Where it is sent.
    pub location: ParameterLocation,
    /// Optional human description.
    pub description: Option<String>,
}

/// What an operation returns.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResponseShape {
    /// Stripe `object` tag of the result (`charge`, `list`, ...).
    pub object: Option<String>,
    /// Key holding the items of a list response.
    pub items_key: Option<String>,
}

/// A single operation of a resource.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperationSpec {
    /// Operation name (`create`, `retrieve`, `all`, ...).
    pub name: String,
    /// HTTP method.
    pub http_method: HttpMethod,
    /// Path template relative to the service base URL.
    pub uri: String,
    /// Declared parameters, in declaration order.
    pub parameters: Vec<ParameterSpec>,
    /// Response description.
    pub response: ResponseShape,
    /// One-line summary.
    pub summary: String,
}

impl OperationSpec {
    /// Looks up a declared parameter by name.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

/// How the next page cursor is derived from a list response.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CursorSource {
    /// The named field of the last item on the page (Stripe's `id`).
    LastItemField(String),
    /// A top-level field of the response holding an opaque cursor.
    ResponseField(String),
}

/// Pagination conventions of a resource's list operation.
///
/// Defaults follow Stripe: items under `data`, a `has_more` flag, and the
/// last item's `id` sent back as `starting_after` with the page size in
/// `limit`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaginationPolicy {
    /// Key holding the page's items.
    pub items_key: String,
    /// Key holding the has-more flag.
    pub has_more_key: String,
    /// Request parameter carrying the cursor.
    pub cursor_param: String,
    /// Request parameter carrying the page size.
    pub page_size_param: String,
    /// Where the next cursor comes from.
    pub cursor: CursorSource,
}

impl Default for PaginationPolicy {
    fn default() -> Self {
        Self {
            items_key: "data".to_string(),
            has_more_key: "has_more".to_string(),
            cursor_param: "starting_after".to_string(),
            page_size_param: "limit".to_string(),
            cursor: CursorSource::LastItemField("id".to_string()),
        }
    }
}

/// Service-wide metadata from the base document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceMetadata {
    /// Service name.
    pub name: String,
    /// Base URL operation URIs are appended to.
    pub base_url: String,
    /// Human description.
    pub description: String,
    /// How request bodies are encoded.
    pub request_encoding: DataType,
}

/// The parsed base document of one API version.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BaseManifest {
    /// API version the document belongs to.
    pub version: String,
    /// Service metadata.
    pub service: ServiceMetadata,
    /// Errors shared by every resource.
    pub errors: ErrorTable,
}

/// A resource manifest merged with its base document.
///
/// Immutable once built; the store hands out shared `Arc<Manifest>`s.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Manifest {
    /// Canonical resource name (`Charges`).
    pub name: String,
    /// API version.
    pub version: String,
    /// Service metadata after resource overrides.
    pub service: ServiceMetadata,
    /// Operations by name.
    pub operations: BTreeMap<String, OperationSpec>,
    /// Resource errors with the base errors merged in.
    pub errors: Arc<ErrorTable>,
    /// Pagination conventions.
    pub pagination: PaginationPolicy,
}

impl Manifest {
    /// Looks up an operation by name.
    #[must_use]
    pub fn operation(&self, name: &str) -> Option<&OperationSpec> {
        self.operations.get(name)
    }

    /// Returns operation names in sorted order.
    pub fn operation_names(&self) -> impl Iterator<Item = &str> {
        self.operations.keys().map(String::as_str)
    }
}

/// Returns the `{placeholder}` names of a URI template, in order.
///
/// # Example
///
/// ```rust
/// use stripe_api::manifest::placeholders;
///
/// assert_eq!(
///     placeholders("/v1/customers/{customer}/cards/{id}"),
///     vec!["customer", "id"]
/// );
/// ```
#[must_use]
pub fn placeholders(uri: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut rest = uri;
    while let Some(start) = rest.find('{') {
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else { break };
        let name = &after[..end];
        if !name.is_empty() {
            names.push(name);
        }
        rest = &after[end + 1..];
    }
    names
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBase {
    name: String,
    base_url: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    request_encoding: DataType,
    #[serde(default)]
    errors: ErrorTable,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawResource {
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    request_encoding: Option<DataType>,
    #[serde(default)]
    errors: ErrorTable,
    #[serde(default)]
    pagination: PaginationPolicy,
    operations: BTreeMap<String, RawOperation>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOperation {
    http_method: HttpMethod,
    uri: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    parameters: Vec<RawParameter>,
    #[serde(default)]
    response: ResponseShape,
}

#[derive(Deserialize)]
struct RawParameter {
    name: String,
    #[serde(rename = "type", default = "any_type")]
    param_type: ParameterType,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    location: Option<ParameterLocation>,
    #[serde(default)]
    description: Option<String>,
}

const fn any_type() -> ParameterType {
    ParameterType::Any
}

impl BaseManifest {
    /// Parses the base document of `version`.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Malformed`] if the text is not a valid base
    /// document.
    pub fn parse(version: &str, name: &str, text: &str) -> Result<Self, ManifestError> {
        let raw: RawBase = serde_json::from_str(text).map_err(|e| ManifestError::Malformed {
            version: version.to_string(),
            name: name.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            version: version.to_string(),
            service: ServiceMetadata {
                name: raw.name,
                base_url: raw.base_url.trim_end_matches('/').to_string(),
                description: raw.description,
                request_encoding: raw.request_encoding,
            },
            errors: raw.errors,
        })
    }
}

impl Manifest {
    /// Parses a resource document and merges it with its base document.
    ///
    /// Resource service keys win over the base; base errors fill in the
    /// status codes the resource does not declare.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Malformed`] for invalid JSON or shape,
    /// [`ManifestError::DuplicateParameter`] and
    /// [`ManifestError::UndeclaredPathParameter`] for invalid operations.
    pub fn parse(
        version: &str,
        name: &str,
        text: &str,
        base: &BaseManifest,
    ) -> Result<Self, ManifestError> {
        let malformed = |reason: String| ManifestError::Malformed {
            version: version.to_string(),
            name: name.to_string(),
            reason,
        };

        let raw: RawResource = serde_json::from_str(text).map_err(|e| malformed(e.to_string()))?;

        let mut operations = BTreeMap::new();
        for (op_name, raw_op) in raw.operations {
            let spec = build_operation(name, &op_name, raw_op).map_err(|e| match e {
                OperationProblem::Manifest(e) => e,
                OperationProblem::Malformed(reason) => malformed(reason),
            })?;
            operations.insert(op_name, spec);
        }

        let mut errors = raw.errors;
        errors.merge_missing(&base.errors);

        let service = ServiceMetadata {
            name: base.service.name.clone(),
            base_url: raw.base_url.map_or_else(
                || base.service.base_url.clone(),
                |url| url.trim_end_matches('/').to_string(),
            ),
            description: raw
                .description
                .unwrap_or_else(|| base.service.description.clone()),
            request_encoding: raw
                .request_encoding
                .unwrap_or(base.service.request_encoding),
        };

        Ok(Self {
            name: name.to_string(),
            version: version.to_string(),
            service,
            operations,
            errors: Arc::new(errors),
            pagination: raw.pagination,
        })
    }
}

enum OperationProblem {
    Manifest(ManifestError),
    Malformed(String),
}

fn build_operation(
    resource: &str,
    operation: &str,
    raw: RawOperation,
) -> Result<OperationSpec, OperationProblem> {
    let template_names: Vec<&str> = placeholders(&raw.uri);

    let mut seen = HashSet::new();
    let mut parameters = Vec::with_capacity(raw.parameters.len());
    for param in raw.parameters {
        if !seen.insert(param.name.clone()) {
            return Err(OperationProblem::Manifest(
                ManifestError::DuplicateParameter {
                    resource: resource.to_string(),
                    operation: operation.to_string(),
                    parameter: param.name,
                },
            ));
        }

        let in_template = template_names.contains(&param.name.as_str());
        let location = match param.location {
            Some(location) => location,
            None if in_template => ParameterLocation::Path,
            None if raw.http_method.sends_body() => ParameterLocation::Body,
            None => ParameterLocation::Query,
        };

        if location == ParameterLocation::Path && !in_template {
            return Err(OperationProblem::Malformed(format!(
                "operation '{operation}' declares path parameter '{}' not present in '{}'",
                param.name, raw.uri
            )));
        }

        parameters.push(ParameterSpec {
            name: param.name,
            param_type: param.param_type,
            required: param.required || location == ParameterLocation::Path,
            location,
            description: param.description,
        });
    }

    if let Some(missing) = template_names.iter().find(|placeholder| {
        !parameters
            .iter()
            .any(|p| p.name == **placeholder && p.location == ParameterLocation::Path)
    }) {
        return Err(OperationProblem::Manifest(
            ManifestError::UndeclaredPathParameter {
                resource: resource.to_string(),
                operation: operation.to_string(),
                parameter: (*missing).to_string(),
            },
        ));
    }

    Ok(OperationSpec {
        name: operation.to_string(),
        http_method: raw.http_method,
        uri: raw.uri,
        parameters,
        response: raw.response,
        summary: raw.summary,
    })
}
