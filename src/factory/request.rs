//! Turning an operation spec plus call parameters into an [`HttpRequest`].
//!
//! Declared parameters are checked for presence and JSON type, path
//! parameters are interpolated into the URI template, and everything else is
//! routed to the query string or the body.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::clients::{flatten_params, DataType, HttpError, HttpRequest};
use crate::error::ClientError;
use crate::manifest::{ErrorTable, OperationSpec, ParameterLocation};

/// Everything a request needs besides the operation and its parameters.
#[derive(Debug)]
pub(crate) struct RequestContext<'a> {
    pub base_url: &'a str,
    pub headers: &'a HashMap<String, String>,
    pub encoding: DataType,
    pub tries: u32,
    pub errors: &'a Arc<ErrorTable>,
}

/// Interpolates `{name}` placeholders with URL-encoded values.
///
/// # Example
///
/// ```rust,ignore
/// let mut ids = HashMap::new();
/// ids.insert("customer", "cus 1".to_string());
/// ids.insert("id", "card_1".to_string());
///
/// let path = build_path("/v1/customers/{customer}/cards/{id}", &ids);
/// assert_eq!(path, "/v1/customers/cus%201/cards/card_1");
/// ```
pub(crate) fn build_path(template: &str, ids: &HashMap<&str, String>) -> String {
    let mut result = template.to_string();

    for (key, value) in ids {
        let placeholder = format!("{{{key}}}");
        result = result.replace(&placeholder, &urlencoding::encode(value));
    }

    result
}

fn path_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Builds the request for one invocation of `spec`.
///
/// `null` values count as absent. Undeclared parameters travel in the body
/// for POST/PUT and in the query string otherwise.
pub(crate) fn build_request(
    spec: &OperationSpec,
    params: &Map<String, Value>,
    context: &RequestContext<'_>,
) -> Result<HttpRequest, ClientError> {
    let supplied = |name: &str| params.get(name).filter(|value| !value.is_null());

    for param in &spec.parameters {
        match supplied(&param.name) {
            None if param.required => {
                return Err(ClientError::MissingParameter {
                    operation: spec.name.clone(),
                    parameter: param.name.clone(),
                });
            }
            Some(value) if !param.param_type.matches(value) => {
                return Err(ClientError::InvalidParameter {
                    operation: spec.name.clone(),
                    parameter: param.name.clone(),
                    expected: param.param_type,
                });
            }
            _ => {}
        }
    }

    let mut ids = HashMap::new();
    let mut query = Map::new();
    let mut body = Map::new();

    for (name, value) in params {
        if value.is_null() {
            continue;
        }
        let location = spec.parameter(name).map_or_else(
            || {
                if spec.http_method.sends_body() {
                    ParameterLocation::Body
                } else {
                    ParameterLocation::Query
                }
            },
            |param| param.location,
        );
        match location {
            ParameterLocation::Path => {
                ids.insert(name.as_str(), path_value(value));
            }
            ParameterLocation::Query => {
                query.insert(name.clone(), value.clone());
            }
            ParameterLocation::Body => {
                body.insert(name.clone(), value.clone());
            }
        }
    }

    let path = build_path(&spec.uri, &ids);
    let separator = if path.starts_with('/') { "" } else { "/" };
    let url = format!("{}{separator}{path}", context.base_url);

    let mut builder = HttpRequest::builder(spec.http_method, url)
        .headers(context.headers.clone())
        .query(flatten_params(&Value::Object(query)))
        .tries(context.tries)
        .errors(Arc::clone(context.errors));

    if !body.is_empty() {
        builder = builder.body(Value::Object(body)).body_type(context.encoding);
    }

    Ok(builder.build().map_err(HttpError::from)?)
}
