//! Status-code to error-kind mapping declared by manifests.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

/// Semantic classification of a failed API call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The request had invalid parameters.
    InvalidRequest,
    /// The API key was missing or invalid.
    Authentication,
    /// The card could not be charged.
    Card,
    /// The requested object does not exist.
    NotFound,
    /// Too many requests hit the API too quickly.
    RateLimit,
    /// Something went wrong on Stripe's end.
    Api,
    /// Anything else.
    Unknown,
}

impl ErrorKind {
    /// Derives a kind from the HTTP status alone.
    #[must_use]
    pub const fn from_status(status: u16) -> Self {
        match status {
            400 => Self::InvalidRequest,
            401 | 403 => Self::Authentication,
            402 => Self::Card,
            404 => Self::NotFound,
            429 => Self::RateLimit,
            500..=599 => Self::Api,
            _ => Self::Unknown,
        }
    }

    /// Maps Stripe's `error.type` to a kind.
    #[must_use]
    pub fn from_stripe_type(error_type: &str) -> Option<Self> {
        match error_type {
            "invalid_request_error" => Some(Self::InvalidRequest),
            "authentication_error" => Some(Self::Authentication),
            "card_error" => Some(Self::Card),
            "rate_limit_error" => Some(Self::RateLimit),
            "api_error" | "api_connection_error" => Some(Self::Api),
            _ => None,
        }
    }

    /// Returns the manifest spelling of this kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::Authentication => "authentication",
            Self::Card => "card",
            Self::NotFound => "not_found",
            Self::RateLimit => "rate_limit",
            Self::Api => "api",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_template() -> String {
    "{message}".to_string()
}

/// How one HTTP status is reported.
///
/// The message template may reference `{message}` (the API's own message)
/// and `{status}`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ErrorSpec {
    /// Semantic classification.
    pub kind: ErrorKind,
    /// Message template.
    #[serde(default = "default_template")]
    pub message: String,
}

impl ErrorSpec {
    /// Creates an error spec.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Renders the message template.
    #[must_use]
    pub fn render(&self, api_message: &str, status: u16) -> String {
        self.message
            .replace("{status}", &status.to_string())
            .replace("{message}", api_message)
    }
}

/// Error specs keyed by HTTP status code.
///
/// In manifest documents this is an object whose keys are status codes:
///
/// ```json
/// { "404": { "kind": "not_found", "message": "{message}" } }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ErrorTable {
    entries: BTreeMap<u16, ErrorSpec>,
}

impl ErrorTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the spec for a status code.
    pub fn insert(&mut self, status: u16, spec: ErrorSpec) {
        self.entries.insert(status, spec);
    }

    /// Returns the spec for a status code.
    #[must_use]
    pub fn get(&self, status: u16) -> Option<&ErrorSpec> {
        self.entries.get(&status)
    }

    /// Copies in every entry of `base` whose status is not present yet.
    ///
    /// Existing entries always win, and each status appears at most once, so
    /// merging the same base again leaves the table unchanged.
    pub fn merge_missing(&mut self, base: &Self) {
        for (status, spec) in &base.entries {
            self.entries
                .entry(*status)
                .or_insert_with(|| spec.clone());
        }
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in ascending status order.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &ErrorSpec)> {
        self.entries.iter().map(|(status, spec)| (*status, spec))
    }
}
