//! Lazy cursor pagination over a resource's list operation.
//!
//! A [`ResourceIterator`] issues no request until it is first advanced, then
//! fetches one page per round trip and yields its items one at a time. The
//! original call parameters are sent unchanged on every page; only the
//! cursor and page size parameters are overwritten.
//!
//! # Example
//!
//! ```rust,ignore
//! use stripe_api::{StripeClient, IteratorOptions};
//! use serde_json::json;
//!
//! let client = StripeClient::new("sk_test_123")?;
//! let mut charges = client.iterator(
//!     "charges",
//!     json!({"customer": "cus_123"}),
//!     IteratorOptions::default().with_limit(50),
//! )?;
//!
//! while let Some(charge) = charges.next().await {
//!     println!("{}", charge?["id"]);
//! }
//! ```

use std::collections::VecDeque;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::clients::{HttpClient, Transport};
use crate::error::ClientError;
use crate::factory::Command;
use crate::manifest::{CursorSource, PaginationPolicy};

/// Largest page Stripe serves.
pub const MAX_PAGE_SIZE: u64 = 100;

/// How an iteration is driven.
///
/// Deserializes from the second call argument of an iterator call, e.g.
/// `{"limit": 50, "page_size": 10}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IteratorOptions {
    /// Maximum number of items to yield in total.
    pub limit: Option<usize>,
    /// Items requested per page.
    #[serde(alias = "pageSize")]
    pub page_size: Option<u64>,
    /// Cursor to start after.
    #[serde(alias = "startingAfter")]
    pub starting_after: Option<String>,
}

impl IteratorOptions {
    /// Reads options from a call argument.
    ///
    /// `null` means defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidArguments`] if the value is not an
    /// options object.
    pub fn from_value(value: &Value) -> Result<Self, ClientError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        Self::deserialize(value).map_err(|e| ClientError::InvalidArguments {
            reason: format!("invalid iterator options: {e}"),
        })
    }

    /// Sets the maximum number of items.
    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the page size.
    #[must_use]
    pub const fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Sets the starting cursor.
    #[must_use]
    pub fn with_starting_after(mut self, cursor: impl Into<String>) -> Self {
        self.starting_after = Some(cursor.into());
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum IteratorState {
    Initial,
    Yielding,
    Done,
}

/// A lazy, forward-only sequence of list items.
///
/// Once done it yields `None` forever without fetching; to start over,
/// build a new iterator.
pub struct ResourceIterator<T: Transport = HttpClient> {
    command: Command<T>,
    options: IteratorOptions,
    policy: PaginationPolicy,
    state: IteratorState,
    cursor: Option<String>,
    has_more: bool,
    buffer: VecDeque<Value>,
    yielded: usize,
    requests: usize,
}

impl<T: Transport> std::fmt::Debug for ResourceIterator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceIterator")
            .field("command", &self.command)
            .field("options", &self.options)
            .field("state", &self.state)
            .field("cursor", &self.cursor)
            .field("buffered", &self.buffer.len())
            .field("yielded", &self.yielded)
            .field("requests", &self.requests)
            .finish()
    }
}

impl<T: Transport> ResourceIterator<T> {
    /// Creates an iterator over `command`, typically the `all` command of
    /// an executor.
    #[must_use]
    pub fn new(command: Command<T>, options: IteratorOptions) -> Self {
        let policy = command.executor().manifest().pagination.clone();
        let cursor = options.starting_after.clone();
        Self {
            command,
            options,
            policy,
            state: IteratorState::Initial,
            cursor,
            has_more: false,
            buffer: VecDeque::new(),
            yielded: 0,
            requests: 0,
        }
    }

    /// Returns the number of items yielded so far.
    #[must_use]
    pub const fn yielded_count(&self) -> usize {
        self.yielded
    }

    /// Returns the number of pages requested so far.
    #[must_use]
    pub const fn request_count(&self) -> usize {
        self.requests
    }

    /// Returns `true` once the iterator will yield nothing more.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.state == IteratorState::Done
    }

    /// Returns the options the iterator was built with.
    #[must_use]
    pub const fn options(&self) -> &IteratorOptions {
        &self.options
    }

    /// Advances to the next item, fetching a page when needed.
    ///
    /// A failed fetch is returned once, after every item of earlier pages;
    /// the iterator is done afterwards.
    pub async fn next(&mut self) -> Option<Result<Value, ClientError>> {
        loop {
            if self.state == IteratorState::Done {
                return None;
            }

            if self.remaining() == Some(0) {
                self.finish();
                return None;
            }

            if let Some(item) = self.buffer.pop_front() {
                self.yielded += 1;
                return Some(Ok(item));
            }

            if self.state == IteratorState::Yielding && !(self.has_more && self.cursor.is_some()) {
                self.finish();
                return None;
            }

            if let Err(error) = self.fetch_page().await {
                self.finish();
                return Some(Err(error));
            }
        }
    }

    /// Drains the iterator into a vector.
    ///
    /// # Errors
    ///
    /// Returns the first fetch error. Use [`collect_into`](Self::collect_into)
    /// to keep the items that arrived before it.
    pub async fn collect_all(&mut self) -> Result<Vec<Value>, ClientError> {
        let mut items = Vec::new();
        self.collect_into(&mut items).await?;
        Ok(items)
    }

    /// Drains the iterator, appending every item to `items`, and returns how
    /// many were appended.
    ///
    /// # Errors
    ///
    /// Returns the first fetch error. Items yielded before the failure stay
    /// in `items`.
    pub async fn collect_into(&mut self, items: &mut Vec<Value>) -> Result<usize, ClientError> {
        let before = items.len();
        while let Some(item) = self.next().await {
            items.push(item?);
        }
        Ok(items.len() - before)
    }

    fn finish(&mut self) {
        self.state = IteratorState::Done;
        self.buffer.clear();
    }

    fn remaining(&self) -> Option<usize> {
        self.options
            .limit
            .map(|limit| limit.saturating_sub(self.yielded))
    }

    fn page_size(&self) -> Option<u64> {
        let requested = self.options.page_size.or_else(|| {
            self.command
                .params()
                .get(&self.policy.page_size_param)
                .and_then(Value::as_u64)
        });
        let remaining = self
            .remaining()
            .map(|r| u64::try_from(r).unwrap_or(u64::MAX));

        match (requested, remaining) {
            (Some(size), Some(remaining)) => Some(size.min(remaining)),
            (Some(size), None) => Some(size),
            (None, Some(remaining)) => Some(remaining.min(MAX_PAGE_SIZE)),
            (None, None) => None,
        }
    }

    async fn fetch_page(&mut self) -> Result<(), ClientError> {
        let mut overrides = Map::new();
        if let Some(size) = self.page_size() {
            overrides.insert(self.policy.page_size_param.clone(), Value::from(size));
        }
        if let Some(cursor) = &self.cursor {
            overrides.insert(self.policy.cursor_param.clone(), Value::from(cursor.clone()));
        }

        self.requests += 1;
        tracing::debug!(
            "Fetching page {} of {}.{} (cursor: {:?})",
            self.requests,
            self.command.executor().resource(),
            self.command.operation(),
            self.cursor
        );

        let page = self.command.execute_with(overrides).await?;

        let items = page
            .get(&self.policy.items_key)
            .and_then(Value::as_array)
            .ok_or_else(|| ClientError::UnexpectedResponse {
                operation: self.command.operation().to_string(),
                reason: format!("missing '{}' array in list response", self.policy.items_key),
            })?;

        let has_more = page
            .get(&self.policy.has_more_key)
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let cursor = match &self.policy.cursor {
            CursorSource::LastItemField(field) => items.last().and_then(|item| item.get(field)),
            CursorSource::ResponseField(field) => page.get(field),
        }
        .and_then(|value| match value {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        });

        self.has_more = has_more && !items.is_empty();
        self.cursor = cursor;
        self.buffer = items.iter().cloned().collect();
        self.state = IteratorState::Yielding;
        Ok(())
    }
}
