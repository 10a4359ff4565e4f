//! Page parsers
//!
//! Response shapes are endpoint-specific, so the fetcher only asks a
//! `PageParser` to turn body bytes into items plus pagination signals.

use super::types::{Page, PageMeta};
use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::marker::PhantomData;

/// Turns a response body into a `Page`
pub trait PageParser<T>: Send + Sync {
    /// Parse one response body
    fn parse(&self, body: &[u8]) -> Result<Page<T>>;
}

impl<T, F> PageParser<T> for F
where
    F: Fn(&[u8]) -> Result<Page<T>> + Send + Sync,
{
    fn parse(&self, body: &[u8]) -> Result<Page<T>> {
        self(body)
    }
}

/// JSON parser reading items and pagination signals from dotted paths
///
/// Missing or null item arrays yield an empty page. Signals that are absent
/// or of the wrong type (e.g. a string `total`) are treated as not sent.
pub struct JsonPageParser<T> {
    items_path: String,
    is_last_path: Option<String>,
    total_path: Option<String>,
    start_at_path: Option<String>,
    max_results_path: Option<String>,
    next_link_path: Option<String>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> JsonPageParser<T> {
    /// Parser reading only items (use `""` for a top-level array)
    pub fn new(items_path: impl Into<String>) -> Self {
        Self {
            items_path: items_path.into(),
            is_last_path: None,
            total_path: None,
            start_at_path: None,
            max_results_path: None,
            next_link_path: None,
            _marker: PhantomData,
        }
    }

    /// Parser for offset listings (`isLast`, `total`, `startAt`, `maxResults`)
    pub fn offset(items_path: impl Into<String>) -> Self {
        Self::new(items_path)
            .is_last_path("isLast")
            .total_path("total")
            .start_at_path("startAt")
            .max_results_path("maxResults")
    }

    /// Parser for cursor listings (`links.next`)
    pub fn cursor(items_path: impl Into<String>) -> Self {
        Self::new(items_path).next_link_path("links.next")
    }

    /// Set the is-last flag path
    #[must_use]
    pub fn is_last_path(mut self, path: impl Into<String>) -> Self {
        self.is_last_path = Some(path.into());
        self
    }

    /// Set the total count path
    #[must_use]
    pub fn total_path(mut self, path: impl Into<String>) -> Self {
        self.total_path = Some(path.into());
        self
    }

    /// Set the echoed offset path
    #[must_use]
    pub fn start_at_path(mut self, path: impl Into<String>) -> Self {
        self.start_at_path = Some(path.into());
        self
    }

    /// Set the echoed page size path
    #[must_use]
    pub fn max_results_path(mut self, path: impl Into<String>) -> Self {
        self.max_results_path = Some(path.into());
        self
    }

    /// Set the next link path
    #[must_use]
    pub fn next_link_path(mut self, path: impl Into<String>) -> Self {
        self.next_link_path = Some(path.into());
        self
    }

    fn lookup<'v>(value: &'v Value, path: Option<&String>) -> Option<&'v Value> {
        extract_path(value, path?)
    }
}

impl<T: DeserializeOwned> PageParser<T> for JsonPageParser<T> {
    fn parse(&self, body: &[u8]) -> Result<Page<T>> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| Error::decode(format!("response is not JSON: {e}")))?;

        let items = match extract_path(&value, &self.items_path) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| T::deserialize(item))
                .collect::<std::result::Result<Vec<T>, _>>()
                .map_err(|e| {
                    Error::decode(format!("item at '{}' did not match: {e}", self.items_path))
                })?,
            Some(other) => {
                return Err(Error::decode(format!(
                    "expected an array at '{}', found {}",
                    self.items_path,
                    type_name(other)
                )))
            }
        };

        let meta = PageMeta {
            is_last: Self::lookup(&value, self.is_last_path.as_ref()).and_then(Value::as_bool),
            total: Self::lookup(&value, self.total_path.as_ref()).and_then(Value::as_u64),
            start_at: Self::lookup(&value, self.start_at_path.as_ref()).and_then(Value::as_u64),
            max_results: Self::lookup(&value, self.max_results_path.as_ref())
                .and_then(Value::as_u64),
            next_link: Self::lookup(&value, self.next_link_path.as_ref())
                .and_then(Value::as_str)
                .map(str::to_string),
        };

        Ok(Page { items, meta })
    }
}

impl<T> std::fmt::Debug for JsonPageParser<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonPageParser")
            .field("items_path", &self.items_path)
            .field("is_last_path", &self.is_last_path)
            .field("total_path", &self.total_path)
            .field("next_link_path", &self.next_link_path)
            .finish_non_exhaustive()
    }
}

/// Extract a JSON value at a dotted path (`$.` prefix optional, `""` = root)
pub fn extract_path<'v>(value: &'v Value, path: &str) -> Option<&'v Value> {
    let path = path.strip_prefix("$.").unwrap_or(path);
    if path.is_empty() || path == "$" {
        return Some(value);
    }

    let mut current = value;
    for part in path.split('.') {
        match current {
            Value::Object(map) => {
                current = map.get(part)?;
            }
            _ => return None,
        }
    }

    Some(current)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
