//! Pagination types and traits
//!
//! Defines the core pagination abstractions used by all strategies.

use crate::error::Result;
use crate::http::TransportRequest;
use crate::types::{JsonValue, Method, StringMap};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a paginated fetch stands
///
/// `Cursor("")` is the first page of a cursor sequence (no cursor sent yet).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Continuation {
    /// Next page starts at this item offset
    Offset(u64),
    /// Next page is addressed by this server-issued cursor
    Cursor(String),
    /// No more pages
    Done,
}

impl Continuation {
    /// The first page of a cursor sequence
    pub fn first_cursor() -> Self {
        Self::Cursor(String::new())
    }

    /// Check if this is a done result
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Offset, if this is an offset continuation
    pub fn offset(&self) -> Option<u64> {
        match self {
            Self::Offset(offset) => Some(*offset),
            _ => None,
        }
    }

    /// Cursor, if this is a cursor continuation
    pub fn cursor(&self) -> Option<&str> {
        match self {
            Self::Cursor(cursor) => Some(cursor),
            _ => None,
        }
    }
}

impl fmt::Display for Continuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Offset(offset) => write!(f, "offset {offset}"),
            Self::Cursor(cursor) if cursor.is_empty() => f.write_str("first cursor page"),
            Self::Cursor(cursor) => write!(f, "cursor {cursor}"),
            Self::Done => f.write_str("done"),
        }
    }
}

/// Pagination signals found in one response
///
/// Every field is optional; endpoints disagree on which they send.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMeta {
    /// Explicit last-page flag (`isLast`)
    pub is_last: Option<bool>,
    /// Total item count hint (`total`)
    pub total: Option<u64>,
    /// Offset the server says this page starts at (`startAt`)
    pub start_at: Option<u64>,
    /// Page size the server actually applied (`maxResults`)
    pub max_results: Option<u64>,
    /// Link to the next page (`links.next`)
    pub next_link: Option<String>,
}

/// One fetched response unit
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Items in server order
    pub items: Vec<T>,
    /// Pagination signals
    pub meta: PageMeta,
}

impl<T> Page<T> {
    /// Create a page with no pagination signals
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            meta: PageMeta::default(),
        }
    }

    /// Attach pagination signals
    #[must_use]
    pub fn with_meta(mut self, meta: PageMeta) -> Self {
        self.meta = meta;
        self
    }
}

/// Immutable description of one logical paginated query
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    /// HTTP method
    pub method: Method,
    /// Endpoint path (relative to the transport base URL) or absolute URL
    pub endpoint: String,
    /// Fixed query parameters sent with every page
    pub query: StringMap,
    /// Fixed headers sent with every page
    pub headers: StringMap,
    /// Fixed JSON body sent with every page
    pub body: Option<JsonValue>,
    /// Requested items per page
    pub page_size: u32,
}

impl FetchRequest {
    /// Default page size, matching the tracker's default `maxResults`
    pub const DEFAULT_PAGE_SIZE: u32 = 50;

    /// Create a request with the given method
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            query: StringMap::new(),
            headers: StringMap::new(),
            body: None,
            page_size: Self::DEFAULT_PAGE_SIZE,
        }
    }

    /// Create a GET request
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(Method::GET, endpoint)
    }

    /// Create a POST request with a JSON body
    pub fn post(endpoint: impl Into<String>, body: JsonValue) -> Self {
        Self::new(Method::POST, endpoint).json(body)
    }

    /// Add a fixed query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Add a fixed header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set the JSON body
    #[must_use]
    pub fn json(mut self, body: JsonValue) -> Self {
        self.body = Some(body);
        self
    }

    /// Set the page size hint
    #[must_use]
    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = size;
        self
    }

    /// The request for a page before any pagination parameters are added
    pub fn base_request(&self) -> TransportRequest {
        TransportRequest {
            method: self.method,
            url: self.endpoint.clone(),
            headers: self.headers.clone(),
            query: self.query.clone(),
            body: self.body.clone(),
        }
    }
}

/// Core trait for pagination strategies
pub trait Paginator: Send + Sync {
    /// Continuation for the first page
    fn start(&self) -> Continuation;

    /// Build the transport request for the page at `continuation`
    fn build_request(
        &self,
        request: &FetchRequest,
        continuation: &Continuation,
    ) -> Result<TransportRequest>;

    /// Compute the continuation following a page fetched at `continuation`
    fn advance(
        &self,
        request: &FetchRequest,
        continuation: &Continuation,
        meta: &PageMeta,
        item_count: usize,
    ) -> Result<Continuation>;

    /// Continuation to resume from when the page at `continuation` is skipped
    ///
    /// `seen` holds the latest `total` and `max_results` reported by earlier
    /// pages of this sequence.
    fn skip(
        &self,
        request: &FetchRequest,
        continuation: &Continuation,
        seen: &PageMeta,
    ) -> Continuation;
}
