//! Pagination strategy implementations
//!
//! Each strategy handles a specific pagination pattern.

use super::types::{Continuation, FetchRequest, PageMeta, Paginator};
use crate::error::{Error, Result};
use crate::http::TransportRequest;
use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

// ============================================================================
// Offset Pagination
// ============================================================================

/// Offset-based pagination (`?startAt=100&maxResults=50`)
///
/// Stops on the first of: an `isLast: true` flag, `start + step >= total`
/// (only when a numeric total was sent), or an empty page. The step is the
/// `maxResults` the server echoes back, since servers may cap the requested
/// page size, falling back to the request's page size.
#[derive(Debug, Clone)]
pub struct OffsetPaginator {
    /// Query parameter name for offset
    pub offset_param: String,
    /// Query parameter name for page size
    pub limit_param: String,
}

impl Default for OffsetPaginator {
    fn default() -> Self {
        Self::new("startAt", "maxResults")
    }
}

impl OffsetPaginator {
    /// Create a new offset paginator
    pub fn new(offset_param: impl Into<String>, limit_param: impl Into<String>) -> Self {
        Self {
            offset_param: offset_param.into(),
            limit_param: limit_param.into(),
        }
    }
}

impl Paginator for OffsetPaginator {
    fn start(&self) -> Continuation {
        Continuation::Offset(0)
    }

    fn build_request(
        &self,
        request: &FetchRequest,
        continuation: &Continuation,
    ) -> Result<TransportRequest> {
        let Continuation::Offset(offset) = continuation else {
            return Err(Error::malformed(format!(
                "offset pagination cannot fetch at {continuation}"
            )));
        };

        Ok(request
            .base_request()
            .query(&self.offset_param, offset.to_string())
            .query(&self.limit_param, request.page_size.to_string()))
    }

    fn advance(
        &self,
        request: &FetchRequest,
        continuation: &Continuation,
        meta: &PageMeta,
        item_count: usize,
    ) -> Result<Continuation> {
        let Continuation::Offset(start) = *continuation else {
            return Err(Error::malformed(format!(
                "offset pagination cannot advance from {continuation}"
            )));
        };

        if let Some(echoed) = meta.start_at {
            if echoed != start {
                return Err(Error::malformed(format!(
                    "requested {}={start} but the page reports {echoed}",
                    self.offset_param
                )));
            }
        }

        if meta.is_last == Some(true) {
            return Ok(Continuation::Done);
        }

        if item_count == 0 {
            debug!(start, "Empty page, stopping");
            return Ok(Continuation::Done);
        }

        let step = meta
            .max_results
            .filter(|&size| size > 0)
            .unwrap_or(u64::from(request.page_size));
        if step == 0 {
            return Err(Error::malformed(format!(
                "{} is zero, pagination would never advance",
                self.limit_param
            )));
        }

        let Some(next) = start.checked_add(step) else {
            return Err(Error::malformed(format!(
                "{}={step} from {start} overflows the offset",
                self.limit_param
            )));
        };
        if meta.total.is_some_and(|total| next >= total) {
            return Ok(Continuation::Done);
        }

        Ok(Continuation::Offset(next))
    }

    fn skip(
        &self,
        request: &FetchRequest,
        continuation: &Continuation,
        seen: &PageMeta,
    ) -> Continuation {
        let Continuation::Offset(offset) = *continuation else {
            return Continuation::Done;
        };

        // Step as the server did, so a capped page size skips only the failed page
        let step = seen
            .max_results
            .filter(|&size| size > 0)
            .unwrap_or(u64::from(request.page_size.max(1)));

        // Without a known total there is no telling where the listing ends
        match (offset.checked_add(step), seen.total) {
            (Some(next), Some(total)) if next < total => Continuation::Offset(next),
            _ => Continuation::Done,
        }
    }
}

// ============================================================================
// Cursor Pagination
// ============================================================================

/// Where the cursor and page size are sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorLocation {
    /// As query parameters
    #[default]
    Query,
    /// As fields merged into the JSON request body
    Body,
}

/// Cursor-based pagination driven by a next-page link
///
/// The link is usually a URL (absolute or relative) carrying the cursor as a
/// query parameter, e.g. `{"links": {"next": "/rule/summary?cursor=abc"}}`.
#[derive(Debug, Clone)]
pub struct CursorPaginator {
    /// Name of the cursor parameter (in the link and in requests)
    pub cursor_param: String,
    /// Name of the page size parameter, if one is sent
    pub limit_param: Option<String>,
    /// Where cursor and page size go in requests
    pub location: CursorLocation,
}

impl Default for CursorPaginator {
    fn default() -> Self {
        Self {
            cursor_param: "cursor".to_string(),
            limit_param: Some("limit".to_string()),
            location: CursorLocation::Query,
        }
    }
}

impl CursorPaginator {
    /// Create a new cursor paginator
    pub fn new(cursor_param: impl Into<String>) -> Self {
        Self {
            cursor_param: cursor_param.into(),
            ..Self::default()
        }
    }

    /// Set the page size parameter (or none)
    #[must_use]
    pub fn with_limit_param(mut self, param: Option<&str>) -> Self {
        self.limit_param = param.map(str::to_string);
        self
    }

    /// Send cursor and page size in the JSON body instead of the query
    #[must_use]
    pub fn in_body(mut self) -> Self {
        self.location = CursorLocation::Body;
        self
    }
}

impl Paginator for CursorPaginator {
    fn start(&self) -> Continuation {
        Continuation::first_cursor()
    }

    fn build_request(
        &self,
        request: &FetchRequest,
        continuation: &Continuation,
    ) -> Result<TransportRequest> {
        let Continuation::Cursor(cursor) = continuation else {
            return Err(Error::malformed(format!(
                "cursor pagination cannot fetch at {continuation}"
            )));
        };

        let mut req = request.base_request();
        match self.location {
            CursorLocation::Query => {
                if let Some(ref param) = self.limit_param {
                    req = req.query(param, request.page_size.to_string());
                }
                if !cursor.is_empty() {
                    req = req.query(&self.cursor_param, cursor);
                }
            }
            CursorLocation::Body => {
                let mut body = match req.body.take() {
                    Some(Value::Object(map)) => map,
                    None => Map::new(),
                    Some(_) => {
                        return Err(Error::config(
                            "cursor in body requires a JSON object request body",
                        ))
                    }
                };
                if let Some(ref param) = self.limit_param {
                    body.insert(param.clone(), Value::from(request.page_size));
                }
                if !cursor.is_empty() {
                    body.insert(self.cursor_param.clone(), Value::from(cursor.as_str()));
                }
                req.body = Some(Value::Object(body));
            }
        }
        Ok(req)
    }

    fn advance(
        &self,
        _request: &FetchRequest,
        continuation: &Continuation,
        meta: &PageMeta,
        _item_count: usize,
    ) -> Result<Continuation> {
        let Continuation::Cursor(current) = continuation else {
            return Err(Error::malformed(format!(
                "cursor pagination cannot advance from {continuation}"
            )));
        };

        let Some(link) = meta
            .next_link
            .as_deref()
            .map(str::trim)
            .filter(|link| !link.is_empty())
        else {
            return Ok(Continuation::Done);
        };

        let next = extract_cursor(link, &self.cursor_param).ok_or_else(|| {
            Error::malformed(format!(
                "next link '{link}' carries no '{}' parameter",
                self.cursor_param
            ))
        })?;

        if next.is_empty() {
            return Ok(Continuation::Done);
        }
        if next == *current {
            return Err(Error::malformed(format!(
                "server returned cursor '{next}' again"
            )));
        }

        Ok(Continuation::Cursor(next))
    }

    fn skip(
        &self,
        _request: &FetchRequest,
        _continuation: &Continuation,
        _seen: &PageMeta,
    ) -> Continuation {
        // The next cursor lives in the page that failed
        Continuation::Done
    }
}

/// Extract a cursor from a next-page link
///
/// Accepts absolute URLs, relative paths, bare query strings
/// (`cursor=abc`) and, as a last resort, a bare token.
pub fn extract_cursor(link: &str, param: &str) -> Option<String> {
    let link = link.trim();
    let base = Url::parse("https://placeholder.invalid/").ok()?;

    if let Ok(url) = base.join(link) {
        if let Some(value) = query_value(&url, param) {
            return Some(value);
        }
    }

    if !link.contains('?') {
        if let Ok(url) = base.join(&format!("?{link}")) {
            if let Some(value) = query_value(&url, param) {
                return Some(value);
            }
        }
    }

    if !link.contains(['?', '/', '&']) {
        return Some(link.to_string());
    }

    None
}

fn query_value(url: &Url, param: &str) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == param)
        .map(|(_, value)| value.into_owned())
}

// ============================================================================
// Single Page
// ============================================================================

/// No pagination - a single request
///
/// The lone page is addressed as offset zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct SinglePage;

impl Paginator for SinglePage {
    fn start(&self) -> Continuation {
        Continuation::Offset(0)
    }

    fn build_request(
        &self,
        request: &FetchRequest,
        continuation: &Continuation,
    ) -> Result<TransportRequest> {
        if continuation.is_done() {
            return Err(Error::malformed("single page already fetched"));
        }
        Ok(request.base_request())
    }

    fn advance(
        &self,
        _request: &FetchRequest,
        _continuation: &Continuation,
        _meta: &PageMeta,
        _item_count: usize,
    ) -> Result<Continuation> {
        Ok(Continuation::Done)
    }

    fn skip(
        &self,
        _request: &FetchRequest,
        _continuation: &Continuation,
        _seen: &PageMeta,
    ) -> Continuation {
        Continuation::Done
    }
}
