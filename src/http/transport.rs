//! Transport abstraction
//!
//! The fetcher never builds connections itself. It hands a fully
//! described `TransportRequest` to a `Transport` and gets back the raw
//! status, headers and body.

use crate::error::Result;
use crate::types::{JsonValue, Method, StringMap};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use std::sync::Arc;

/// One HTTP call, fully resolved
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransportRequest {
    /// HTTP method
    pub method: Method,
    /// Path relative to the transport's base URL, or an absolute URL
    pub url: String,
    /// Request headers
    pub headers: StringMap,
    /// Query parameters
    pub query: StringMap,
    /// JSON body
    pub body: Option<JsonValue>,
}

impl TransportRequest {
    /// Create a request for the given method and URL
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            ..Default::default()
        }
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set JSON body
    #[must_use]
    pub fn json(mut self, body: JsonValue) -> Self {
        self.body = Some(body);
        self
    }
}

/// Raw response as seen on the wire
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HeaderMap,
    /// Response body
    pub body: Bytes,
}

impl TransportResponse {
    /// Create a response with no headers
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Check for a 2xx status
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Get a header value as a string
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Body as (lossy) UTF-8 text
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Capability to send one HTTP request
///
/// Implementations must return non-2xx responses as `Ok` and reserve `Err`
/// for failures where no response was received (connect, DNS, timeout).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and return the raw response
    async fn send(&self, request: &TransportRequest) -> Result<TransportResponse>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: &TransportRequest) -> Result<TransportResponse> {
        (**self).send(request).await
    }
}
