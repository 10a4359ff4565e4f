//! HTTP transport module
//!
//! Provides the transport seam the fetcher sends requests through, and the
//! reqwest-backed implementation used against real tracker sites.
//!
//! # Features
//!
//! - **Transport trait**: `send(request) -> response`, statuses untouched
//! - **Rate Limiting**: Token bucket rate limiter using governor
//! - **Credentials**: Applied as headers on every request

mod client;
mod rate_limit;
mod transport;

pub use client::{HttpTransport, HttpTransportConfig, HttpTransportConfigBuilder};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
pub use transport::{Transport, TransportRequest, TransportResponse};
