// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # tracker-fetch
//!
//! Resilient paginated fetching for issue-tracker REST APIs, built for
//! administration reports that walk every dashboard, workflow, automation
//! rule or gadget of a site.
//!
//! ## Features
//!
//! - **Retry with backoff**: 429/5xx/transport failures retried, `Retry-After` honored
//! - **Unified pagination**: offset (`startAt`/`maxResults`) and cursor (`links.next`)
//!   listings behind one `Continuation` value
//! - **Resumable**: every page reports the continuation to resume from
//! - **Skip and continue**: optionally record failed pages or sub-fetches and keep going
//! - **Cancellation**: stop between attempts or mid-backoff via a signal or deadline
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tracker_fetch::{FetchRequest, FetcherConfig, JsonPageParser, OffsetPaginator};
//!
//! #[tokio::main]
//! async fn main() -> tracker_fetch::Result<()> {
//!     let fetcher = FetcherConfig::from_file("tracker.yaml")?.build()?;
//!
//!     let request = FetchRequest::get("/rest/api/3/dashboard/search").page_size(100);
//!     let parser = JsonPageParser::<serde_json::Value>::offset("values");
//!     let outcome = fetcher
//!         .collect(&request, &OffsetPaginator::default(), &parser)
//!         .await?;
//!
//!     println!("{} dashboards", outcome.items.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          Fetcher                                │
//! │  fetch_page()   pages() → Stream<PageEvent>   collect()         │
//! │  fetch_each(jobs) → ScanReport                                  │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────────┬───────────────┴───────────┬──────────────────────┐
//! │    Retry     │        Pagination         │      Transport       │
//! ├──────────────┼───────────────────────────┼──────────────────────┤
//! │ RetryPolicy  │ Continuation              │ HttpTransport        │
//! │ Backoff      │ Offset / Cursor / Single  │ Credentials          │
//! │ CancelSignal │ JsonPageParser            │ Rate Limit           │
//! └──────────────┴───────────────────────────┴──────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
#[allow(missing_docs)]
pub mod error;

/// Common types and type aliases
pub mod types;

/// Credentials
pub mod auth;

/// HTTP transport with rate limiting
pub mod http;

/// Retry policy, retrying executor and cancellation
pub mod retry;

/// Pagination strategies and page parsers
pub mod pagination;

/// Fetch orchestration
pub mod engine;

/// Configuration
pub mod config;

#[cfg(test)]
pub(crate) mod test_support;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result, ResultExt};
pub use types::*;

// Re-export commonly used types
pub use auth::Credentials;
pub use config::{CredentialsConfig, FetcherConfig, RetryConfig};
pub use engine::{
    FetchOutcome, FetchStats, FetchedPage, Fetcher, PageEvent, ScanReport, SkippedPage,
    SubFetch, SubFetchFailure,
};
pub use http::{
    HttpTransport, HttpTransportConfig, RateLimiterConfig, Transport, TransportRequest,
    TransportResponse,
};
pub use pagination::{
    Continuation, CursorLocation, CursorPaginator, FetchRequest, JsonPageParser, OffsetPaginator,
    Page, PageMeta, PageParser, Paginator, SinglePage,
};
pub use retry::{CancelHandle, CancelSignal, RetryDecision, RetryPolicy};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
