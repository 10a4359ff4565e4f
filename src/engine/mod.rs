//! Execution engine module
//!
//! Drives paginated fetches through the retrying transport.
//!
//! # Overview
//!
//! The engine module provides:
//! - `Fetcher` - Fetches pages, streams page sequences and runs sub-fetch scans
//! - `PageEvent` - One element of a lazy page sequence (fetched or skipped)
//! - `FetchOutcome` / `ScanReport` - Drained results with statistics
//!
//! Pages of one sequence are fetched strictly one after another. Only
//! independent sub-fetches (`fetch_each`) run concurrently, bounded by the
//! fetcher's concurrency.

mod types;

pub use types::{
    FetchOutcome, FetchStats, FetchedPage, PageEvent, ScanReport, SkippedPage, SubFetch,
    SubFetchFailure,
};

use crate::error::{Error, Result};
use crate::http::Transport;
use crate::pagination::{Continuation, FetchRequest, PageMeta, PageParser, Paginator};
use crate::retry::{send_with_retry, CancelSignal, RetryPolicy};
use crate::types::ErrorStrategy;
use futures::stream::{self, Stream, StreamExt};
use std::fmt::Debug;
use std::pin::pin;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Paginated fetcher over a shared transport
#[derive(Clone)]
pub struct Fetcher {
    /// Transport every request goes through
    transport: Arc<dyn Transport>,
    /// Retry policy applied to each HTTP call
    policy: RetryPolicy,
    /// What to do when a page fails
    strategy: ErrorStrategy,
    /// Maximum sub-fetches in flight in `fetch_each`
    concurrency: usize,
    /// Caller-supplied cancellation
    cancel: CancelSignal,
}

impl Fetcher {
    /// Create a fetcher with the default retry policy and fail-fast errors
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self::from_arc(Arc::new(transport))
    }

    /// Create a fetcher over an already shared transport
    pub fn from_arc(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            policy: RetryPolicy::default(),
            strategy: ErrorStrategy::default(),
            concurrency: 1,
            cancel: CancelSignal::never(),
        }
    }

    /// Set the retry policy
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the error strategy
    #[must_use]
    pub fn with_error_strategy(mut self, strategy: ErrorStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set how many sub-fetches `fetch_each` runs at once (at least 1)
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Set the cancellation signal
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelSignal) -> Self {
        self.cancel = cancel;
        self
    }

    /// Get the retry policy
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Get the error strategy
    pub fn error_strategy(&self) -> ErrorStrategy {
        self.strategy
    }

    /// Get the sub-fetch concurrency
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Fetch the single page at `continuation`
    ///
    /// Builds the request, sends it under the retry policy, parses the body
    /// and computes the next continuation. Nothing is retained between
    /// calls, so a sequence can resume from any returned `next`.
    pub async fn fetch_page<T, P, R>(
        &self,
        request: &FetchRequest,
        paginator: &P,
        parser: &R,
        continuation: &Continuation,
    ) -> Result<FetchedPage<T>>
    where
        P: Paginator + ?Sized,
        R: PageParser<T> + ?Sized,
    {
        if continuation.is_done() {
            return Err(Error::malformed("no page left to fetch"));
        }

        let transport_request = paginator.build_request(request, continuation)?;
        let delivered = send_with_retry(
            self.transport.as_ref(),
            &transport_request,
            &self.policy,
            &self.cancel,
        )
        .await?;

        let page = parser.parse(&delivered.response.body)?;
        let next = paginator.advance(request, continuation, &page.meta, page.items.len())?;

        debug!(
            endpoint = %request.endpoint,
            at = %continuation,
            next = %next,
            items = page.items.len(),
            attempts = delivered.attempts,
            "Fetched page"
        );

        Ok(FetchedPage {
            items: page.items,
            continuation: continuation.clone(),
            next,
            total: page.meta.total,
            page_size: page.meta.max_results,
            attempts: delivered.attempts,
            backoff: delivered.backoff,
        })
    }

    /// Lazy page sequence from the first page
    pub fn pages<'a, T, P, R>(
        &'a self,
        request: &'a FetchRequest,
        paginator: &'a P,
        parser: &'a R,
    ) -> impl Stream<Item = Result<PageEvent<T>>> + 'a
    where
        T: 'a,
        P: Paginator + ?Sized,
        R: PageParser<T> + ?Sized,
    {
        self.pages_from(request, paginator, parser, paginator.start())
    }

    /// Lazy page sequence resuming at `start`
    ///
    /// Pages are requested only as the stream is polled. The stream ends
    /// after the page whose `next` is `Done`, or right after yielding an
    /// error that the error strategy does not skip.
    pub fn pages_from<'a, T, P, R>(
        &'a self,
        request: &'a FetchRequest,
        paginator: &'a P,
        parser: &'a R,
        start: Continuation,
    ) -> impl Stream<Item = Result<PageEvent<T>>> + 'a
    where
        T: 'a,
        P: Paginator + ?Sized,
        R: PageParser<T> + ?Sized,
    {
        stream::unfold(Some((start, PageMeta::default())), move |state| async move {
            let (continuation, mut seen) = state?;
            if continuation.is_done() {
                return None;
            }

            match self
                .fetch_page(request, paginator, parser, &continuation)
                .await
            {
                Ok(page) => {
                    let next = page.next.clone();
                    seen.total = page.total.or(seen.total);
                    seen.max_results = page.page_size.or(seen.max_results);
                    Some((Ok(PageEvent::Page(page)), Some((next, seen))))
                }
                Err(error) if self.skips(&error) => {
                    let next = paginator.skip(request, &continuation, &seen);
                    warn!(
                        endpoint = %request.endpoint,
                        at = %continuation,
                        resume = %next,
                        "Skipping page: {error}"
                    );
                    let skipped = SkippedPage {
                        continuation,
                        next: next.clone(),
                        error,
                    };
                    Some((Ok(PageEvent::Skipped(skipped)), Some((next, seen))))
                }
                Err(error) => Some((Err(error), None)),
            }
        })
    }

    /// Drain the whole sequence from the first page
    pub async fn collect<T, P, R>(
        &self,
        request: &FetchRequest,
        paginator: &P,
        parser: &R,
    ) -> Result<FetchOutcome<T>>
    where
        P: Paginator + ?Sized,
        R: PageParser<T> + ?Sized,
    {
        self.collect_from(request, paginator, parser, paginator.start())
            .await
    }

    /// Drain the sequence resuming at `start`
    pub async fn collect_from<T, P, R>(
        &self,
        request: &FetchRequest,
        paginator: &P,
        parser: &R,
        start: Continuation,
    ) -> Result<FetchOutcome<T>>
    where
        P: Paginator + ?Sized,
        R: PageParser<T> + ?Sized,
    {
        let mut outcome = FetchOutcome::new(start.clone());
        let mut events = pin!(self.pages_from(request, paginator, parser, start));

        while let Some(event) = events.next().await {
            outcome.record(event?);
        }

        info!(
            endpoint = %request.endpoint,
            pages = outcome.stats.pages_fetched,
            items = outcome.stats.items_fetched,
            skipped = outcome.stats.pages_skipped,
            retries = outcome.stats.retries,
            "Fetch complete"
        );

        Ok(outcome)
    }

    /// Run one independent sub-fetch per job, e.g. the gadgets of each
    /// dashboard
    ///
    /// Up to `concurrency` sub-fetches are in flight; results keep job
    /// order. Each sub-fetch aborts on its own first error. Under
    /// `ErrorStrategy::Skip` that failure is recorded in the report and the
    /// scan goes on; under `Fail` it ends the scan.
    pub async fn fetch_each<K, T, P, R>(
        &self,
        jobs: impl IntoIterator<Item = (K, FetchRequest)>,
        paginator: &P,
        parser: &R,
    ) -> Result<ScanReport<K, T>>
    where
        K: Debug,
        P: Paginator + ?Sized,
        R: PageParser<T> + ?Sized,
    {
        let strict = self.clone().with_error_strategy(ErrorStrategy::Fail);
        let strict = &strict;

        let mut results = pin!(stream::iter(jobs)
            .map(move |(key, request)| async move {
                let outcome = strict.collect(&request, paginator, parser).await;
                (key, outcome)
            })
            .buffered(self.concurrency));

        let mut report = ScanReport::new();
        while let Some((key, outcome)) = results.next().await {
            match outcome {
                Ok(outcome) => report.successes.push(SubFetch { key, outcome }),
                Err(error) if self.skips(&error) => {
                    warn!(key = ?key, "Sub-fetch failed, continuing: {error}");
                    report.failures.push(SubFetchFailure { key, error });
                }
                Err(error) => return Err(error),
            }
        }

        info!(
            succeeded = report.successes.len(),
            failed = report.failures.len(),
            "Scan complete"
        );

        Ok(report)
    }

    fn skips(&self, error: &Error) -> bool {
        self.strategy == ErrorStrategy::Skip && error.is_skippable()
    }
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher")
            .field("policy", &self.policy)
            .field("strategy", &self.strategy)
            .field("concurrency", &self.concurrency)
            .field("cancel", &self.cancel)
            .finish_non_exhaustive()
    }
}
