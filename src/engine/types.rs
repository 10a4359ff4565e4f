//! Engine types
//!
//! Pages, skip records and statistics produced by the fetcher.

use crate::error::Error;
use crate::pagination::Continuation;
use std::time::Duration;

/// One successfully fetched page
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedPage<T> {
    /// Items in server order
    pub items: Vec<T>,
    /// Continuation this page was fetched at
    pub continuation: Continuation,
    /// Continuation for the following page
    pub next: Continuation,
    /// Total item count reported by the server, if any
    pub total: Option<u64>,
    /// Page size the server reported applying, if any
    pub page_size: Option<u64>,
    /// HTTP attempts it took
    pub attempts: u32,
    /// Backoff slept before success
    pub backoff: Duration,
}

/// A page given up on under the skip policy
#[derive(Debug)]
pub struct SkippedPage {
    /// Continuation of the page that failed
    pub continuation: Continuation,
    /// Where the sequence resumed
    pub next: Continuation,
    /// Why it failed
    pub error: Error,
}

/// One element of a lazy page sequence
#[derive(Debug)]
pub enum PageEvent<T> {
    /// A page was fetched
    Page(FetchedPage<T>),
    /// A page failed and was skipped
    Skipped(SkippedPage),
}

impl<T> PageEvent<T> {
    /// Continuation to resume from after this event
    pub fn next(&self) -> &Continuation {
        match self {
            Self::Page(page) => &page.next,
            Self::Skipped(skipped) => &skipped.next,
        }
    }

    /// Check if this is a fetched page
    pub fn is_page(&self) -> bool {
        matches!(self, Self::Page(_))
    }

    /// Check if this is a skipped page
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }
}

/// Statistics from a fetch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchStats {
    /// Pages fetched successfully
    pub pages_fetched: usize,
    /// Items across fetched pages
    pub items_fetched: usize,
    /// Pages skipped
    pub pages_skipped: usize,
    /// HTTP attempts for fetched pages
    pub attempts: u32,
    /// Attempts beyond the first, per page
    pub retries: u32,
    /// Total backoff slept
    pub backoff: Duration,
}

impl FetchStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fetched page
    pub fn add_page<T>(&mut self, page: &FetchedPage<T>) {
        self.pages_fetched += 1;
        self.items_fetched += page.items.len();
        self.attempts += page.attempts;
        self.retries += page.attempts.saturating_sub(1);
        self.backoff += page.backoff;
    }

    /// Add a skipped page
    pub fn add_skipped(&mut self) {
        self.pages_skipped += 1;
    }
}

/// Everything a drained page sequence produced
#[derive(Debug)]
pub struct FetchOutcome<T> {
    /// Items of every fetched page, in order
    pub items: Vec<T>,
    /// Pages given up on
    pub skipped: Vec<SkippedPage>,
    /// Final continuation (`Done` once drained)
    pub next: Continuation,
    /// Statistics
    pub stats: FetchStats,
}

impl<T> FetchOutcome<T> {
    /// An empty outcome positioned at `start`
    pub fn new(start: Continuation) -> Self {
        Self {
            items: Vec::new(),
            skipped: Vec::new(),
            next: start,
            stats: FetchStats::new(),
        }
    }

    /// Fold one event into the outcome
    pub fn record(&mut self, event: PageEvent<T>) {
        match event {
            PageEvent::Page(page) => {
                self.stats.add_page(&page);
                self.next = page.next;
                self.items.extend(page.items);
            }
            PageEvent::Skipped(skipped) => {
                self.stats.add_skipped();
                self.next = skipped.next.clone();
                self.skipped.push(skipped);
            }
        }
    }

    /// True when no page was skipped
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// A sub-fetch that succeeded
#[derive(Debug)]
pub struct SubFetch<K, T> {
    /// Caller's key for the entity
    pub key: K,
    /// What the sub-fetch produced
    pub outcome: FetchOutcome<T>,
}

/// A sub-fetch that failed and was recorded under the skip policy
#[derive(Debug)]
pub struct SubFetchFailure<K> {
    /// Caller's key for the entity
    pub key: K,
    /// Why it failed
    pub error: Error,
}

/// Result of running many independent sub-fetches
#[derive(Debug)]
pub struct ScanReport<K, T> {
    /// Successful sub-fetches, in job order
    pub successes: Vec<SubFetch<K, T>>,
    /// Failed sub-fetches, in job order
    pub failures: Vec<SubFetchFailure<K>>,
}

impl<K, T> Default for ScanReport<K, T> {
    fn default() -> Self {
        Self {
            successes: Vec::new(),
            failures: Vec::new(),
        }
    }
}

impl<K, T> ScanReport<K, T> {
    /// Create an empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sub-fetches run
    pub fn len(&self) -> usize {
        self.successes.len() + self.failures.len()
    }

    /// Check if no sub-fetch was run
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Items across every successful sub-fetch
    pub fn items(&self) -> impl Iterator<Item = &T> {
        self.successes
            .iter()
            .flat_map(|success| success.outcome.items.iter())
    }
}
