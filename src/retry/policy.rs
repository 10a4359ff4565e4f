//! Retry policy
//!
//! Retries 429, 5xx and transport failures up to a fixed number of attempts.
//! A `Retry-After` header (integer seconds) is honored exactly; otherwise the
//! configured backoff applies, linear by default.

use crate::error::{Error, Result};
use crate::http::TransportResponse;
use crate::types::BackoffType;
use reqwest::header::HeaderMap;
use std::time::Duration;

/// What to do after one attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// The response is usable
    Succeed,
    /// Wait for the duration, then try again
    RetryAfter(Duration),
    /// Stop; the outcome is final
    FailPermanently,
}

/// Retry/backoff policy for a single HTTP call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first
    pub max_attempts: u32,
    /// Base delay for computed backoff
    pub base_delay: Duration,
    /// Upper bound for computed backoff (`Retry-After` is not capped)
    pub max_backoff: Duration,
    /// How the computed delay grows with the attempt number
    pub backoff_type: BackoffType,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(2),
            max_backoff: Duration::from_secs(60),
            backoff_type: BackoffType::Linear,
        }
    }
}

impl RetryPolicy {
    /// Create the default policy (5 attempts, linear 2s backoff)
    pub fn new() -> Self {
        Self::default()
    }

    /// A policy that never retries
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Set max attempts (at least one)
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Set backoff configuration
    #[must_use]
    pub fn with_backoff(
        mut self,
        backoff_type: BackoffType,
        base: Duration,
        max: Duration,
    ) -> Self {
        self.backoff_type = backoff_type;
        self.base_delay = base;
        self.max_backoff = max;
        self
    }

    /// Calculate the computed delay after the given (1-based) failed attempt
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        let delay = match self.backoff_type {
            BackoffType::Constant => self.base_delay,
            BackoffType::Linear => self.base_delay.saturating_mul(attempt),
            BackoffType::Exponential => {
                let factor = 2u32.saturating_pow(attempt - 1);
                self.base_delay.saturating_mul(factor)
            }
        };

        std::cmp::min(delay, self.max_backoff)
    }

    /// Decide what to do with the outcome of the given (1-based) attempt
    pub fn decide(&self, outcome: &Result<TransportResponse>, attempt: u32) -> RetryDecision {
        let retry_after = match outcome {
            Ok(response) if response.is_success() => return RetryDecision::Succeed,
            Ok(response) if is_retryable_status(response.status) => {
                parse_retry_after(&response.headers)
            }
            Ok(_) => return RetryDecision::FailPermanently,
            Err(error) if error.is_retryable() => None,
            Err(_) => return RetryDecision::FailPermanently,
        };

        if attempt >= self.max_attempts {
            return RetryDecision::FailPermanently;
        }

        let delay = retry_after.map_or_else(|| self.calculate_backoff(attempt), Duration::from_secs);
        RetryDecision::RetryAfter(delay)
    }

    /// Turn a final, unsuccessful outcome into the error to surface
    pub fn into_error(outcome: Result<TransportResponse>) -> Error {
        match outcome {
            Ok(response) => Error::from_status(
                response.status,
                parse_retry_after(&response.headers),
                response.text(),
            ),
            Err(error) => error,
        }
    }
}

/// Check if an HTTP status is retryable
fn is_retryable_status(status: u16) -> bool {
    status == 429 || (500..=599).contains(&status)
}

/// Parse a `Retry-After` header given in whole seconds
///
/// HTTP-date values are ignored and fall back to computed backoff.
pub fn parse_retry_after(headers: &HeaderMap) -> Option<u64> {
    headers
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
}
