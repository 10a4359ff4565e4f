//! Retrying executor
//!
//! Sends one request through a transport, applying a `RetryPolicy`. The
//! `RetryState` lives only for the duration of that call.

use super::cancel::CancelSignal;
use super::policy::{RetryDecision, RetryPolicy};
use crate::error::{Error, Result};
use crate::http::{Transport, TransportRequest, TransportResponse};
use std::time::Duration;
use tracing::{debug, warn};

/// Attempt counter and accumulated backoff for one HTTP call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryState {
    /// Attempts made so far
    pub attempt: u32,
    /// Total time spent in backoff
    pub backoff: Duration,
}

impl RetryState {
    /// Create a fresh state
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of retries (attempts beyond the first)
    pub fn retries(&self) -> u32 {
        self.attempt.saturating_sub(1)
    }
}

/// A successful response and what it took to get it
#[derive(Debug, Clone)]
pub struct Delivered {
    /// The 2xx response
    pub response: TransportResponse,
    /// Attempts made, including the successful one
    pub attempts: u32,
    /// Total backoff slept before success
    pub backoff: Duration,
}

/// Send a request, retrying under `policy` until success, permanent failure,
/// exhaustion or cancellation
pub async fn send_with_retry<T: Transport + ?Sized>(
    transport: &T,
    request: &TransportRequest,
    policy: &RetryPolicy,
    cancel: &CancelSignal,
) -> Result<Delivered> {
    let mut state = RetryState::new();

    loop {
        state.attempt += 1;

        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(Error::Cancelled),
            outcome = transport.send(request) => outcome,
        };

        match policy.decide(&outcome, state.attempt) {
            RetryDecision::Succeed => {
                let response = outcome?;
                debug!(
                    method = %request.method,
                    url = %request.url,
                    attempts = state.attempt,
                    "Request succeeded"
                );
                return Ok(Delivered {
                    response,
                    attempts: state.attempt,
                    backoff: state.backoff,
                });
            }
            RetryDecision::RetryAfter(delay) => {
                let reason = match &outcome {
                    Ok(response) => format!("status {}", response.status),
                    Err(e) => e.to_string(),
                };
                warn!(
                    url = %request.url,
                    attempt = state.attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "Request failed ({reason}), retrying"
                );

                tokio::select! {
                    biased;
                    () = cancel.cancelled() => return Err(Error::Cancelled),
                    () = tokio::time::sleep(delay) => {}
                }
                state.backoff += delay;
            }
            RetryDecision::FailPermanently => {
                let error = RetryPolicy::into_error(outcome);
                if error.is_retryable() {
                    warn!(
                        url = %request.url,
                        attempts = state.attempt,
                        "Retries exhausted: {error}"
                    );
                    return Err(Error::RetryExhausted {
                        attempts: state.attempt,
                        last: Box::new(error),
                    });
                }
                return Err(error);
            }
        }
    }
}
