//! Retry module
//!
//! Decides whether a single HTTP call should be retried and drives the
//! attempts, suspending cooperatively between them.
//!
//! # Overview
//!
//! - `RetryPolicy` - Classifies an outcome into succeed / retry-after / fail
//! - `send_with_retry` - Sends one request through a `Transport` under a policy
//! - `CancelSignal` - Caller-supplied cancellation (flag and/or deadline)

mod cancel;
mod executor;
mod policy;

pub use cancel::{CancelHandle, CancelSignal};
pub use executor::{send_with_retry, Delivered, RetryState};
pub use policy::{parse_retry_after, RetryDecision, RetryPolicy};
