//! Retry decisions and backoff.
//!
//! # Key Types
//!
//! - [`RetryPolicy`] - whether a request may be repeated at all
//! - [`BackoffStrategy`] - how long to wait between attempts
//! - [`ExponentialBackoff`] - `250ms * 2^(n-1)` plus jitter, capped
//! - [`retry_after_hint`] - server-provided delay, clamped
//!
//! # Examples
//!
//! ```rust
//! use contentkit_core::method::Method;
//! use contentkit_core::retry::{BackoffStrategy, ExponentialBackoff, RetryPolicy};
//! use http::HeaderMap;
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::evaluate(Method::Post, &HeaderMap::new());
//! assert_eq!(policy.max_attempts(3), 1);
//!
//! let backoff = ExponentialBackoff::builder()
//!     .max_delay(Duration::from_secs(2))
//!     .build();
//! let wait = backoff.delay_for(1, Some(Duration::from_secs(30)));
//! assert_eq!(wait, Duration::from_secs(2));
//! ```

mod after;
mod exponential;
mod policy;
mod strategy;

pub use after::{parse_retry_after, retry_after_hint};
pub use exponential::{
    DEFAULT_INITIAL_DELAY, DEFAULT_JITTER, DEFAULT_MAX_DELAY, ExponentialBackoff,
    ExponentialBackoffBuilder,
};
pub use policy::{IDEMPOTENCY_HEADERS, RetryDiagnostics, RetryPolicy, RetryReason};
pub use strategy::BackoffStrategy;
