//! Which requests may be repeated.

use crate::method::Method;
use http::HeaderMap;
use serde::Serialize;

/// Header names that mark a write as safe to repeat.
pub const IDEMPOTENCY_HEADERS: [&str; 2] = ["idempotency-key", "x-idempotency-key"];

/// Why a request is, or is not, allowed to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryReason {
    /// The method has no side effects.
    SafeMethod,
    /// The caller supplied an idempotency key.
    IdempotencyKey,
    /// A write without an idempotency key.
    UnsafeMethod,
}

/// Retry decision derived from method and headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RetryPolicy {
    /// Whether more than one physical attempt may be made.
    pub allowed: bool,
    /// Why.
    pub reason: RetryReason,
}

impl RetryPolicy {
    /// Decide whether a request may be retried.
    ///
    /// `GET` is always retry-safe. Any other method is retry-safe only when a
    /// non-blank `Idempotency-Key` or `X-Idempotency-Key` header is present;
    /// header lookup is case-insensitive.
    pub fn evaluate(method: Method, headers: &HeaderMap) -> Self {
        if method.is_safe() {
            return Self {
                allowed: true,
                reason: RetryReason::SafeMethod,
            };
        }

        if has_idempotency_key(headers) {
            Self {
                allowed: true,
                reason: RetryReason::IdempotencyKey,
            }
        } else {
            Self {
                allowed: false,
                reason: RetryReason::UnsafeMethod,
            }
        }
    }

    /// Total physical attempts for a given retry budget.
    pub fn max_attempts(&self, retry_budget: u32) -> u32 {
        if self.allowed {
            retry_budget.saturating_add(1)
        } else {
            1
        }
    }
}

fn has_idempotency_key(headers: &HeaderMap) -> bool {
    IDEMPOTENCY_HEADERS.iter().any(|name| {
        headers
            .get(*name)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| !v.trim().is_empty())
    })
}

/// Retry bookkeeping attached to the final error of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryDiagnostics {
    /// Physical attempts made.
    pub attempts: u32,
    /// `attempts - 1`.
    pub retries_used: u32,
    /// Attempts the policy allowed.
    pub max_attempts: u32,
    /// The policy in force.
    pub policy: RetryPolicy,
}
