//! Delay strategies between attempts.

use std::time::Duration;

/// A strategy for spacing out repeated attempts.
///
/// Implementations decide how long to wait after a failed attempt. Whether to
/// retry at all is decided by [`RetryPolicy`](super::RetryPolicy) and the
/// error's retryable flag; the strategy only answers "how long".
///
/// # Examples
///
/// ```rust
/// use contentkit_core::retry::{BackoffStrategy, ExponentialBackoff};
/// use std::time::Duration;
///
/// let backoff = ExponentialBackoff::builder()
///     .initial_delay(Duration::from_millis(250))
///     .jitter(Duration::ZERO)
///     .build();
///
/// assert_eq!(backoff.next_delay(1), Duration::from_millis(250));
/// assert_eq!(backoff.next_delay(2), Duration::from_millis(500));
/// ```
pub trait BackoffStrategy: Send + Sync {
    /// Delay to wait after attempt number `attempt` (1-based) failed.
    ///
    /// Implementations must never return more than [`max_delay`](Self::max_delay).
    fn next_delay(&self, attempt: u32) -> Duration;

    /// Ceiling applied to every delay, server hints included.
    fn max_delay(&self) -> Duration;

    /// Delay to wait, preferring a server-provided hint when there is one.
    ///
    /// The hint is clamped to [`max_delay`](Self::max_delay).
    fn delay_for(&self, attempt: u32, hint: Option<Duration>) -> Duration {
        match hint {
            Some(hint) => hint.min(self.max_delay()),
            None => self.next_delay(attempt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Duration);

    impl BackoffStrategy for Fixed {
        fn next_delay(&self, _attempt: u32) -> Duration {
            self.0
        }

        fn max_delay(&self) -> Duration {
            Duration::from_secs(2)
        }
    }

    #[test]
    fn test_hint_preferred_and_clamped() {
        let strategy = Fixed(Duration::from_millis(100));

        assert_eq!(strategy.delay_for(1, None), Duration::from_millis(100));
        assert_eq!(
            strategy.delay_for(1, Some(Duration::from_millis(700))),
            Duration::from_millis(700)
        );
        assert_eq!(
            strategy.delay_for(1, Some(Duration::from_secs(120))),
            Duration::from_secs(2)
        );
    }
}
