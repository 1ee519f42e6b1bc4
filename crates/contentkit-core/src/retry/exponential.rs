//! Exponential backoff with additive jitter.

use super::strategy::BackoffStrategy;
use std::time::Duration;

/// Default delay after the first failed attempt.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(250);

/// Default upper bound of the random jitter added to each delay.
pub const DEFAULT_JITTER: Duration = Duration::from_millis(100);

/// Default ceiling for any single delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(3);

/// Exponential backoff strategy with additive jitter.
///
/// # Mathematical Formula
///
/// For attempt `n` (1-based, the attempt that just failed):
/// ```text
/// base_delay  = initial_delay * multiplier^(n - 1)
/// jitter      = random in [0, jitter)
/// final_delay = min(base_delay + jitter, max_delay)
/// ```
///
/// With the defaults this is `250ms, 500ms, 1s, 2s, ...` plus up to 100ms of
/// jitter, never more than `max_delay`.
///
/// # Examples
///
/// ```rust
/// use contentkit_core::retry::{BackoffStrategy, ExponentialBackoff};
/// use std::time::Duration;
///
/// let backoff = ExponentialBackoff::builder()
///     .max_delay(Duration::from_secs(1))
///     .build();
///
/// let delay = backoff.next_delay(1);
/// assert!(delay >= Duration::from_millis(250));
/// assert!(delay < Duration::from_millis(350));
/// assert_eq!(backoff.next_delay(10), Duration::from_secs(1));
/// ```
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    initial_delay: Duration,
    max_delay: Duration,
    multiplier: f64,
    jitter: Duration,
}

impl ExponentialBackoff {
    /// Create a new builder for configuring exponential backoff.
    pub fn builder() -> ExponentialBackoffBuilder {
        ExponentialBackoffBuilder::default()
    }
}

impl Default for ExponentialBackoff {
    /// Defaults:
    /// - `initial_delay`: 250ms
    /// - `max_delay`: 3s
    /// - `multiplier`: 2.0
    /// - `jitter`: up to 100ms
    fn default() -> Self {
        Self {
            initial_delay: DEFAULT_INITIAL_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            multiplier: 2.0,
            jitter: DEFAULT_JITTER,
        }
    }
}

impl BackoffStrategy for ExponentialBackoff {
    fn next_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let base_ms = self.initial_delay.as_secs_f64() * 1000.0 * self.multiplier.powi(exponent);

        let jitter_ms = if self.jitter.is_zero() {
            0.0
        } else {
            rand::random::<f64>() * self.jitter.as_secs_f64() * 1000.0
        };

        // The negated comparison also catches an infinite base for very large attempts
        let total_ms = base_ms + jitter_ms;
        if !(total_ms < self.max_delay.as_secs_f64() * 1000.0) {
            return self.max_delay;
        }
        Duration::from_secs_f64(total_ms.max(0.0) / 1000.0).min(self.max_delay)
    }

    fn max_delay(&self) -> Duration {
        self.max_delay
    }
}

/// Builder for configuring [`ExponentialBackoff`].
///
/// # Examples
///
/// ```rust
/// use contentkit_core::retry::ExponentialBackoff;
/// use std::time::Duration;
///
/// let backoff = ExponentialBackoff::builder()
///     .initial_delay(Duration::from_millis(100))
///     .max_delay(Duration::from_secs(30))
///     .multiplier(1.5)
///     .jitter(Duration::from_millis(20))
///     .build();
/// ```
#[derive(Debug, Default)]
pub struct ExponentialBackoffBuilder {
    initial_delay: Option<Duration>,
    max_delay: Option<Duration>,
    multiplier: Option<f64>,
    jitter: Option<Duration>,
}

impl ExponentialBackoffBuilder {
    /// Set the delay after the first failed attempt.
    ///
    /// Default: 250ms
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = Some(delay);
        self
    }

    /// Set the ceiling for any single delay.
    ///
    /// Default: 3s
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = Some(delay);
        self
    }

    /// Set the exponential multiplier. Values below 1.0 are raised to 1.0.
    ///
    /// Default: 2.0
    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = Some(multiplier.max(1.0));
        self
    }

    /// Set the exclusive upper bound of the random jitter.
    ///
    /// Default: 100ms. `Duration::ZERO` disables jitter.
    pub fn jitter(mut self, jitter: Duration) -> Self {
        self.jitter = Some(jitter);
        self
    }

    /// Build the `ExponentialBackoff` instance.
    ///
    /// Uses default values for any unset parameters.
    pub fn build(self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_delay: self.initial_delay.unwrap_or(DEFAULT_INITIAL_DELAY),
            max_delay: self.max_delay.unwrap_or(DEFAULT_MAX_DELAY),
            multiplier: self.multiplier.unwrap_or(2.0),
            jitter: self.jitter.unwrap_or(DEFAULT_JITTER),
        }
    }
}
