//! Structured logging for requests passing through the executor.
//!
//! Every URL handed to these helpers is already redacted.

use contentkit_core::diagnostics::redact_url;
use contentkit_core::error::ClassifiedError;
use contentkit_core::method::Method;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Request metadata for structured logging
#[derive(Debug, Clone)]
pub struct RequestMetadata {
    /// HTTP method
    pub method: Method,
    /// Request URL with the query string redacted
    pub url: String,
    /// Request body size in bytes (optional)
    pub body_size: Option<usize>,
}

impl RequestMetadata {
    /// Create request metadata, redacting the URL's query string.
    pub fn new(method: Method, url: &str) -> Self {
        Self {
            method,
            url: redact_url(url),
            body_size: None,
        }
    }

    /// Set the request body size
    pub fn with_body_size(mut self, size: Option<usize>) -> Self {
        self.body_size = size;
        self
    }

    /// Log an attempt being sent
    pub fn log_attempt(&self, attempt: u32, max_attempts: u32) {
        debug!(
            method = %self.method,
            url = %self.url,
            body_size = self.body_size,
            attempt,
            max_attempts,
            "Sending HTTP request"
        );
    }

    /// Log a retry about to happen
    pub fn log_retry(&self, attempt: u32, delay: Duration, error: &ClassifiedError) {
        warn!(
            method = %self.method,
            url = %self.url,
            attempt,
            delay_ms = delay.as_millis() as u64,
            code = error.code(),
            status = error.status(),
            error = %error,
            "Retrying HTTP request"
        );
    }

    /// Log a retryable failure that the policy refused to repeat
    pub fn log_retry_skipped(&self, error: &ClassifiedError) {
        warn!(
            method = %self.method,
            url = %self.url,
            code = error.code(),
            status = error.status(),
            "Retry skipped: no idempotency key"
        );
    }
}

/// Response metadata for structured logging
#[derive(Debug, Clone)]
pub struct ResponseMetadata {
    /// HTTP status code, when a response was received
    pub status: Option<u16>,
    /// Time elapsed across all attempts
    pub elapsed: Duration,
    /// Number of retries taken
    pub retries: u32,
}

impl ResponseMetadata {
    /// Create new response metadata
    pub fn new(status: Option<u16>, elapsed: Duration) -> Self {
        Self {
            status,
            elapsed,
            retries: 0,
        }
    }

    /// Set the number of retries
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Log successful response
    pub fn log_success(&self, request: &RequestMetadata, request_id: Option<&str>) {
        info!(
            method = %request.method,
            url = %request.url,
            status = self.status,
            elapsed_ms = self.elapsed.as_millis() as u64,
            retries = self.retries,
            request_id,
            "HTTP request succeeded"
        );
    }

    /// Log final failure
    pub fn log_error(&self, request: &RequestMetadata, error: &ClassifiedError) {
        warn!(
            method = %request.method,
            url = %request.url,
            status = self.status,
            elapsed_ms = self.elapsed.as_millis() as u64,
            retries = self.retries,
            code = error.code(),
            error = %error,
            "HTTP request failed"
        );
    }
}

/// Timer for measuring request duration
pub struct RequestTimer {
    start: Instant,
}

impl RequestTimer {
    /// Start a new timer
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}
