//! Structured logging for fetch-all, bulk runs and validation.
//!
//! Per-request logging lives in `contentkit_transport::observability`; this
//! module covers the layers above it.

use crate::validation::Severity;
use contentkit_core::error::ClassifiedError;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Install a `tracing` subscriber writing to stderr.
///
/// `RUST_LOG` wins when set; otherwise contentkit crates log at `debug` when
/// `verbose` and `info` when not.
///
/// # Errors
///
/// Returns an `UnknownError` if a global subscriber is already installed.
#[cfg(feature = "trace")]
pub fn init_tracing(verbose: bool) -> contentkit_core::error::Result<()> {
    use tracing_subscriber::EnvFilter;

    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "contentkit={lvl},contentkit_transport={lvl},contentkit_core={lvl}",
            lvl = default_level
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| ClassifiedError::unknown(format!("failed to install tracing subscriber: {}", e)))
}

/// Progress of one fetch-all call.
#[derive(Debug)]
pub struct FetchProgress {
    endpoint: String,
    start: Instant,
}

impl FetchProgress {
    /// Start tracking a fetch-all over `endpoint`.
    pub fn new(endpoint: &str) -> Self {
        debug!(endpoint, "Starting fetch-all");
        Self {
            endpoint: endpoint.to_string(),
            start: Instant::now(),
        }
    }

    /// Log one fetched page
    pub fn log_page(&self, page: u32, offset: u64, returned: usize, total_count: u64) {
        debug!(
            endpoint = %self.endpoint,
            page,
            offset,
            returned,
            total_count,
            "Fetched page"
        );
    }

    /// Log completion
    pub fn log_complete(&self, pages: u32, items: usize) {
        info!(
            endpoint = %self.endpoint,
            pages,
            items,
            elapsed_ms = self.elapsed().as_millis() as u64,
            "Fetch-all complete"
        );
    }

    /// Time since start
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Log the outcome of one bulk operation.
pub fn log_bulk_item(index: usize, total: usize, action: &str, endpoint: &str, error: Option<&ClassifiedError>) {
    match error {
        None => info!(index, total, action, endpoint, "Bulk operation succeeded"),
        Some(err) => warn!(
            index,
            total,
            action,
            endpoint,
            code = err.code(),
            status = err.status(),
            error = %err,
            "Bulk operation failed"
        ),
    }
}

/// Log a validation issue
pub fn log_validation_issue(severity: Severity, field: &str, message: &str) {
    debug!(?severity, field, message, "Validation issue");
}

/// Log validation completion for the operation at `index`
pub fn log_validation_complete(index: usize, errors: usize, warnings: usize) {
    debug!(index, errors, warnings, "Validation complete");
}
