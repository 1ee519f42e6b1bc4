//! Retry-aware request execution.
//!
//! [`RequestExecutor`] owns every retry decision. By the time an error leaves
//! [`RequestExecutor::execute`] it is final: retries were either exhausted or
//! not allowed, and the error carries [`RetryDiagnostics`] saying which.

use crate::classify::{classify_response, classify_transport_error};
use crate::observability::{RequestMetadata, RequestTimer, ResponseMetadata};
use crate::traits::{ApiResponse, HttpResponse, RequestDescriptor, Transport};
use contentkit_core::diagnostics::{DiagnosticsSink, NullSink};
use contentkit_core::error::{ClassifiedError, Result};
use contentkit_core::retry::{
    BackoffStrategy, DEFAULT_INITIAL_DELAY, DEFAULT_JITTER, ExponentialBackoff, RetryDiagnostics,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Runs logical requests over a [`Transport`], one physical attempt at a time.
///
/// # Algorithm
///
/// 1. `max_attempts = budget + 1` when the [`RetryPolicy`] allows retries,
///    otherwise 1.
/// 2. Each attempt runs under the descriptor's timeout. Expiry drops the
///    in-flight attempt and counts as a retryable `NetworkError`.
/// 3. A 2xx response returns immediately. Anything else is classified.
/// 4. Retryable failures with attempts left sleep for the `Retry-After` hint
///    (clamped) or the exponential backoff delay, then try again.
/// 5. Otherwise the error gets retry diagnostics attached and is returned.
///
/// [`RetryPolicy`]: contentkit_core::retry::RetryPolicy
///
/// # Example
///
/// ```rust,no_run
/// use contentkit_core::method::Method;
/// use contentkit_transport::{HttpTransport, RequestDescriptor, RequestExecutor};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let executor = RequestExecutor::new(Arc::new(HttpTransport::new()?));
/// let request = RequestDescriptor::builder(
///     Method::Get,
///     "https://svc.example.com/api/v1/blogs".parse()?,
/// )
/// .build();
///
/// let response = executor.execute(&request).await?;
/// println!("{:?} {}", response.request_id, response.data);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RequestExecutor {
    transport: Arc<dyn Transport>,
    diagnostics: Arc<dyn DiagnosticsSink>,
    verbose: bool,
    initial_delay: Duration,
    jitter: Duration,
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("verbose", &self.verbose)
            .field("initial_delay", &self.initial_delay)
            .field("jitter", &self.jitter)
            .finish_non_exhaustive()
    }
}

impl RequestExecutor {
    /// Create an executor with the default backoff and no diagnostics.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            diagnostics: Arc::new(NullSink),
            verbose: false,
            initial_delay: DEFAULT_INITIAL_DELAY,
            jitter: DEFAULT_JITTER,
        }
    }

    /// Report retries to `sink` when `verbose` is set.
    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticsSink>, verbose: bool) -> Self {
        self.diagnostics = sink;
        self.verbose = verbose;
        self
    }

    /// Override the delay after the first failure (default 250ms).
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Override the jitter upper bound (default 100ms).
    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    fn backoff_for(&self, request: &RequestDescriptor) -> ExponentialBackoff {
        ExponentialBackoff::builder()
            .initial_delay(self.initial_delay)
            .jitter(self.jitter)
            .max_delay(request.retry_max_delay())
            .build()
    }

    /// Execute a request and decode the body as JSON.
    ///
    /// An empty success body decodes to `Value::Null`.
    pub async fn execute(&self, request: &RequestDescriptor) -> Result<ApiResponse<Value>> {
        let policy = request.retry_policy();
        let max_attempts = policy.max_attempts(request.retry_budget());
        let backoff = self.backoff_for(request);
        let metadata = RequestMetadata::new(request.method(), request.url().as_str())
            .with_body_size(request.body().map(|b| b.len()));
        let timer = RequestTimer::start();

        let mut attempt = 1;
        loop {
            metadata.log_attempt(attempt, max_attempts);

            let error = match self.attempt(request).await {
                Ok(response) => {
                    ResponseMetadata::new(Some(response.status), timer.elapsed())
                        .with_retries(attempt - 1)
                        .log_success(&metadata, response.request_id.as_deref());
                    return Ok(response);
                }
                Err(error) => error,
            };

            if error.is_retryable() && attempt < max_attempts {
                let delay = backoff.delay_for(attempt, error.retry_after());
                metadata.log_retry(attempt, delay, &error);
                if self.verbose {
                    self.diagnostics.emit(&format!(
                        "retry {}/{} for {} {} in {}ms ({}: {})",
                        attempt,
                        max_attempts - 1,
                        metadata.method,
                        metadata.url,
                        delay.as_millis(),
                        error.code(),
                        error
                    ));
                }
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            if error.is_retryable() && !policy.allowed {
                metadata.log_retry_skipped(&error);
                if self.verbose {
                    self.diagnostics.emit(&format!(
                        "retry skipped: no idempotency key for {} {} ({}: {})",
                        metadata.method,
                        metadata.url,
                        error.code(),
                        error
                    ));
                }
            }

            let error = error.with_retry_diagnostics(RetryDiagnostics {
                attempts: attempt,
                retries_used: attempt - 1,
                max_attempts,
                policy,
            });
            ResponseMetadata::new(error.status(), timer.elapsed())
                .with_retries(attempt - 1)
                .log_error(&metadata, &error);
            return Err(error);
        }
    }

    /// Execute a request and decode the body into `T`.
    ///
    /// A body that does not match `T` is a non-retryable `ApiError`.
    pub async fn execute_json<T: DeserializeOwned>(
        &self,
        request: &RequestDescriptor,
    ) -> Result<ApiResponse<T>> {
        let response = self.execute(request).await?;
        let request_id = response.request_id.clone();
        let status = response.status;
        match serde_json::from_value::<T>(response.data) {
            Ok(data) => Ok(ApiResponse {
                data,
                request_id,
                status,
            }),
            Err(e) => Err(ClassifiedError::api(format!("unexpected response shape: {}", e))
                .with_status(status)
                .with_request_id(request_id)),
        }
    }

    async fn attempt(&self, request: &RequestDescriptor) -> Result<ApiResponse<Value>> {
        let timeout = request.timeout();
        let response = match tokio::time::timeout(timeout, self.transport.send(request)).await {
            Err(_elapsed) => {
                return Err(ClassifiedError::network(format!(
                    "request timed out after {}ms",
                    timeout.as_millis()
                )));
            }
            Ok(Err(transport_error)) => return Err(classify_transport_error(&transport_error)),
            Ok(Ok(response)) => response,
        };

        if response.is_success() {
            decode_success(response)
        } else {
            Err(classify_response(&response, request.retry_max_delay()))
        }
    }
}

fn decode_success(response: HttpResponse) -> Result<ApiResponse<Value>> {
    let request_id = response.request_id();
    let data = if response.body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice(&response.body).map_err(|e| {
            ClassifiedError::api(format!("response body is not valid JSON: {}", e))
                .with_status(response.status)
                .with_request_id(request_id.clone())
        })?
    };

    Ok(ApiResponse {
        data,
        request_id,
        status: response.status,
    })
}
