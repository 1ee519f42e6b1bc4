//! Error taxonomy shared by every contentkit crate.
//!
//! Every failure that leaves the core is a [`ClassifiedError`]: a closed
//! [`ErrorKind`], a human-readable message, a retryable flag and optional
//! structured detail. The kind determines the stable error code and the
//! process exit code the outer CLI reports.

mod boundary;

use crate::retry::RetryDiagnostics;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for operations that fail with a [`ClassifiedError`].
pub type Result<T> = std::result::Result<T, ClassifiedError>;

/// Closed set of error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Caller supplied something unusable (bad flags, bad payload, bad file).
    InvalidInput,
    /// 401 from the API.
    AuthFailed,
    /// 403 from the API.
    Forbidden,
    /// Transport failure, timeout, or a throttling-style status (408/425/429).
    NetworkError,
    /// 409 from the API.
    Conflict,
    /// 404 from the API.
    NotFound,
    /// Any other non-success response, or a response of the wrong shape.
    ApiError,
    /// Anything that could not be classified.
    UnknownError,
}

impl ErrorKind {
    /// Stable machine-readable code, e.g. `NETWORK_ERROR`.
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "INVALID_INPUT",
            ErrorKind::AuthFailed => "AUTH_FAILED",
            ErrorKind::Forbidden => "FORBIDDEN",
            ErrorKind::NetworkError => "NETWORK_ERROR",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::ApiError => "API_ERROR",
            ErrorKind::UnknownError => "UNKNOWN_ERROR",
        }
    }

    /// Retryability a freshly constructed error of this kind starts with.
    ///
    /// Only `NetworkError` is retryable by construction; 5xx `ApiError`s are
    /// marked retryable by the classifier.
    pub fn default_retryable(self) -> bool {
        matches!(self, ErrorKind::NetworkError)
    }

    /// Process exit code for this kind.
    ///
    /// `ApiError` is the only context-dependent kind: retryable (5xx) API
    /// errors exit with 5, everything else with 1.
    pub fn exit_code(self, retryable: bool) -> i32 {
        match self {
            ErrorKind::InvalidInput => 2,
            ErrorKind::AuthFailed => 3,
            ErrorKind::Forbidden => 4,
            ErrorKind::NetworkError => 5,
            ErrorKind::Conflict => 6,
            ErrorKind::NotFound => 2,
            ErrorKind::ApiError if retryable => 5,
            ErrorKind::ApiError => 1,
            ErrorKind::UnknownError => 1,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A failure with its kind, retryability and structured detail.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ClassifiedError {
    kind: ErrorKind,
    message: String,
    retryable: bool,
    status: Option<u16>,
    request_id: Option<String>,
    retry_after: Option<Duration>,
    body: Option<Value>,
    context: Map<String, Value>,
    retry: Option<RetryDiagnostics>,
    details_always_visible: bool,
}

impl ClassifiedError {
    /// Create an error of the given kind with the kind's default retryability.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable: kind.default_retryable(),
            status: None,
            request_id: None,
            retry_after: None,
            body: None,
            context: Map::new(),
            retry: None,
            details_always_visible: false,
        }
    }

    /// Shorthand for an `InvalidInput` error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    /// Shorthand for a retryable `NetworkError`.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NetworkError, message)
    }

    /// Shorthand for a non-retryable `ApiError`.
    pub fn api(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ApiError, message)
    }

    /// Shorthand for an `UnknownError`.
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownError, message)
    }

    /// A payload-validation failure.
    ///
    /// Its details are rendered even when the caller did not ask for verbose
    /// output, since they are needed to fix the input.
    pub fn validation(message: impl Into<String>, details: Value) -> Self {
        let mut err = Self::invalid_input(message);
        err.body = Some(details);
        err.details_always_visible = true;
        err
    }

    /// Override the retryable flag.
    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    /// Attach the HTTP status that produced this error.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Attach the server request id.
    pub fn with_request_id(mut self, request_id: Option<String>) -> Self {
        self.request_id = request_id;
        self
    }

    /// Attach a parsed `Retry-After` hint.
    pub fn with_retry_after(mut self, retry_after: Option<Duration>) -> Self {
        self.retry_after = retry_after;
        self
    }

    /// Attach the raw response body.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Add one key to the structured detail, e.g. the page or operation index
    /// a failure happened at.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Attach the executor's retry bookkeeping.
    pub fn with_retry_diagnostics(mut self, retry: RetryDiagnostics) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Prefix the message, keeping kind and detail.
    pub fn context(mut self, context: impl fmt::Display) -> Self {
        self.message = format!("{}: {}", context, self.message);
        self
    }

    /// Error kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Stable error code string.
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether another attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        self.retryable
    }

    /// HTTP status, when the error came from a response.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Server request id, when the response carried one.
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// Parsed and clamped `Retry-After` hint.
    pub fn retry_after(&self) -> Option<Duration> {
        self.retry_after
    }

    /// Retry bookkeeping attached by the executor.
    pub fn retry_diagnostics(&self) -> Option<&RetryDiagnostics> {
        self.retry.as_ref()
    }

    /// Look up one structured detail key.
    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.context
            .get(key)
            .or_else(|| self.body.as_ref().and_then(|body| body.get(key)))
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        self.kind.exit_code(self.retryable)
    }

    /// Structured detail: the response body merged with status, request id,
    /// retry hint, context keys and retry diagnostics.
    ///
    /// Returns `None` when there is nothing to report.
    pub fn details(&self) -> Option<Value> {
        let mut merged = match &self.body {
            Some(Value::Object(map)) => map.clone(),
            Some(Value::Null) | None => Map::new(),
            Some(other) => {
                let mut map = Map::new();
                map.insert("body".to_string(), other.clone());
                map
            }
        };

        if let Some(status) = self.status {
            merged.insert("status".to_string(), Value::from(status));
        }
        if let Some(request_id) = &self.request_id {
            merged.insert("requestId".to_string(), Value::from(request_id.clone()));
        }
        if let Some(retry_after) = self.retry_after {
            merged.insert(
                "retryAfterMs".to_string(),
                Value::from(retry_after.as_millis() as u64),
            );
        }
        for (key, value) in &self.context {
            merged.insert(key.clone(), value.clone());
        }
        if let Some(retry) = &self.retry
            && let Ok(value) = serde_json::to_value(retry)
        {
            merged.insert("retry".to_string(), value);
        }

        if merged.is_empty() {
            None
        } else {
            Some(Value::Object(merged))
        }
    }

    /// Render the error for the output layer.
    ///
    /// Details are included only when `verbose` is set, except for payload
    /// validation failures which always carry them.
    pub fn to_payload(&self, verbose: bool) -> ErrorPayload {
        let details = if verbose || self.details_always_visible {
            self.details()
        } else {
            None
        };

        ErrorPayload {
            code: self.kind,
            message: self.message.clone(),
            retryable: self.retryable,
            details,
        }
    }
}

/// Wire shape of an error handed to the render layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorPayload {
    /// Stable code.
    pub code: ErrorKind,
    /// Human-readable message.
    pub message: String,
    /// Whether another attempt could succeed.
    pub retryable: bool,
    /// Structured detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::{RetryPolicy, RetryReason};
    use serde_json::json;

    #[test]
    fn test_exit_codes() {
        assert_eq!(ErrorKind::InvalidInput.exit_code(false), 2);
        assert_eq!(ErrorKind::AuthFailed.exit_code(false), 3);
        assert_eq!(ErrorKind::Forbidden.exit_code(false), 4);
        assert_eq!(ErrorKind::NetworkError.exit_code(true), 5);
        assert_eq!(ErrorKind::Conflict.exit_code(false), 6);
        assert_eq!(ErrorKind::NotFound.exit_code(false), 2);
        assert_eq!(ErrorKind::ApiError.exit_code(true), 5);
        assert_eq!(ErrorKind::ApiError.exit_code(false), 1);
        assert_eq!(ErrorKind::UnknownError.exit_code(false), 1);
    }

    #[test]
    fn test_default_retryable() {
        assert!(ClassifiedError::network("reset").is_retryable());
        assert!(!ClassifiedError::api("bad").is_retryable());
        assert!(!ClassifiedError::unknown("?").is_retryable());
        assert!(!ClassifiedError::invalid_input("no").is_retryable());
    }

    #[test]
    fn test_code_serialization() {
        let value = serde_json::to_value(ErrorKind::NetworkError).unwrap();
        assert_eq!(value, json!("NETWORK_ERROR"));
        assert_eq!(ErrorKind::AuthFailed.to_string(), "AUTH_FAILED");
    }

    #[test]
    fn test_details_merge_body_and_metadata() {
        let err = ClassifiedError::api("boom")
            .with_status(500)
            .with_retryable(true)
            .with_request_id(Some("req-1".into()))
            .with_retry_after(Some(Duration::from_millis(1500)))
            .with_body(json!({"message": "boom", "code": "E1"}))
            .with_detail("offset", 200);

        let details = err.details().unwrap();
        assert_eq!(details["message"], "boom");
        assert_eq!(details["code"], "E1");
        assert_eq!(details["status"], 500);
        assert_eq!(details["requestId"], "req-1");
        assert_eq!(details["retryAfterMs"], 1500);
        assert_eq!(details["offset"], 200);
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn test_non_object_body_is_nested() {
        let err = ClassifiedError::api("bad gateway").with_body(json!("<html>502</html>"));
        assert_eq!(err.details().unwrap()["body"], "<html>502</html>");
    }

    #[test]
    fn test_payload_hides_details_unless_verbose() {
        let err = ClassifiedError::api("boom").with_status(418);

        assert!(err.to_payload(false).details.is_none());
        assert_eq!(err.to_payload(true).details.unwrap()["status"], 418);
    }

    #[test]
    fn test_validation_details_always_visible() {
        let err = ClassifiedError::validation(
            "payload validation failed",
            json!({"errors": ["title is required"]}),
        );

        let payload = err.to_payload(false);
        assert_eq!(payload.code, ErrorKind::InvalidInput);
        assert_eq!(payload.details.unwrap()["errors"][0], "title is required");
    }

    #[test]
    fn test_retry_diagnostics_in_details() {
        let err = ClassifiedError::network("timed out").with_retry_diagnostics(RetryDiagnostics {
            attempts: 3,
            retries_used: 2,
            max_attempts: 3,
            policy: RetryPolicy {
                allowed: true,
                reason: RetryReason::SafeMethod,
            },
        });

        let details = err.details().unwrap();
        assert_eq!(details["retry"]["retriesUsed"], 2);
        assert_eq!(details["retry"]["policy"]["reason"], "safe_method");
    }

    #[test]
    fn test_context_prefixes_message() {
        let err = ClassifiedError::api("HTTP 500").context("operations[2]");
        assert_eq!(err.to_string(), "operations[2]: HTTP 500");
        assert_eq!(err.kind(), ErrorKind::ApiError);
    }

    #[test]
    fn test_empty_details() {
        assert!(ClassifiedError::unknown("x").details().is_none());
    }
}
