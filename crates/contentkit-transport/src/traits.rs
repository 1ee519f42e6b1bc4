//! Request/response types and the transport trait.
//!
//! A [`RequestDescriptor`] describes one logical request; a [`Transport`]
//! performs one physical attempt of it. Retries live above the transport, in
//! [`RequestExecutor`](crate::executor::RequestExecutor).

use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use contentkit_core::error::ClassifiedError;
use contentkit_core::method::Method;
use contentkit_core::retry::{DEFAULT_MAX_DELAY, RetryPolicy};
use http::{HeaderMap, HeaderName, HeaderValue};
use std::time::Duration;
use url::Url;

/// Response header carrying the server's request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Response header carrying the server's retry hint.
pub const RETRY_AFTER_HEADER: &str = "retry-after";

/// Default per-attempt timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of retries after the first attempt.
pub const DEFAULT_RETRY_BUDGET: u32 = 2;

/// One logical request. Immutable once built.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Bytes>,
    timeout: Duration,
    retry_budget: u32,
    retry_max_delay: Duration,
}

impl RequestDescriptor {
    /// Start building a request.
    pub fn builder(method: Method, url: Url) -> RequestDescriptorBuilder {
        RequestDescriptorBuilder {
            descriptor: RequestDescriptor {
                method,
                url,
                headers: HeaderMap::new(),
                body: None,
                timeout: DEFAULT_TIMEOUT,
                retry_budget: DEFAULT_RETRY_BUDGET,
                retry_max_delay: DEFAULT_MAX_DELAY,
            },
        }
    }

    /// HTTP method.
    pub fn method(&self) -> Method {
        self.method
    }

    /// Target URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Request body, if any.
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Per-attempt timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Retries allowed after the first attempt.
    pub fn retry_budget(&self) -> u32 {
        self.retry_budget
    }

    /// Ceiling for any single backoff delay, server hints included.
    pub fn retry_max_delay(&self) -> Duration {
        self.retry_max_delay
    }

    /// Whether this request may be retried at all.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::evaluate(self.method, &self.headers)
    }
}

/// Builder for [`RequestDescriptor`].
#[derive(Debug, Clone)]
pub struct RequestDescriptorBuilder {
    descriptor: RequestDescriptor,
}

impl RequestDescriptorBuilder {
    /// Set a header.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidInput` error if the header name or value contains
    /// invalid characters.
    pub fn header(
        mut self,
        key: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> std::result::Result<Self, ClassifiedError> {
        let key_str = key.as_ref();
        let value_str = value.as_ref();

        let name = HeaderName::from_bytes(key_str.as_bytes()).map_err(|e| {
            ClassifiedError::invalid_input(format!("invalid header name '{}': {}", key_str, e))
        })?;
        let value = HeaderValue::from_str(value_str).map_err(|e| {
            ClassifiedError::invalid_input(format!("invalid header value for '{}': {}", key_str, e))
        })?;

        self.descriptor.headers.insert(name, value);
        Ok(self)
    }

    /// Merge a set of already-validated headers.
    pub fn headers(mut self, headers: &HeaderMap) -> Self {
        for (name, value) in headers {
            self.descriptor.headers.insert(name.clone(), value.clone());
        }
        self
    }

    /// Mark the request as safe to retry with the given idempotency key.
    pub fn idempotency_key(
        self,
        key: impl AsRef<str>,
    ) -> std::result::Result<Self, ClassifiedError> {
        self.header("Idempotency-Key", key)
    }

    /// Mark the request as safe to retry with a freshly generated UUID v4
    /// idempotency key.
    pub fn generated_idempotency_key(self) -> std::result::Result<Self, ClassifiedError> {
        let key = uuid::Uuid::new_v4().to_string();
        self.idempotency_key(key)
    }

    /// Set a raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.descriptor.body = Some(body.into());
        self
    }

    /// Serialize `value` as the JSON body and set `content-type`.
    pub fn json<T: serde::Serialize + ?Sized>(
        mut self,
        value: &T,
    ) -> std::result::Result<Self, ClassifiedError> {
        let bytes = serde_json::to_vec(value)?;
        self.descriptor.body = Some(Bytes::from(bytes));
        self.descriptor.headers.insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        Ok(self)
    }

    /// Set the per-attempt timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.descriptor.timeout = timeout;
        self
    }

    /// Set the number of retries after the first attempt.
    pub fn retry_budget(mut self, retry_budget: u32) -> Self {
        self.descriptor.retry_budget = retry_budget;
        self
    }

    /// Set the ceiling for any single backoff delay.
    pub fn retry_max_delay(mut self, max_delay: Duration) -> Self {
        self.descriptor.retry_max_delay = max_delay;
        self
    }

    /// Finish building.
    pub fn build(self) -> RequestDescriptor {
        self.descriptor
    }
}

/// Raw HTTP response from one physical attempt.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,

    /// Response headers
    pub headers: HeaderMap,

    /// Response body
    pub body: Bytes,
}

impl HttpResponse {
    /// Create a new HTTP response
    pub fn new(status: u16, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Check if response is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Get a header value by name (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Server request id from `x-request-id`.
    pub fn request_id(&self) -> Option<String> {
        self.header(REQUEST_ID_HEADER)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from)
    }

    /// Body as lossy UTF-8 text.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// A successful, decoded response.
///
/// The request id travels with the data so callers thread it explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    /// Decoded body.
    pub data: T,
    /// Server request id, if the response carried one.
    pub request_id: Option<String>,
    /// HTTP status code.
    pub status: u16,
}

impl<T> ApiResponse<T> {
    /// Transform the payload, keeping request id and status.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
        ApiResponse {
            data: f(self.data),
            request_id: self.request_id,
            status: self.status,
        }
    }
}

/// Performs one physical attempt of a request.
///
/// Implementations must not retry. The executor enforces the per-attempt
/// timeout by dropping the returned future, so implementations must be
/// cancel-safe.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request once and return whatever the server answered.
    async fn send(&self, request: &RequestDescriptor) -> Result<HttpResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use contentkit_core::retry::RetryReason;

    fn url() -> Url {
        Url::parse("https://svc.example.com/api/v1/blogs").unwrap()
    }

    #[test]
    fn test_builder_defaults() {
        let request = RequestDescriptor::builder(Method::Get, url()).build();

        assert_eq!(request.method(), Method::Get);
        assert_eq!(request.timeout(), DEFAULT_TIMEOUT);
        assert_eq!(request.retry_budget(), DEFAULT_RETRY_BUDGET);
        assert_eq!(request.retry_max_delay(), DEFAULT_MAX_DELAY);
        assert!(request.body().is_none());
    }

    #[test]
    fn test_json_body_sets_content_type() {
        let request = RequestDescriptor::builder(Method::Post, url())
            .json(&serde_json::json!({"title": "hello"}))
            .unwrap()
            .build();

        assert_eq!(
            request.headers().get("content-type").unwrap(),
            "application/json"
        );
        assert_eq!(request.body().unwrap().as_ref(), br#"{"title":"hello"}"#);
    }

    #[test]
    fn test_invalid_header_rejected() {
        let result = RequestDescriptor::builder(Method::Get, url()).header("bad header", "x");
        assert!(result.is_err());

        let result = RequestDescriptor::builder(Method::Get, url()).header("x-ok", "line\nbreak");
        assert!(result.is_err());
    }

    #[test]
    fn test_generated_idempotency_key_enables_retry() {
        let request = RequestDescriptor::builder(Method::Post, url())
            .generated_idempotency_key()
            .unwrap()
            .build();

        let key = request.headers().get("idempotency-key").unwrap();
        assert_eq!(key.len(), 36);
        assert_eq!(request.retry_policy().reason, RetryReason::IdempotencyKey);
    }

    #[test]
    fn test_response_request_id() {
        let mut headers = HeaderMap::new();
        headers.insert("x-request-id", HeaderValue::from_static("req_123"));
        let response = HttpResponse::new(200, headers, Bytes::new());

        assert!(response.is_success());
        assert_eq!(response.request_id().as_deref(), Some("req_123"));
    }

    #[test]
    fn test_api_response_map() {
        let response = ApiResponse {
            data: 2,
            request_id: Some("r".to_string()),
            status: 201,
        };
        let mapped = response.map(|n| n * 10);

        assert_eq!(mapped.data, 20);
        assert_eq!(mapped.request_id.as_deref(), Some("r"));
        assert_eq!(mapped.status, 201);
    }
}
