//! HTTP transport client implementation
//!
//! Implements the [`Transport`] trait over `reqwest`. Each call is exactly one
//! physical attempt; retries and timeouts belong to the executor.

use crate::error::{Result, TransportError};
use crate::traits::{HttpResponse, RequestDescriptor, Transport};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use std::sync::Arc;
use std::time::Duration;

/// HTTP transport implementation
///
/// Handles:
/// - Connection pooling
/// - Connect timeouts
/// - Optional proxying
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Arc<ReqwestClient>,
}

impl HttpTransport {
    /// Create a new HTTP transport with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(Default::default())
    }

    /// Create a new HTTP transport with custom configuration
    pub fn with_config(config: HttpTransportConfig) -> Result<Self> {
        let mut builder = ReqwestClient::builder()
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .user_agent(config.user_agent);

        if let Some(proxy) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| TransportError::InvalidRequest(format!("invalid proxy: {}", e)))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        Ok(Self {
            client: Arc::new(client),
        })
    }

    /// Get a reference to the underlying reqwest client
    pub fn reqwest_client(&self) -> Arc<ReqwestClient> {
        self.client.clone()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &RequestDescriptor) -> Result<HttpResponse> {
        let method: http::Method = request.method().into();
        let mut req = self
            .client
            .request(method, request.url().clone())
            .headers(request.headers().clone());

        if let Some(body) = request.body() {
            req = req.body(body.clone());
        }

        let response = req.send().await?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(HttpResponse::new(status, headers, body))
    }
}

/// HTTP transport configuration
#[derive(Clone, Debug)]
pub struct HttpTransportConfig {
    /// Connection timeout
    pub connect_timeout: Duration,

    /// Maximum idle connections per host
    pub pool_max_idle_per_host: usize,

    /// `User-Agent` header value
    pub user_agent: String,

    /// HTTP proxy URL
    pub proxy: Option<String>,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            pool_max_idle_per_host: 10,
            user_agent: format!("contentkit/{}", env!("CARGO_PKG_VERSION")),
            proxy: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_transport_creation() {
        assert!(HttpTransport::new().is_ok());
    }

    #[test]
    fn test_http_transport_with_config() {
        let config = HttpTransportConfig {
            connect_timeout: Duration::from_secs(5),
            pool_max_idle_per_host: 2,
            user_agent: "test-agent".to_string(),
            proxy: Some("http://127.0.0.1:3128".to_string()),
        };

        assert!(HttpTransport::with_config(config).is_ok());
    }
}
