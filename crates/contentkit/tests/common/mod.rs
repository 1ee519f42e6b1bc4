//! Common test utilities and helpers

use async_trait::async_trait;
use contentkit::content::{ContentApi, StatusValue, WriteOptions};
use contentkit::{ApiResponse, ClassifiedError, Client, ErrorKind, Result};
use contentkit_core::diagnostics::NullSink;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::MockServer;

/// Create a test API key
#[allow(dead_code)]
pub fn test_api_key() -> String {
    "ck-test-key-0123456789abcdef".to_string()
}

/// Client pointed at a mock server, with short backoff.
///
/// Content API lives under `/api/v1/`, management API under `/mgmt/v1/`.
#[allow(dead_code)]
pub fn client_for(server: &MockServer) -> Client {
    builder_for(server).build().expect("Failed to build client")
}

/// Builder pointed at a mock server, for tests that tweak settings.
#[allow(dead_code)]
pub fn builder_for(server: &MockServer) -> contentkit::ClientBuilder {
    Client::builder()
        .api_key(test_api_key())
        .base_url(format!("{}/api/v1/", server.uri()))
        .management_base_url(format!("{}/mgmt/v1/", server.uri()))
        .retry_max_delay(Duration::from_millis(20))
        .diagnostics(Arc::new(NullSink))
}

/// Path of a fixture file
#[allow(dead_code)]
pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// A page body in list-response shape, items `item-{start}..item-{end}`.
#[allow(dead_code)]
pub fn page_body(start: u64, end: u64, total: u64) -> Value {
    let contents: Vec<Value> = (start..end)
        .map(|i| json!({"id": format!("item-{}", i), "title": format!("Title {}", i)}))
        .collect();
    json!({"contents": contents, "totalCount": total, "offset": start, "limit": end - start})
}

/// One recorded call against [`FakeContentApi`].
#[derive(Debug, Clone, PartialEq)]
#[allow(dead_code)]
pub struct Call {
    pub action: &'static str,
    pub endpoint: String,
    pub id: Option<String>,
}

/// In-memory content API. Ids listed in `missing` answer 404; everything
/// else succeeds. Creates without an id get `created-{n}`.
#[derive(Debug, Default, Clone)]
#[allow(dead_code)]
pub struct FakeContentApi {
    pub calls: Arc<Mutex<Vec<Call>>>,
    pub missing: Vec<String>,
}

#[allow(dead_code)]
impl FakeContentApi {
    pub fn with_missing(ids: &[&str]) -> Self {
        Self {
            missing: ids.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, action: &'static str, endpoint: &str, id: Option<&str>) -> Result<()> {
        let mut calls = self.calls.lock().unwrap();
        calls.push(Call {
            action,
            endpoint: endpoint.to_string(),
            id: id.map(str::to_string),
        });
        match id {
            Some(id) if self.missing.iter().any(|m| m == id) => Err(ClassifiedError::new(
                ErrorKind::NotFound,
                format!("{} not found", id),
            )
            .with_status(404)),
            _ => Ok(()),
        }
    }

    fn ok(data: Value) -> ApiResponse<Value> {
        ApiResponse {
            data,
            request_id: None,
            status: 200,
        }
    }
}

#[async_trait]
impl ContentApi for FakeContentApi {
    async fn create(
        &self,
        endpoint: &str,
        _payload: &Value,
        options: &WriteOptions,
    ) -> Result<ApiResponse<Value>> {
        self.record("create", endpoint, options.id.as_deref())?;
        let id = options
            .id
            .clone()
            .unwrap_or_else(|| format!("created-{}", self.calls.lock().unwrap().len()));
        Ok(Self::ok(json!({"id": id})))
    }

    async fn update(
        &self,
        endpoint: &str,
        id: &str,
        _payload: &Value,
        _options: &WriteOptions,
    ) -> Result<ApiResponse<Value>> {
        self.record("update", endpoint, Some(id))?;
        Ok(Self::ok(json!({"id": id})))
    }

    async fn delete(&self, endpoint: &str, id: &str) -> Result<ApiResponse<Value>> {
        self.record("delete", endpoint, Some(id))?;
        Ok(Self::ok(Value::Null))
    }

    async fn set_status(
        &self,
        endpoint: &str,
        id: &str,
        _status: StatusValue,
    ) -> Result<ApiResponse<Value>> {
        self.record("status", endpoint, Some(id))?;
        Ok(Self::ok(json!({"id": id})))
    }
}
