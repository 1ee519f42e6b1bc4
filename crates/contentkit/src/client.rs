//! Main client implementation for the content API

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use contentkit_core::diagnostics::{DiagnosticsSink, sink_for_output};
use contentkit_core::error::{ClassifiedError, Result};
use contentkit_core::method::Method;
use contentkit_transport::{
    ApiResponse, HttpTransport, HttpTransportConfig, RequestDescriptor, RequestDescriptorBuilder,
    RequestExecutor, Transport,
};
use http::HeaderMap;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use url::Url;

use crate::bulk::BulkRunner;
use crate::config::ClientConfig;
use crate::content::{ContentApi, StatusValue, WriteOptions};
use crate::pagination::{self, ContentPage, FetchLimits, ListQuery, PageFetcher};
use crate::validation::SchemaSource;

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "X-MICROCMS-API-KEY";

/// Host suffix of the content API.
pub const CONTENT_HOST: &str = "microcms.io";

/// Host suffix of the management API.
pub const MANAGEMENT_HOST: &str = "microcms-management.io";

/// Which API a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Api {
    Content,
    Management,
}

/// Main client for a content service.
///
/// Every call goes through one [`RequestExecutor`], so timeouts, retry policy
/// and backoff apply uniformly. Request ids come back in each
/// [`ApiResponse`]; the client itself holds no per-request state and is cheap
/// to clone.
///
/// # Example
///
/// ```rust,no_run
/// use contentkit::{Client, ListQuery};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = Client::new("my-blog", "api-key")?;
///
/// let everything = client.fetch_all(&ListQuery::new("blogs")).await?;
/// println!("{} of {}", everything.contents.len(), everything.total_count);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    executor: RequestExecutor,
    diagnostics: Arc<dyn DiagnosticsSink>,
    content_base: Url,
    management_base: Option<Url>,
    api_key: SecretString,
    default_headers: HeaderMap,
    timeout: Duration,
    max_retries: u32,
    retry_max_delay: Duration,
    limits: FetchLimits,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("content_base", &self.inner.content_base.as_str())
            .field(
                "management_base",
                &self.inner.management_base.as_ref().map(Url::as_str),
            )
            .field("timeout", &self.inner.timeout)
            .field("max_retries", &self.inner.max_retries)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Create a client for a service domain.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidInput` error if the domain or key is blank.
    pub fn new(service_domain: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        Self::from_config(ClientConfig::new(service_domain, api_key))
    }

    /// Create a new client builder for advanced configuration.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Create a client from a configuration object.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidInput` error when the API key is missing, when
    /// neither a service domain nor a base URL is set, or when a base URL is
    /// not a valid http(s) URL.
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        ClientBuilder::default().config(config).build()
    }

    /// Base URL of the content API, always ending in `/`.
    pub fn content_base_url(&self) -> &Url {
        &self.inner.content_base
    }

    /// Base URL of the management API, when one is configured.
    pub fn management_base_url(&self) -> Option<&Url> {
        self.inner.management_base.as_ref()
    }

    /// Fetch-all bounds derived from the configuration.
    pub fn limits(&self) -> FetchLimits {
        self.inner.limits
    }

    /// The executor all requests run through.
    pub fn executor(&self) -> &RequestExecutor {
        &self.inner.executor
    }

    /// List one page of an endpoint.
    pub async fn list(&self, query: &ListQuery) -> Result<ApiResponse<Value>> {
        let url = self.url(Api::Content, &[query.endpoint.as_str()], &query.query_pairs())?;
        self.send(self.request(Method::Get, url)?).await
    }

    /// Get one content item.
    pub async fn get(
        &self,
        endpoint: &str,
        id: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<ApiResponse<Value>> {
        let query: Vec<(String, String)> =
            params.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        let url = self.url(Api::Content, &[endpoint, id], &query)?;
        self.send(self.request(Method::Get, url)?).await
    }

    /// Create a content item: POST `<endpoint>`, or PUT `<endpoint>/<id>`
    /// when `options.id` is set.
    ///
    /// Retried on transient failures only when `options.idempotency_key` is
    /// set.
    pub async fn create(
        &self,
        endpoint: &str,
        payload: &Value,
        options: &WriteOptions,
    ) -> Result<ApiResponse<Value>> {
        let query = draft_query(options.draft);
        let (method, url) = match options.id.as_deref() {
            Some(id) => (Method::Put, self.url(Api::Content, &[endpoint, id], &query)?),
            None => (Method::Post, self.url(Api::Content, &[endpoint], &query)?),
        };
        let builder = self.write_request(method, url, payload, options)?;
        self.send(builder).await
    }

    /// Partially update a content item with PATCH `<endpoint>/<id>`.
    pub async fn update(
        &self,
        endpoint: &str,
        id: &str,
        payload: &Value,
        options: &WriteOptions,
    ) -> Result<ApiResponse<Value>> {
        let url = self.url(Api::Content, &[endpoint, id], &draft_query(options.draft))?;
        let builder = self.write_request(Method::Patch, url, payload, options)?;
        self.send(builder).await
    }

    /// Delete a content item. Never retried.
    pub async fn delete(&self, endpoint: &str, id: &str) -> Result<ApiResponse<Value>> {
        let url = self.url(Api::Content, &[endpoint, id], &[])?;
        self.send(self.request(Method::Delete, url)?).await
    }

    /// Change a content item's publication status through the management API.
    pub async fn set_status(
        &self,
        endpoint: &str,
        id: &str,
        status: StatusValue,
    ) -> Result<ApiResponse<Value>> {
        let url = self.url(Api::Management, &["contents", endpoint, id, "status"], &[])?;
        let builder = self
            .request(Method::Patch, url)?
            .json(&json!({ "status": [status.as_str()] }))?;
        self.send(builder).await
    }

    /// Fetch the schema of an endpoint from the management API.
    pub async fn schema(&self, endpoint: &str) -> Result<Value> {
        let url = self.url(Api::Management, &["apis", endpoint], &[])?;
        Ok(self.send(self.request(Method::Get, url)?).await?.data)
    }

    /// Fetch every item of an endpoint with the configured limits.
    ///
    /// See [`pagination::fetch_all`] for the consistency checks applied.
    pub async fn fetch_all(&self, query: &ListQuery) -> Result<ContentPage> {
        pagination::fetch_all(query, self, self.inner.limits).await
    }

    /// A bulk runner writing through this client, validating against its
    /// schemas and reporting progress to its diagnostics sink.
    pub fn bulk(&self) -> BulkRunner {
        BulkRunner::new(Arc::new(self.clone()))
            .with_schema_source(Arc::new(self.clone()))
            .with_diagnostics(self.inner.diagnostics.clone())
    }

    /// Resolve `segments` under the chosen API's base URL.
    ///
    /// Segments are percent-encoded, so ids containing `/` stay one segment.
    pub(crate) fn url(&self, api: Api, segments: &[&str], query: &[(String, String)]) -> Result<Url> {
        let mut url = match api {
            Api::Content => self.inner.content_base.clone(),
            Api::Management => self.inner.management_base.clone().ok_or_else(|| {
                ClassifiedError::invalid_input(
                    "management API is not configured: set a service domain or a management base URL",
                )
            })?,
        };

        if let Some(empty) = segments.iter().find(|s| s.trim().is_empty()) {
            return Err(ClassifiedError::invalid_input(format!(
                "path segment must not be empty (got '{}')",
                empty
            )));
        }

        url.path_segments_mut()
            .map_err(|_| ClassifiedError::invalid_input("base URL cannot carry path segments"))?
            .pop_if_empty()
            .extend(segments);

        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> Result<RequestDescriptorBuilder> {
        RequestDescriptor::builder(method, url)
            .headers(&self.inner.default_headers)
            .header(API_KEY_HEADER, self.inner.api_key.expose_secret())
            .map(|b| {
                b.timeout(self.inner.timeout)
                    .retry_budget(self.inner.max_retries)
                    .retry_max_delay(self.inner.retry_max_delay)
            })
    }

    fn write_request(
        &self,
        method: Method,
        url: Url,
        payload: &Value,
        options: &WriteOptions,
    ) -> Result<RequestDescriptorBuilder> {
        let builder = self.request(method, url)?.json(payload)?;
        match options.idempotency_key.as_deref() {
            Some(key) => builder.idempotency_key(key),
            None => Ok(builder),
        }
    }

    async fn send(&self, builder: RequestDescriptorBuilder) -> Result<ApiResponse<Value>> {
        self.inner.executor.execute(&builder.build()).await
    }
}

fn draft_query(draft: bool) -> Vec<(String, String)> {
    if draft {
        vec![("status".to_string(), "draft".to_string())]
    } else {
        Vec::new()
    }
}

#[async_trait]
impl ContentApi for Client {
    async fn create(
        &self,
        endpoint: &str,
        payload: &Value,
        options: &WriteOptions,
    ) -> Result<ApiResponse<Value>> {
        Client::create(self, endpoint, payload, options).await
    }

    async fn update(
        &self,
        endpoint: &str,
        id: &str,
        payload: &Value,
        options: &WriteOptions,
    ) -> Result<ApiResponse<Value>> {
        Client::update(self, endpoint, id, payload, options).await
    }

    async fn delete(&self, endpoint: &str, id: &str) -> Result<ApiResponse<Value>> {
        Client::delete(self, endpoint, id).await
    }

    async fn set_status(
        &self,
        endpoint: &str,
        id: &str,
        status: StatusValue,
    ) -> Result<ApiResponse<Value>> {
        Client::set_status(self, endpoint, id, status).await
    }
}

#[async_trait]
impl SchemaSource for Client {
    async fn schema(&self, endpoint: &str) -> Result<Value> {
        Client::schema(self, endpoint).await
    }
}

#[async_trait]
impl PageFetcher for Client {
    async fn fetch_page(&self, query: &ListQuery) -> Result<ApiResponse<Value>> {
        self.list(query).await
    }
}

/// Builder for creating a configured Client.
#[derive(Default)]
pub struct ClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
    diagnostics: Option<Arc<dyn DiagnosticsSink>>,
}

impl ClientBuilder {
    /// Replace the whole configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the service subdomain.
    pub fn service_domain(mut self, domain: impl Into<String>) -> Self {
        self.config.service_domain = Some(domain.into());
        self
    }

    /// Set the API key.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config.api_key = Some(SecretString::new(api_key.into().into_boxed_str()));
        self
    }

    /// Override the content API base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = Some(base_url.into());
        self
    }

    /// Override the management API base URL.
    pub fn management_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.management_base_url = Some(base_url.into());
        self
    }

    /// Set the per-attempt timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the number of retries after the first attempt.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.config.max_retries = max_retries;
        self
    }

    /// Set the backoff ceiling.
    pub fn retry_max_delay(mut self, delay: Duration) -> Self {
        self.config.retry_max_delay = delay;
        self
    }

    /// Set the default fetch-all page size.
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.config.page_size = page_size;
        self
    }

    /// Set the fetch-all safety ceiling.
    pub fn max_all_items(mut self, max: usize) -> Self {
        self.config.max_all_items = max;
        self
    }

    /// Enable retry diagnostics.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.config.verbose = verbose;
        self
    }

    /// Use a custom transport instead of `reqwest`.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Send retry and progress lines to `sink` (stderr by default).
    pub fn diagnostics(mut self, sink: Arc<dyn DiagnosticsSink>) -> Self {
        self.diagnostics = Some(sink);
        self
    }

    /// Build the client with the configured options.
    ///
    /// # Errors
    ///
    /// See [`Client::from_config`].
    pub fn build(self) -> Result<Client> {
        let config = self.config;

        let api_key = config
            .api_key
            .filter(|key| !key.expose_secret().trim().is_empty())
            .ok_or_else(|| ClassifiedError::invalid_input("API key is required"))?;

        let domain = config.service_domain.as_deref();
        let content_base = resolve_base(config.base_url.as_deref(), domain, CONTENT_HOST, "content")?
            .ok_or_else(|| {
                ClassifiedError::invalid_input("a service domain or a base URL is required")
            })?;
        let management_base = resolve_base(
            config.management_base_url.as_deref(),
            domain,
            MANAGEMENT_HOST,
            "management",
        )?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => {
                let http_config = HttpTransportConfig {
                    proxy: config.proxy.clone(),
                    ..Default::default()
                };
                let transport = HttpTransport::with_config(http_config).map_err(|e| {
                    ClassifiedError::invalid_input(format!("failed to build HTTP transport: {}", e))
                })?;
                Arc::new(transport) as Arc<dyn Transport>
            }
        };
        let diagnostics = self.diagnostics.unwrap_or_else(|| sink_for_output(false));
        let executor =
            RequestExecutor::new(transport).with_diagnostics(diagnostics.clone(), config.verbose);

        Ok(Client {
            inner: Arc::new(ClientInner {
                executor,
                diagnostics,
                content_base,
                management_base,
                api_key,
                default_headers: config.default_headers,
                timeout: config.timeout,
                max_retries: config.max_retries,
                retry_max_delay: config.retry_max_delay,
                limits: FetchLimits::default()
                    .with_page_size(config.page_size)
                    .with_max_items(config.max_all_items),
            }),
        })
    }
}

/// Resolve a base URL from an explicit override or the service domain.
fn resolve_base(
    override_url: Option<&str>,
    domain: Option<&str>,
    host: &str,
    what: &str,
) -> Result<Option<Url>> {
    if let Some(raw) = override_url {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ClassifiedError::invalid_input(format!(
                "{} base URL is empty",
                what
            )));
        }
        let mut url = Url::parse(raw)
            .map_err(|e| ClassifiedError::from(e).context(format!("invalid {} base URL '{}'", what, raw)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClassifiedError::invalid_input(format!(
                "{} base URL must use http or https, got '{}'",
                what,
                url.scheme()
            )));
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        return Ok(Some(url));
    }

    match domain.map(str::trim) {
        Some(domain) if !domain.is_empty() => {
            if !domain.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
                return Err(ClassifiedError::invalid_input(format!(
                    "invalid service domain '{}': use the subdomain only, e.g. 'my-blog'",
                    domain
                )));
            }
            let url = Url::parse(&format!("https://{}.{}/api/v1/", domain, host))?;
            Ok(Some(url))
        }
        _ => Ok(None),
    }
}
