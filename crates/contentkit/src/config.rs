//! Configuration for the content client

use contentkit_core::error::{ClassifiedError, Result};
use http::HeaderMap;
use secrecy::SecretString;
use std::time::Duration;

/// Default per-attempt timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Default ceiling for a single backoff delay.
pub const DEFAULT_RETRY_MAX_DELAY: Duration = Duration::from_secs(3);

/// Default page size for list and fetch-all requests.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Default fetch-all safety ceiling.
pub const DEFAULT_MAX_ALL_ITEMS: usize = 100_000;

/// Configuration for the content client.
///
/// Environment variables are read only by [`ClientConfig::from_env`]; every
/// other component receives explicit values from here.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Service subdomain, e.g. `my-blog` for `my-blog.microcms.io`
    pub service_domain: Option<String>,

    /// API key sent as `X-MICROCMS-API-KEY`
    pub api_key: Option<SecretString>,

    /// Override for the content API base URL
    pub base_url: Option<String>,

    /// Override for the management API base URL
    pub management_base_url: Option<String>,

    /// Per-attempt timeout
    pub timeout: Duration,

    /// Retries after the first attempt
    pub max_retries: u32,

    /// Ceiling for one backoff delay, `Retry-After` hints included
    pub retry_max_delay: Duration,

    /// Page size used by fetch-all when the query sets none
    pub page_size: u32,

    /// Fetch-all safety ceiling
    pub max_all_items: usize,

    /// Emit retry diagnostics
    pub verbose: bool,

    /// Custom headers to include with every request
    pub default_headers: HeaderMap,

    /// HTTP proxy URL
    pub proxy: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            service_domain: None,
            api_key: None,
            base_url: None,
            management_base_url: None,
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_max_delay: DEFAULT_RETRY_MAX_DELAY,
            page_size: DEFAULT_PAGE_SIZE,
            max_all_items: DEFAULT_MAX_ALL_ITEMS,
            verbose: false,
            default_headers: HeaderMap::new(),
            proxy: None,
        }
    }
}

impl ClientConfig {
    /// Create a new configuration for a service domain and API key.
    pub fn new(service_domain: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            service_domain: Some(service_domain.into()),
            api_key: Some(SecretString::new(api_key.into().into_boxed_str())),
            ..Default::default()
        }
    }

    /// Create a new builder.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is loaded first when present.
    ///
    /// This will look for:
    /// - `CONTENTKIT_SERVICE_DOMAIN` for the service subdomain
    /// - `CONTENTKIT_API_KEY` for authentication
    /// - `CONTENTKIT_BASE_URL` / `CONTENTKIT_MANAGEMENT_BASE_URL` for URL overrides
    /// - `CONTENTKIT_TIMEOUT_MS` for the per-attempt timeout
    /// - `CONTENTKIT_RETRY` for the retry budget
    /// - `CONTENTKIT_RETRY_MAX_DELAY_MS` for the backoff ceiling
    /// - `CONTENTKIT_MAX_ALL_ITEMS` for the fetch-all safety ceiling
    /// - `CONTENTKIT_VERBOSE` for retry diagnostics
    ///
    /// # Errors
    ///
    /// Returns an `InvalidInput` error when a numeric or boolean variable does
    /// not parse.
    #[cfg(feature = "env")]
    pub fn from_env() -> Result<Self> {
        // A missing .env file is the common case
        let _ = dotenvy::dotenv();
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Build a configuration from a variable lookup function.
    ///
    /// Unset and empty variables keep their defaults.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        config.service_domain = var("CONTENTKIT_SERVICE_DOMAIN");
        config.api_key = var("CONTENTKIT_API_KEY").map(|k| SecretString::new(k.into_boxed_str()));
        config.base_url = var("CONTENTKIT_BASE_URL");
        config.management_base_url = var("CONTENTKIT_MANAGEMENT_BASE_URL");

        if let Some(ms) = var("CONTENTKIT_TIMEOUT_MS") {
            config.timeout = Duration::from_millis(parse_number("CONTENTKIT_TIMEOUT_MS", &ms)?);
        }
        if let Some(retry) = var("CONTENTKIT_RETRY") {
            config.max_retries = parse_number("CONTENTKIT_RETRY", &retry)?;
        }
        if let Some(ms) = var("CONTENTKIT_RETRY_MAX_DELAY_MS") {
            config.retry_max_delay =
                Duration::from_millis(parse_number("CONTENTKIT_RETRY_MAX_DELAY_MS", &ms)?);
        }
        if let Some(max) = var("CONTENTKIT_MAX_ALL_ITEMS") {
            config.max_all_items = parse_number("CONTENTKIT_MAX_ALL_ITEMS", &max)?;
        }
        if let Some(verbose) = var("CONTENTKIT_VERBOSE") {
            config.verbose = parse_flag("CONTENTKIT_VERBOSE", &verbose)?;
        }

        Ok(config)
    }

    /// Merge this configuration with another, with the other taking precedence.
    ///
    /// Fields of `other` still at their default value do not override, so
    /// `other` cannot reset a setting back to its default. Use
    /// [`ClientConfig::apply`] when that matters.
    pub fn merge(mut self, other: ClientConfig) -> Self {
        if other.service_domain.is_some() {
            self.service_domain = other.service_domain;
        }
        if other.api_key.is_some() {
            self.api_key = other.api_key;
        }
        if other.base_url.is_some() {
            self.base_url = other.base_url;
        }
        if other.management_base_url.is_some() {
            self.management_base_url = other.management_base_url;
        }
        if other.timeout != DEFAULT_TIMEOUT {
            self.timeout = other.timeout;
        }
        if other.max_retries != DEFAULT_MAX_RETRIES {
            self.max_retries = other.max_retries;
        }
        if other.retry_max_delay != DEFAULT_RETRY_MAX_DELAY {
            self.retry_max_delay = other.retry_max_delay;
        }
        if other.page_size != DEFAULT_PAGE_SIZE {
            self.page_size = other.page_size;
        }
        if other.max_all_items != DEFAULT_MAX_ALL_ITEMS {
            self.max_all_items = other.max_all_items;
        }
        self.verbose |= other.verbose;
        for (key, value) in other.default_headers.iter() {
            self.default_headers.insert(key.clone(), value.clone());
        }
        if other.proxy.is_some() {
            self.proxy = other.proxy;
        }

        self
    }

    /// Apply explicit overrides. Every `Some` wins, including values equal
    /// to the defaults.
    pub fn apply(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(timeout) = overrides.timeout {
            self.timeout = timeout;
        }
        if let Some(max_retries) = overrides.max_retries {
            self.max_retries = max_retries;
        }
        if let Some(delay) = overrides.retry_max_delay {
            self.retry_max_delay = delay;
        }
        if let Some(page_size) = overrides.page_size {
            self.page_size = page_size;
        }
        if let Some(max) = overrides.max_all_items {
            self.max_all_items = max;
        }
        if let Some(verbose) = overrides.verbose {
            self.verbose = verbose;
        }
        self
    }
}

/// Tunables set explicitly by a caller, e.g. from command-line flags.
///
/// `None` leaves the underlying configuration untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    /// Per-attempt timeout
    pub timeout: Option<Duration>,
    /// Retries after the first attempt
    pub max_retries: Option<u32>,
    /// Ceiling for one backoff delay
    pub retry_max_delay: Option<Duration>,
    /// Fetch-all page size
    pub page_size: Option<u32>,
    /// Fetch-all safety ceiling
    pub max_all_items: Option<usize>,
    /// Emit retry diagnostics
    pub verbose: Option<bool>,
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse::<T>().map_err(|_| {
        ClassifiedError::invalid_input(format!(
            "invalid {}: '{}' is not a non-negative integer",
            name, value
        ))
    })
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ClassifiedError::invalid_input(format!(
            "invalid {}: '{}' is not a boolean",
            name, value
        ))),
    }
}

/// Builder for creating ClientConfig with a fluent API.
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
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

    /// Set the default page size.
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

    /// Add a default header.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidInput` error if the header name or value is invalid.
    pub fn default_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Result<Self> {
        let key_str = key.into();
        let value_str = value.into();

        let key: http::HeaderName = key_str.parse().map_err(|_| {
            ClassifiedError::invalid_input(format!("invalid header name '{}'", key_str))
        })?;
        let value: http::HeaderValue = value_str.parse().map_err(|_| {
            ClassifiedError::invalid_input(format!("invalid header value for '{}'", key_str))
        })?;

        self.config.default_headers.insert(key, value);
        Ok(self)
    }

    /// Set the HTTP proxy.
    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.config.proxy = Some(proxy.into());
        self
    }

    /// Build the configuration.
    pub fn build(self) -> ClientConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contentkit_core::error::ErrorKind;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.retry_max_delay, Duration::from_secs(3));
        assert_eq!(config.page_size, 100);
        assert_eq!(config.max_all_items, 100_000);
        assert!(!config.verbose);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_config_new() {
        let config = ClientConfig::new("my-blog", "key");
        assert_eq!(config.service_domain.as_deref(), Some("my-blog"));
        assert_eq!(config.api_key.unwrap().expose_secret(), "key");
    }

    #[test]
    fn test_config_builder() {
        let config = ClientConfig::builder()
            .service_domain("my-blog")
            .api_key("test-key")
            .base_url("https://example.com/api/v1/")
            .timeout(Duration::from_secs(5))
            .max_retries(4)
            .retry_max_delay(Duration::from_millis(800))
            .max_all_items(500)
            .verbose(true)
            .default_header("x-trace", "abc")
            .unwrap()
            .build();

        assert_eq!(config.base_url.as_deref(), Some("https://example.com/api/v1/"));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.max_retries, 4);
        assert_eq!(config.retry_max_delay, Duration::from_millis(800));
        assert_eq!(config.max_all_items, 500);
        assert!(config.verbose);
        assert!(config.default_headers.contains_key("x-trace"));
    }

    #[test]
    fn test_invalid_default_header_rejected() {
        let err = ClientConfig::builder()
            .default_header("bad header", "v")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_from_vars() {
        let config = ClientConfig::from_vars(lookup(&[
            ("CONTENTKIT_SERVICE_DOMAIN", "my-blog"),
            ("CONTENTKIT_API_KEY", "secret"),
            ("CONTENTKIT_TIMEOUT_MS", "1500"),
            ("CONTENTKIT_RETRY", "5"),
            ("CONTENTKIT_RETRY_MAX_DELAY_MS", "250"),
            ("CONTENTKIT_MAX_ALL_ITEMS", "42"),
            ("CONTENTKIT_VERBOSE", "true"),
        ]))
        .unwrap();

        assert_eq!(config.service_domain.as_deref(), Some("my-blog"));
        assert_eq!(config.api_key.unwrap().expose_secret(), "secret");
        assert_eq!(config.timeout, Duration::from_millis(1500));
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.retry_max_delay, Duration::from_millis(250));
        assert_eq!(config.max_all_items, 42);
        assert!(config.verbose);
    }

    #[test]
    fn test_from_vars_empty_values_keep_defaults() {
        let config = ClientConfig::from_vars(lookup(&[
            ("CONTENTKIT_RETRY", ""),
            ("CONTENTKIT_BASE_URL", "  "),
        ]))
        .unwrap();

        assert_eq!(config.max_retries, DEFAULT_MAX_RETRIES);
        assert!(config.base_url.is_none());
    }

    #[test]
    fn test_from_vars_rejects_bad_numbers() {
        let err = ClientConfig::from_vars(lookup(&[("CONTENTKIT_RETRY", "-1")])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(err.message().contains("CONTENTKIT_RETRY"));

        let err =
            ClientConfig::from_vars(lookup(&[("CONTENTKIT_VERBOSE", "maybe")])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_config_merge_precedence() {
        let base = ClientConfig::builder()
            .service_domain("base")
            .api_key("key1")
            .proxy("http://proxy1.local")
            .default_header("x-one", "1")
            .unwrap()
            .build();
        let overrides = ClientConfig::builder()
            .service_domain("override")
            .timeout(Duration::from_secs(60))
            .default_header("x-two", "2")
            .unwrap()
            .build();

        let merged = base.merge(overrides);

        assert_eq!(merged.service_domain.as_deref(), Some("override"));
        assert_eq!(merged.api_key.unwrap().expose_secret(), "key1");
        assert_eq!(merged.timeout, Duration::from_secs(60));
        assert_eq!(merged.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(merged.proxy.as_deref(), Some("http://proxy1.local"));
        assert!(merged.default_headers.contains_key("x-one"));
        assert!(merged.default_headers.contains_key("x-two"));
    }

    #[test]
    fn test_merge_cannot_reset_to_default() {
        let base = ClientConfig::builder().max_retries(5).build();
        let overrides = ClientConfig::builder().max_retries(DEFAULT_MAX_RETRIES).build();

        assert_eq!(base.merge(overrides).max_retries, 5);
    }

    #[test]
    fn test_apply_overrides_back_to_default() {
        let base = ClientConfig::builder()
            .max_retries(5)
            .timeout(Duration::from_secs(90))
            .verbose(true)
            .build();
        let overrides = ConfigOverrides {
            max_retries: Some(DEFAULT_MAX_RETRIES),
            verbose: Some(false),
            ..Default::default()
        };

        let config = base.apply(overrides);

        assert_eq!(config.max_retries, DEFAULT_MAX_RETRIES);
        assert!(!config.verbose);
        assert_eq!(config.timeout, Duration::from_secs(90));
    }

    #[cfg(feature = "env")]
    #[test]
    fn test_config_from_env_variables() {
        temp_env::with_vars(
            [
                ("CONTENTKIT_SERVICE_DOMAIN", Some("env-blog")),
                ("CONTENTKIT_API_KEY", Some("env-key")),
                ("CONTENTKIT_BASE_URL", Some("http://localhost:9000/api/v1/")),
                ("CONTENTKIT_TIMEOUT_MS", Some("2000")),
                ("CONTENTKIT_RETRY", None),
            ],
            || {
                let config = ClientConfig::from_env().unwrap();
                assert_eq!(config.service_domain.as_deref(), Some("env-blog"));
                assert_eq!(config.base_url.as_deref(), Some("http://localhost:9000/api/v1/"));
                assert_eq!(config.timeout, Duration::from_secs(2));
                assert_eq!(config.max_retries, DEFAULT_MAX_RETRIES);
            },
        );
    }
}
