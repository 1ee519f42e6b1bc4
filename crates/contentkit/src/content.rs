//! Write operations against a content endpoint.

use async_trait::async_trait;
use contentkit_core::error::{ClassifiedError, Result};
use contentkit_transport::ApiResponse;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Publication status of a content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StatusValue {
    /// Publicly visible
    Publish,
    /// Saved as draft
    Draft,
}

impl StatusValue {
    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Publish => "PUBLISH",
            Self::Draft => "DRAFT",
        }
    }
}

impl fmt::Display for StatusValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusValue {
    type Err = ClassifiedError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PUBLISH" => Ok(Self::Publish),
            "DRAFT" => Ok(Self::Draft),
            _ => Err(ClassifiedError::invalid_input(format!(
                "invalid status '{}': expected PUBLISH or DRAFT",
                s
            ))),
        }
    }
}

/// Options for create and update calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Content id. On create, switches POST to PUT `<endpoint>/<id>`.
    pub id: Option<String>,
    /// Save as draft instead of publishing.
    pub draft: bool,
    /// Idempotency key. Its presence makes the write retry-safe.
    pub idempotency_key: Option<String>,
}

impl WriteOptions {
    /// Options with a caller-chosen id.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    /// Save as draft.
    pub fn draft(mut self, draft: bool) -> Self {
        self.draft = draft;
        self
    }

    /// Attach an idempotency key.
    pub fn idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}

/// The write half of the content API.
///
/// [`Client`](crate::Client) implements this over HTTP; the bulk orchestrator
/// only ever talks to this trait.
#[async_trait]
pub trait ContentApi: Send + Sync {
    /// Create a content item.
    async fn create(
        &self,
        endpoint: &str,
        payload: &Value,
        options: &WriteOptions,
    ) -> Result<ApiResponse<Value>>;

    /// Partially update a content item.
    async fn update(
        &self,
        endpoint: &str,
        id: &str,
        payload: &Value,
        options: &WriteOptions,
    ) -> Result<ApiResponse<Value>>;

    /// Delete a content item.
    async fn delete(&self, endpoint: &str, id: &str) -> Result<ApiResponse<Value>>;

    /// Change a content item's publication status.
    async fn set_status(
        &self,
        endpoint: &str,
        id: &str,
        status: StatusValue,
    ) -> Result<ApiResponse<Value>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_value_parsing() {
        assert_eq!("publish".parse::<StatusValue>().unwrap(), StatusValue::Publish);
        assert_eq!(" DRAFT ".parse::<StatusValue>().unwrap(), StatusValue::Draft);
        assert!("archived".parse::<StatusValue>().is_err());
    }

    #[test]
    fn test_status_value_serde() {
        assert_eq!(serde_json::to_value(StatusValue::Publish).unwrap(), "PUBLISH");
        let parsed: StatusValue = serde_json::from_value(Value::from("DRAFT")).unwrap();
        assert_eq!(parsed, StatusValue::Draft);
    }

    #[test]
    fn test_write_options_builder() {
        let options = WriteOptions::with_id("abc").draft(true).idempotency_key("k1");
        assert_eq!(options.id.as_deref(), Some("abc"));
        assert!(options.draft);
        assert_eq!(options.idempotency_key.as_deref(), Some("k1"));
    }
}
