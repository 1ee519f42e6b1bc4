//! Operation file model and parsing.

use crate::content::StatusValue;
use contentkit_core::error::{ClassifiedError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::Path;

/// Kind of write an operation performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Create a content item
    Create,
    /// Partially update a content item
    Update,
    /// Delete a content item
    Delete,
    /// Change publication status
    Status,
}

impl Action {
    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Status => "status",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of an operation file.
///
/// ```json
/// {"action": "create", "endpoint": "blogs", "payload": {"title": "Hello"}, "draft": true}
/// {"action": "update", "endpoint": "blogs", "id": "abc", "payload": {"title": "Hi"}}
/// {"action": "delete", "endpoint": "blogs", "id": "abc"}
/// {"action": "status", "endpoint": "blogs", "id": "abc", "status": "PUBLISH"}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Operation {
    /// POST `<endpoint>`, or PUT `<endpoint>/<id>` when `id` is set
    Create {
        /// Target endpoint
        endpoint: String,
        /// Content fields
        payload: Value,
        /// Caller-chosen id
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        /// Save as draft
        #[serde(default)]
        draft: bool,
    },
    /// PATCH `<endpoint>/<id>`
    Update {
        /// Target endpoint
        endpoint: String,
        /// Content id
        id: String,
        /// Fields to change
        payload: Value,
        /// Save as draft
        #[serde(default)]
        draft: bool,
    },
    /// DELETE `<endpoint>/<id>`
    Delete {
        /// Target endpoint
        endpoint: String,
        /// Content id
        id: String,
    },
    /// Set publication status through the management API
    Status {
        /// Target endpoint
        endpoint: String,
        /// Content id
        id: String,
        /// New status
        status: StatusValue,
    },
}

impl Operation {
    /// The action this operation performs.
    pub fn action(&self) -> Action {
        match self {
            Self::Create { .. } => Action::Create,
            Self::Update { .. } => Action::Update,
            Self::Delete { .. } => Action::Delete,
            Self::Status { .. } => Action::Status,
        }
    }

    /// Target endpoint.
    pub fn endpoint(&self) -> &str {
        match self {
            Self::Create { endpoint, .. }
            | Self::Update { endpoint, .. }
            | Self::Delete { endpoint, .. }
            | Self::Status { endpoint, .. } => endpoint,
        }
    }

    /// Content id known before execution.
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Create { id, .. } => id.as_deref(),
            Self::Update { id, .. } | Self::Delete { id, .. } | Self::Status { id, .. } => {
                Some(id)
            }
        }
    }

    /// Payload for create and update.
    pub fn payload(&self) -> Option<&Value> {
        match self {
            Self::Create { payload, .. } | Self::Update { payload, .. } => Some(payload),
            _ => None,
        }
    }

    /// Structural checks serde cannot express.
    fn check(&self) -> std::result::Result<(), String> {
        if self.endpoint().trim().is_empty() {
            return Err("endpoint must not be empty".to_string());
        }
        if let Some(id) = self.id()
            && id.trim().is_empty()
        {
            return Err("id must not be empty".to_string());
        }
        if let Some(payload) = self.payload()
            && !payload.is_object()
        {
            return Err("payload must be a JSON object".to_string());
        }
        Ok(())
    }
}

/// Parse an operation document.
///
/// The document is either an array of operations or an object with an
/// `operations` array.
///
/// # Errors
///
/// Returns an `InvalidInput` error for malformed JSON, an unexpected document
/// shape, an empty operation list, or an invalid entry. Entry errors name the
/// position as `operations[i]`.
pub fn parse_operations(text: &str) -> Result<Vec<Operation>> {
    let document: Value = serde_json::from_str(text)
        .map_err(|e| ClassifiedError::invalid_input(format!("operation file is not valid JSON: {}", e)))?;

    let items = match document {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("operations") {
            Some(Value::Array(items)) => items,
            _ => return Err(shape_error()),
        },
        _ => return Err(shape_error()),
    };

    if items.is_empty() {
        return Err(ClassifiedError::invalid_input(
            "operation file contains no operations",
        ));
    }

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            let operation: Operation = serde_json::from_value(item).map_err(|e| {
                ClassifiedError::invalid_input(format!("operations[{}]: {}", i, e))
                    .with_detail("position", i)
            })?;
            operation.check().map_err(|msg| {
                ClassifiedError::invalid_input(format!("operations[{}]: {}", i, msg))
                    .with_detail("position", i)
            })?;
            Ok(operation)
        })
        .collect()
}

/// Read and parse an operation file.
///
/// # Errors
///
/// Returns an `InvalidInput` error if the file cannot be read or does not
/// parse; see [`parse_operations`].
pub async fn load_operations(path: impl AsRef<Path>) -> Result<Vec<Operation>> {
    let path = path.as_ref();
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ClassifiedError::from(e).context(format!("reading {}", path.display())))?;
    parse_operations(&text)
}

fn shape_error() -> ClassifiedError {
    ClassifiedError::invalid_input(
        "operation file must be a JSON array or an object with an \"operations\" array",
    )
}
