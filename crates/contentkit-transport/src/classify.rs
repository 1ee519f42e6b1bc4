//! Map transport and HTTP outcomes onto the error taxonomy.
//!
//! | outcome                         | kind           | retryable |
//! |---------------------------------|----------------|-----------|
//! | timeout / reset / DNS / abort   | `NetworkError` | yes       |
//! | 401                             | `AuthFailed`   | no        |
//! | 403                             | `Forbidden`    | no        |
//! | 404                             | `NotFound`     | no        |
//! | 409                             | `Conflict`     | no        |
//! | 408, 425, 429                   | `NetworkError` | yes       |
//! | >= 500                          | `ApiError`     | yes       |
//! | any other non-2xx               | `ApiError`     | no        |
//! | anything else                   | `UnknownError` | no        |

use crate::error::TransportError;
use crate::traits::{HttpResponse, RETRY_AFTER_HEADER};
use contentkit_core::error::{ClassifiedError, ErrorKind};
use contentkit_core::error_boundary;
use contentkit_core::retry::retry_after_hint;
use serde_json::Value;
use std::time::Duration;

/// Kind and retryability for a non-success HTTP status.
pub fn classify_status(status: u16) -> (ErrorKind, bool) {
    match status {
        401 => (ErrorKind::AuthFailed, false),
        403 => (ErrorKind::Forbidden, false),
        404 => (ErrorKind::NotFound, false),
        409 => (ErrorKind::Conflict, false),
        408 | 425 | 429 => (ErrorKind::NetworkError, true),
        s if s >= 500 => (ErrorKind::ApiError, true),
        _ => (ErrorKind::ApiError, false),
    }
}

/// Classify a non-success response.
///
/// The body (JSON when it parses, text otherwise) becomes the error's detail,
/// alongside status, request id and the `Retry-After` hint clamped to
/// `retry_ceiling`.
pub fn classify_response(response: &HttpResponse, retry_ceiling: Duration) -> ClassifiedError {
    let (kind, retryable) = classify_status(response.status);
    let body = parse_body(response);
    let message = body
        .as_ref()
        .and_then(message_from_body)
        .unwrap_or_else(|| default_message(response.status));
    let retry_after = response
        .header(RETRY_AFTER_HEADER)
        .and_then(|v| retry_after_hint(v, retry_ceiling));

    let mut err = ClassifiedError::new(kind, message)
        .with_retryable(retryable)
        .with_status(response.status)
        .with_request_id(response.request_id())
        .with_retry_after(retry_after);
    if let Some(body) = body {
        err = err.with_body(body);
    }
    err
}

/// Classify a failure that happened before any status was available.
pub fn classify_transport_error(error: &TransportError) -> ClassifiedError {
    if error.is_network() {
        ClassifiedError::network(error.to_string())
    } else {
        ClassifiedError::unknown(error.to_string())
    }
}

error_boundary!(TransportError => ClassifiedError, |e| classify_transport_error(&e));

fn parse_body(response: &HttpResponse) -> Option<Value> {
    if response.body.is_empty() {
        return None;
    }
    match serde_json::from_slice::<Value>(&response.body) {
        Ok(value) => Some(value),
        Err(_) => {
            let text = response.text();
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| Value::String(trimmed.to_string()))
        }
    }
}

fn message_from_body(body: &Value) -> Option<String> {
    ["message", "error"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(String::from)
}

fn default_message(status: u16) -> String {
    match http::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
    {
        Some(reason) => format!("HTTP {} {}", status, reason),
        None => format!("HTTP {}", status),
    }
}
