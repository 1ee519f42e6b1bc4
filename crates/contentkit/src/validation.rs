//! Pre-flight payload validation against endpoint schemas.
//!
//! Validation runs before any write so a bad item in an operation file aborts
//! the run while the remote side is still untouched. Validators are pure: the
//! schema is fetched once per endpoint by a [`SchemaSource`] and handed in.
//!
//! # Schema shape
//!
//! [`FieldSchemaValidator`] understands the management API schema:
//!
//! ```json
//! {"apiFields": [{"fieldId": "title", "kind": "text", "required": true}]}
//! ```
//!
//! - **Errors**: payload is not an object, a required field is missing or
//!   blank, a value does not match its field kind
//! - **Warnings**: payload keys the schema does not define
//!
//! Partial payloads ([`PayloadMode::Partial`], used for PATCH updates) may
//! omit required fields; every other check still applies.
//!
//! # Examples
//!
//! ```rust
//! use contentkit::validation::{FieldSchemaValidator, PayloadMode, PayloadValidator};
//! use serde_json::json;
//!
//! let schema = json!({"apiFields": [{"fieldId": "title", "kind": "text", "required": true}]});
//! let report = FieldSchemaValidator.validate(&json!({"title": 42}), &schema, PayloadMode::Complete);
//!
//! assert!(!report.valid);
//! assert_eq!(report.errors, vec!["title: expected text (string), got number"]);
//!
//! let patch = FieldSchemaValidator.validate(&json!({}), &schema, PayloadMode::Partial);
//! assert!(patch.valid);
//! ```

use async_trait::async_trait;
use contentkit_core::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How bad an issue is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocks the write
    Error,
    /// Blocks the write only in strict mode
    Warning,
}

/// Whether a payload carries the whole item or only the fields to change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PayloadMode {
    /// Create or replace: required fields must be present
    #[default]
    Complete,
    /// Partial update: absent fields keep their stored value
    Partial,
}

/// One problem found in a payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// Error or warning
    pub severity: Severity,
    /// Offending field, empty for payload-level issues
    pub field: String,
    /// What is wrong
    pub message: String,
}

/// Outcome of validating one payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// `true` when there are no errors
    pub valid: bool,
    /// Rendered error messages
    pub errors: Vec<String>,
    /// Rendered warning messages
    pub warnings: Vec<String>,
    /// Every issue, in discovery order
    pub issues: Vec<ValidationIssue>,
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            issues: Vec::new(),
        }
    }
}

impl ValidationReport {
    /// Record an error.
    pub fn error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.push(Severity::Error, field.into(), message.into());
    }

    /// Record a warning.
    pub fn warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.push(Severity::Warning, field.into(), message.into());
    }

    /// Whether this report blocks a write; warnings count under `strict`.
    pub fn blocks(&self, strict: bool) -> bool {
        !self.valid || (strict && !self.warnings.is_empty())
    }

    fn push(&mut self, severity: Severity, field: String, message: String) {
        let rendered = if field.is_empty() {
            message.clone()
        } else {
            format!("{}: {}", field, message)
        };
        match severity {
            Severity::Error => {
                self.valid = false;
                self.errors.push(rendered);
            }
            Severity::Warning => self.warnings.push(rendered),
        }
        self.issues.push(ValidationIssue {
            severity,
            field,
            message,
        });
    }
}

/// Checks a payload against an endpoint schema.
pub trait PayloadValidator: Send + Sync {
    /// Validate `payload` against `schema`. Never fails; problems go in the report.
    fn validate(&self, payload: &Value, schema: &Value, mode: PayloadMode) -> ValidationReport;
}

/// Supplies endpoint schemas, one remote call per endpoint.
#[async_trait]
pub trait SchemaSource: Send + Sync {
    /// Fetch the schema of `endpoint`.
    async fn schema(&self, endpoint: &str) -> Result<Value>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiField {
    field_id: String,
    #[serde(default)]
    kind: String,
    #[serde(default)]
    required: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiSchema {
    #[serde(default)]
    api_fields: Vec<ApiField>,
}

/// Validator for the management API `apiFields` schema.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldSchemaValidator;

impl PayloadValidator for FieldSchemaValidator {
    fn validate(&self, payload: &Value, schema: &Value, mode: PayloadMode) -> ValidationReport {
        let mut report = ValidationReport::default();

        let Some(object) = payload.as_object() else {
            report.error("", format!("payload must be a JSON object, got {}", type_name(payload)));
            return report;
        };

        let fields = match serde_json::from_value::<ApiSchema>(schema.clone()) {
            Ok(schema) => schema.api_fields,
            Err(e) => {
                report.warning("", format!("schema is not readable, payload not checked ({})", e));
                return report;
            }
        };
        for field in &fields {
            match object.get(&field.field_id) {
                None if mode == PayloadMode::Partial => {}
                None | Some(Value::Null) => {
                    if field.required {
                        report.error(&field.field_id, "required field is missing");
                    }
                }
                Some(Value::String(s)) if field.required && s.trim().is_empty() => {
                    report.error(&field.field_id, "required field is empty");
                }
                Some(value) => {
                    if let Some(expected) = kind_mismatch(&field.kind, value) {
                        report.error(
                            &field.field_id,
                            format!(
                                "expected {} ({}), got {}",
                                field.kind,
                                expected,
                                type_name(value)
                            ),
                        );
                    }
                }
            }
        }

        for key in object.keys() {
            if !fields.iter().any(|f| &f.field_id == key) {
                report.warning(key, "field is not defined in the schema");
            }
        }

        report
    }
}

/// Returns the expected JSON shape when `value` does not fit `kind`.
///
/// Unknown kinds are accepted as-is.
fn kind_mismatch(kind: &str, value: &Value) -> Option<&'static str> {
    match kind {
        "text" | "textArea" | "richEditor" | "richEditorV2" | "relation" => {
            (!value.is_string()).then_some("string")
        }
        "number" => (!value.is_number()).then_some("number"),
        "boolean" => (!value.is_boolean()).then_some("boolean"),
        "date" => match value.as_str() {
            Some(s) if chrono::DateTime::parse_from_rfc3339(s).is_ok() => None,
            _ => Some("ISO 8601 date string"),
        },
        "select" | "mediaList" | "relationList" | "repeater" => {
            (!value.is_array()).then_some("array")
        }
        "custom" | "iframe" => (!value.is_object()).then_some("object"),
        "media" | "file" => (!(value.is_string() || value.is_object())).then_some("string or object"),
        _ => None,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn schema() -> Value {
        json!({
            "apiFields": [
                {"fieldId": "title", "kind": "text", "required": true},
                {"fieldId": "body", "kind": "richEditorV2"},
                {"fieldId": "views", "kind": "number"},
                {"fieldId": "publishedOn", "kind": "date"},
                {"fieldId": "tags", "kind": "select"}
            ]
        })
    }

    #[test]
    fn test_valid_payload() {
        let report = FieldSchemaValidator.validate(
            &json!({"title": "Hello", "views": 3, "publishedOn": "2024-05-01T00:00:00Z", "tags": ["a"]}),
            &schema(),
            PayloadMode::Complete,
        );
        assert!(report.valid);
        assert!(report.errors.is_empty());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_missing_required_field() {
        let report = FieldSchemaValidator.validate(&json!({"views": 1}), &schema(), PayloadMode::Complete);
        assert!(!report.valid);
        assert_eq!(report.errors, vec!["title: required field is missing"]);
    }

    #[test]
    fn test_partial_payload_may_omit_required_fields() {
        let report = FieldSchemaValidator.validate(&json!({"views": 5}), &schema(), PayloadMode::Partial);
        assert!(report.valid);
        assert!(report.errors.is_empty());

        let report = FieldSchemaValidator.validate(&json!({"title": null}), &schema(), PayloadMode::Partial);
        assert_eq!(report.errors, vec!["title: required field is missing"]);
    }

    #[rstest]
    #[case::blank(json!({"title": " "}), "title: required field is empty")]
    #[case::wrong_kind(json!({"views": "5"}), "views: expected number (number), got string")]
    fn test_partial_payload_keeps_value_checks(#[case] payload: Value, #[case] expected: &str) {
        let report = FieldSchemaValidator.validate(&payload, &schema(), PayloadMode::Partial);
        assert_eq!(report.errors, vec![expected.to_string()]);
    }

    #[test]
    fn test_blank_required_field() {
        let report = FieldSchemaValidator.validate(&json!({"title": "  "}), &schema(), PayloadMode::Complete);
        assert_eq!(report.errors, vec!["title: required field is empty"]);
    }

    #[rstest]
    #[case::number_as_string(json!({"title": "t", "views": "3"}), "views: expected number (number), got string")]
    #[case::bad_date(json!({"title": "t", "publishedOn": "yesterday"}), "publishedOn: expected date (ISO 8601 date string), got string")]
    #[case::select_scalar(json!({"title": "t", "tags": "a"}), "tags: expected select (array), got string")]
    fn test_kind_mismatch(#[case] payload: Value, #[case] expected: &str) {
        let report = FieldSchemaValidator.validate(&payload, &schema(), PayloadMode::Complete);
        assert!(!report.valid);
        assert_eq!(report.errors, vec![expected.to_string()]);
    }

    #[test]
    fn test_unknown_field_is_warning() {
        let report = FieldSchemaValidator.validate(&json!({"title": "t", "slug": "x"}), &schema(), PayloadMode::Complete);
        assert!(report.valid);
        assert_eq!(report.warnings, vec!["slug: field is not defined in the schema"]);
        assert!(!report.blocks(false));
        assert!(report.blocks(true));
    }

    #[test]
    fn test_non_object_payload() {
        let report = FieldSchemaValidator.validate(&json!(["title"]), &schema(), PayloadMode::Complete);
        assert!(!report.valid);
        assert_eq!(report.errors, vec!["payload must be a JSON object, got array"]);
        assert_eq!(report.issues[0].field, "");
    }

    #[test]
    fn test_unknown_kind_accepts_anything() {
        let schema = json!({"apiFields": [{"fieldId": "x", "kind": "somethingNew"}]});
        let report = FieldSchemaValidator.validate(&json!({"x": [1, 2]}), &schema, PayloadMode::Complete);
        assert!(report.valid);
    }

    #[test]
    fn test_report_serializes_issues() {
        let report = FieldSchemaValidator.validate(&json!({}), &schema(), PayloadMode::Complete);
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["issues"][0]["severity"], "error");
        assert_eq!(value["issues"][0]["field"], "title");
    }
}
