//! Sequential execution of an operation list.

use super::operation::{Action, Operation};
use crate::content::{ContentApi, WriteOptions};
use crate::observability::{log_bulk_item, log_validation_complete, log_validation_issue};
use crate::validation::{FieldSchemaValidator, PayloadMode, PayloadValidator, SchemaSource};
use contentkit_core::diagnostics::{DiagnosticsSink, NullSink};
use contentkit_core::error::{ClassifiedError, ErrorPayload, Result};
use contentkit_transport::ApiResponse;
use serde::Serialize;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// What to do after an operation fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Skip everything after the first failure
    #[default]
    StopOnError,
    /// Keep going
    ContinueOnError,
}

impl ErrorPolicy {
    /// Resolve the policy from the two mutually exclusive flags.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidInput` error when both flags are set.
    pub fn from_flags(stop_on_error: bool, continue_on_error: bool) -> Result<Self> {
        match (stop_on_error, continue_on_error) {
            (true, true) => Err(ClassifiedError::invalid_input(
                "stop-on-error and continue-on-error are mutually exclusive",
            )),
            (_, true) => Ok(Self::ContinueOnError),
            _ => Ok(Self::StopOnError),
        }
    }
}

/// Options for one bulk run.
#[derive(Debug, Clone, Default)]
pub struct BulkOptions {
    /// Pause between consecutive executed operations
    pub interval: Duration,
    /// Partial-failure behavior
    pub error_policy: ErrorPolicy,
    /// Validate create/update payloads against endpoint schemas first
    pub validate_payload: bool,
    /// Treat validation warnings as errors
    pub strict_warnings: bool,
    /// Include error details in result items
    pub verbose: bool,
}

impl BulkOptions {
    /// Set the pause between operations.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the error policy.
    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    /// Enable payload validation, optionally strict.
    pub fn with_validation(mut self, strict_warnings: bool) -> Self {
        self.validate_payload = true;
        self.strict_warnings = strict_warnings;
        self
    }

    /// Include error details in result items.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// Outcome of one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    /// The remote call succeeded
    Succeeded,
    /// The remote call failed
    Failed,
    /// Never attempted because an earlier operation failed
    Skipped,
}

/// Per-operation result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkResultItem {
    /// 1-based position in the operation list
    pub index: usize,
    /// Action performed
    pub action: Action,
    /// Target endpoint
    pub endpoint: String,
    /// Known id, or the id the server assigned
    pub id: Option<String>,
    /// Outcome
    pub status: ItemStatus,
    /// Response body on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Error on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorPayload>,
}

/// Result of a bulk run.
///
/// `succeeded + failed + skipped == total` always holds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkRunResult {
    /// Number of operations
    pub total: usize,
    /// Operations that succeeded
    pub succeeded: usize,
    /// Operations that failed
    pub failed: usize,
    /// Operations never attempted
    pub skipped: usize,
    /// Per-operation results in file order
    pub results: Vec<BulkResultItem>,
    #[serde(skip)]
    first_failure_exit_code: Option<i32>,
}

impl BulkRunResult {
    /// Process exit code: 0 when nothing failed, otherwise the first
    /// failure's exit code.
    pub fn exit_code(&self) -> i32 {
        self.first_failure_exit_code.unwrap_or(0)
    }
}

/// Runs operation lists against a [`ContentApi`], one operation at a time.
///
/// # Example
///
/// ```rust,no_run
/// use contentkit::Client;
/// use contentkit::bulk::{BulkOptions, ErrorPolicy, load_operations};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = Client::builder().service_domain("my-blog").api_key("key").build()?;
/// let operations = load_operations("ops.json").await?;
///
/// let options = BulkOptions::default()
///     .with_error_policy(ErrorPolicy::from_flags(false, true)?)
///     .with_validation(false);
/// let result = client.bulk().run(&operations, &options).await?;
/// std::process::exit(result.exit_code());
/// # }
/// ```
#[derive(Clone)]
pub struct BulkRunner {
    api: Arc<dyn ContentApi>,
    schemas: Option<Arc<dyn SchemaSource>>,
    validator: Arc<dyn PayloadValidator>,
    diagnostics: Arc<dyn DiagnosticsSink>,
}

impl std::fmt::Debug for BulkRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BulkRunner")
            .field("has_schema_source", &self.schemas.is_some())
            .finish_non_exhaustive()
    }
}

impl BulkRunner {
    /// Create a runner with the field schema validator and no progress output.
    pub fn new(api: Arc<dyn ContentApi>) -> Self {
        Self {
            api,
            schemas: None,
            validator: Arc::new(FieldSchemaValidator),
            diagnostics: Arc::new(NullSink),
        }
    }

    /// Set where endpoint schemas come from. Required for payload validation.
    pub fn with_schema_source(mut self, schemas: Arc<dyn SchemaSource>) -> Self {
        self.schemas = Some(schemas);
        self
    }

    /// Replace the payload validator.
    pub fn with_validator(mut self, validator: Arc<dyn PayloadValidator>) -> Self {
        self.validator = validator;
        self
    }

    /// Report progress lines to `sink`.
    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticsSink>) -> Self {
        self.diagnostics = sink;
        self
    }

    /// Run `operations` in order.
    ///
    /// # Errors
    ///
    /// Fails before any write when payload validation is enabled and an item
    /// does not pass, or when validation is requested without a schema
    /// source. Individual operation failures are reported in the result, not
    /// as an `Err`.
    pub async fn run(&self, operations: &[Operation], options: &BulkOptions) -> Result<BulkRunResult> {
        if options.validate_payload {
            self.prevalidate(operations, options.strict_warnings).await?;
        }

        let total = operations.len();
        info!(total, policy = ?options.error_policy, "Starting bulk run");

        let mut result = BulkRunResult {
            total,
            succeeded: 0,
            failed: 0,
            skipped: 0,
            results: Vec::with_capacity(total),
            first_failure_exit_code: None,
        };
        let mut halted = false;
        let mut executed_any = false;

        for (i, operation) in operations.iter().enumerate() {
            let index = i + 1;
            let mut item = BulkResultItem {
                index,
                action: operation.action(),
                endpoint: operation.endpoint().to_string(),
                id: operation.id().map(str::to_string),
                status: ItemStatus::Skipped,
                data: None,
                error: None,
            };

            if halted {
                result.skipped += 1;
                result.results.push(item);
                continue;
            }

            if executed_any && !options.interval.is_zero() {
                tokio::time::sleep(options.interval).await;
            }
            executed_any = true;

            match self.execute(operation).await {
                Ok(response) => {
                    if item.id.is_none() {
                        item.id = response.data.get("id").and_then(Value::as_str).map(str::to_string);
                    }
                    log_bulk_item(index, total, item.action.as_str(), &item.endpoint, None);
                    self.diagnostics.emit(&format!(
                        "[{}/{}] {} {} {} ok",
                        index,
                        total,
                        item.action,
                        item.endpoint,
                        item.id.as_deref().unwrap_or("-")
                    ));
                    item.status = ItemStatus::Succeeded;
                    item.data = Some(response.data);
                    result.succeeded += 1;
                }
                Err(error) => {
                    let error = error.with_detail("index", index);
                    log_bulk_item(index, total, item.action.as_str(), &item.endpoint, Some(&error));
                    self.diagnostics.emit(&format!(
                        "[{}/{}] {} {} {} failed ({}: {})",
                        index,
                        total,
                        item.action,
                        item.endpoint,
                        item.id.as_deref().unwrap_or("-"),
                        error.code(),
                        error
                    ));
                    result.first_failure_exit_code.get_or_insert(error.exit_code());
                    item.status = ItemStatus::Failed;
                    item.error = Some(error.to_payload(options.verbose));
                    result.failed += 1;
                    if options.error_policy == ErrorPolicy::StopOnError {
                        halted = true;
                    }
                }
            }
            result.results.push(item);
        }

        info!(
            total,
            succeeded = result.succeeded,
            failed = result.failed,
            skipped = result.skipped,
            "Bulk run complete"
        );
        Ok(result)
    }

    async fn execute(&self, operation: &Operation) -> Result<ApiResponse<Value>> {
        match operation {
            Operation::Create {
                endpoint,
                payload,
                id,
                draft,
            } => {
                let options = WriteOptions {
                    id: id.clone(),
                    draft: *draft,
                    idempotency_key: None,
                };
                self.api.create(endpoint, payload, &options).await
            }
            Operation::Update {
                endpoint,
                id,
                payload,
                draft,
            } => {
                let options = WriteOptions::default().draft(*draft);
                self.api.update(endpoint, id, payload, &options).await
            }
            Operation::Delete { endpoint, id } => self.api.delete(endpoint, id).await,
            Operation::Status {
                endpoint,
                id,
                status,
            } => self.api.set_status(endpoint, id, *status).await,
        }
    }

    /// Validate every create/update payload, fetching each schema once.
    async fn prevalidate(&self, operations: &[Operation], strict: bool) -> Result<()> {
        let Some(schemas) = &self.schemas else {
            return Err(ClassifiedError::invalid_input(
                "payload validation requires a schema source",
            ));
        };

        let mut cache: HashMap<&str, Value> = HashMap::new();
        for operation in operations {
            if operation.payload().is_none() || cache.contains_key(operation.endpoint()) {
                continue;
            }
            let endpoint = operation.endpoint();
            debug!(endpoint, "Fetching schema for validation");
            let schema = schemas
                .schema(endpoint)
                .await
                .map_err(|e| e.context(format!("fetching schema for {}", endpoint)))?;
            cache.insert(endpoint, schema);
        }

        for (i, operation) in operations.iter().enumerate() {
            let (Some(payload), Some(schema)) = (operation.payload(), cache.get(operation.endpoint()))
            else {
                continue;
            };

            // Updates are PATCHes: omitted fields keep their stored value
            let mode = match operation.action() {
                Action::Update => PayloadMode::Partial,
                _ => PayloadMode::Complete,
            };
            let report = self.validator.validate(payload, schema, mode);
            for issue in &report.issues {
                log_validation_issue(issue.severity, &issue.field, &issue.message);
            }
            log_validation_complete(i + 1, report.errors.len(), report.warnings.len());
            if !report.blocks(strict) {
                continue;
            }

            let index = i + 1;
            let mut problems = report.errors.clone();
            if strict {
                problems.extend(report.warnings.iter().cloned());
            }
            let mut details = json!({
                "index": index,
                "action": operation.action(),
                "endpoint": operation.endpoint(),
                "errors": report.errors,
            });
            if strict {
                details["warnings"] = json!(report.warnings);
            }

            return Err(ClassifiedError::validation(
                format!(
                    "operation {} ({} {}) failed validation: {}",
                    index,
                    operation.action(),
                    operation.endpoint(),
                    problems.join("; ")
                ),
                details,
            ));
        }

        Ok(())
    }
}
