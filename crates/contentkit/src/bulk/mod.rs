//! Bulk and sequential write operations.
//!
//! An operation file lists create/update/delete/status writes. [`BulkRunner`]
//! executes them strictly in file order, one at a time, with optional
//! pre-flight payload validation and a configurable [`ErrorPolicy`]:
//!
//! - **Stop on error** (default): the first failure marks every later
//!   operation `skipped`
//! - **Continue on error**: every operation is attempted
//!
//! The runner never retries; retry-safe writes are retried by the executor
//! underneath the [`ContentApi`](crate::content::ContentApi).

mod operation;
mod orchestrator;

pub use operation::{Action, Operation, load_operations, parse_operations};
pub use orchestrator::{
    BulkOptions, BulkResultItem, BulkRunResult, BulkRunner, ErrorPolicy, ItemStatus,
};
