#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Core abstractions for the contentkit workspace.
//!
//! This crate holds the pieces every other contentkit crate agrees on:
//!
//! - **Error taxonomy** via [`ClassifiedError`](error::ClassifiedError) and
//!   [`ErrorKind`](error::ErrorKind), with stable codes and exit codes
//! - **Retry decisions** via [`RetryPolicy`](retry::RetryPolicy)
//! - **Backoff** via the [`BackoffStrategy`](retry::BackoffStrategy) trait
//!   and [`ExponentialBackoff`](retry::ExponentialBackoff)
//! - **Diagnostics** via the [`DiagnosticsSink`](diagnostics::DiagnosticsSink) trait
//! - **Declarative error boundaries** via the `error_boundary!` macro
//!
//! # Examples
//!
//! ```rust
//! use contentkit_core::prelude::*;
//!
//! let err = ClassifiedError::new(ErrorKind::Conflict, "slug already taken");
//! assert_eq!(err.exit_code(), 6);
//! assert!(!err.is_retryable());
//! ```

pub mod diagnostics;
pub mod error;
pub mod method;
pub mod retry;

/// Convenient re-exports of commonly used items.
///
/// ```rust
/// use contentkit_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::diagnostics::{DiagnosticsSink, NullSink, RecordingSink, StderrSink};
    pub use crate::error::{ClassifiedError, ErrorKind, ErrorPayload, Result};
    pub use crate::error_boundary;
    pub use crate::method::Method;
    pub use crate::retry::{
        BackoffStrategy, ExponentialBackoff, ExponentialBackoffBuilder, RetryDiagnostics,
        RetryPolicy, RetryReason,
    };
}
