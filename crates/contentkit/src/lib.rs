//! # contentkit
//!
//! Resilient execution core for headless CMS content APIs:
//! - Retry-aware requests with exponential backoff, jitter and `Retry-After`
//! - Idempotency-key gated retries for writes
//! - Fetch-all pagination with cross-page consistency checks
//! - Sequential bulk operations with stop/continue-on-error semantics
//! - Pre-flight payload validation against endpoint schemas
//! - A closed error taxonomy with stable codes and exit codes
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use contentkit::{Client, ListQuery};
//! use contentkit::bulk::{BulkOptions, load_operations};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new("my-blog", "your-api-key")?;
//!
//!     let page = client.fetch_all(&ListQuery::new("blogs")).await?;
//!     println!("fetched {} posts", page.contents.len());
//!
//!     let operations = load_operations("operations.json").await?;
//!     let result = client.bulk().run(&operations, &BulkOptions::default()).await?;
//!     println!("{} succeeded, {} failed", result.succeeded, result.failed);
//!
//!     std::process::exit(result.exit_code());
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Re-export commonly used types
pub use bulk::{BulkOptions, BulkRunResult, BulkRunner, ErrorPolicy, Operation};
pub use client::{Client, ClientBuilder};
pub use config::{ClientConfig, ConfigOverrides};
pub use content::{ContentApi, StatusValue, WriteOptions};
pub use contentkit_core::error::{ClassifiedError, ErrorKind, ErrorPayload, Result};
pub use contentkit_transport::ApiResponse;
pub use pagination::{ContentPage, FetchLimits, ListQuery, PageFetcher, fetch_all};
pub use validation::{
    FieldSchemaValidator, PayloadMode, PayloadValidator, SchemaSource, ValidationReport,
};

// Module declarations
pub mod bulk;
pub mod client;
pub mod config;
pub mod content;
pub mod observability;
pub mod pagination;
pub mod validation;

// Re-export key dependencies for convenience
pub use async_trait::async_trait;
pub use serde_json::Value as JsonValue;

/// Prelude module for common imports
///
/// # Examples
///
/// ```rust
/// use contentkit::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        ApiResponse, BulkOptions, BulkRunResult, ClassifiedError, Client, ClientConfig,
        ContentPage, ErrorKind, ErrorPolicy, ListQuery, Operation, Result, StatusValue,
        WriteOptions,
    };
}

/// Crate version, automatically updated from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
