//! Transport layer for contentkit
//!
//! Splits a remote call into two halves:
//!
//! - **Transport trait**: one physical attempt of a request ([`Transport`]),
//!   implemented over `reqwest` by [`HttpTransport`] and by in-memory fakes in
//!   tests
//! - **Request executor**: one logical request ([`RequestExecutor`]), owning
//!   timeouts, retry policy, backoff and `Retry-After` handling
//! - **Classifier**: maps statuses and transport failures onto
//!   [`ClassifiedError`](contentkit_core::error::ClassifiedError)
//!
//! # Usage
//!
//! ```rust,no_run
//! use contentkit_core::method::Method;
//! use contentkit_transport::{HttpTransport, RequestDescriptor, RequestExecutor};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let executor = RequestExecutor::new(Arc::new(HttpTransport::new()?));
//! let request = RequestDescriptor::builder(
//!     Method::Post,
//!     "https://svc.example.com/api/v1/blogs".parse()?,
//! )
//! .json(&serde_json::json!({"title": "hello"}))?
//! .generated_idempotency_key()?
//! .timeout(Duration::from_secs(10))
//! .build();
//!
//! let created = executor.execute(&request).await?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod classify;
pub mod error;
pub mod executor;
pub mod http;
pub mod observability;
pub mod traits;

// Re-export commonly used types
pub use error::{Result, TransportError};
pub use executor::RequestExecutor;
pub use crate::http::{HttpTransport, HttpTransportConfig};
pub use traits::{
    ApiResponse, HttpResponse, REQUEST_ID_HEADER, RETRY_AFTER_HEADER, RequestDescriptor,
    RequestDescriptorBuilder, Transport,
};
