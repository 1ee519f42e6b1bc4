//! Declarative `From` conversions at crate boundaries.

use super::{ClassifiedError, ErrorKind};

/// Macro to define error boundaries with automatic `From` implementation.
///
/// This macro generates a `From` implementation for error conversion,
/// enabling seamless use of the `?` operator across crate boundaries.
///
/// # Syntax
///
/// ```ignore
/// error_boundary!(SourceError => TargetError, |err_var| {
///     // conversion logic returning TargetError
/// });
/// ```
///
/// # Example
///
/// ```
/// use contentkit_core::error::{ClassifiedError, ErrorKind};
/// use contentkit_core::error_boundary;
///
/// #[derive(Debug, thiserror::Error)]
/// #[error("lookup failed: {0}")]
/// struct LookupError(String);
///
/// error_boundary!(LookupError => ClassifiedError, |e| {
///     ClassifiedError::new(ErrorKind::NotFound, e.to_string())
/// });
///
/// fn lookup() -> Result<(), ClassifiedError> {
///     Err(LookupError("blogs".into()))?;
///     Ok(())
/// }
///
/// assert_eq!(lookup().unwrap_err().kind(), ErrorKind::NotFound);
/// ```
#[macro_export]
macro_rules! error_boundary {
    ($inner:ty => $outer:ty, |$err:ident| $body:expr) => {
        impl ::std::convert::From<$inner> for $outer {
            fn from($err: $inner) -> $outer {
                $body
            }
        }
    };
}

// Malformed JSON coming from the caller (operation files, payloads) is an input
// problem; malformed JSON coming from the API is classified at the transport.
error_boundary!(serde_json::Error => ClassifiedError, |e| {
    ClassifiedError::new(ErrorKind::InvalidInput, format!("invalid JSON: {}", e))
});

error_boundary!(std::io::Error => ClassifiedError, |e| {
    ClassifiedError::new(ErrorKind::InvalidInput, format!("I/O error: {}", e))
});

error_boundary!(url::ParseError => ClassifiedError, |e| {
    ClassifiedError::new(ErrorKind::InvalidInput, format!("invalid URL: {}", e))
});
