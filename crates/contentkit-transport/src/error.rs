//! Transport error types

use thiserror::Error;

/// Result type for transport operations
pub type Result<T> = std::result::Result<T, TransportError>;

/// Errors a single physical attempt can fail with before any HTTP status is
/// available.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The transport's own deadline fired.
    #[error("timeout: {0}")]
    Timeout(String),

    /// Connection refused, reset, or name resolution failed.
    #[error("connection error: {0}")]
    Connection(String),

    /// The attempt was cancelled before completing.
    #[error("request aborted: {0}")]
    Aborted(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The request could not be built or encoded.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Generic transport error
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Whether the failure is a network-level one (and therefore worth
    /// another attempt).
    pub fn is_network(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Connection(_) | Self::Aborted(_) => true,
            Self::Io(err) => matches!(
                err.kind(),
                std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::ConnectionRefused
                    | std::io::ErrorKind::NotConnected
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::UnexpectedEof
            ),
            Self::InvalidRequest(_) | Self::Other(_) => false,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() || err.is_request() || err.is_body() {
            Self::Connection(err.to_string())
        } else if err.is_builder() {
            Self::InvalidRequest(err.to_string())
        } else {
            Self::Other(err.to_string())
        }
    }
}
