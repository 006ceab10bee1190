//! Error types for revit-lookup

use thiserror::Error;

/// Main error type for lookup operations
///
/// Per-member failures never show up here: the engine converts them into
/// descriptor values. This type covers what is left for the session boundary.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid object: {0}")]
    InvalidObject(String),

    #[error("Host error: {0}")]
    HostInternal(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Unreadable type metadata: {0}")]
    Metadata(String),

    #[error("Host command queue closed")]
    QueueClosed,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an invalid object error
    pub fn invalid_object(msg: impl Into<String>) -> Self {
        Error::InvalidObject(msg.into())
    }

    /// Create a host failure error
    pub fn host(msg: impl Into<String>) -> Self {
        Error::HostInternal(msg.into())
    }

    /// Create a metadata error
    pub fn metadata(msg: impl Into<String>) -> Self {
        Error::Metadata(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }

    /// Create a settings error
    pub fn settings(msg: impl Into<String>) -> Self {
        Error::Settings(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Error::Internal(msg.into())
    }

    /// Whether the error is a user cancellation rather than a failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Internal(err.to_string())
    }
}

/// Wrapper raised by invocation layers around the member's own failure.
///
/// The evaluator reports the wrapped error's message instead of this one.
#[derive(Error, Debug)]
#[error("Exception has been thrown by the target of an invocation")]
pub struct InvocationError {
    #[source]
    pub inner: Box<dyn std::error::Error + Send + Sync>,
}

impl InvocationError {
    pub fn new(inner: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self {
            inner: inner.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_is_not_a_failure_message() {
        assert!(Error::Cancelled.is_cancelled());
        assert!(!Error::host("boom").is_cancelled());
        assert_eq!(Error::Cancelled.to_string(), "Operation cancelled");
    }

    #[test]
    fn test_invocation_error_keeps_source() {
        let err = InvocationError::new("element was deleted");
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "element was deleted");
    }
}
