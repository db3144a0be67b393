//! Structured error handling shared by every pipeline collaborator.

use hipstr::HipStr;
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};
use thiserror::Error;

/// Type alias for boxed dynamic errors that can be sent across threads.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Type alias for Results with our custom Error type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Categories of errors that can occur while processing work items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[derive(AsRefStr, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Input validation failed (bad spreadsheet, bad argument).
    InvalidInput,
    /// A referenced resource (local file, object) does not exist.
    NotFound,
    /// Network-related error occurred.
    NetworkError,
    /// Timeout occurred.
    Timeout,
    /// Remote service temporarily unavailable.
    ServiceUnavailable,
    /// Remote service answered with an unexpected status.
    ExternalError,
    /// Serialization/deserialization error.
    Serialization,
    /// The result store rejected or failed a write.
    Persistence,
    /// Configuration error.
    Configuration,
    /// Work was abandoned because the run was cancelled.
    Cancelled,
    /// Internal error.
    InternalError,
    /// Unknown error occurred.
    #[default]
    Unknown,
}

impl ErrorKind {
    /// Check if this error kind is typically retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NetworkError | Self::Timeout | Self::ServiceUnavailable
        )
    }
}

/// Structured error type with classification and context tracking.
#[must_use]
#[derive(Debug, Error)]
#[error("[{kind}]{}", message.as_ref().map(|m| format!(": {m}")).unwrap_or_default())]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Primary error message.
    pub message: Option<HipStr<'static>>,
    /// Underlying source error, if any.
    #[source]
    pub source: Option<BoxedError>,
    /// Additional context information.
    pub context: Option<HipStr<'static>>,
}

impl Error {
    /// Creates a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            source: None,
            context: None,
        }
    }

    /// Creates a new error from a source error.
    pub fn from_source(kind: ErrorKind, source: impl Into<BoxedError>) -> Self {
        Self {
            kind,
            message: None,
            source: Some(source.into()),
            context: None,
        }
    }

    /// Adds a message to this error.
    pub fn with_message(mut self, message: impl Into<HipStr<'static>>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Sets the source of the error.
    pub fn with_source(mut self, source: impl Into<BoxedError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Adds context to the error.
    pub fn with_context(mut self, context: impl Into<HipStr<'static>>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Check if this error is retryable based on its kind.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    /// Shorthand for an [`ErrorKind::InvalidInput`] error with a message.
    pub fn invalid_input(message: impl Into<HipStr<'static>>) -> Self {
        Self::new(ErrorKind::InvalidInput).with_message(message)
    }

    /// Shorthand for an [`ErrorKind::NotFound`] error with a message.
    pub fn not_found(message: impl Into<HipStr<'static>>) -> Self {
        Self::new(ErrorKind::NotFound).with_message(message)
    }

    /// Shorthand for an [`ErrorKind::Timeout`] error.
    pub fn timeout() -> Self {
        Self::new(ErrorKind::Timeout).with_message("Operation timed out")
    }

    /// Shorthand for an [`ErrorKind::Cancelled`] error.
    pub fn cancelled() -> Self {
        Self::new(ErrorKind::Cancelled).with_message("Operation cancelled")
    }

    /// Shorthand for an [`ErrorKind::Persistence`] error wrapping a store failure.
    pub fn persistence(source: impl Into<BoxedError>) -> Self {
        Self::from_source(ErrorKind::Persistence, source)
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        let kind = match error.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound,
            _ => ErrorKind::InternalError,
        };

        Self::from_source(kind, error).with_message("I/O operation failed")
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::from_source(ErrorKind::Serialization, error).with_message("Invalid JSON payload")
    }
}

impl From<calamine::Error> for Error {
    fn from(error: calamine::Error) -> Self {
        Self::from_source(ErrorKind::InvalidInput, error).with_message("Unreadable spreadsheet")
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_error_new() {
        let error = Error::new(ErrorKind::Unknown);
        assert_eq!(error.kind, ErrorKind::Unknown);
        assert!(error.message.is_none());
        assert!(error.source.is_none());
        assert!(error.context.is_none());
    }

    #[test]
    fn test_error_builder_pattern() {
        let error = Error::new(ErrorKind::Configuration)
            .with_message("bad config")
            .with_context("chunk_size");

        assert_eq!(error.kind, ErrorKind::Configuration);
        assert_eq!(error.message.as_deref(), Some("bad config"));
        assert_eq!(error.context.as_deref(), Some("chunk_size"));
    }

    #[test]
    fn test_error_display() {
        let error = Error::new(ErrorKind::Persistence).with_message("insert failed");

        let display_str = error.to_string();
        assert!(display_str.contains("persistence"));
        assert!(display_str.contains("insert failed"));
    }

    #[test]
    fn test_error_from_io_not_found() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error = Error::from(io_error);

        assert_eq!(error.kind, ErrorKind::NotFound);
        assert!(error.source.is_some());
    }

    #[test]
    fn test_error_from_io_other() {
        let error = Error::from(std::io::Error::other("disk full"));
        assert_eq!(error.kind, ErrorKind::InternalError);
    }

    #[test]
    fn test_error_from_json() {
        let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error = Error::from(json_error);
        assert_eq!(error.kind, ErrorKind::Serialization);
    }

    #[test]
    fn test_is_retryable() {
        assert!(Error::new(ErrorKind::NetworkError).is_retryable());
        assert!(Error::timeout().is_retryable());
        assert!(!Error::cancelled().is_retryable());
        assert!(!Error::invalid_input("bad").is_retryable());
        assert!(!ErrorKind::Persistence.is_retryable());
    }

    #[test]
    fn test_default() {
        assert_eq!(ErrorKind::default(), ErrorKind::Unknown);
    }

    #[test]
    fn test_from_str() {
        assert_eq!(
            ErrorKind::from_str("not_found").unwrap(),
            ErrorKind::NotFound
        );
        assert_eq!(
            ErrorKind::from_str("persistence").unwrap(),
            ErrorKind::Persistence
        );
        assert!(ErrorKind::from_str("invalid").is_err());
    }
}
