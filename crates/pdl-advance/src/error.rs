//! Error types for OCR provider calls.

use std::path::PathBuf;

use pdl_core::ErrorKind;

/// Result type for all provider operations in this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failure modes when calling the OCR provider.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP client errors (connection, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider answered with a non-2xx status
    #[error("API error (status {status})")]
    Api {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// Body could not be decoded
    #[error("Invalid response: {message}")]
    InvalidResponse {
        /// What went wrong while decoding
        message: String,
        /// Raw response body
        body: String,
    },

    /// The image to upload does not exist
    #[error("File not found: {}", path.display())]
    FileNotFound {
        /// Path that was looked up
        path: PathBuf,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem
        message: String,
    },

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an API error
    pub fn api(status: u16, body: impl Into<String>) -> Self {
        Self::Api {
            status,
            body: body.into(),
        }
    }

    /// Create an invalid response error
    pub fn invalid_response(message: impl Into<String>, body: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
            body: body.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Get the HTTP status code if this is an HTTP/API error
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            Error::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Classification shared with the rest of the pipeline.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Http(err) if err.is_timeout() => ErrorKind::Timeout,
            Error::Http(_) => ErrorKind::NetworkError,
            Error::Api { status, .. } if matches!(*status, 429 | 502..=504) => {
                ErrorKind::ServiceUnavailable
            }
            Error::Api { .. } => ErrorKind::ExternalError,
            Error::InvalidResponse { .. } => ErrorKind::Serialization,
            Error::FileNotFound { .. } => ErrorKind::NotFound,
            Error::Config { .. } => ErrorKind::Configuration,
            Error::Io(_) => ErrorKind::InternalError,
        }
    }
}

impl From<Error> for pdl_core::Error {
    fn from(err: Error) -> Self {
        let kind = err.kind();
        let message = err.to_string();
        pdl_core::Error::from_source(kind, err)
            .with_message(message)
            .with_context("ocr provider")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(Error::api(500, "boom").kind(), ErrorKind::ExternalError);
        assert_eq!(Error::api(503, "").kind(), ErrorKind::ServiceUnavailable);
        assert_eq!(
            Error::invalid_response("bad json", "<html>").kind(),
            ErrorKind::Serialization
        );
        assert_eq!(
            Error::FileNotFound { path: "a.jpg".into() }.kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_status_code() {
        assert_eq!(Error::api(404, "").status_code(), Some(404));
        assert_eq!(Error::config("x").status_code(), None);
    }

    #[test]
    fn test_into_core_error() {
        let err: pdl_core::Error = Error::api(502, "bad gateway").into();
        assert_eq!(err.kind, ErrorKind::ServiceUnavailable);
        assert!(err.message.as_deref().unwrap_or_default().contains("502"));
    }
}
