//! Error types for reqwest-based audit delivery.

use thiserror::Error;

/// Result type alias for reqwest operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for reqwest operations.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),
    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// The endpoint answered with a non-2xx status.
    #[error("endpoint returned status {0}")]
    Status(u16),
    /// The client could not be configured.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<Error> for pdl_core::Error {
    fn from(err: Error) -> Self {
        use pdl_core::{Error as CoreError, ErrorKind};

        match err {
            Error::Reqwest(e) => {
                if e.is_timeout() {
                    CoreError::timeout()
                        .with_message(e.to_string())
                        .with_source(e)
                } else if e.is_connect() {
                    CoreError::new(ErrorKind::NetworkError)
                        .with_message("Connection failed")
                        .with_source(e)
                } else {
                    CoreError::new(ErrorKind::NetworkError)
                        .with_message(e.to_string())
                        .with_source(e)
                }
            }
            Error::Serde(e) => CoreError::new(ErrorKind::Serialization)
                .with_message(e.to_string())
                .with_source(e),
            Error::Status(status) => CoreError::new(ErrorKind::ExternalError)
                .with_message(format!("Audit endpoint returned status {status}")),
            Error::Config(message) => CoreError::new(ErrorKind::Configuration).with_message(message),
        }
    }
}
