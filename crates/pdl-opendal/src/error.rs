//! Storage error types.

use pdl_core::ErrorKind;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Failed to initialize the storage backend.
    #[error("storage initialization failed: {0}")]
    Init(String),

    /// Object not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Permission denied.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Invalid key or local path.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Local filesystem error.
    #[error("local i/o failed: {0}")]
    Io(#[from] std::io::Error),

    /// Backend-specific error.
    #[error("backend error: {0}")]
    Backend(opendal::Error),
}

impl StorageError {
    /// Creates a new initialization error.
    pub fn init(msg: impl Into<String>) -> Self {
        Self::Init(msg.into())
    }

    /// Creates a new invalid path error.
    pub fn invalid_path(msg: impl Into<String>) -> Self {
        Self::InvalidPath(msg.into())
    }

    fn kind(&self) -> ErrorKind {
        match self {
            Self::Init(_) => ErrorKind::Configuration,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::InvalidPath(_) => ErrorKind::InvalidInput,
            Self::Backend(err) if err.is_temporary() => ErrorKind::ServiceUnavailable,
            Self::PermissionDenied(_) | Self::Io(_) | Self::Backend(_) => ErrorKind::ExternalError,
        }
    }
}

impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        use opendal::ErrorKind;

        match err.kind() {
            ErrorKind::NotFound => Self::NotFound(err.to_string()),
            ErrorKind::PermissionDenied => Self::PermissionDenied(err.to_string()),
            _ => Self::Backend(err),
        }
    }
}

impl From<StorageError> for pdl_core::Error {
    fn from(err: StorageError) -> Self {
        let kind = err.kind();
        pdl_core::Error::from_source(kind, err).with_context("object storage")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_opendal_not_found() {
        let err = opendal::Error::new(opendal::ErrorKind::NotFound, "missing");
        assert!(matches!(StorageError::from(err), StorageError::NotFound(_)));
    }

    #[test]
    fn test_into_core_error() {
        let err: pdl_core::Error = StorageError::invalid_path("../etc").into();
        assert_eq!(err.kind, ErrorKind::InvalidInput);

        let err: pdl_core::Error = StorageError::init("no bucket").into();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }
}
