//! Object storage configuration.

use std::fmt;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::{StorageError, StorageResult};

/// Default transfer part size (5 MiB).
pub const DEFAULT_PART_SIZE: usize = 5 * 1024 * 1024;

/// Default number of objects transferred concurrently per batch.
pub const DEFAULT_CONCURRENCY: usize = 8;

const MAX_CONCURRENCY: usize = 64;
const MIN_PART_SIZE: usize = 64 * 1024;

/// S3 bucket, credentials and transfer knobs.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct StorageConfig {
    /// Bucket holding the identity documents
    #[cfg_attr(feature = "config", arg(long = "s3-bucket", env = "S3_BUCKET"))]
    pub s3_bucket: String,

    /// Bucket region
    #[cfg_attr(
        feature = "config",
        arg(long = "s3-region", env = "S3_REGION", default_value = "ap-south-1")
    )]
    pub s3_region: String,

    /// Custom endpoint for S3-compatible storage
    #[cfg_attr(feature = "config", arg(long = "s3-endpoint", env = "S3_ENDPOINT"))]
    pub s3_endpoint: Option<String>,

    /// Access key id
    #[cfg_attr(
        feature = "config",
        arg(long = "s3-access-key-id", env = "S3_ACCESS_KEY_ID")
    )]
    pub s3_access_key_id: Option<String>,

    /// Secret access key
    #[cfg_attr(
        feature = "config",
        arg(long = "s3-secret-access-key", env = "S3_SECRET_ACCESS_KEY")
    )]
    pub s3_secret_access_key: Option<String>,

    /// Transfer part size in bytes
    #[cfg_attr(
        feature = "config",
        arg(long = "s3-part-size", env = "S3_PART_SIZE", default_value_t = DEFAULT_PART_SIZE)
    )]
    pub s3_part_size: usize,

    /// Objects transferred concurrently per batch
    #[cfg_attr(
        feature = "config",
        arg(long = "s3-concurrency", env = "S3_CONCURRENCY", default_value_t = DEFAULT_CONCURRENCY)
    )]
    pub s3_concurrency: usize,
}

impl StorageConfig {
    /// Creates a configuration for `bucket` with default transfer knobs.
    pub fn new(bucket: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            s3_bucket: bucket.into(),
            s3_region: region.into(),
            s3_endpoint: None,
            s3_access_key_id: None,
            s3_secret_access_key: None,
            s3_part_size: DEFAULT_PART_SIZE,
            s3_concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Sets the custom endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.s3_endpoint = Some(endpoint.into());
        self
    }

    /// Sets the access credentials.
    pub fn with_credentials(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.s3_access_key_id = Some(access_key_id.into());
        self.s3_secret_access_key = Some(secret_access_key.into());
        self
    }

    /// Sets the per-batch object concurrency.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.s3_concurrency = concurrency;
        self
    }

    /// Sets the transfer part size.
    pub fn with_part_size(mut self, part_size: usize) -> Self {
        self.s3_part_size = part_size;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> StorageResult<()> {
        if self.s3_bucket.trim().is_empty() {
            return Err(StorageError::init("bucket name must not be empty"));
        }

        if !(1..=MAX_CONCURRENCY).contains(&self.s3_concurrency) {
            return Err(StorageError::init(format!(
                "concurrency must be between 1 and {MAX_CONCURRENCY}, got {}",
                self.s3_concurrency
            )));
        }

        if self.s3_part_size < MIN_PART_SIZE {
            return Err(StorageError::init(format!(
                "part size must be at least {MIN_PART_SIZE} bytes, got {}",
                self.s3_part_size
            )));
        }

        Ok(())
    }
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("s3_bucket", &self.s3_bucket)
            .field("s3_region", &self.s3_region)
            .field("s3_endpoint", &self.s3_endpoint)
            .field("s3_access_key_id", &self.s3_access_key_id)
            .field(
                "s3_secret_access_key",
                &self.s3_secret_access_key.as_ref().map(|_| "****"),
            )
            .field("s3_part_size", &self.s3_part_size)
            .field("s3_concurrency", &self.s3_concurrency)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = StorageConfig::new("docs", "ap-south-1");
        assert!(config.validate().is_ok());
        assert_eq!(config.s3_part_size, DEFAULT_PART_SIZE);
        assert_eq!(config.s3_concurrency, DEFAULT_CONCURRENCY);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(StorageConfig::new("", "ap-south-1").validate().is_err());
        assert!(
            StorageConfig::new("docs", "ap-south-1")
                .with_concurrency(0)
                .validate()
                .is_err()
        );
        assert!(
            StorageConfig::new("docs", "ap-south-1")
                .with_part_size(1024)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_debug_masks_secret() {
        let config = StorageConfig::new("docs", "ap-south-1").with_credentials("AKIA", "hunter2");
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("AKIA"));
    }
}
