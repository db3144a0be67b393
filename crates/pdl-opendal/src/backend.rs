//! Storage backend implementation.

use opendal::Operator;

use crate::config::StorageConfig;
use crate::error::StorageResult;
use crate::TRACING_TARGET;

/// Storage backend that wraps an OpenDAL operator.
#[derive(Clone)]
pub struct StorageBackend {
    operator: Operator,
    config: StorageConfig,
}

impl StorageBackend {
    /// Creates an S3 backend from configuration.
    #[cfg(feature = "s3")]
    #[cfg_attr(docsrs, doc(cfg(feature = "s3")))]
    pub fn new(config: StorageConfig) -> StorageResult<Self> {
        config.validate()?;
        let operator = Self::create_s3_operator(&config)?;

        tracing::info!(
            target: TRACING_TARGET,
            bucket = %config.s3_bucket,
            region = %config.s3_region,
            part_size = config.s3_part_size,
            concurrency = config.s3_concurrency,
            "Storage backend initialized"
        );

        Ok(Self { operator, config })
    }

    /// Creates an in-memory backend.
    #[cfg(feature = "memory")]
    #[cfg_attr(docsrs, doc(cfg(feature = "memory")))]
    pub fn memory(config: StorageConfig) -> StorageResult<Self> {
        let operator = Operator::new(opendal::services::Memory::default())
            .map(|op| op.finish())
            .map_err(|e| crate::StorageError::init(e.to_string()))?;
        Self::from_operator(operator, config)
    }

    /// Wraps an already built operator.
    pub fn from_operator(operator: Operator, config: StorageConfig) -> StorageResult<Self> {
        config.validate()?;

        tracing::debug!(
            target: TRACING_TARGET,
            scheme = %operator.info().scheme(),
            "Storage backend wrapped"
        );

        Ok(Self { operator, config })
    }

    /// Returns the configuration for this backend.
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Underlying operator.
    pub fn operator(&self) -> &Operator {
        &self.operator
    }

    /// Opens a streaming reader for one object.
    ///
    /// The reader fetches the object in parts of the configured size.
    pub async fn reader(&self, key: &str) -> StorageResult<opendal::Reader> {
        let reader = self
            .operator
            .reader_with(key)
            .chunk(self.config.s3_part_size)
            .await?;

        Ok(reader)
    }

    #[cfg(feature = "s3")]
    fn create_s3_operator(config: &StorageConfig) -> StorageResult<Operator> {
        let mut builder = opendal::services::S3::default()
            .bucket(&config.s3_bucket)
            .region(&config.s3_region);

        if let Some(ref endpoint) = config.s3_endpoint {
            builder = builder.endpoint(endpoint);
        }

        if let Some(ref access_key_id) = config.s3_access_key_id {
            builder = builder.access_key_id(access_key_id);
        }

        if let Some(ref secret_access_key) = config.s3_secret_access_key {
            builder = builder.secret_access_key(secret_access_key);
        }

        Operator::new(builder)
            .map(|op| op.finish())
            .map_err(|e| crate::StorageError::init(e.to_string()))
    }
}

impl std::fmt::Debug for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageBackend")
            .field("scheme", &self.operator.info().scheme())
            .field("bucket", &self.config.s3_bucket)
            .finish()
    }
}
