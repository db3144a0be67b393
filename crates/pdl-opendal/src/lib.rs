#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod backend;
mod config;
mod error;
mod fetch;

pub use backend::StorageBackend;
pub use config::StorageConfig;
pub use error::{StorageError, StorageResult};
pub use fetch::BatchFetcher;

/// Tracing target for storage operations.
pub const TRACING_TARGET: &str = "pdl_opendal";

/// Tracing target for batched fetches.
pub const TRACING_TARGET_FETCH: &str = "pdl_opendal::fetch";
