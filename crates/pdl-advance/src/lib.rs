#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod error;
mod retry;

pub mod client;

pub use client::{AdvClient, AdvConfig};
pub use error::{Error, Result};
pub use retry::RetryPolicy;

/// Logging target for client operations.
pub const TRACING_TARGET_CLIENT: &str = "pdl_advance::client";

/// Logging target for HTTP requests and responses.
pub const TRACING_TARGET_HTTP: &str = "pdl_advance::http";

/// Header carrying the provider API key (`X-ADVAI-KEY`, names are case-insensitive).
pub const API_KEY_HEADER: &str = "x-advai-key";
