//! Reqwest-based HTTP client for audit delivery.
//!
//! # Example
//!
//! ```rust,ignore
//! use pdl_webhook::reqwest::{ReqwestClient, ReqwestConfig};
//!
//! let config = ReqwestConfig::new("https://events.example.com/third-service");
//! let service = ReqwestClient::new(config)?.into_service();
//! service.report(record);
//! ```

mod client;
mod config;
mod error;

pub use client::ReqwestClient;
pub use config::ReqwestConfig;
pub use error::{Error, Result};

/// Tracing target for reqwest client operations.
pub const TRACING_TARGET: &str = "pdl_webhook::reqwest";
