#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

#[cfg(feature = "reqwest")]
#[cfg_attr(docsrs, doc(cfg(feature = "reqwest")))]
pub mod reqwest;

pub use pdl_core::{AuditProvider, AuditRecord, AuditService, Error, ErrorKind, Result};

/// Tracing target for audit delivery.
pub const TRACING_TARGET: &str = "pdl_webhook";
