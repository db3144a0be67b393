#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod error;
mod persist;
mod pipeline;
mod report;
mod resume;

pub mod batch;
pub mod handler;
pub mod service;

pub use error::{Result, WorkerError};
pub use persist::persist_ocr_result;
pub use pipeline::{Pipeline, Stage};
pub use report::{BatchReport, ItemOutcome, Progress, RunReport, Tally};
pub use resume::{compute_remaining, load_remaining};
pub use service::{PgResultStore, WorkerConfig, WorkerState};

/// Tracing target for the batch coordinator.
pub const TRACING_TARGET_COORDINATOR: &str = "pdl_worker::coordinator";

/// Tracing target for stage handlers.
pub const TRACING_TARGET_HANDLER: &str = "pdl_worker::handler";

/// Tracing target for pipeline runs.
pub const TRACING_TARGET_PIPELINE: &str = "pdl_worker::pipeline";
