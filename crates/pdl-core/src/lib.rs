#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod error;

pub mod audit;
pub mod fetch;
pub mod ocr;
pub mod source;
pub mod store;
pub mod types;

pub use audit::{AuditProvider, AuditRecord, AuditService, AuditTally, YesNo};
pub use error::{BoxedError, Error, ErrorKind, Result};
pub use fetch::{DocumentFetcher, FetchReport};
pub use ocr::{OcrOutcome, OcrProvider, OcrReply, OcrResponse, OcrService, OcrStatus};
pub use source::SpreadsheetSource;
pub use store::ResultStore;
pub use types::{OcrResult, WorkItem};
