//! Stage handlers run by the [`Coordinator`] for each sub-batch.
//!
//! - **Download**: one batched fetch per sub-batch.
//! - **Recognize**: sequential OCR, persistence and audit per item.
//!
//! [`Coordinator`]: crate::batch::Coordinator

mod download;
mod recognize;

pub use download::DownloadHandler;
pub use recognize::RecognizeHandler;
