//! Mock implementations of the pipeline seams.

mod audit;
mod fetch;
mod ocr;
mod store;

pub use audit::MockAuditProvider;
pub use fetch::MockFetcher;
pub use ocr::{MockOcrProvider, status_body, success_body};
pub use store::MemoryStore;
