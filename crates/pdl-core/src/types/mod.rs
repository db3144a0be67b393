//! Domain types flowing through the pipeline.

mod ocr_result;
mod work_item;

pub use ocr_result::OcrResult;
pub use work_item::WorkItem;
