//! Repository traits implemented for [`PgConnection`].
//!
//! [`PgConnection`]: crate::PgConnection

mod cust_ocr_result;
mod third_service_record;

pub use cust_ocr_result::OcrResultRepository;
pub use third_service_record::ServiceRecordRepository;
