//! Row types for the result store tables.

mod cust_ocr_result;
mod third_service_record;

pub use cust_ocr_result::{CustOcrResult, NewCustOcrResult, ProcessedCustomer};
pub use third_service_record::{NewThirdServiceRecord, ThirdServiceRecord};
