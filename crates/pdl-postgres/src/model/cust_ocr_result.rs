//! Extracted identity fields, one row per successful recognition.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::cust_ocr_results;

/// Stored OCR result for a customer.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = cust_ocr_results)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CustOcrResult {
    /// Row identifier.
    pub id: Uuid,
    /// Customer the card image belongs to.
    pub customer_id: String,
    /// Business line code copied from the work list.
    pub business_type: String,
    /// Provider status code, always the success sentinel.
    pub provider_code: String,
    /// Provider status message.
    pub provider_message: String,
    /// Extracted PAN.
    pub pan_number: String,
    /// Card holder name.
    pub customer_name: String,
    /// Date of birth as printed on the card.
    pub birthday: String,
    pub father_name: String,
    pub inserted_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Customer id and provider code of a stored result, as read by the resume query.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable)]
#[diesel(table_name = cust_ocr_results)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProcessedCustomer {
    pub customer_id: String,
    pub provider_code: String,
}

/// Data for inserting an OCR result.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = cust_ocr_results)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewCustOcrResult {
    pub id: Uuid,
    pub customer_id: String,
    pub business_type: String,
    pub provider_code: String,
    pub provider_message: String,
    pub pan_number: String,
    pub customer_name: String,
    pub birthday: String,
    pub father_name: String,
    pub inserted_at: Timestamp,
    pub updated_at: Timestamp,
}

impl CustOcrResult {
    /// Returns whether a PAN was actually extracted.
    pub fn has_pan_number(&self) -> bool {
        !self.pan_number.trim().is_empty()
    }
}
