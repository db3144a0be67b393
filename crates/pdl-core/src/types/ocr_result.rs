use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ocr::{OcrResponse, OcrStatus};
use crate::types::WorkItem;

/// A successful identity extraction, append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrResult {
    pub id: Uuid,
    pub customer_id: String,
    pub business_type: String,
    pub provider_code: String,
    pub provider_message: String,
    pub pan_number: String,
    pub name: String,
    pub birthday: String,
    pub father_name: String,
    pub inserted_at: Timestamp,
    pub updated_at: Timestamp,
}

impl OcrResult {
    /// Builds a result row from a provider response.
    ///
    /// Returns `None` unless the provider code is the success sentinel.
    pub fn from_response(item: &WorkItem, response: &OcrResponse) -> Option<Self> {
        if response.status() != OcrStatus::Success {
            return None;
        }

        let now = Timestamp::now();
        let values = &response.data.values;

        Some(Self {
            id: Uuid::new_v4(),
            customer_id: item.customer_id.clone(),
            business_type: item.business_type.clone(),
            provider_code: response.code.clone(),
            provider_message: response.message.clone(),
            pan_number: values.id_number.clone(),
            name: values.name.clone(),
            birthday: values.birthday.clone(),
            father_name: values.father_name.clone(),
            inserted_at: now,
            updated_at: now,
        })
    }
}
