use serde::{Deserialize, Serialize};

/// One row of the input spreadsheet, immutable once parsed.
///
/// `customer_id` is the unique business key within a run's input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItem {
    /// Customer identifier.
    pub customer_id: String,
    /// Business line the customer belongs to.
    pub business_type: String,
    /// Relative object-storage key, prefix stripped.
    pub storage_key: String,
    /// Loan application number.
    pub application_no: String,
    /// Registered phone number.
    pub phone_no: String,
}

impl WorkItem {
    /// Creates a new work item.
    pub fn new(
        customer_id: impl Into<String>,
        business_type: impl Into<String>,
        storage_key: impl Into<String>,
        application_no: impl Into<String>,
        phone_no: impl Into<String>,
    ) -> Self {
        Self {
            customer_id: customer_id.into(),
            business_type: business_type.into(),
            storage_key: storage_key.into(),
            application_no: application_no.into(),
            phone_no: phone_no.into(),
        }
    }
}
