//! Audit trail of third-party calls.

use diesel::prelude::*;
use jiff_diesel::{DateTime, Timestamp};
use uuid::Uuid;

use crate::schema::third_service_records;

/// One recorded third-party call.
///
/// Request and response times are local wall-clock values, matching what the
/// back office receives.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = third_service_records)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ThirdServiceRecord {
    pub id: Uuid,
    /// Application number of the customer.
    pub app_no: String,
    /// Registration (phone) number of the customer.
    pub regist_no: String,
    pub transaction_id: String,
    pub service_name: String,
    pub inst_user_no: String,
    pub request_time: DateTime,
    pub response_time: DateTime,
    /// Yes/no code: whether the provider answered.
    pub response_status: String,
    pub response_code: String,
    pub response_message: String,
    /// Yes/no code: whether the call was billed.
    pub is_pay: String,
    /// Raw provider response.
    pub remark: String,
    pub created_at: Timestamp,
}

/// Data for inserting an audit record.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = third_service_records)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewThirdServiceRecord {
    pub id: Uuid,
    pub app_no: String,
    pub regist_no: String,
    pub transaction_id: String,
    pub service_name: String,
    pub inst_user_no: String,
    pub request_time: DateTime,
    pub response_time: DateTime,
    pub response_status: String,
    pub response_code: String,
    pub response_message: String,
    pub is_pay: String,
    pub remark: String,
}
