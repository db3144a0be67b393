use jiff::civil::DateTime;
use serde::{Deserialize, Serialize};

use crate::ocr::OcrReply;
use crate::types::WorkItem;
use crate::Error;

/// Service name reported for identity-card OCR calls.
pub const SERVICE_NAME: &str = "PAN OCR";

/// Operator recorded for calls made by the batch job.
pub const SYSTEM_USER: &str = "sys";

/// Two-valued code from the back office's `1000` code class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum YesNo {
    #[serde(rename = "10000001")]
    Yes,
    #[serde(rename = "10000000")]
    No,
}

impl YesNo {
    /// Wire code of this value.
    pub const fn code(self) -> &'static str {
        match self {
            Self::Yes => "10000001",
            Self::No => "10000000",
        }
    }
}

impl From<bool> for YesNo {
    fn from(value: bool) -> Self {
        if value { Self::Yes } else { Self::No }
    }
}

/// One third-party call, successful or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub app_no: String,
    pub regist_no: String,
    pub transaction_id: String,
    pub service_name: String,
    pub inst_user_no: String,
    #[serde(with = "wall_clock")]
    pub request_time: DateTime,
    #[serde(with = "wall_clock")]
    pub response_time: DateTime,
    /// Whether the provider answered at all.
    pub response_status: YesNo,
    pub response_code: String,
    pub response_message: String,
    pub is_pay: YesNo,
    /// Raw provider response.
    pub remark: String,
}

impl AuditRecord {
    /// Record for a call the provider answered.
    pub fn answered(item: &WorkItem, request_time: DateTime, reply: &OcrReply) -> Self {
        let response = &reply.response;
        Self {
            app_no: item.application_no.clone(),
            regist_no: item.phone_no.clone(),
            transaction_id: response.transaction_id.clone(),
            service_name: SERVICE_NAME.to_owned(),
            inst_user_no: SYSTEM_USER.to_owned(),
            request_time,
            response_time: now(),
            response_status: YesNo::Yes,
            response_code: response.code.clone(),
            response_message: response.message.clone(),
            is_pay: response.is_paid().into(),
            remark: reply.raw.clone(),
        }
    }

    /// Record for a call that never produced a usable answer.
    pub fn unanswered(item: &WorkItem, request_time: DateTime, error: &Error) -> Self {
        Self {
            app_no: item.application_no.clone(),
            regist_no: item.phone_no.clone(),
            transaction_id: String::new(),
            service_name: SERVICE_NAME.to_owned(),
            inst_user_no: SYSTEM_USER.to_owned(),
            request_time,
            response_time: now(),
            response_status: YesNo::No,
            response_code: error.kind.to_string(),
            response_message: error.to_string(),
            is_pay: YesNo::No,
            remark: String::new(),
        }
    }
}

/// Local wall-clock time, truncated to seconds.
pub fn now() -> DateTime {
    let now = jiff::Zoned::now().datetime();
    now.with().subsec_nanosecond(0).build().unwrap_or(now)
}

mod wall_clock {
    use jiff::civil::DateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

    pub fn serialize<S>(value: &DateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&value.strftime(FORMAT))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        DateTime::strptime(FORMAT, &value).map_err(serde::de::Error::custom)
    }
}
