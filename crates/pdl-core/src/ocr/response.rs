//! Provider response payload and its business classification.

use serde::{Deserialize, Deserializer, Serialize};
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};

/// Provider status code as reported in the `code` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum OcrStatus {
    Success,
    Error,
    EmptyParameterError,
    InsufficientBalance,
    ServiceBusy,
    IamFailed,
    OverQueryLimit,
    ParameterError,
    CardTypeNotMatch,
    NoSupportedCard,
    TooManyCards,
    OcrNoResult,
    /// Any code this client does not know about.
    Unknown,
}

impl OcrStatus {
    /// Parses a provider code, mapping unrecognized values to [`OcrStatus::Unknown`].
    pub fn from_code(code: &str) -> Self {
        code.parse().unwrap_or(Self::Unknown)
    }

    /// Business classification of this status.
    pub const fn outcome(self) -> OcrOutcome {
        match self {
            Self::Success => OcrOutcome::Found,
            Self::CardTypeNotMatch | Self::NoSupportedCard | Self::TooManyCards | Self::OcrNoResult => {
                OcrOutcome::NotFound
            }
            _ => OcrOutcome::Error,
        }
    }
}

/// What a provider answer means for the work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum OcrOutcome {
    /// Identity fields were extracted.
    Found,
    /// The provider answered but found no usable card.
    NotFound,
    /// The provider reported an error.
    Error,
}

/// Decoded provider response.
///
/// Missing or `null` fields decode as their defaults, error payloads are sparse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OcrResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub code: String,
    #[serde(deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(deserialize_with = "null_as_default")]
    pub data: OcrData,
    pub extra: Option<serde_json::Value>,
    #[serde(deserialize_with = "null_as_default")]
    pub transaction_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub pricing_strategy: String,
}

impl OcrResponse {
    /// Parsed status code.
    pub fn status(&self) -> OcrStatus {
        OcrStatus::from_code(&self.code)
    }

    /// Whether the provider billed this call.
    pub fn is_paid(&self) -> bool {
        self.pricing_strategy.eq_ignore_ascii_case("PAY")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OcrData {
    #[serde(deserialize_with = "null_as_default")]
    pub card_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub values: OcrValues,
}

/// Identity fields extracted from the card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OcrValues {
    #[serde(deserialize_with = "null_as_default")]
    pub id_number: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub birthday: String,
    #[serde(deserialize_with = "null_as_default")]
    pub father_name: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!(OcrStatus::from_code("SUCCESS"), OcrStatus::Success);
        assert_eq!(OcrStatus::from_code("SERVICE_BUSY"), OcrStatus::ServiceBusy);
        assert_eq!(OcrStatus::from_code("IAM_FAILED"), OcrStatus::IamFailed);
        assert_eq!(OcrStatus::from_code("SOMETHING_NEW"), OcrStatus::Unknown);
        assert_eq!(OcrStatus::from_code(""), OcrStatus::Unknown);
    }

    #[test]
    fn test_status_outcome() {
        assert_eq!(OcrStatus::Success.outcome(), OcrOutcome::Found);
        assert_eq!(OcrStatus::OcrNoResult.outcome(), OcrOutcome::NotFound);
        assert_eq!(OcrStatus::TooManyCards.outcome(), OcrOutcome::NotFound);
        assert_eq!(OcrStatus::ServiceBusy.outcome(), OcrOutcome::Error);
        assert_eq!(OcrStatus::Unknown.outcome(), OcrOutcome::Error);
    }

    #[test]
    fn test_response_decode_full() {
        let body = r#"{
            "code": "SUCCESS",
            "message": "OK",
            "data": {
                "cardType": "PAN_FRONT",
                "values": {"idNumber": "ABCDE1234F", "name": "RAVI", "birthday": "01/01/1990", "fatherName": "MOHAN"}
            },
            "extra": null,
            "transactionId": "tx-1",
            "pricingStrategy": "PAY"
        }"#;

        let response: OcrResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.status(), OcrStatus::Success);
        assert_eq!(response.data.values.id_number, "ABCDE1234F");
        assert_eq!(response.transaction_id, "tx-1");
        assert!(response.is_paid());
    }

    #[test]
    fn test_response_decode_sparse() {
        let response: OcrResponse =
            serde_json::from_str(r#"{"code":"SERVICE_BUSY","data":null,"transactionId":null}"#)
                .unwrap();
        assert_eq!(response.status(), OcrStatus::ServiceBusy);
        assert!(response.data.values.id_number.is_empty());
        assert!(response.transaction_id.is_empty());
        assert!(!response.is_paid());
    }
}
