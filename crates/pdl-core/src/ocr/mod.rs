//! Identity-card OCR abstractions.
//!
//! The provider seam hands back the raw payload together with its decoded form.
//! Business classification (found, not found, error) is left to the caller via
//! [`OcrStatus::outcome`].

use std::path::Path;

mod response;
mod service;

pub use response::{OcrData, OcrOutcome, OcrResponse, OcrStatus, OcrValues};
pub use service::OcrService;

use crate::Result;

/// Tracing target for OCR operations.
pub const TRACING_TARGET: &str = "pdl_core::ocr";

/// A decoded provider answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrReply {
    /// Response body exactly as received.
    pub raw: String,
    /// Decoded response body.
    pub response: OcrResponse,
    /// Number of HTTP attempts it took to obtain this answer.
    pub attempts: u32,
}

impl OcrReply {
    /// Decodes a raw body into a reply.
    pub fn from_raw(raw: impl Into<String>, attempts: u32) -> Result<Self> {
        let raw = raw.into();
        let response = serde_json::from_str(&raw)?;
        Ok(Self {
            raw,
            response,
            attempts,
        })
    }
}

/// Core trait for OCR providers.
///
/// Implementations own transport concerns including the bounded retry on a
/// busy provider. Any returned `Ok` carries a parseable payload.
#[async_trait::async_trait]
pub trait OcrProvider: Send + Sync {
    /// Submits the image at `path` for recognition.
    async fn request(&self, path: &Path) -> Result<OcrReply>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_reply_from_raw() {
        let reply = OcrReply::from_raw(r#"{"code":"SUCCESS"}"#, 1).unwrap();
        assert_eq!(reply.response.status(), OcrStatus::Success);
        assert_eq!(reply.attempts, 1);
    }

    #[test]
    fn test_reply_from_malformed() {
        let error = OcrReply::from_raw("<html>", 1).unwrap_err();
        assert_eq!(error.kind, ErrorKind::Serialization);
    }
}
