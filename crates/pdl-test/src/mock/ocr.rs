//! Scripted OCR provider.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use pdl_core::{Error, ErrorKind, OcrProvider, OcrReply, Result};

/// Builds a successful provider body with the given card values.
pub fn success_body(pan: &str, name: &str, birthday: &str, father_name: &str) -> String {
    serde_json::json!({
        "code": "SUCCESS",
        "message": "OK",
        "data": {
            "cardType": "PAN_FRONT",
            "values": {
                "idNumber": pan,
                "name": name,
                "birthday": birthday,
                "fatherName": father_name,
            }
        },
        "extra": null,
        "transactionId": format!("tx-{pan}"),
        "pricingStrategy": "PAY",
    })
    .to_string()
}

/// Builds a provider body carrying only a status code.
pub fn status_body(code: &str) -> String {
    serde_json::json!({
        "code": code,
        "message": code.to_lowercase(),
        "data": null,
        "transactionId": "",
        "pricingStrategy": "FREE",
    })
    .to_string()
}

#[derive(Debug, Clone)]
enum Script {
    Body(String),
    Fail(ErrorKind),
}

#[derive(Debug, Default)]
struct Inner {
    scripts: HashMap<String, Script>,
    calls: Vec<PathBuf>,
}

/// OCR provider that answers from a per-file-name script.
///
/// Files without a script get a `NO_SUPPORTED_CARD` body.
#[derive(Debug, Clone, Default)]
pub struct MockOcrProvider {
    inner: Arc<Mutex<Inner>>,
    delay: Option<Duration>,
}

impl MockOcrProvider {
    /// Creates a provider with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers requests for `file_name` with `body`.
    pub fn with_body(self, file_name: impl Into<String>, body: impl Into<String>) -> Self {
        self.script(file_name.into(), Script::Body(body.into()));
        self
    }

    /// Fails requests for `file_name` with an error of `kind`.
    pub fn with_failure(self, file_name: impl Into<String>, kind: ErrorKind) -> Self {
        self.script(file_name.into(), Script::Fail(kind));
        self
    }

    /// Sleeps before every answer.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Paths requested so far, in call order.
    pub fn calls(&self) -> Vec<PathBuf> {
        self.lock().calls.clone()
    }

    fn script(&self, file_name: String, script: Script) {
        self.lock().scripts.insert(file_name, script);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait::async_trait]
impl OcrProvider for MockOcrProvider {
    async fn request(&self, path: &Path) -> Result<OcrReply> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let script = {
            let mut inner = self.lock();
            inner.calls.push(path.to_path_buf());
            inner.scripts.get(&file_name).cloned()
        };

        match script {
            Some(Script::Body(body)) => OcrReply::from_raw(body, 1),
            Some(Script::Fail(kind)) => {
                Err(Error::new(kind).with_message(format!("scripted failure for {file_name}")))
            }
            None => OcrReply::from_raw(status_body("NO_SUPPORTED_CARD"), 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use pdl_core::OcrStatus;

    use super::*;

    #[tokio::test]
    async fn test_scripted_answers() {
        let provider = MockOcrProvider::new()
            .with_body("a.jpg", success_body("ABCDE1234F", "RAVI", "01/01/1990", "SURESH"))
            .with_failure("b.jpg", ErrorKind::NetworkError);

        let reply = provider.request(Path::new("/data/x/a.jpg")).await.unwrap();
        assert_eq!(reply.response.status(), OcrStatus::Success);
        assert_eq!(reply.response.data.values.id_number, "ABCDE1234F");

        let error = provider.request(Path::new("/data/b.jpg")).await.unwrap_err();
        assert_eq!(error.kind, ErrorKind::NetworkError);

        let reply = provider.request(Path::new("c.jpg")).await.unwrap();
        assert_eq!(reply.response.status(), OcrStatus::NoSupportedCard);

        assert_eq!(provider.calls().len(), 3);
    }
}
