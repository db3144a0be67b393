//! Identity-card OCR HTTP client.

use std::path::Path;

use pdl_core::{OcrProvider, OcrReply, OcrResponse, OcrStatus};
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::{Form, Part};
use url::Url;

use crate::{
    API_KEY_HEADER, AdvConfig, Error, Result, TRACING_TARGET_CLIENT, TRACING_TARGET_HTTP,
};

/// HTTP client for the OCR provider.
#[derive(Debug, Clone)]
pub struct AdvClient {
    http_client: Client,
    url: Url,
    config: AdvConfig,
}

impl AdvClient {
    /// Create a new client with the given configuration.
    pub fn new(config: AdvConfig) -> Result<Self> {
        config.validate()?;
        let url = config.url()?;

        let mut api_key = HeaderValue::from_str(&config.ocr_api_key)
            .map_err(|e| Error::config(format!("Invalid API key: {e}")))?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static(API_KEY_HEADER), api_key);

        let http_client = Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))?;

        tracing::debug!(
            target: TRACING_TARGET_CLIENT,
            url = %url,
            timeout = ?config.timeout(),
            max_attempts = config.ocr_max_attempts,
            "OCR client initialized"
        );

        Ok(Self {
            http_client,
            url,
            config,
        })
    }

    /// Get a reference to the client configuration.
    pub fn config(&self) -> &AdvConfig {
        &self.config
    }

    /// Submits the image at `path` and returns the decoded answer.
    ///
    /// A busy provider is retried up to the configured number of attempts,
    /// after which the last busy payload is returned.
    pub async fn request_ocr(&self, path: &Path) -> Result<OcrReply> {
        if !tokio::fs::try_exists(path).await? {
            tracing::error!(
                target: TRACING_TARGET_CLIENT,
                path = %path.display(),
                "Image file does not exist"
            );
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_owned());
        let mime_type = mime_type(path);

        let policy = self.config.retry_policy();
        let mut attempt = 1;

        loop {
            let image = Part::bytes(bytes.clone())
                .file_name(file_name.clone())
                .mime_str(mime_type)?;
            let form = Form::new()
                .part("image", image)
                .text("cardType", self.config.ocr_card_type.clone());

            let response = self
                .http_client
                .post(self.url.clone())
                .multipart(form)
                .send()
                .await?;

            let status = response.status();
            let body = response.text().await?;

            tracing::debug!(
                target: TRACING_TARGET_HTTP,
                status = status.as_u16(),
                size = body.len(),
                attempt,
                "Received response from OCR provider"
            );

            if !status.is_success() {
                tracing::error!(
                    target: TRACING_TARGET_CLIENT,
                    path = %path.display(),
                    status = status.as_u16(),
                    attempt,
                    "OCR provider returned an error status"
                );
                return Err(Error::api(status.as_u16(), body));
            }

            let response: OcrResponse = match serde_json::from_str(&body) {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!(
                        target: TRACING_TARGET_CLIENT,
                        path = %path.display(),
                        error = %e,
                        "OCR provider returned a malformed body"
                    );
                    return Err(Error::invalid_response(e.to_string(), body));
                }
            };

            if response.status() == OcrStatus::ServiceBusy {
                if policy.should_retry(attempt) {
                    let backoff = policy.jittered_backoff(attempt);
                    tracing::warn!(
                        target: TRACING_TARGET_CLIENT,
                        path = %path.display(),
                        attempt,
                        max_attempts = policy.max_attempts,
                        backoff_ms = backoff.as_millis(),
                        "OCR provider busy, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                    continue;
                }

                tracing::warn!(
                    target: TRACING_TARGET_CLIENT,
                    path = %path.display(),
                    attempts = attempt,
                    "OCR provider still busy, giving up"
                );
            }

            return Ok(OcrReply {
                raw: body,
                response,
                attempts: attempt,
            });
        }
    }
}

#[async_trait::async_trait]
impl OcrProvider for AdvClient {
    async fn request(&self, path: &Path) -> pdl_core::Result<OcrReply> {
        Ok(self.request_ocr(path).await?)
    }
}

/// MIME type from the file extension.
fn mime_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("bmp") => "image/bmp",
        Some("webp") => "image/webp",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pdl_core::ErrorKind;
    use tempfile::TempDir;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const BUSY: &str = r#"{"code":"SERVICE_BUSY","message":"busy","data":null}"#;
    const FOUND: &str = r#"{
        "code": "SUCCESS",
        "message": "OK",
        "data": {"cardType": "PAN_FRONT", "values": {"idNumber": "ABCDE1234F", "name": "RAVI", "birthday": "01/01/1990", "fatherName": "MOHAN"}},
        "transactionId": "tx-1",
        "pricingStrategy": "PAY"
    }"#;

    fn image() -> (TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.jpg");
        std::fs::write(&path, "fake-jpeg-bytes").unwrap();
        (dir, path)
    }

    fn client(server: &MockServer) -> AdvClient {
        let config = AdvConfig::new(format!("{}/ocr", server.uri()), "secret")
            .with_backoff(Duration::from_millis(1), Duration::from_millis(5));
        AdvClient::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_always_busy_makes_exactly_three_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ocr"))
            .respond_with(ResponseTemplate::new(200).set_body_string(BUSY))
            .expect(3)
            .mount(&server)
            .await;

        let (_dir, image) = image();
        let reply = client(&server).request_ocr(&image).await.unwrap();

        assert_eq!(reply.attempts, 3);
        assert_eq!(reply.response.status(), OcrStatus::ServiceBusy);
        assert_eq!(reply.raw, BUSY);
    }

    #[tokio::test]
    async fn test_busy_then_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string(BUSY))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string(FOUND))
            .expect(1)
            .mount(&server)
            .await;

        let (_dir, image) = image();
        let reply = client(&server).request_ocr(&image).await.unwrap();

        assert_eq!(reply.attempts, 2);
        assert_eq!(reply.response.status(), OcrStatus::Success);
        assert_eq!(reply.response.data.values.id_number, "ABCDE1234F");
    }

    #[tokio::test]
    async fn test_request_carries_key_card_type_and_image() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ocr"))
            .and(header(API_KEY_HEADER, "secret"))
            .and(body_string_contains("name=\"cardType\""))
            .and(body_string_contains("PAN_FRONT"))
            .and(body_string_contains("name=\"image\""))
            .and(body_string_contains("fake-jpeg-bytes"))
            .respond_with(ResponseTemplate::new(200).set_body_string(FOUND))
            .expect(1)
            .mount(&server)
            .await;

        let (_dir, image) = image();
        let reply = client(&server).request_ocr(&image).await.unwrap();
        assert_eq!(reply.attempts, 1);
        assert!(reply.response.is_paid());
    }

    #[tokio::test]
    async fn test_error_status_is_terminal() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&server)
            .await;

        let (_dir, image) = image();
        let error = client(&server).request_ocr(&image).await.unwrap_err();
        assert_eq!(error.status_code(), Some(500));
    }

    #[tokio::test]
    async fn test_malformed_body_is_terminal() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let (_dir, image) = image();
        let error = client(&server).request_ocr(&image).await.unwrap_err();
        assert!(matches!(error, Error::InvalidResponse { .. }));
    }

    #[tokio::test]
    async fn test_missing_file_fails_before_any_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string(FOUND))
            .expect(0)
            .mount(&server)
            .await;

        let error = client(&server)
            .request(Path::new("/definitely/not/here.jpg"))
            .await
            .unwrap_err();
        assert_eq!(error.kind, ErrorKind::NotFound);
    }

    #[test]
    fn test_mime_type() {
        assert_eq!(mime_type(Path::new("a.JPG")), "image/jpeg");
        assert_eq!(mime_type(Path::new("a.png")), "image/png");
        assert_eq!(mime_type(Path::new("a")), "application/octet-stream");
    }
}
