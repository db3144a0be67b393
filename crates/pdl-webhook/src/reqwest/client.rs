//! Reqwest-based HTTP client for audit delivery.

use std::sync::Arc;
use std::time::Instant;

use pdl_core::{AuditProvider, AuditRecord, AuditService};
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use url::Url;

use super::{Error, ReqwestConfig, Result, TRACING_TARGET};

/// Inner client that holds the HTTP client and configuration.
struct ReqwestClientInner {
    http: Client,
    url: Url,
    config: ReqwestConfig,
}

/// Reqwest-based client POSTing audit records to the event endpoint.
#[derive(Clone)]
pub struct ReqwestClient {
    inner: Arc<ReqwestClientInner>,
}

impl std::fmt::Debug for ReqwestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestClient")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl ReqwestClient {
    /// Creates a new reqwest client with the given configuration.
    pub fn new(config: ReqwestConfig) -> Result<Self> {
        let url = config.url()?;
        let timeout = config.effective_timeout();
        let user_agent = config.effective_user_agent();

        tracing::debug!(
            target: TRACING_TARGET,
            url = %url,
            timeout_ms = timeout.as_millis(),
            "Creating reqwest client"
        );

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(&user_agent)
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        Ok(Self {
            inner: Arc::new(ReqwestClientInner { http, url, config }),
        })
    }

    /// Gets the client configuration.
    pub fn config(&self) -> &ReqwestConfig {
        &self.inner.config
    }

    /// Converts this client into an [`AuditService`].
    pub fn into_service(self) -> AuditService {
        AuditService::new(self)
    }

    async fn post(&self, record: &AuditRecord) -> Result<u16> {
        let payload = serde_json::to_vec(record)?;

        let response = self
            .inner
            .http
            .post(self.inner.url.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status(status.as_u16()));
        }

        Ok(status.as_u16())
    }
}

#[async_trait::async_trait]
impl AuditProvider for ReqwestClient {
    async fn deliver(&self, record: &AuditRecord) -> pdl_core::Result<()> {
        let started_at = Instant::now();

        match self.post(record).await {
            Ok(status_code) => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    app_no = %record.app_no,
                    status_code,
                    elapsed_ms = started_at.elapsed().as_millis(),
                    "Audit record posted"
                );
                Ok(())
            }
            Err(error) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    app_no = %record.app_no,
                    error = %error,
                    "Audit record post failed"
                );
                Err(error.into())
            }
        }
    }
}
