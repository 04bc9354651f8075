//! Attachment download over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, warn};

use crate::domain::errors::ProcessingError;
use crate::domain::ports::AttachmentFetchPort;

/// Downloads attachment bytes from the CDN.
#[derive(Debug, Clone)]
pub struct HttpAttachmentFetcher {
    http_client: reqwest::Client,
}

impl HttpAttachmentFetcher {
    /// Creates a fetcher whose requests give up after `timeout`.
    ///
    /// # Errors
    /// Returns `ProcessingError::Fetch` if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, ProcessingError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProcessingError::fetch(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { http_client })
    }
}

#[async_trait]
impl AttachmentFetchPort for HttpAttachmentFetcher {
    async fn fetch_bytes(&self, url: &str) -> Result<Bytes, ProcessingError> {
        debug!(url, "Downloading attachment");

        let response = self.http_client.get(url).send().await.map_err(|e| {
            warn!(url, error = %e, "Attachment request failed");
            if e.is_timeout() {
                ProcessingError::fetch("request timed out")
            } else {
                ProcessingError::fetch(format!("Request failed: {e}"))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProcessingError::fetch(format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProcessingError::fetch(format!("Failed to read body: {e}")))?;

        debug!(url, size = bytes.len(), "Attachment downloaded");
        Ok(bytes)
    }
}
