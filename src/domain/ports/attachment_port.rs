//! Attachment download port definition.

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::errors::ProcessingError;

/// Port for downloading attachment bytes by URL.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttachmentFetchPort: Send + Sync {
    /// Downloads the full body at `url`.
    ///
    /// # Errors
    ///
    /// Returns `ProcessingError::Fetch` when the bytes are unreachable,
    /// the server answers with an error status, or the request times out.
    async fn fetch_bytes(&self, url: &str) -> Result<Bytes, ProcessingError>;
}
