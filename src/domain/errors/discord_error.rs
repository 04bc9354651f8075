//! Discord transport error types.

use thiserror::Error;

/// Errors raised while talking to the Discord REST API or gateway.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum DiscordError {
    #[error("request rejected by Discord: {message}")]
    Rejected { message: String },

    #[error("resource not found: {resource}")]
    NotFound { resource: String },

    #[error("network error talking to Discord: {message}")]
    NetworkError { message: String },

    #[error("rate limited by Discord, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("gateway error: {message}")]
    Gateway { message: String },

    #[error("unexpected Discord error: {message}")]
    Unexpected { message: String },
}

impl DiscordError {
    /// Creates rejected error.
    #[must_use]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    /// Creates not-found error.
    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Creates network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::NetworkError {
            message: message.into(),
        }
    }

    /// Creates gateway error.
    #[must_use]
    pub fn gateway(message: impl Into<String>) -> Self {
        Self::Gateway {
            message: message.into(),
        }
    }

    /// Creates unexpected error.
    #[must_use]
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected {
            message: message.into(),
        }
    }

    /// Returns whether retrying later could succeed.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NetworkError { .. } | Self::RateLimited { .. } | Self::Gateway { .. }
        )
    }

    /// Returns whether error is network related.
    #[must_use]
    pub const fn is_network_error(&self) -> bool {
        matches!(self, Self::NetworkError { .. } | Self::RateLimited { .. })
    }
}
