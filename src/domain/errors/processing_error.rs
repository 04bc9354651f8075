//! Per-attachment processing error types.

use thiserror::Error;

use crate::domain::entities::{OutputFormat, Region};

/// Failures that can occur while processing a single attachment.
///
/// None of these are fatal: the attachment loop catches them, reports them
/// and moves on to the next attachment.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum ProcessingError {
    #[error("failed to fetch attachment: {message}")]
    Fetch { message: String },

    #[error("not a supported image: {message}")]
    Decode { message: String },

    #[error("region {region} does not fit inside the {width}x{height} image")]
    Geometry {
        region: Region,
        width: u32,
        height: u32,
    },

    #[error("failed to encode {format} output: {message}")]
    Encode {
        format: OutputFormat,
        message: String,
    },

    #[error("image worker failed: {message}")]
    Worker { message: String },
}

impl ProcessingError {
    /// Creates fetch error.
    #[must_use]
    pub fn fetch(message: impl Into<String>) -> Self {
        Self::Fetch {
            message: message.into(),
        }
    }

    /// Creates decode error.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Creates geometry error.
    #[must_use]
    pub const fn geometry(region: Region, width: u32, height: u32) -> Self {
        Self::Geometry {
            region,
            width,
            height,
        }
    }

    /// Creates encode error.
    #[must_use]
    pub fn encode(format: OutputFormat, message: impl Into<String>) -> Self {
        Self::Encode {
            format,
            message: message.into(),
        }
    }

    /// Creates worker error.
    #[must_use]
    pub fn worker(message: impl Into<String>) -> Self {
        Self::Worker {
            message: message.into(),
        }
    }

    /// Returns whether the failure points at a configuration mismatch and
    /// is answered with a reply on the source message.
    #[must_use]
    pub const fn should_report_visibly(&self) -> bool {
        matches!(self, Self::Geometry { .. })
    }

    /// Short label used in logs and reports.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Fetch { .. } => "fetch",
            Self::Decode { .. } => "decode",
            Self::Geometry { .. } => "geometry",
            Self::Encode { .. } => "encode",
            Self::Worker { .. } => "worker",
        }
    }
}
