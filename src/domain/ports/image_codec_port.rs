//! Raster decode/transform/encode port definition.

use crate::domain::entities::{EncodedImage, RasterImage};
use crate::domain::errors::ProcessingError;
use crate::domain::services::TransformDecision;

/// Port for the CPU-bound image capability.
///
/// Implementations are synchronous; callers move work onto a blocking pool.
#[cfg_attr(test, mockall::automock)]
pub trait ImageCodecPort: Send + Sync {
    /// Decodes bytes into an orientation-normalized image.
    ///
    /// # Errors
    ///
    /// Returns `ProcessingError::Decode` for unsupported or corrupt input.
    fn decode(&self, bytes: &[u8]) -> Result<RasterImage, ProcessingError>;

    /// Applies the decided action and encodes the result.
    ///
    /// An encode failure in the requested format is retried once as JPEG;
    /// the returned [`EncodedImage::format`] tells which one succeeded.
    ///
    /// # Errors
    ///
    /// Returns `ProcessingError::Geometry` if a crop region does not fit the
    /// image, or `ProcessingError::Encode` if the fallback also fails.
    fn execute(
        &self,
        image: &RasterImage,
        decision: &TransformDecision,
    ) -> Result<EncodedImage, ProcessingError>;
}
