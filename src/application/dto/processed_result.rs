//! Outcome of processing one attachment.

use crate::domain::entities::EncodedImage;
use crate::domain::ports::OutgoingFile;
use crate::domain::services::{TransformAction, TransformDecision};

/// An encoded image ready to be posted back, plus how to describe it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedResult {
    /// Encoded output.
    pub bytes: Vec<u8>,
    /// Name of the uploaded file, extension matching the actual format.
    pub file_name: String,
    /// MIME type of `bytes`.
    pub content_type: String,
    /// Action that produced the output.
    pub action: TransformAction,
}

impl ProcessedResult {
    /// Builds a result from the executor output and the decision behind it.
    #[must_use]
    pub fn new(encoded: EncodedImage, decision: &TransformDecision) -> Self {
        Self {
            file_name: decision.file_name_for(encoded.format),
            content_type: encoded.format.mime_type().to_string(),
            bytes: encoded.bytes,
            action: decision.action,
        }
    }

    /// Reply text, e.g. `✂️ Trimmed photo.png`.
    #[must_use]
    pub fn label(&self, original_name: &str) -> String {
        format!("{} {original_name}", self.action.label())
    }

    /// Converts into an upload.
    #[must_use]
    pub fn into_file(self) -> OutgoingFile {
        OutgoingFile::new(self.file_name, self.bytes, self.content_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{OutputFormat, Region};

    #[test]
    fn test_fallback_format_drives_name_and_mime() {
        let decision = TransformDecision {
            action: TransformAction::FixedTrim(Region::new(64, 69, 1920, 1080)),
            format: OutputFormat::Avif,
            base_name: "shot".to_string(),
        };
        let encoded = EncodedImage {
            bytes: vec![1, 2, 3],
            format: OutputFormat::Jpeg,
        };

        let result = ProcessedResult::new(encoded, &decision);
        assert_eq!(result.file_name, "shot_trimmed.jpg");
        assert_eq!(result.content_type, "image/jpeg");
        assert_eq!(result.label("shot.avif"), "✂️ Trimmed shot.avif");

        let file = result.into_file();
        assert_eq!(file.name, "shot_trimmed.jpg");
        assert_eq!(file.bytes, vec![1, 2, 3]);
    }
}
