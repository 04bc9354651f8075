//! Chooses what to do with a decoded image and what to call the result.

use crate::domain::entities::{ImageMetadata, OutputFormat, RasterImage, Region};

use super::border_scanner::{BorderMeasurement, BorderScanner};

const FALLBACK_BASE_NAME: &str = "image";

/// A catalogued frame layout: images of exactly this size are trimmed to a
/// known rectangle without running border detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibratedRegion {
    /// Width an image must have to match.
    pub expected_width: u32,
    /// Height an image must have to match.
    pub expected_height: u32,
    /// Rectangle kept on a match.
    pub crop: Region,
}

impl CalibratedRegion {
    /// Returns true if the metadata has exactly the expected dimensions.
    #[must_use]
    pub const fn matches(&self, width: u32, height: u32) -> bool {
        self.expected_width == width && self.expected_height == height
    }
}

impl Default for CalibratedRegion {
    fn default() -> Self {
        Self {
            expected_width: 2048,
            expected_height: 1440,
            crop: Region::new(64, 69, 1920, 1080),
        }
    }
}

/// Decider configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeciderConfig {
    /// Longest side an image may have before it is downscaled.
    pub max_size: u32,
    /// Optional fixed layout that wins over border detection.
    pub template: Option<CalibratedRegion>,
}

impl Default for DeciderConfig {
    fn default() -> Self {
        Self {
            max_size: 2048,
            template: Some(CalibratedRegion::default()),
        }
    }
}

/// The pixel operation chosen for an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformAction {
    /// Leave the pixels alone.
    Skip,
    /// Extract the calibrated rectangle.
    FixedTrim(Region),
    /// Extract the content inside a detected border.
    ProportionalCrop(Region),
    /// Downscale to the given size.
    Resize {
        /// Target width.
        width: u32,
        /// Target height.
        height: u32,
    },
}

impl TransformAction {
    /// File name tag for the action.
    #[must_use]
    pub const fn suffix(&self) -> &'static str {
        match self {
            Self::Skip => "",
            Self::FixedTrim(_) => "_trimmed",
            Self::ProportionalCrop(_) => "_cropped",
            Self::Resize { .. } => "_resized",
        }
    }

    /// Verb shown to users in the reply.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Skip => "Unchanged",
            Self::FixedTrim(_) => "✂️ Trimmed",
            Self::ProportionalCrop(_) => "✂️ Cropped",
            Self::Resize { .. } => "🔄 Resized",
        }
    }

    /// Returns true when no pixel operation is needed.
    #[must_use]
    pub const fn is_skip(&self) -> bool {
        matches!(self, Self::Skip)
    }

    /// Size of the image the action produces from a `width` x `height` input.
    #[must_use]
    pub const fn output_size(&self, width: u32, height: u32) -> (u32, u32) {
        match *self {
            Self::Skip => (width, height),
            Self::FixedTrim(region) | Self::ProportionalCrop(region) => {
                (region.width, region.height)
            }
            Self::Resize { width, height } => (width, height),
        }
    }
}

/// Full outcome of a decision: action, output format and naming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformDecision {
    /// Operation to perform.
    pub action: TransformAction,
    /// Requested output format.
    pub format: OutputFormat,
    /// Original file name without its extension.
    pub base_name: String,
}

impl TransformDecision {
    /// Destination file name for the requested format.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.file_name_for(self.format)
    }

    /// Destination file name for a specific format, used after an encode fallback.
    #[must_use]
    pub fn file_name_for(&self, format: OutputFormat) -> String {
        format!(
            "{}{}.{}",
            self.base_name,
            self.action.suffix(),
            format.extension()
        )
    }
}

/// Deterministic decision pipeline between border detection and transform.
#[derive(Debug, Clone, Default)]
pub struct TransformDecider {
    config: DeciderConfig,
    scanner: BorderScanner,
}

impl TransformDecider {
    /// Creates a decider.
    #[must_use]
    pub const fn new(config: DeciderConfig, scanner: BorderScanner) -> Self {
        Self { config, scanner }
    }

    /// Returns the decider configuration.
    #[must_use]
    pub const fn config(&self) -> &DeciderConfig {
        &self.config
    }

    /// Picks an action. First match wins: calibrated template, detected
    /// border, oversize resize, then skip.
    #[must_use]
    pub fn decide(
        &self,
        metadata: &ImageMetadata,
        border: Option<BorderMeasurement>,
        file_name: &str,
    ) -> TransformDecision {
        let ImageMetadata { width, height, .. } = *metadata;

        let action = if let Some(template) = self.matching_template(width, height) {
            TransformAction::FixedTrim(template.crop)
        } else if let Some(border) = border {
            TransformAction::ProportionalCrop(border.content_region(width, height))
        } else if width.max(height) > self.config.max_size {
            let (width, height) = fit_inside(width, height, self.config.max_size);
            TransformAction::Resize { width, height }
        } else {
            TransformAction::Skip
        };

        TransformDecision {
            action,
            format: OutputFormat::preserving(metadata.format),
            base_name: base_name(file_name),
        }
    }

    /// Scans the image for a border when needed and decides.
    ///
    /// Template-sized images skip the scan since the template always wins.
    #[must_use]
    pub fn plan(&self, image: &RasterImage, file_name: &str) -> TransformDecision {
        let metadata = image.metadata();
        let border = if self.matching_template(metadata.width, metadata.height).is_some() {
            None
        } else {
            self.scanner.scan_image(&image.to_rgba8())
        };

        self.decide(&metadata, border, file_name)
    }

    fn matching_template(&self, width: u32, height: u32) -> Option<&CalibratedRegion> {
        self.config
            .template
            .as_ref()
            .filter(|template| template.matches(width, height))
    }
}

/// Scales `width` x `height` down so the longer side equals `max_size`.
///
/// Ties favor width. Never enlarges; the short side is rounded and kept at
/// least one pixel.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn fit_inside(width: u32, height: u32, max_size: u32) -> (u32, u32) {
    if width.max(height) <= max_size || max_size == 0 {
        return (width, height);
    }

    let scale = |short: u32, long: u32| -> u32 {
        let scaled = (f64::from(short) * f64::from(max_size) / f64::from(long)).round();
        (scaled as u32).max(1)
    };

    if width >= height {
        (max_size, scale(height, width))
    } else {
        (scale(width, height), max_size)
    }
}

/// Strips the final extension from a file name.
///
/// Falls back to `"image"` when nothing usable remains.
#[must_use]
pub fn base_name(file_name: &str) -> String {
    let trimmed = file_name.trim();
    let stem = match trimmed.rfind('.') {
        Some(0) | None => trimmed,
        Some(dot) => &trimmed[..dot],
    };

    if stem.is_empty() || stem == "." {
        FALLBACK_BASE_NAME.to_string()
    } else {
        stem.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::SourceFormat;
    use image::{DynamicImage, Rgba, RgbaImage};
    use test_case::test_case;

    fn metadata(width: u32, height: u32, format: SourceFormat) -> ImageMetadata {
        ImageMetadata {
            width,
            height,
            format,
        }
    }

    fn raster(image: RgbaImage, format: SourceFormat) -> RasterImage {
        RasterImage::new(DynamicImage::ImageRgba8(image), format).unwrap()
    }

    #[test]
    fn test_oversized_photo_is_resized() {
        let decider = TransformDecider::default();
        let decision = decider.decide(&metadata(4000, 3000, SourceFormat::Jpeg), None, "photo.JPG");

        assert_eq!(
            decision.action,
            TransformAction::Resize {
                width: 2048,
                height: 1536
            }
        );
        assert_eq!(decision.file_name(), "photo_resized.jpg");
    }

    #[test]
    fn test_template_sized_image_is_trimmed() {
        let decider = TransformDecider::default();
        let decision = decider.decide(
            &metadata(2048, 1440, SourceFormat::Png),
            None,
            "screenshot.png",
        );

        assert_eq!(
            decision.action,
            TransformAction::FixedTrim(Region::new(64, 69, 1920, 1080))
        );
        assert_eq!(decision.action.output_size(2048, 1440), (1920, 1080));
        assert_eq!(decision.file_name(), "screenshot_trimmed.png");
    }

    #[test]
    fn test_template_wins_over_detected_border() {
        let decider = TransformDecider::default();
        let border = BorderMeasurement {
            top: 10,
            bottom: 10,
            left: 10,
            right: 10,
        };
        let decision = decider.decide(
            &metadata(2048, 1440, SourceFormat::Png),
            Some(border),
            "frame.png",
        );

        assert!(matches!(decision.action, TransformAction::FixedTrim(_)));
    }

    #[test]
    fn test_full_bleed_template_image_is_trimmed() {
        let solid = RgbaImage::from_pixel(2048, 1440, Rgba([12, 120, 200, 255]));
        let decision = TransformDecider::default().plan(&raster(solid, SourceFormat::Png), "a.png");

        assert_eq!(
            decision.action,
            TransformAction::FixedTrim(Region::new(64, 69, 1920, 1080))
        );
    }

    #[test]
    fn test_bordered_image_is_cropped() {
        let image = RgbaImage::from_fn(1200, 800, |x, y| {
            if (20..1180).contains(&x) && (20..780).contains(&y) {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        });
        let decision =
            TransformDecider::default().plan(&raster(image, SourceFormat::WebP), "art.webp");

        assert_eq!(
            decision.action,
            TransformAction::ProportionalCrop(Region::new(20, 20, 1160, 760))
        );
        assert_eq!(decision.file_name(), "art_cropped.webp");
    }

    #[test]
    fn test_small_image_is_skipped() {
        let decision = TransformDecider::default().decide(
            &metadata(800, 600, SourceFormat::Bmp),
            None,
            "tiny.bmp",
        );

        assert!(decision.action.is_skip());
        assert_eq!(decision.format, OutputFormat::Jpeg);
    }

    #[test]
    fn test_without_template_exact_size_falls_through() {
        let decider = TransformDecider::new(
            DeciderConfig {
                max_size: 2048,
                template: None,
            },
            BorderScanner::default(),
        );
        let decision = decider.decide(&metadata(2048, 1440, SourceFormat::Png), None, "x.png");

        assert!(decision.action.is_skip());
    }

    #[test_case(4000, 3000, (2048, 1536) ; "landscape")]
    #[test_case(3000, 4000, (1536, 2048) ; "portrait")]
    #[test_case(5000, 5000, (2048, 2048) ; "square_favors_width")]
    #[test_case(2048, 2048, (2048, 2048) ; "at_limit")]
    #[test_case(1000, 700, (1000, 700) ; "never_upscaled")]
    #[test_case(100_000, 10, (2048, 1) ; "short_side_at_least_one")]
    #[test_case(3001, 2000, (2048, 1365) ; "rounded")]
    fn test_fit_inside(width: u32, height: u32, expected: (u32, u32)) {
        assert_eq!(fit_inside(width, height, 2048), expected);
    }

    #[test]
    fn test_resize_preserves_aspect_within_one_pixel() {
        for (w, h) in [(4001, 2999), (2049, 17), (9999, 4321), (2500, 7777)] {
            let (tw, th) = fit_inside(w, h, 2048);
            assert_eq!(tw.max(th), 2048);
            let exact = f64::from(w.min(h)) * 2048.0 / f64::from(w.max(h));
            assert!((f64::from(tw.min(th)) - exact).abs() <= 1.0);
        }
    }

    #[test_case("photo.jpg", "photo" ; "simple")]
    #[test_case("archive.tar.gz", "archive.tar" ; "last_extension_only")]
    #[test_case("noext", "noext" ; "no_extension")]
    #[test_case(".hidden", ".hidden" ; "leading_dot")]
    #[test_case("", "image" ; "empty")]
    #[test_case(".", "image" ; "only_dot")]
    fn test_base_name(input: &str, expected: &str) {
        assert_eq!(base_name(input), expected);
    }

    #[test]
    fn test_fallback_file_name_uses_fallback_extension() {
        let decision = TransformDecider::default().decide(
            &metadata(2048, 1440, SourceFormat::Avif),
            None,
            "shot.avif",
        );

        assert_eq!(decision.file_name(), "shot_trimmed.avif");
        assert_eq!(
            decision.file_name_for(OutputFormat::Jpeg),
            "shot_trimmed.jpg"
        );
    }
}
