//! Raster image entities and the geometry and format types around them.

use std::fmt;

use image::DynamicImage;

/// Container format the attachment bytes were decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum SourceFormat {
    Jpeg,
    Png,
    WebP,
    Avif,
    Gif,
    Tiff,
    Bmp,
    Ico,
    Unknown,
}

/// Format a processed image is encoded to.
///
/// Only formats in the known-safe set are representable; anything else
/// falls back to [`OutputFormat::Jpeg`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[allow(missing_docs)]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
    WebP,
    Avif,
    Gif,
    Tiff,
}

impl OutputFormat {
    /// Picks the output format for a decoded source, preserving safe formats.
    #[must_use]
    pub const fn preserving(source: SourceFormat) -> Self {
        match source {
            SourceFormat::Jpeg => Self::Jpeg,
            SourceFormat::Png => Self::Png,
            SourceFormat::WebP => Self::WebP,
            SourceFormat::Avif => Self::Avif,
            SourceFormat::Gif => Self::Gif,
            SourceFormat::Tiff => Self::Tiff,
            SourceFormat::Bmp | SourceFormat::Ico | SourceFormat::Unknown => Self::Jpeg,
        }
    }

    /// File extension without the leading dot. JPEG maps to `jpg`.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::WebP => "webp",
            Self::Avif => "avif",
            Self::Gif => "gif",
            Self::Tiff => "tiff",
        }
    }

    /// MIME type used when uploading the encoded bytes.
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::WebP => "image/webp",
            Self::Avif => "image/avif",
            Self::Gif => "image/gif",
            Self::Tiff => "image/tiff",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Jpeg => "jpeg",
            other => other.extension(),
        };
        f.write_str(name)
    }
}

/// Axis-aligned rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub struct Region {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    /// Creates a new region.
    #[must_use]
    pub const fn new(left: u32, top: u32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Returns true if the region is non-empty and lies inside a frame of the given size.
    #[must_use]
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.width > 0
            && self.height > 0
            && self
                .left
                .checked_add(self.width)
                .is_some_and(|right| right <= width)
            && self
                .top
                .checked_add(self.height)
                .is_some_and(|bottom| bottom <= height)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{}+{}+{}",
            self.width, self.height, self.left, self.top
        )
    }
}

/// Geometry and format of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
    pub format: SourceFormat,
}

/// A decoded, orientation-normalized image.
///
/// Owned and never mutated after decoding; dropped when the pipeline run for
/// its attachment finishes.
#[derive(Debug, Clone)]
pub struct RasterImage {
    pixels: DynamicImage,
    format: SourceFormat,
}

impl RasterImage {
    /// Wraps decoded pixels. Returns `None` for zero-sized images.
    #[must_use]
    pub fn new(pixels: DynamicImage, format: SourceFormat) -> Option<Self> {
        if pixels.width() == 0 || pixels.height() == 0 {
            return None;
        }
        Some(Self { pixels, format })
    }

    /// Image width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Image height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Format the image was decoded from.
    #[must_use]
    pub const fn format(&self) -> SourceFormat {
        self.format
    }

    /// Returns dimensions and format.
    #[must_use]
    pub fn metadata(&self) -> ImageMetadata {
        ImageMetadata {
            width: self.width(),
            height: self.height(),
            format: self.format,
        }
    }

    /// Decoded pixels in their native color type.
    #[must_use]
    pub const fn pixels(&self) -> &DynamicImage {
        &self.pixels
    }

    /// Tightly packed, row-major RGBA8 copy of the pixels.
    #[must_use]
    pub fn to_rgba8(&self) -> image::RgbaImage {
        self.pixels.to_rgba8()
    }
}

/// Encoded output bytes plus the format actually used to produce them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    /// Encoded file contents.
    pub bytes: Vec<u8>,
    /// Format of `bytes`; may differ from the requested format after a fallback.
    pub format: OutputFormat,
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(SourceFormat::Jpeg, OutputFormat::Jpeg ; "jpeg_kept")]
    #[test_case(SourceFormat::Png, OutputFormat::Png ; "png_kept")]
    #[test_case(SourceFormat::WebP, OutputFormat::WebP ; "webp_kept")]
    #[test_case(SourceFormat::Avif, OutputFormat::Avif ; "avif_kept")]
    #[test_case(SourceFormat::Gif, OutputFormat::Gif ; "gif_kept")]
    #[test_case(SourceFormat::Tiff, OutputFormat::Tiff ; "tiff_kept")]
    #[test_case(SourceFormat::Bmp, OutputFormat::Jpeg ; "bmp_falls_back")]
    #[test_case(SourceFormat::Unknown, OutputFormat::Jpeg ; "unknown_falls_back")]
    fn test_output_format_selection(source: SourceFormat, expected: OutputFormat) {
        assert_eq!(OutputFormat::preserving(source), expected);
    }

    #[test]
    fn test_jpeg_extension_is_jpg() {
        assert_eq!(OutputFormat::Jpeg.extension(), "jpg");
        assert_eq!(OutputFormat::Jpeg.to_string(), "jpeg");
        assert_eq!(OutputFormat::WebP.extension(), "webp");
    }

    #[test]
    fn test_region_bounds() {
        assert!(Region::new(64, 69, 1920, 1080).fits_within(2048, 1440));
        assert!(Region::new(0, 0, 10, 10).fits_within(10, 10));
        assert!(!Region::new(1, 0, 10, 10).fits_within(10, 10));
        assert!(!Region::new(0, 0, 0, 10).fits_within(10, 10));
        assert!(!Region::new(u32::MAX, 0, 2, 1).fits_within(10, 10));
    }

    #[test]
    fn test_raster_image_rejects_empty() {
        let empty = DynamicImage::new_rgba8(0, 0);
        assert!(RasterImage::new(empty, SourceFormat::Png).is_none());

        let image = RasterImage::new(DynamicImage::new_rgba8(3, 2), SourceFormat::Png);
        let metadata = image.map(|i| i.metadata());
        assert_eq!(
            metadata,
            Some(ImageMetadata {
                width: 3,
                height: 2,
                format: SourceFormat::Png
            })
        );
    }
}
