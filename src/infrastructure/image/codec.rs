//! Decode, transform and encode with the `image` crate.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use tracing::{debug, warn};

use crate::domain::entities::{EncodedImage, OutputFormat, RasterImage, SourceFormat};
use crate::domain::errors::ProcessingError;
use crate::domain::ports::ImageCodecPort;
use crate::domain::services::{TransformAction, TransformDecision};

const JPEG_QUALITY: u8 = 90;

/// [`ImageCodecPort`] backed by the pure-Rust `image` codecs.
#[derive(Debug, Clone, Copy)]
pub struct ImageRsCodec {
    jpeg_quality: u8,
}

impl Default for ImageRsCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageRsCodec {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            jpeg_quality: JPEG_QUALITY,
        }
    }

    fn transform(
        image: &RasterImage,
        action: TransformAction,
    ) -> Result<DynamicImage, ProcessingError> {
        let pixels = image.pixels();
        match action {
            TransformAction::Skip => Ok(pixels.clone()),
            TransformAction::FixedTrim(region) | TransformAction::ProportionalCrop(region) => {
                if !region.fits_within(image.width(), image.height()) {
                    return Err(ProcessingError::geometry(
                        region,
                        image.width(),
                        image.height(),
                    ));
                }
                Ok(pixels.crop_imm(region.left, region.top, region.width, region.height))
            }
            TransformAction::Resize { width, height } => {
                Ok(pixels.resize_exact(width.max(1), height.max(1), FilterType::Lanczos3))
            }
        }
    }

    fn encode(&self, pixels: &DynamicImage, format: OutputFormat) -> Result<Vec<u8>, String> {
        let mut buffer = Cursor::new(Vec::new());

        match format {
            OutputFormat::Jpeg => {
                // JPEG has no alpha channel.
                let rgb = DynamicImage::ImageRgb8(pixels.to_rgb8());
                let encoder = JpegEncoder::new_with_quality(&mut buffer, self.jpeg_quality.max(1));
                rgb.write_with_encoder(encoder)
                    .map_err(|e| e.to_string())?;
            }
            OutputFormat::Png => pixels
                .write_to(&mut buffer, ImageFormat::Png)
                .map_err(|e| e.to_string())?,
            other => {
                let rgba = DynamicImage::ImageRgba8(pixels.to_rgba8());
                rgba.write_to(&mut buffer, image_format(other))
                    .map_err(|e| e.to_string())?;
            }
        }

        Ok(buffer.into_inner())
    }
}

impl ImageCodecPort for ImageRsCodec {
    fn decode(&self, bytes: &[u8]) -> Result<RasterImage, ProcessingError> {
        let reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| ProcessingError::decode(e.to_string()))?;

        let source = reader.format().map_or(SourceFormat::Unknown, source_format);
        match source {
            SourceFormat::Unknown => {
                return Err(ProcessingError::decode("unrecognized image format"));
            }
            // No pure-Rust AVIF decoder is compiled in.
            SourceFormat::Avif => {
                return Err(ProcessingError::decode("AVIF input is not supported"));
            }
            _ => {}
        }

        let mut decoder = reader
            .into_decoder()
            .map_err(|e| ProcessingError::decode(e.to_string()))?;
        let orientation = decoder
            .orientation()
            .map_err(|e| ProcessingError::decode(e.to_string()))?;
        let mut pixels =
            DynamicImage::from_decoder(decoder).map_err(|e| ProcessingError::decode(e.to_string()))?;
        pixels.apply_orientation(orientation);

        debug!(
            width = pixels.width(),
            height = pixels.height(),
            format = ?source,
            "Decoded image"
        );

        RasterImage::new(pixels, source).ok_or_else(|| ProcessingError::decode("image is empty"))
    }

    fn execute(
        &self,
        image: &RasterImage,
        decision: &TransformDecision,
    ) -> Result<EncodedImage, ProcessingError> {
        let output = Self::transform(image, decision.action)?;

        match self.encode(&output, decision.format) {
            Ok(bytes) => Ok(EncodedImage {
                bytes,
                format: decision.format,
            }),
            Err(reason) if decision.format != OutputFormat::Jpeg => {
                warn!(
                    format = %decision.format,
                    error = %reason,
                    "Encode failed, retrying as JPEG"
                );
                self.encode(&output, OutputFormat::Jpeg)
                    .map(|bytes| EncodedImage {
                        bytes,
                        format: OutputFormat::Jpeg,
                    })
                    .map_err(|e| ProcessingError::encode(OutputFormat::Jpeg, e))
            }
            Err(reason) => Err(ProcessingError::encode(decision.format, reason)),
        }
    }
}

fn source_format(format: ImageFormat) -> SourceFormat {
    match format {
        ImageFormat::Jpeg => SourceFormat::Jpeg,
        ImageFormat::Png => SourceFormat::Png,
        ImageFormat::WebP => SourceFormat::WebP,
        ImageFormat::Avif => SourceFormat::Avif,
        ImageFormat::Gif => SourceFormat::Gif,
        ImageFormat::Tiff => SourceFormat::Tiff,
        ImageFormat::Bmp => SourceFormat::Bmp,
        ImageFormat::Ico => SourceFormat::Ico,
        _ => SourceFormat::Unknown,
    }
}

const fn image_format(format: OutputFormat) -> ImageFormat {
    match format {
        OutputFormat::Jpeg => ImageFormat::Jpeg,
        OutputFormat::Png => ImageFormat::Png,
        OutputFormat::WebP => ImageFormat::WebP,
        OutputFormat::Avif => ImageFormat::Avif,
        OutputFormat::Gif => ImageFormat::Gif,
        OutputFormat::Tiff => ImageFormat::Tiff,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Region;
    use image::{ImageEncoder, Rgb, RgbImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 40]));
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buffer, ImageFormat::Png)
            .unwrap();
        buffer.into_inner()
    }

    fn decision(action: TransformAction, format: OutputFormat) -> TransformDecision {
        TransformDecision {
            action,
            format,
            base_name: "shot".to_string(),
        }
    }

    fn decoded(width: u32, height: u32) -> RasterImage {
        ImageRsCodec::new().decode(&png_bytes(width, height)).unwrap()
    }

    #[test]
    fn test_decode_png() {
        let image = decoded(40, 30);
        assert_eq!(image.width(), 40);
        assert_eq!(image.height(), 30);
        assert_eq!(image.format(), SourceFormat::Png);
    }

    #[test]
    fn test_decode_garbage_is_decode_error() {
        let err = ImageRsCodec::new().decode(b"not an image").unwrap_err();
        assert!(matches!(err, ProcessingError::Decode { .. }));
    }

    #[test]
    fn test_skip_keeps_dimensions() {
        let codec = ImageRsCodec::new();
        let encoded = codec
            .execute(&decoded(40, 30), &decision(TransformAction::Skip, OutputFormat::Png))
            .unwrap();

        assert_eq!(encoded.format, OutputFormat::Png);
        let roundtrip = codec.decode(&encoded.bytes).unwrap();
        assert_eq!((roundtrip.width(), roundtrip.height()), (40, 30));
    }

    #[test]
    fn test_skip_round_trip_keeps_pixels() {
        let codec = ImageRsCodec::new();
        let source = decoded(40, 30);
        let encoded = codec
            .execute(&source, &decision(TransformAction::Skip, OutputFormat::Png))
            .unwrap();

        let roundtrip = codec.decode(&encoded.bytes).unwrap();
        assert_eq!(roundtrip.to_rgba8(), source.to_rgba8());
    }

    fn jpeg_rotated_quarter_turn(width: u32, height: u32) -> Vec<u8> {
        // Big-endian TIFF header, one IFD entry: Orientation (0x0112) = 6.
        let exif = vec![
            0x4d, 0x4d, 0x00, 0x2a, 0x00, 0x00, 0x00, 0x08, //
            0x00, 0x01, //
            0x01, 0x12, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01, 0x00, 0x06, 0x00, 0x00, //
            0x00, 0x00, 0x00, 0x00,
        ];
        let img = RgbImage::from_pixel(width, height, Rgb([120, 60, 30]));
        let mut buffer = Cursor::new(Vec::new());
        let mut encoder = JpegEncoder::new_with_quality(&mut buffer, 90);
        encoder.set_exif_metadata(exif).unwrap();
        DynamicImage::ImageRgb8(img)
            .write_with_encoder(encoder)
            .unwrap();
        buffer.into_inner()
    }

    #[test]
    fn test_decode_applies_exif_orientation() {
        let image = ImageRsCodec::new()
            .decode(&jpeg_rotated_quarter_turn(64, 32))
            .unwrap();

        assert_eq!((image.width(), image.height()), (32, 64));
        assert_eq!(image.format(), SourceFormat::Jpeg);
    }

    #[test]
    fn test_avif_input_is_decode_error() {
        let mut bytes = vec![0x00, 0x00, 0x00, 0x1c];
        bytes.extend_from_slice(b"ftypavif");
        bytes.resize(64, 0);

        let err = ImageRsCodec::new().decode(&bytes).unwrap_err();
        assert!(matches!(err, ProcessingError::Decode { .. }));
        assert!(err.to_string().contains("AVIF"));
    }

    #[test]
    fn test_crop_produces_region_size() {
        let codec = ImageRsCodec::new();
        let action = TransformAction::ProportionalCrop(Region::new(5, 4, 20, 10));
        let encoded = codec
            .execute(&decoded(40, 30), &decision(action, OutputFormat::Png))
            .unwrap();

        let cropped = codec.decode(&encoded.bytes).unwrap();
        assert_eq!((cropped.width(), cropped.height()), (20, 10));
    }

    #[test]
    fn test_trim_outside_image_is_geometry_error() {
        let action = TransformAction::FixedTrim(Region::new(64, 69, 1920, 1080));
        let err = ImageRsCodec::new()
            .execute(&decoded(40, 30), &decision(action, OutputFormat::Png))
            .unwrap_err();

        assert!(matches!(err, ProcessingError::Geometry { .. }));
        assert!(err.should_report_visibly());
    }

    #[test]
    fn test_resize_to_target() {
        let codec = ImageRsCodec::new();
        let action = TransformAction::Resize {
            width: 16,
            height: 12,
        };
        let encoded = codec
            .execute(&decoded(40, 30), &decision(action, OutputFormat::Jpeg))
            .unwrap();

        assert_eq!(encoded.format, OutputFormat::Jpeg);
        let resized = codec.decode(&encoded.bytes).unwrap();
        assert_eq!((resized.width(), resized.height()), (16, 12));
        assert_eq!(resized.format(), SourceFormat::Jpeg);
    }

    #[test]
    fn test_webp_output() {
        let encoded = ImageRsCodec::new()
            .execute(&decoded(8, 8), &decision(TransformAction::Skip, OutputFormat::WebP))
            .unwrap();
        assert_eq!(encoded.format, OutputFormat::WebP);
    }

    #[test]
    fn test_unavailable_encoder_falls_back_to_jpeg() {
        let codec = ImageRsCodec::new();
        let encoded = codec
            .execute(&decoded(8, 8), &decision(TransformAction::Skip, OutputFormat::Avif))
            .unwrap();

        assert_eq!(encoded.format, OutputFormat::Jpeg);
        assert_eq!(codec.decode(&encoded.bytes).unwrap().format(), SourceFormat::Jpeg);
    }
}
