//! Uniform border detection on raw RGBA pixel data.
//!
//! A pixel counts as background when its R, G and B channels are all at or
//! above the brightness threshold; alpha is ignored. Rows are scanned inward
//! from the top and bottom edges, then columns inward from the left and right
//! edges, sampling every `sample_stride` pixels. A line stays part of the
//! margin while its share of background samples reaches the coverage
//! threshold; the first line below it is the content edge. Content that is
//! narrower than the frame (pillarboxed or letterboxed) is therefore still
//! found, and a few specks of dust in the margin are tolerated.
//!
//! Column samples are restricted to the `[top, bottom]` band found by the row
//! scan, so the horizontal pass must run after the vertical one.

use crate::domain::entities::Region;

const CHANNELS: usize = 4;

/// Tuning knobs for [`BorderScanner`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanConfig {
    /// Minimum value of each RGB channel for a pixel to count as background.
    pub brightness_threshold: u8,
    /// Distance in pixels between two samples on a scan line.
    pub sample_stride: u32,
    /// Fraction of background samples a line needs to count as margin.
    pub coverage_threshold: f64,
    /// Thinnest margin (on every side) that counts as a border.
    pub min_border_thickness: u32,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            brightness_threshold: 245,
            sample_stride: 10,
            coverage_threshold: 0.95,
            min_border_thickness: 6,
        }
    }
}

/// Margin thickness in pixels on each side of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct BorderMeasurement {
    pub top: u32,
    pub bottom: u32,
    pub left: u32,
    pub right: u32,
}

impl BorderMeasurement {
    /// Thinnest of the four margins.
    #[must_use]
    pub fn min_thickness(&self) -> u32 {
        self.top.min(self.bottom).min(self.left).min(self.right)
    }

    /// Rectangle inside the margins for an image of the given size.
    ///
    /// Equivalent to `{left, top, right_edge - left + 1, bottom_edge - top + 1}`
    /// in boundary-index terms.
    #[must_use]
    pub fn content_region(&self, width: u32, height: u32) -> Region {
        Region::new(
            self.left,
            self.top,
            width.saturating_sub(self.left + self.right),
            height.saturating_sub(self.top + self.bottom),
        )
    }
}

/// Finds near-white frames around image content.
#[derive(Debug, Clone, Copy, Default)]
pub struct BorderScanner {
    config: ScanConfig,
}

impl BorderScanner {
    /// Creates a scanner with the given configuration.
    #[must_use]
    pub const fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    /// Returns the scanner configuration.
    #[must_use]
    pub const fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Measures the border of a tightly packed RGBA buffer.
    ///
    /// Returns `None` when no margin at least `min_border_thickness` thick
    /// exists on every side, when the content would collapse to nothing, or
    /// when the buffer is smaller than `width * height * 4` bytes.
    #[must_use]
    pub fn scan(&self, pixels: &[u8], width: u32, height: u32) -> Option<BorderMeasurement> {
        let frame = Frame::new(pixels, width, height, self.config.brightness_threshold)?;
        let stride = self.config.sample_stride.max(1) as usize;

        let top = (0..height)
            .find(|&y| self.is_content_row(&frame, y, stride))
            .unwrap_or(0);
        let bottom = (0..height)
            .rev()
            .find(|&y| self.is_content_row(&frame, y, stride))
            .unwrap_or(height - 1);

        if bottom < top {
            return None;
        }

        let left = (0..width)
            .find(|&x| self.is_content_column(&frame, x, top, bottom, stride))
            .unwrap_or(0);
        let right = (0..width)
            .rev()
            .find(|&x| self.is_content_column(&frame, x, top, bottom, stride))
            .unwrap_or(width - 1);

        if right < left {
            return None;
        }

        let measurement = BorderMeasurement {
            top,
            bottom: height - 1 - bottom,
            left,
            right: width - 1 - right,
        };

        (measurement.min_thickness() >= self.config.min_border_thickness).then_some(measurement)
    }

    /// Measures the border of an RGBA image buffer.
    #[must_use]
    pub fn scan_image(&self, image: &image::RgbaImage) -> Option<BorderMeasurement> {
        self.scan(image.as_raw(), image.width(), image.height())
    }

    fn is_content_row(&self, frame: &Frame<'_>, y: u32, stride: usize) -> bool {
        let samples = (0..frame.width).step_by(stride).map(|x| frame.is_background(x, y));
        self.is_content_line(samples)
    }

    fn is_content_column(
        &self,
        frame: &Frame<'_>,
        x: u32,
        top: u32,
        bottom: u32,
        stride: usize,
    ) -> bool {
        let samples = (top..=bottom).step_by(stride).map(|y| frame.is_background(x, y));
        self.is_content_line(samples)
    }

    #[allow(clippy::cast_precision_loss)]
    fn is_content_line(&self, samples: impl Iterator<Item = bool>) -> bool {
        let (total, background) = samples.fold((0_usize, 0_usize), |(total, bg), is_bg| {
            (total + 1, bg + usize::from(is_bg))
        });

        total > 0 && (background as f64 / total as f64) < self.config.coverage_threshold
    }
}

struct Frame<'a> {
    pixels: &'a [u8],
    width: u32,
    threshold: u8,
}

impl<'a> Frame<'a> {
    fn new(pixels: &'a [u8], width: u32, height: u32, threshold: u8) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        let needed = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(CHANNELS)?;
        if pixels.len() < needed {
            return None;
        }

        Some(Self {
            pixels,
            width,
            threshold,
        })
    }

    fn is_background(&self, x: u32, y: u32) -> bool {
        let i = (y as usize * self.width as usize + x as usize) * CHANNELS;
        self.pixels[i..i + 3].iter().all(|&c| c >= self.threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use test_case::test_case;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
    const INK: Rgba<u8> = Rgba([30, 40, 50, 255]);

    fn framed(width: u32, height: u32, margins: (u32, u32, u32, u32)) -> RgbaImage {
        let (top, bottom, left, right) = margins;
        RgbaImage::from_fn(width, height, |x, y| {
            let inside =
                y >= top && y < height - bottom && x >= left && x < width - right;
            if inside { INK } else { WHITE }
        })
    }

    #[test]
    fn test_uniform_twenty_pixel_margin() {
        let image = framed(1200, 800, (20, 20, 20, 20));
        let scanner = BorderScanner::default();

        let measurement = scanner.scan_image(&image).unwrap();
        assert_eq!(
            measurement,
            BorderMeasurement {
                top: 20,
                bottom: 20,
                left: 20,
                right: 20
            }
        );
        assert_eq!(
            measurement.content_region(1200, 800),
            Region::new(20, 20, 1160, 760)
        );
    }

    #[test_case((6, 6, 6, 6) ; "exactly_minimum")]
    #[test_case((7, 31, 12, 90) ; "uneven")]
    #[test_case((150, 8, 64, 9) ; "thick_top")]
    #[test_case((13, 13, 200, 200) ; "pillarbox")]
    fn test_recovered_region_contains_all_content(margins: (u32, u32, u32, u32)) {
        let (width, height) = (640, 480);
        let image = framed(width, height, margins);
        let scanner = BorderScanner::default();

        let measurement = scanner.scan_image(&image).unwrap();
        let min = scanner.config().min_border_thickness;
        assert!(measurement.top >= min);
        assert!(measurement.bottom >= min);
        assert!(measurement.left >= min);
        assert!(measurement.right >= min);

        let region = measurement.content_region(width, height);
        assert!(region.fits_within(width, height));
        for (x, y, pixel) in image.enumerate_pixels() {
            if *pixel != WHITE {
                assert!(x >= region.left && x < region.left + region.width);
                assert!(y >= region.top && y < region.top + region.height);
            }
        }
    }

    #[test]
    fn test_pillarboxed_content_is_measured_exactly() {
        let image = framed(640, 480, (13, 13, 200, 200));

        let measurement = BorderScanner::default().scan_image(&image).unwrap();
        assert_eq!(
            measurement,
            BorderMeasurement {
                top: 13,
                bottom: 13,
                left: 200,
                right: 200
            }
        );
        assert_eq!(
            measurement.content_region(640, 480),
            Region::new(200, 13, 240, 454)
        );
    }

    #[test]
    fn test_dust_in_margin_is_tolerated() {
        let mut image = framed(1200, 800, (20, 20, 20, 20));
        image.put_pixel(0, 5, INK);
        image.put_pixel(600, 795, INK);

        let measurement = BorderScanner::default().scan_image(&image).unwrap();
        assert_eq!(measurement.top, 20);
        assert_eq!(measurement.bottom, 20);
    }

    #[test]
    fn test_strict_coverage_treats_dust_as_content() {
        let mut image = framed(1200, 800, (20, 20, 20, 20));
        image.put_pixel(0, 5, INK);

        let strict = BorderScanner::new(ScanConfig {
            coverage_threshold: 1.0,
            ..ScanConfig::default()
        });
        assert!(strict.scan_image(&image).is_none());
    }

    #[test]
    fn test_full_bleed_content_has_no_border() {
        let image = framed(300, 200, (0, 0, 0, 0));
        assert!(BorderScanner::default().scan_image(&image).is_none());
    }

    #[test]
    fn test_thin_fringe_is_ignored() {
        let image = framed(300, 200, (2, 2, 2, 2));
        assert!(BorderScanner::default().scan_image(&image).is_none());
    }

    #[test]
    fn test_one_side_without_margin_is_ignored() {
        let image = framed(300, 200, (20, 20, 0, 20));
        assert!(BorderScanner::default().scan_image(&image).is_none());
    }

    #[test]
    fn test_all_white_image_is_not_cropped() {
        let image = RgbaImage::from_pixel(120, 90, WHITE);
        assert!(BorderScanner::default().scan_image(&image).is_none());
    }

    #[test]
    fn test_near_white_counts_as_background() {
        let mut image = framed(200, 200, (10, 10, 10, 10));
        for (x, y, pixel) in image.enumerate_pixels_mut() {
            if (x < 10 || y < 10) && (x + y) % 2 == 0 {
                *pixel = Rgba([246, 250, 245, 0]);
            }
        }

        let measurement = BorderScanner::default().scan_image(&image).unwrap();
        assert_eq!(measurement.min_thickness(), 10);
    }

    #[test]
    fn test_threshold_is_configurable() {
        let grey = Rgba([200, 200, 200, 255]);
        let image = RgbaImage::from_fn(100, 100, |x, y| {
            if (15..85).contains(&x) && (15..85).contains(&y) {
                INK
            } else {
                grey
            }
        });

        assert!(BorderScanner::default().scan_image(&image).is_none());

        let lenient = BorderScanner::new(ScanConfig {
            brightness_threshold: 190,
            ..ScanConfig::default()
        });
        assert_eq!(lenient.scan_image(&image).map(|m| m.top), Some(15));
    }

    #[test]
    fn test_short_buffer_is_rejected() {
        let scanner = BorderScanner::default();
        assert!(scanner.scan(&[255; 12], 2, 2).is_none());
        assert!(scanner.scan(&[], 0, 0).is_none());
    }
}
