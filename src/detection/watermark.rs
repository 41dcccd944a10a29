//! Watermark detection via local-contrast analysis
//!
//! The portrait watermark is a diffuse region whose tone differs slightly
//! from the surrounding paper. Lightness-only CLAHE amplifies it without
//! shifting hue, and the difference against a heavily blurred copy isolates
//! mid-frequency structure. A large outer contour whose circularity sits
//! between a line and a circle is taken as a portrait-like shape.

use opencv::{
    core::{absdiff, merge, split, Mat, Size, Vector},
    imgproc::{
        create_clahe, cvt_color_def, gaussian_blur_def, threshold, COLOR_BGR2GRAY,
        COLOR_BGR2Lab, COLOR_Lab2BGR, THRESH_BINARY,
    },
    prelude::*,
};
use tracing::debug;

use super::{external_contours, mean_and_std_dev, ContourGeometry, Detection};
use crate::config::WatermarkConfig;
use crate::image_loader::ensure_bgr8;
use crate::{Result, VerificationError};

/// Watermark detector based on contrast-map contours
#[derive(Debug, Clone, Default)]
pub struct WatermarkDetector {
    config: WatermarkConfig,
}

impl WatermarkDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: WatermarkConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WatermarkConfig {
        &self.config
    }

    /// Look for a watermark-shaped region in a BGR note image
    pub fn detect(&self, image: &Mat) -> Result<Detection> {
        self.detect_with_contrast(image).map(|(detection, _)| detection)
    }

    /// Same as [`detect`](Self::detect), also returning the contrast map the
    /// decision was made on
    pub fn detect_with_contrast(&self, image: &Mat) -> Result<(Detection, Mat)> {
        let contrast = self.contrast_map(image)?;
        let (mean, std_dev) = mean_and_std_dev(&contrast)?;
        let cutoff = std_dev * self.config.contrast_std_factor;

        let mut binary = Mat::default();
        threshold(&contrast, &mut binary, cutoff, 255.0, THRESH_BINARY)
            .map_err(|e| VerificationError::opencv("contrast threshold", e))?;

        let contours = external_contours(&binary)?;
        let image_area = image.rows() as f64 * image.cols() as f64;
        debug!(
            mean,
            std_dev,
            cutoff,
            contours = contours.len(),
            "watermark: contrast statistics"
        );

        for contour in contours.iter() {
            let geometry = ContourGeometry::measure(&contour)?;
            if self.is_watermark_candidate(&geometry, image_area) {
                debug!(
                    area = geometry.area,
                    circularity = geometry.circularity(),
                    "watermark: candidate accepted"
                );
                return Ok((Detection::found(self.config.detected_confidence), contrast));
            }
        }

        Ok((Detection::missing(self.config.fallback_confidence), contrast))
    }

    /// Grayscale magnitude of the difference between the enhanced image and
    /// its blurred copy
    pub fn contrast_map(&self, image: &Mat) -> Result<Mat> {
        let enhanced = self.enhance(image)?;

        let k = self.config.blur_kernel_size;
        let mut blurred = Mat::default();
        gaussian_blur_def(&enhanced, &mut blurred, Size::new(k, k), 0.0)
            .map_err(|e| VerificationError::opencv("Gaussian blur", e))?;

        let mut diff = Mat::default();
        absdiff(&enhanced, &blurred, &mut diff)
            .map_err(|e| VerificationError::opencv("absolute difference", e))?;

        let mut gray = Mat::default();
        cvt_color_def(&diff, &mut gray, COLOR_BGR2GRAY)
            .map_err(|e| VerificationError::opencv("grayscale conversion", e))?;

        Ok(gray)
    }

    /// CLAHE on the Lab lightness channel, chroma untouched
    pub fn enhance(&self, image: &Mat) -> Result<Mat> {
        ensure_bgr8(image)?;

        let mut lab = Mat::default();
        cvt_color_def(image, &mut lab, COLOR_BGR2Lab)
            .map_err(|e| VerificationError::opencv("Lab conversion", e))?;

        let mut channels = Vector::<Mat>::new();
        split(&lab, &mut channels).map_err(|e| VerificationError::opencv("channel split", e))?;

        let lightness = channels
            .get(0)
            .map_err(|e| VerificationError::opencv("lightness channel", e))?;

        let tiles = self.config.clahe_tile_grid;
        let mut clahe = create_clahe(self.config.clahe_clip_limit, Size::new(tiles, tiles))
            .map_err(|e| VerificationError::opencv("CLAHE creation", e))?;
        let mut equalized = Mat::default();
        clahe
            .apply(&lightness, &mut equalized)
            .map_err(|e| VerificationError::opencv("CLAHE", e))?;

        channels
            .set(0, equalized)
            .map_err(|e| VerificationError::opencv("lightness channel", e))?;

        let mut merged = Mat::default();
        merge(&channels, &mut merged).map_err(|e| VerificationError::opencv("channel merge", e))?;

        let mut bgr = Mat::default();
        cvt_color_def(&merged, &mut bgr, COLOR_Lab2BGR)
            .map_err(|e| VerificationError::opencv("BGR conversion", e))?;

        Ok(bgr)
    }

    /// Large enough and neither line-like nor disc-like
    fn is_watermark_candidate(&self, geometry: &ContourGeometry, image_area: f64) -> bool {
        if geometry.area <= image_area * self.config.min_area_fraction {
            return false;
        }
        match geometry.circularity() {
            Some(c) => c > self.config.min_circularity && c < self.config.max_circularity,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use opencv::core::{Rect, CV_8UC1, CV_8UC3};

    fn geometry(area: f64, perimeter: f64) -> ContourGeometry {
        ContourGeometry {
            area,
            perimeter,
            bounds: Rect::new(0, 0, 100, 100),
        }
    }

    #[test]
    fn test_uniform_image_falls_back() {
        let image = fixtures::uniform_gray(200, 300, 128).unwrap();
        let detection = WatermarkDetector::new().detect(&image).unwrap();
        assert_eq!(detection, Detection::missing(0.3));
    }

    #[test]
    fn test_textured_oval_detected() {
        let image = fixtures::textured_oval(200, 300).unwrap();
        let detection = WatermarkDetector::new().detect(&image).unwrap();
        assert_eq!(detection, Detection::found(0.85));
    }

    #[test]
    fn test_textured_oval_contrast_is_confined() {
        let image = fixtures::textured_oval(200, 300).unwrap();
        let (_, contrast) = WatermarkDetector::new().detect_with_contrast(&image).unwrap();

        // Strong inside the oval, next to nothing in the paper corners
        let center = *contrast.at_2d::<u8>(100, 150).unwrap();
        let corner = *contrast.at_2d::<u8>(5, 5).unwrap();
        assert!(center > 40, "center contrast {}", center);
        assert!(corner < 5, "corner contrast {}", corner);
    }

    #[test]
    fn test_disc_is_too_circular() {
        // Same texture, but a circle: circularity near 1
        let image = fixtures::textured_oval_with_axes(200, 300, 60, 60).unwrap();
        let detection = WatermarkDetector::new().detect(&image).unwrap();
        assert_eq!(detection, Detection::missing(0.3));
    }

    #[test]
    fn test_contrast_map_shape() {
        let image = fixtures::micro_text_block(120, 200).unwrap();
        let detector = WatermarkDetector::new();

        let contrast = detector.contrast_map(&image).unwrap();
        assert_eq!(contrast.rows(), 120);
        assert_eq!(contrast.cols(), 200);
        assert_eq!(contrast.typ(), CV_8UC1);

        let enhanced = detector.enhance(&image).unwrap();
        assert_eq!(enhanced.typ(), CV_8UC3);
    }

    #[test]
    fn test_uniform_contrast_map_is_zero() {
        let image = fixtures::uniform_gray(100, 100, 90).unwrap();
        let contrast = WatermarkDetector::new().contrast_map(&image).unwrap();
        let (mean, std_dev) = mean_and_std_dev(&contrast).unwrap();
        assert_eq!(mean, 0.0);
        assert_eq!(std_dev, 0.0);
    }

    #[test]
    fn test_candidate_requires_minimum_area() {
        let detector = WatermarkDetector::new();
        let image_area = 200.0 * 200.0;

        // Circularity 0.5 in both cases
        let perimeter_for = |area: f64| (4.0 * std::f64::consts::PI * area / 0.5).sqrt();

        assert!(detector.is_watermark_candidate(&geometry(4000.0, perimeter_for(4000.0)), image_area));
        // Exactly 5% of the pixel count is not enough
        assert!(!detector.is_watermark_candidate(&geometry(2000.0, perimeter_for(2000.0)), image_area));
    }

    #[test]
    fn test_candidate_circularity_band() {
        let detector = WatermarkDetector::new();
        let image_area = 200.0 * 200.0;
        let area = 10_000.0;

        // Square outline: π/4 is too circular
        assert!(!detector.is_watermark_candidate(&geometry(area, 400.0), image_area));
        // Long thin outline
        assert!(!detector.is_watermark_candidate(&geometry(area, 2000.0), image_area));
        // Zero perimeter
        assert!(!detector.is_watermark_candidate(&geometry(area, 0.0), image_area));
    }

    #[test]
    fn test_rejects_single_channel_input() {
        let gray = fixtures::grayscale(100, 100).unwrap();
        assert!(matches!(
            WatermarkDetector::new().detect(&gray),
            Err(VerificationError::InvalidImageFormat { .. })
        ));
    }
}
