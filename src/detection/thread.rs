//! Color-shifting security thread detection
//!
//! A windowed thread shows as a thin, near-vertical ribbon whose color moves
//! between green and blue with viewing angle. The detector:
//! - Segments both hue bands in HSV and unions them
//! - Closes small gaps left by glare or fold lines
//! - Accepts the first outer contour that is tall, mid-sized and smooth
//!
//! No template matching: the combined color, size and shape gate rejects
//! most background print on its own.

use opencv::{
    core::{bitwise_or_def, in_range, Mat, Scalar},
    imgproc::{cvt_color_def, morphology_ex_def, COLOR_BGR2HSV, MORPH_CLOSE},
    prelude::*,
};
use tracing::debug;

use super::{external_contours, square_kernel, ContourGeometry, Detection};
use crate::config::{HueBand, SecurityThreadConfig};
use crate::image_loader::ensure_bgr8;
use crate::{Result, VerificationError};

/// Security-thread detector using hue segmentation and contour geometry
#[derive(Debug, Clone, Default)]
pub struct SecurityThreadDetector {
    config: SecurityThreadConfig,
}

impl SecurityThreadDetector {
    /// Create a detector with default parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detector with custom parameters
    pub fn with_config(config: SecurityThreadConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SecurityThreadConfig {
        &self.config
    }

    /// Look for a thread in a BGR note image
    ///
    /// Returns the configured detected confidence on the first qualifying
    /// contour, the fallback confidence otherwise.
    ///
    /// # Errors
    ///
    /// Returns `VerificationError::InvalidImageFormat` for non-BGR input.
    pub fn detect(&self, image: &Mat) -> Result<Detection> {
        self.detect_with_mask(image).map(|(detection, _)| detection)
    }

    /// Same as [`detect`](Self::detect), also returning the closed hue mask
    pub fn detect_with_mask(&self, image: &Mat) -> Result<(Detection, Mat)> {
        let mask = self.thread_mask(image)?;
        let contours = external_contours(&mask)?;
        debug!(contours = contours.len(), "security thread: contours in hue mask");

        for contour in contours.iter() {
            let geometry = ContourGeometry::measure(&contour)?;
            if self.is_thread_candidate(&geometry) {
                debug!(
                    area = geometry.area,
                    aspect_ratio = geometry.aspect_ratio(),
                    "security thread: candidate accepted"
                );
                return Ok((Detection::found(self.config.detected_confidence), mask));
            }
        }

        Ok((Detection::missing(self.config.fallback_confidence), mask))
    }

    /// Closed union of the green and blue hue masks
    pub fn thread_mask(&self, image: &Mat) -> Result<Mat> {
        ensure_bgr8(image)?;

        let mut hsv = Mat::default();
        cvt_color_def(image, &mut hsv, COLOR_BGR2HSV)
            .map_err(|e| VerificationError::opencv("HSV conversion", e))?;

        let green = self.band_mask(&hsv, self.config.green_hue)?;
        let blue = self.band_mask(&hsv, self.config.blue_hue)?;

        let mut combined = Mat::default();
        bitwise_or_def(&green, &blue, &mut combined)
            .map_err(|e| VerificationError::opencv("mask union", e))?;

        let kernel = square_kernel(self.config.close_kernel_size)?;
        let mut closed = Mat::default();
        morphology_ex_def(&combined, &mut closed, MORPH_CLOSE, &kernel)
            .map_err(|e| VerificationError::opencv("closing", e))?;

        Ok(closed)
    }

    fn band_mask(&self, hsv: &Mat, band: HueBand) -> Result<Mat> {
        let lower = Scalar::new(band.min, self.config.min_saturation, self.config.min_value, 0.0);
        let upper = Scalar::new(band.max, 255.0, 255.0, 0.0);

        let mut mask = Mat::default();
        in_range(hsv, &lower, &upper, &mut mask)
            .map_err(|e| VerificationError::opencv("hue range segmentation", e))?;
        Ok(mask)
    }

    /// Tall, mid-sized and smooth; zero-area contours never qualify
    fn is_thread_candidate(&self, geometry: &ContourGeometry) -> bool {
        let Some(ratio) = geometry.perimeter_area_ratio() else {
            return false;
        };

        geometry.aspect_ratio() > self.config.min_aspect_ratio
            && geometry.area > self.config.min_area
            && geometry.area < self.config.max_area
            && ratio < self.config.max_perimeter_area_ratio
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{self, BLUE_HUE_DEGREES, CYAN_HUE_DEGREES, GREEN_HUE_DEGREES, RED_HUE_DEGREES};
    use opencv::core::{Rect, CV_8UC1};

    fn geometry(area: f64, perimeter: f64, width: i32, height: i32) -> ContourGeometry {
        ContourGeometry {
            area,
            perimeter,
            bounds: Rect::new(0, 0, width, height),
        }
    }

    #[test]
    fn test_green_thread_detected() {
        let image = fixtures::vertical_thread(300, 400, GREEN_HUE_DEGREES).unwrap();
        let detection = SecurityThreadDetector::new().detect(&image).unwrap();
        assert_eq!(detection, Detection::found(0.9));
    }

    #[test]
    fn test_blue_thread_detected() {
        let image = fixtures::vertical_thread(300, 400, BLUE_HUE_DEGREES).unwrap();
        let detection = SecurityThreadDetector::new().detect(&image).unwrap();
        assert!(detection.detected);
    }

    #[test]
    fn test_out_of_band_hues_ignored() {
        for hue in [RED_HUE_DEGREES, CYAN_HUE_DEGREES] {
            let image = fixtures::vertical_thread(300, 400, hue).unwrap();
            let detection = SecurityThreadDetector::new().detect(&image).unwrap();
            assert_eq!(detection, Detection::missing(0.2), "hue {}", hue);
        }
    }

    #[test]
    fn test_horizontal_band_rejected() {
        let band = Rect::new(50, 100, 200, 15);
        let image = fixtures::colored_band(300, 400, band, GREEN_HUE_DEGREES).unwrap();
        let detection = SecurityThreadDetector::new().detect(&image).unwrap();
        assert!(!detection.detected);
    }

    #[test]
    fn test_closing_bridges_small_gap() {
        let image = fixtures::broken_thread(300, 400, GREEN_HUE_DEGREES, 2).unwrap();
        let detection = SecurityThreadDetector::new().detect(&image).unwrap();
        assert!(detection.detected);
    }

    #[test]
    fn test_wide_gap_splits_thread() {
        let image = fixtures::broken_thread(300, 400, GREEN_HUE_DEGREES, 20).unwrap();
        let detection = SecurityThreadDetector::new().detect(&image).unwrap();
        assert!(!detection.detected);
    }

    #[test]
    fn test_mask_matches_input_size() {
        let image = fixtures::vertical_thread(240, 320, GREEN_HUE_DEGREES).unwrap();
        let mask = SecurityThreadDetector::new().thread_mask(&image).unwrap();
        assert_eq!(mask.rows(), 240);
        assert_eq!(mask.cols(), 320);
        assert_eq!(mask.typ(), CV_8UC1);
    }

    #[test]
    fn test_detect_with_mask_returns_decision_mask() {
        let image = fixtures::vertical_thread(240, 320, BLUE_HUE_DEGREES).unwrap();
        let detector = SecurityThreadDetector::new();

        let (detection, mask) = detector.detect_with_mask(&image).unwrap();
        assert_eq!(detection, Detection::found(0.9));
        assert_eq!(
            mask.data_bytes().unwrap(),
            detector.thread_mask(&image).unwrap().data_bytes().unwrap()
        );
    }

    #[test]
    fn test_candidate_gate_bounds() {
        let detector = SecurityThreadDetector::new();

        assert!(detector.is_thread_candidate(&geometry(2786.0, 426.0, 15, 200)));
        // Too squat
        assert!(!detector.is_thread_candidate(&geometry(2786.0, 426.0, 30, 200)));
        // Area outside the open range
        assert!(!detector.is_thread_candidate(&geometry(1000.0, 300.0, 10, 200)));
        assert!(!detector.is_thread_candidate(&geometry(15000.0, 900.0, 10, 400)));
        // Jagged outline
        assert!(!detector.is_thread_candidate(&geometry(2000.0, 1200.0, 15, 200)));
        // Degenerate
        assert!(!detector.is_thread_candidate(&geometry(0.0, 400.0, 1, 200)));
    }

    #[test]
    fn test_rejects_single_channel_input() {
        let gray = fixtures::grayscale(100, 100).unwrap();
        assert!(matches!(
            SecurityThreadDetector::new().detect(&gray),
            Err(VerificationError::InvalidImageFormat { .. })
        ));
    }

    #[test]
    fn test_custom_config_widens_area_range() {
        let config = SecurityThreadConfig {
            max_area: 1500.0,
            ..SecurityThreadConfig::default()
        };
        let image = fixtures::vertical_thread(300, 400, GREEN_HUE_DEGREES).unwrap();
        let detection = SecurityThreadDetector::with_config(config).detect(&image).unwrap();
        assert!(!detection.detected);
    }
}
