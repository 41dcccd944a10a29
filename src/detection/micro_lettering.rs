//! Micro-lettering detection from edge density and projection statistics
//!
//! Micro text shows up as a dense field of fine edges. Density alone also
//! fires on guilloche and hatching, so the edge map is additionally summed
//! along rows and columns: text lines and character gaps make both
//! projections uneven, while a flat projection in either direction means
//! uniform structure rather than lettering.

use opencv::{
    core::{bitwise_or_def, count_non_zero, reduce, Mat, Point, BORDER_CONSTANT, CV_64F, REDUCE_SUM},
    imgproc::{
        canny_def, cvt_color_def, dilate, equalize_hist, morphology_default_border_value,
        COLOR_BGR2GRAY,
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{mean_and_std_dev, square_kernel, Detection};
use crate::config::MicroLetteringConfig;
use crate::image_loader::ensure_bgr8;
use crate::{Result, VerificationError};

/// Edge statistics behind a micro-lettering decision
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MicroLetteringAnalysis {
    /// Fraction of nonzero pixels in the dilated edge map
    pub density: f64,
    /// Standard deviation of per-row sums; only computed past the density gate
    pub row_projection_std: Option<f64>,
    /// Standard deviation of per-column sums; only computed past the density gate
    pub column_projection_std: Option<f64>,
}

/// Micro-lettering detector
#[derive(Debug, Clone, Default)]
pub struct MicroLetteringDetector {
    config: MicroLetteringConfig,
}

impl MicroLetteringDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MicroLetteringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MicroLetteringConfig {
        &self.config
    }

    pub fn detect(&self, image: &Mat) -> Result<Detection> {
        self.detect_with_edges(image).map(|(detection, _)| detection)
    }

    /// Same as [`detect`](Self::detect), also returning the dilated edge map
    pub fn detect_with_edges(&self, image: &Mat) -> Result<(Detection, Mat)> {
        let edges = self.edge_map(image)?;
        let analysis = self.analyze_edges(&edges)?;

        let regular = matches!(
            (analysis.row_projection_std, analysis.column_projection_std),
            (Some(rows), Some(cols))
                if rows > self.config.min_projection_std && cols > self.config.min_projection_std
        );

        let detection = if regular {
            Detection::found(self.config.detected_confidence)
        } else {
            Detection::missing(self.config.fallback_confidence)
        };
        Ok((detection, edges))
    }

    /// Edge density and, when dense enough, projection deviations
    pub fn analyze(&self, image: &Mat) -> Result<MicroLetteringAnalysis> {
        let edges = self.edge_map(image)?;
        self.analyze_edges(&edges)
    }

    /// Statistics of an edge map produced by [`edge_map`](Self::edge_map)
    pub fn analyze_edges(&self, edges: &Mat) -> Result<MicroLetteringAnalysis> {
        let total = edges.rows() as f64 * edges.cols() as f64;
        let nonzero = count_non_zero(edges)
            .map_err(|e| VerificationError::opencv("edge pixel count", e))?;
        let density = if total > 0.0 { nonzero as f64 / total } else { 0.0 };

        let mut analysis = MicroLetteringAnalysis {
            density,
            row_projection_std: None,
            column_projection_std: None,
        };

        if density > self.config.min_pattern_density {
            analysis.row_projection_std = Some(projection_std(edges, 1)?);
            analysis.column_projection_std = Some(projection_std(edges, 0)?);
        }

        debug!(
            density = analysis.density,
            row_std = ?analysis.row_projection_std,
            column_std = ?analysis.column_projection_std,
            "micro lettering: edge statistics"
        );

        Ok(analysis)
    }

    /// Dilated union of the Canny passes over the equalized grayscale image
    pub fn edge_map(&self, image: &Mat) -> Result<Mat> {
        ensure_bgr8(image)?;

        let mut gray = Mat::default();
        cvt_color_def(image, &mut gray, COLOR_BGR2GRAY)
            .map_err(|e| VerificationError::opencv("grayscale conversion", e))?;

        let mut equalized = Mat::default();
        equalize_hist(&gray, &mut equalized)
            .map_err(|e| VerificationError::opencv("histogram equalization", e))?;

        let mut combined = Mat::default();
        for &(low, high) in &self.config.canny_thresholds {
            let mut edges = Mat::default();
            canny_def(&equalized, &mut edges, low, high)
                .map_err(|e| VerificationError::opencv("Canny edge detection", e))?;

            combined = if combined.empty() {
                edges
            } else {
                let mut union = Mat::default();
                bitwise_or_def(&combined, &edges, &mut union)
                    .map_err(|e| VerificationError::opencv("edge union", e))?;
                union
            };
        }

        let kernel = square_kernel(self.config.dilate_kernel_size)?;
        let border = morphology_default_border_value()
            .map_err(|e| VerificationError::opencv("border value", e))?;
        let mut dilated = Mat::default();
        dilate(
            &combined,
            &mut dilated,
            &kernel,
            Point::new(-1, -1),
            self.config.dilate_iterations,
            BORDER_CONSTANT,
            border,
        )
        .map_err(|e| VerificationError::opencv("dilation", e))?;

        Ok(dilated)
    }
}

/// Population standard deviation of pixel-value sums along `dim`
/// (1 reduces each row, 0 each column)
fn projection_std(edges: &Mat, dim: i32) -> Result<f64> {
    let mut sums = Mat::default();
    reduce(edges, &mut sums, dim, REDUCE_SUM, CV_64F)
        .map_err(|e| VerificationError::opencv("edge projection", e))?;
    let (_, std_dev) = mean_and_std_dev(&sums)?;
    Ok(std_dev)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use opencv::core::CV_8UC1;

    #[test]
    fn test_uniform_image_has_no_edges() {
        let image = fixtures::uniform_gray(200, 200, 128).unwrap();
        let detector = MicroLetteringDetector::new();

        let analysis = detector.analyze(&image).unwrap();
        assert_eq!(analysis.density, 0.0);
        assert_eq!(analysis.row_projection_std, None);

        assert_eq!(detector.detect(&image).unwrap(), Detection::missing(0.25));
    }

    #[test]
    fn test_hatching_fails_row_projection_gate() {
        let image = fixtures::fine_hatching(200, 200, 8).unwrap();
        let detector = MicroLetteringDetector::new();

        let analysis = detector.analyze(&image).unwrap();
        assert!(analysis.density > 0.15, "density {}", analysis.density);
        assert!(analysis.row_projection_std.unwrap() < 100.0);

        assert_eq!(detector.detect(&image).unwrap(), Detection::missing(0.25));
    }

    #[test]
    fn test_horizontal_hatching_fails_column_projection_gate() {
        let image = fixtures::horizontal_hatching(200, 200, 8).unwrap();
        let detector = MicroLetteringDetector::new();

        let analysis = detector.analyze(&image).unwrap();
        assert!(analysis.density > 0.15, "density {}", analysis.density);
        assert!(analysis.column_projection_std.unwrap() < 100.0);
        assert!(analysis.row_projection_std.unwrap() > 100.0);

        assert_eq!(detector.detect(&image).unwrap(), Detection::missing(0.25));
    }

    #[test]
    fn test_detect_with_edges_returns_analyzed_map() {
        let image = fixtures::micro_text_block(160, 160).unwrap();
        let detector = MicroLetteringDetector::new();

        let (detection, edges) = detector.detect_with_edges(&image).unwrap();
        assert_eq!(detection, detector.detect(&image).unwrap());
        assert_eq!(
            detector.analyze_edges(&edges).unwrap(),
            detector.analyze(&image).unwrap()
        );
    }

    #[test]
    fn test_text_block_detected() {
        let image = fixtures::micro_text_block(200, 200).unwrap();
        let detector = MicroLetteringDetector::new();

        let analysis = detector.analyze(&image).unwrap();
        assert!(analysis.density > 0.15);
        assert!(analysis.row_projection_std.unwrap() > 100.0);
        assert!(analysis.column_projection_std.unwrap() > 100.0);

        assert_eq!(detector.detect(&image).unwrap(), Detection::found(0.8));
    }

    #[test]
    fn test_edge_map_is_binary_single_channel() {
        let image = fixtures::micro_text_block(120, 160).unwrap();
        let edges = MicroLetteringDetector::new().edge_map(&image).unwrap();

        assert_eq!(edges.typ(), CV_8UC1);
        assert_eq!((edges.rows(), edges.cols()), (120, 160));
        assert!(edges.data_bytes().unwrap().iter().all(|&v| v == 0 || v == 255));
    }

    #[test]
    fn test_raised_density_gate_skips_projections() {
        let config = MicroLetteringConfig {
            min_pattern_density: 0.99,
            ..MicroLetteringConfig::default()
        };
        let image = fixtures::micro_text_block(200, 200).unwrap();
        let detector = MicroLetteringDetector::with_config(config);

        let analysis = detector.analyze(&image).unwrap();
        assert_eq!(analysis.column_projection_std, None);
        assert!(!detector.detect(&image).unwrap().detected);
    }
}
