//! Security feature detection module
//!
//! This module holds the three independent heuristic detectors. Each one
//! reads the original BGR image, never another detector's output, and
//! reduces it to a [`Detection`].

pub mod geometry;
pub mod micro_lettering;
pub mod thread;
pub mod watermark;

pub use geometry::ContourGeometry;
pub use micro_lettering::{MicroLetteringAnalysis, MicroLetteringDetector};
pub use thread::SecurityThreadDetector;
pub use watermark::WatermarkDetector;

use opencv::{
    core::{mean_std_dev_def, Mat, Point, Size, Vector},
    imgproc::{
        find_contours_def, get_structuring_element, CHAIN_APPROX_SIMPLE, MORPH_RECT,
        RETR_EXTERNAL,
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};

use crate::{Result, VerificationError};

/// Outcome of a single detector: presence flag and confidence in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub detected: bool,
    pub confidence: f32,
}

impl Detection {
    /// Feature found with the given confidence
    pub fn found(confidence: f32) -> Self {
        Self {
            detected: true,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// Feature absent; `confidence` is the detector's fallback value
    pub fn missing(confidence: f32) -> Self {
        Self {
            detected: false,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// Outer contours of a binary mask, simple chain approximation
pub(crate) fn external_contours(mask: &Mat) -> Result<Vector<Vector<Point>>> {
    let mut contours = Vector::<Vector<Point>>::new();
    find_contours_def(mask, &mut contours, RETR_EXTERNAL, CHAIN_APPROX_SIMPLE)
        .map_err(|e| VerificationError::opencv("contour detection", e))?;
    Ok(contours)
}

/// Square rectangular structuring element
pub(crate) fn square_kernel(size: i32) -> Result<Mat> {
    get_structuring_element(MORPH_RECT, Size::new(size, size), Point::new(-1, -1))
        .map_err(|e| VerificationError::opencv("kernel creation", e))
}

/// Mean and population standard deviation of a single-channel Mat
pub(crate) fn mean_and_std_dev(src: &Mat) -> Result<(f64, f64)> {
    let mut mean = Mat::default();
    let mut std_dev = Mat::default();
    mean_std_dev_def(src, &mut mean, &mut std_dev)
        .map_err(|e| VerificationError::opencv("mean/std computation", e))?;

    let mean = *mean
        .at::<f64>(0)
        .map_err(|e| VerificationError::opencv("mean access", e))?;
    let std_dev = *std_dev
        .at::<f64>(0)
        .map_err(|e| VerificationError::opencv("std access", e))?;
    Ok((mean, std_dev))
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::{Rect, Scalar, CV_8UC1};
    use opencv::imgproc::{rectangle, LINE_8};

    #[test]
    fn test_detection_clamps_confidence() {
        assert_eq!(Detection::found(1.4).confidence, 1.0);
        assert_eq!(Detection::missing(-0.1).confidence, 0.0);
        assert!(Detection::found(0.9).detected);
        assert!(!Detection::missing(0.2).detected);
    }

    #[test]
    fn test_external_contours_skip_holes() {
        let mut mask = Mat::new_rows_cols_with_default(100, 100, CV_8UC1, Scalar::all(0.0)).unwrap();
        rectangle(&mut mask, Rect::new(10, 10, 60, 60), Scalar::all(255.0), -1, LINE_8, 0).unwrap();
        rectangle(&mut mask, Rect::new(30, 30, 20, 20), Scalar::all(0.0), -1, LINE_8, 0).unwrap();
        rectangle(&mut mask, Rect::new(80, 80, 10, 10), Scalar::all(255.0), -1, LINE_8, 0).unwrap();

        let contours = external_contours(&mask).unwrap();
        assert_eq!(contours.len(), 2);
    }

    #[test]
    fn test_mean_and_std_dev_of_two_levels() {
        let mut src = Mat::new_rows_cols_with_default(10, 10, CV_8UC1, Scalar::all(0.0)).unwrap();
        rectangle(&mut src, Rect::new(0, 0, 10, 5), Scalar::all(100.0), -1, LINE_8, 0).unwrap();

        let (mean, std_dev) = mean_and_std_dev(&src).unwrap();
        assert!((mean - 50.0).abs() < 1e-9);
        assert!((std_dev - 50.0).abs() < 1e-9);
    }
}
