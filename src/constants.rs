//! Detection constants and reference values for banknote analysis
//!
//! Every tunable value used by the pipeline lives here, grouped per stage.
//! [`crate::config::DetectionConfig::default`] is built from these values, so
//! changing a constant changes the default behavior of every detector.

/// Input acceptance limits
pub mod input {
    /// Smallest accepted width and height in pixels
    ///
    /// Below this, contour area and perimeter ratios degenerate.
    pub const MIN_IMAGE_DIMENSION: i32 = 50;
}

/// Image normalizer parameters
pub mod normalizer {
    /// CLAHE clip limit for the grayscale image
    pub const CLAHE_CLIP_LIMIT: f64 = 2.0;

    /// CLAHE tile grid (tiles per side)
    pub const CLAHE_TILE_GRID: i32 = 8;

    /// Non-local-means filter strength
    pub const DENOISE_STRENGTH: f32 = 3.0;

    /// Non-local-means template patch size (odd)
    pub const DENOISE_TEMPLATE_WINDOW: i32 = 7;

    /// Non-local-means search window size (odd)
    pub const DENOISE_SEARCH_WINDOW: i32 = 21;

    /// Adaptive threshold neighborhood size (odd)
    pub const ADAPTIVE_BLOCK_SIZE: i32 = 11;

    /// Constant subtracted from the Gaussian-weighted local mean
    pub const ADAPTIVE_OFFSET: f64 = 2.0;
}

/// Security-thread detector parameters
///
/// Hue values use the OpenCV 8-bit convention (degrees / 2, range 0-179).
pub mod security_thread {
    /// Green band hue range
    pub const GREEN_HUE_MIN: f64 = 40.0;
    pub const GREEN_HUE_MAX: f64 = 80.0;

    /// Blue band hue range
    pub const BLUE_HUE_MIN: f64 = 100.0;
    pub const BLUE_HUE_MAX: f64 = 140.0;

    /// Minimum saturation and value for both bands (of 255)
    pub const MIN_SATURATION: f64 = 50.0;
    pub const MIN_VALUE: f64 = 50.0;

    /// Closing kernel size
    pub const CLOSE_KERNEL_SIZE: i32 = 3;

    /// Bounding box height/width must exceed this
    pub const MIN_ASPECT_RATIO: f64 = 8.0;

    /// Contour area bounds in pixels (exclusive)
    pub const MIN_AREA: f64 = 1000.0;
    pub const MAX_AREA: f64 = 15000.0;

    /// Perimeter/area must stay below this
    pub const MAX_PERIMETER_AREA_RATIO: f64 = 0.5;

    pub const DETECTED_CONFIDENCE: f32 = 0.9;
    pub const FALLBACK_CONFIDENCE: f32 = 0.2;
}

/// Watermark detector parameters
pub mod watermark {
    /// CLAHE clip limit for the L channel
    pub const CLAHE_CLIP_LIMIT: f64 = 3.0;

    /// CLAHE tile grid (tiles per side)
    pub const CLAHE_TILE_GRID: i32 = 8;

    /// Gaussian blur kernel size for the local-contrast map (odd)
    pub const BLUR_KERNEL_SIZE: i32 = 15;

    /// Binarization threshold as a multiple of the contrast standard deviation
    pub const CONTRAST_STD_FACTOR: f64 = 0.3;

    /// Minimum contour area as fraction of the image pixel count
    pub const MIN_AREA_FRACTION: f64 = 0.05;

    /// Circularity band (exclusive) for portrait-like shapes
    pub const MIN_CIRCULARITY: f64 = 0.3;
    pub const MAX_CIRCULARITY: f64 = 0.7;

    pub const DETECTED_CONFIDENCE: f32 = 0.85;
    pub const FALLBACK_CONFIDENCE: f32 = 0.3;
}

/// Micro-lettering detector parameters
pub mod micro_lettering {
    /// Sensitive Canny pass
    pub const CANNY_LOW_1: f64 = 50.0;
    pub const CANNY_HIGH_1: f64 = 150.0;

    /// Conservative Canny pass
    pub const CANNY_LOW_2: f64 = 100.0;
    pub const CANNY_HIGH_2: f64 = 200.0;

    /// Dilation kernel size
    pub const DILATE_KERNEL_SIZE: i32 = 2;

    /// Dilation iterations
    pub const DILATE_ITERATIONS: i32 = 1;

    /// Edge pixel fraction that must be exceeded
    pub const MIN_PATTERN_DENSITY: f64 = 0.15;

    /// Row and column projection standard deviations must both exceed this
    pub const MIN_PROJECTION_STD: f64 = 100.0;

    pub const DETECTED_CONFIDENCE: f32 = 0.8;
    pub const FALLBACK_CONFIDENCE: f32 = 0.25;
}

/// Confidence bands used for verdicts and per-feature status
pub mod verdict {
    /// Strictly above: high confidence / verified
    pub const HIGH_CONFIDENCE_THRESHOLD: f32 = 0.7;

    /// Strictly above: medium confidence / unclear
    pub const MEDIUM_CONFIDENCE_THRESHOLD: f32 = 0.4;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hue_bands_do_not_overlap() {
        assert!(security_thread::GREEN_HUE_MIN < security_thread::GREEN_HUE_MAX);
        assert!(security_thread::GREEN_HUE_MAX < security_thread::BLUE_HUE_MIN);
        assert!(security_thread::BLUE_HUE_MIN < security_thread::BLUE_HUE_MAX);
        assert!(security_thread::BLUE_HUE_MAX < 180.0);
    }

    #[test]
    fn test_detected_confidence_exceeds_fallback() {
        assert!(security_thread::DETECTED_CONFIDENCE > security_thread::FALLBACK_CONFIDENCE);
        assert!(watermark::DETECTED_CONFIDENCE > watermark::FALLBACK_CONFIDENCE);
        assert!(micro_lettering::DETECTED_CONFIDENCE > micro_lettering::FALLBACK_CONFIDENCE);
    }

    #[test]
    fn test_window_sizes_are_odd() {
        assert_eq!(normalizer::ADAPTIVE_BLOCK_SIZE % 2, 1);
        assert_eq!(normalizer::DENOISE_TEMPLATE_WINDOW % 2, 1);
        assert_eq!(normalizer::DENOISE_SEARCH_WINDOW % 2, 1);
        assert_eq!(watermark::BLUR_KERNEL_SIZE % 2, 1);
    }

    #[test]
    fn test_verdict_bands_ordered() {
        assert!(verdict::MEDIUM_CONFIDENCE_THRESHOLD < verdict::HIGH_CONFIDENCE_THRESHOLD);
    }
}
