//! Configuration structures for the banknote_verify detection pipeline.
//!
//! This module defines all tunable parameters for feature detection,
//! organized per pipeline stage. Defaults come from [`crate::constants`].
//!
//! # Configuration Loading
//!
//! Configuration can be loaded from JSON files or constructed programmatically:
//!
//! ```no_run
//! use banknote_verify::DetectionConfig;
//! use std::path::Path;
//!
//! // Load from file
//! let config = DetectionConfig::from_json_file(Path::new("detection.json"))?;
//!
//! // Or use defaults
//! let config = DetectionConfig::default();
//! # Ok::<(), banknote_verify::VerificationError>(())
//! ```
//!
//! # Configuration Sections
//!
//! - [`NormalizerConfig`]: CLAHE, denoising and adaptive threshold settings
//! - [`SecurityThreadConfig`]: hue bands and contour geometry gates
//! - [`WatermarkConfig`]: local-contrast and circularity settings
//! - [`MicroLetteringConfig`]: edge thresholds and projection gates

use crate::constants::{input, micro_lettering, normalizer, security_thread, watermark};
use crate::error::{Result, VerificationError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete pipeline configuration.
///
/// Can be serialized to/from JSON for reproducible runs. Missing sections
/// fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Smallest accepted image width and height in pixels
    pub min_image_dimension: i32,

    pub normalizer: NormalizerConfig,

    pub security_thread: SecurityThreadConfig,

    pub watermark: WatermarkConfig,

    pub micro_lettering: MicroLetteringConfig,
}

/// Normalization parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    pub clahe_clip_limit: f64,
    pub clahe_tile_grid: i32,
    pub denoise_strength: f32,
    pub denoise_template_window: i32,
    pub denoise_search_window: i32,
    /// Adaptive threshold neighborhood (must be odd and > 1)
    pub adaptive_block_size: i32,
    pub adaptive_offset: f64,
}

/// Inclusive OpenCV hue range (0-179).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HueBand {
    pub min: f64,
    pub max: f64,
}

impl HueBand {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, hue: f64) -> bool {
        hue >= self.min && hue <= self.max
    }

    /// True when the two bands share at least one hue
    pub fn overlaps(&self, other: &HueBand) -> bool {
        self.contains(other.min) || other.contains(self.min)
    }
}

/// Security-thread detection parameters.
///
/// A contour is a thread candidate when it is very tall relative to its
/// width, its area lies inside the open area range, and its outline is
/// smooth (low perimeter/area ratio).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityThreadConfig {
    pub green_hue: HueBand,
    pub blue_hue: HueBand,
    pub min_saturation: f64,
    pub min_value: f64,
    pub close_kernel_size: i32,
    pub min_aspect_ratio: f64,
    pub min_area: f64,
    pub max_area: f64,
    pub max_perimeter_area_ratio: f64,
    pub detected_confidence: f32,
    pub fallback_confidence: f32,
}

/// Watermark detection parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatermarkConfig {
    pub clahe_clip_limit: f64,
    pub clahe_tile_grid: i32,
    /// Gaussian kernel size (must be odd)
    pub blur_kernel_size: i32,
    pub contrast_std_factor: f64,
    /// Minimum contour area as fraction of image pixel count (0.0-1.0)
    pub min_area_fraction: f64,
    pub min_circularity: f64,
    pub max_circularity: f64,
    pub detected_confidence: f32,
    pub fallback_confidence: f32,
}

/// Micro-lettering detection parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MicroLetteringConfig {
    /// Canny (low, high) threshold pairs; edge maps are combined with OR
    pub canny_thresholds: Vec<(f64, f64)>,
    pub dilate_kernel_size: i32,
    pub dilate_iterations: i32,
    pub min_pattern_density: f64,
    pub min_projection_std: f64,
    pub detected_confidence: f32,
    pub fallback_confidence: f32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_image_dimension: input::MIN_IMAGE_DIMENSION,
            normalizer: NormalizerConfig::default(),
            security_thread: SecurityThreadConfig::default(),
            watermark: WatermarkConfig::default(),
            micro_lettering: MicroLetteringConfig::default(),
        }
    }
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            clahe_clip_limit: normalizer::CLAHE_CLIP_LIMIT,
            clahe_tile_grid: normalizer::CLAHE_TILE_GRID,
            denoise_strength: normalizer::DENOISE_STRENGTH,
            denoise_template_window: normalizer::DENOISE_TEMPLATE_WINDOW,
            denoise_search_window: normalizer::DENOISE_SEARCH_WINDOW,
            adaptive_block_size: normalizer::ADAPTIVE_BLOCK_SIZE,
            adaptive_offset: normalizer::ADAPTIVE_OFFSET,
        }
    }
}

impl Default for SecurityThreadConfig {
    fn default() -> Self {
        Self {
            green_hue: HueBand::new(security_thread::GREEN_HUE_MIN, security_thread::GREEN_HUE_MAX),
            blue_hue: HueBand::new(security_thread::BLUE_HUE_MIN, security_thread::BLUE_HUE_MAX),
            min_saturation: security_thread::MIN_SATURATION,
            min_value: security_thread::MIN_VALUE,
            close_kernel_size: security_thread::CLOSE_KERNEL_SIZE,
            min_aspect_ratio: security_thread::MIN_ASPECT_RATIO,
            min_area: security_thread::MIN_AREA,
            max_area: security_thread::MAX_AREA,
            max_perimeter_area_ratio: security_thread::MAX_PERIMETER_AREA_RATIO,
            detected_confidence: security_thread::DETECTED_CONFIDENCE,
            fallback_confidence: security_thread::FALLBACK_CONFIDENCE,
        }
    }
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            clahe_clip_limit: watermark::CLAHE_CLIP_LIMIT,
            clahe_tile_grid: watermark::CLAHE_TILE_GRID,
            blur_kernel_size: watermark::BLUR_KERNEL_SIZE,
            contrast_std_factor: watermark::CONTRAST_STD_FACTOR,
            min_area_fraction: watermark::MIN_AREA_FRACTION,
            min_circularity: watermark::MIN_CIRCULARITY,
            max_circularity: watermark::MAX_CIRCULARITY,
            detected_confidence: watermark::DETECTED_CONFIDENCE,
            fallback_confidence: watermark::FALLBACK_CONFIDENCE,
        }
    }
}

impl Default for MicroLetteringConfig {
    fn default() -> Self {
        Self {
            canny_thresholds: vec![
                (micro_lettering::CANNY_LOW_1, micro_lettering::CANNY_HIGH_1),
                (micro_lettering::CANNY_LOW_2, micro_lettering::CANNY_HIGH_2),
            ],
            dilate_kernel_size: micro_lettering::DILATE_KERNEL_SIZE,
            dilate_iterations: micro_lettering::DILATE_ITERATIONS,
            min_pattern_density: micro_lettering::MIN_PATTERN_DENSITY,
            min_projection_std: micro_lettering::MIN_PROJECTION_STD,
            detected_confidence: micro_lettering::DETECTED_CONFIDENCE,
            fallback_confidence: micro_lettering::FALLBACK_CONFIDENCE,
        }
    }
}

impl DetectionConfig {
    /// Load configuration from JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            VerificationError::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            VerificationError::config(format!("cannot parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to JSON file
    pub fn to_json_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| VerificationError::config(format!("cannot serialize config: {}", e)))?;
        std::fs::write(path, json).map_err(|e| {
            VerificationError::config(format!("cannot write {}: {}", path.display(), e))
        })?;
        Ok(())
    }

    /// Check parameter consistency
    pub fn validate(&self) -> Result<()> {
        if self.min_image_dimension < 1 {
            return Err(VerificationError::config("min_image_dimension must be positive"));
        }

        let n = &self.normalizer;
        if n.clahe_tile_grid < 1 || n.clahe_clip_limit <= 0.0 {
            return Err(VerificationError::config(
                "normalizer CLAHE needs a positive clip limit and tile grid",
            ));
        }
        if n.adaptive_block_size < 3 || n.adaptive_block_size % 2 == 0 {
            return Err(VerificationError::config(format!(
                "adaptive_block_size must be odd and >= 3, got {}",
                n.adaptive_block_size
            )));
        }
        if n.denoise_template_window % 2 == 0 || n.denoise_search_window % 2 == 0 {
            return Err(VerificationError::config("denoise windows must be odd"));
        }

        let t = &self.security_thread;
        for (label, band) in [("green_hue", t.green_hue), ("blue_hue", t.blue_hue)] {
            if band.min > band.max || band.min < 0.0 || band.max > 179.0 {
                return Err(VerificationError::config(format!(
                    "{} must satisfy 0 <= min <= max <= 179, got {}..{}",
                    label, band.min, band.max
                )));
            }
        }
        if t.green_hue.overlaps(&t.blue_hue) {
            return Err(VerificationError::config(format!(
                "green_hue {}..{} and blue_hue {}..{} must not overlap",
                t.green_hue.min, t.green_hue.max, t.blue_hue.min, t.blue_hue.max
            )));
        }
        if t.close_kernel_size < 1 {
            return Err(VerificationError::config("close_kernel_size must be positive"));
        }
        if t.min_area >= t.max_area {
            return Err(VerificationError::config("thread min_area must be below max_area"));
        }

        let w = &self.watermark;
        if w.blur_kernel_size < 1 || w.blur_kernel_size % 2 == 0 {
            return Err(VerificationError::config(format!(
                "blur_kernel_size must be odd and positive, got {}",
                w.blur_kernel_size
            )));
        }
        if w.clahe_tile_grid < 1 || w.clahe_clip_limit <= 0.0 {
            return Err(VerificationError::config(
                "watermark CLAHE needs a positive clip limit and tile grid",
            ));
        }
        if w.min_circularity >= w.max_circularity {
            return Err(VerificationError::config("min_circularity must be below max_circularity"));
        }

        let m = &self.micro_lettering;
        if m.canny_thresholds.is_empty() {
            return Err(VerificationError::config("at least one Canny threshold pair is required"));
        }
        if m.dilate_kernel_size < 1 || m.dilate_iterations < 0 {
            return Err(VerificationError::config("invalid dilation settings"));
        }

        let confidences = [
            t.detected_confidence,
            t.fallback_confidence,
            w.detected_confidence,
            w.fallback_confidence,
            m.detected_confidence,
            m.fallback_confidence,
        ];
        if confidences.iter().any(|c| !(0.0..=1.0).contains(c)) {
            return Err(VerificationError::config("confidence values must lie in [0, 1]"));
        }

        Ok(())
    }
}
