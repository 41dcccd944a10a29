//! Illumination-robust binarization of note photographs
//!
//! Steps:
//! 1. Luma-weighted grayscale conversion
//! 2. CLAHE to even out local contrast under uneven lighting
//! 3. Non-local-means denoising, which keeps fine print strokes
//! 4. Adaptive Gaussian thresholding
//!
//! The result is a `CV_8UC1` Mat of the input's size with values 0 or 255.

use opencv::{
    core::{Mat, Size},
    imgproc::{
        adaptive_threshold, create_clahe, cvt_color_def, ADAPTIVE_THRESH_GAUSSIAN_C,
        COLOR_BGR2GRAY, THRESH_BINARY,
    },
    photo::fast_nl_means_denoising,
    prelude::*,
};
use tracing::debug;

use crate::config::NormalizerConfig;
use crate::image_loader::ensure_bgr8;
use crate::{Result, VerificationError};

/// Image normalizer producing the binarized auxiliary buffer
#[derive(Debug, Clone, Default)]
pub struct ImageNormalizer {
    config: NormalizerConfig,
}

impl ImageNormalizer {
    /// Create a normalizer with default parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a normalizer with custom parameters
    pub fn with_config(config: NormalizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Normalize a BGR note image
    ///
    /// # Errors
    ///
    /// Returns `VerificationError::InvalidImageFormat` if the input is not an
    /// 8-bit, 3-channel image, or an OpenCV error if a filter fails.
    pub fn normalize(&self, image: &Mat) -> Result<Mat> {
        ensure_bgr8(image)?;

        let mut gray = Mat::default();
        cvt_color_def(image, &mut gray, COLOR_BGR2GRAY)
            .map_err(|e| VerificationError::opencv("grayscale conversion", e))?;

        let enhanced = self.equalize_local_contrast(&gray)?;

        let mut denoised = Mat::default();
        fast_nl_means_denoising(
            &enhanced,
            &mut denoised,
            self.config.denoise_strength,
            self.config.denoise_template_window,
            self.config.denoise_search_window,
        )
        .map_err(|e| VerificationError::opencv("non-local-means denoising", e))?;

        let mut binary = Mat::default();
        adaptive_threshold(
            &denoised,
            &mut binary,
            255.0,
            ADAPTIVE_THRESH_GAUSSIAN_C,
            THRESH_BINARY,
            self.config.adaptive_block_size,
            self.config.adaptive_offset,
        )
        .map_err(|e| VerificationError::opencv("adaptive threshold", e))?;

        debug!(
            rows = binary.rows(),
            cols = binary.cols(),
            "normalized image"
        );

        Ok(binary)
    }

    fn equalize_local_contrast(&self, gray: &Mat) -> Result<Mat> {
        let tiles = self.config.clahe_tile_grid;
        let mut clahe = create_clahe(self.config.clahe_clip_limit, Size::new(tiles, tiles))
            .map_err(|e| VerificationError::opencv("CLAHE creation", e))?;

        let mut enhanced = Mat::default();
        clahe
            .apply(gray, &mut enhanced)
            .map_err(|e| VerificationError::opencv("CLAHE", e))?;

        Ok(enhanced)
    }
}
