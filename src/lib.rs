//! # Banknote Verify
//!
//! A Rust crate for scoring the security features of banknote photographs.
//!
//! This library inspects a BGR image of a note and reports:
//! - A color-shifting security thread (green/blue hue segmentation and contour shape)
//! - A portrait watermark (local-contrast map and circularity)
//! - Micro lettering (edge density and row/column projection statistics)
//!
//! Each feature gets a detection flag and a confidence in [0, 1]; the overall
//! confidence is their unweighted mean.
//!
//! ## Example
//!
//! ```rust,no_run
//! use banknote_verify::{analyze_note_file, Verdict};
//! use std::path::Path;
//!
//! let result = analyze_note_file(Path::new("note.jpg"))?;
//! for feature in &result.features {
//!     println!("{}: {:.2}", feature.name, feature.confidence);
//! }
//! println!("{}", Verdict::from_confidence(result.overall_confidence));
//! # Ok::<(), banknote_verify::VerificationError>(())
//! ```

use opencv::core::Mat;
use std::path::Path;
use tracing::info;

pub mod analysis;
pub mod config;
pub mod constants;
pub mod detection;
pub mod error;
pub mod fixtures;
pub mod image_loader;
pub mod logger;
pub mod preprocessing;
pub mod reference;

#[cfg(feature = "cli")]
pub mod cli;

pub use analysis::{
    AggregateResult, DebugOutput, FeatureAggregator, FeatureKind, FeatureResult, FeatureStatus,
    Verdict,
};
pub use config::DetectionConfig;
pub use detection::Detection;
pub use error::{Result, VerificationError};
pub use reference::{Denomination, ReferenceCatalog};

/// Run the full pipeline on a BGR note image with default parameters
///
/// # Errors
///
/// Returns `VerificationError::InvalidImageFormat` if the image is not a
/// non-empty 8-bit, 3-channel raster of at least 50x50 pixels, or an OpenCV
/// error if a filter fails. Missing features are not errors.
pub fn analyze_note(image: &Mat) -> Result<AggregateResult> {
    analyze_note_with_config(image, &DetectionConfig::default())
}

/// Run the full pipeline with custom parameters
///
/// The configuration is validated before any image work, so an
/// inconsistent config surfaces as `VerificationError::ConfigError`.
pub fn analyze_note_with_config(image: &Mat, config: &DetectionConfig) -> Result<AggregateResult> {
    config.validate()?;
    let aggregator = FeatureAggregator::with_config(config.clone());
    let processed = aggregator.normalize(image)?;
    aggregator.analyze(&processed, image)
}

/// Run the full pipeline and return the intermediate buffers as well
pub fn analyze_note_debug(image: &Mat) -> Result<(AggregateResult, DebugOutput)> {
    FeatureAggregator::new().analyze_debug(image)
}

/// Load a note photograph from disk and analyze it
pub fn analyze_note_file(path: &Path) -> Result<AggregateResult> {
    let image = image_loader::load_image(path)?;
    let result = analyze_note(&image)?;
    info!(
        path = %path.display(),
        overall = result.overall_confidence,
        "note analyzed"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_result_serialization() {
        let result = AggregateResult::from_detections(
            Detection::found(0.9),
            Detection::missing(0.3),
            Detection::missing(0.25),
        );

        let json = serde_json::to_string(&result).unwrap();
        let deserialized: AggregateResult = serde_json::from_str(&json).unwrap();

        assert_eq!(result, deserialized);
    }

    #[test]
    fn test_analyze_note_rejects_empty_image() {
        assert!(matches!(
            analyze_note(&Mat::default()),
            Err(VerificationError::InvalidImageFormat { .. })
        ));
    }

    #[test]
    fn test_invalid_config_rejected_before_image_work() {
        let mut config = DetectionConfig::default();
        config.watermark.blur_kernel_size = 14;

        // Even the empty image is not looked at
        assert!(matches!(
            analyze_note_with_config(&Mat::default(), &config),
            Err(VerificationError::ConfigError { .. })
        ));
    }
}
