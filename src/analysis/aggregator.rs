//! Feature aggregation
//!
//! [`FeatureAggregator`] owns one instance of each detector, built from a
//! single [`DetectionConfig`]. It validates the original image once, runs
//! the detectors in a fixed order and averages their confidences.

use opencv::{core::Mat, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::verdict::{FeatureStatus, Verdict};
use crate::config::DetectionConfig;
use crate::detection::{
    Detection, MicroLetteringDetector, SecurityThreadDetector, WatermarkDetector,
};
use crate::image_loader::validate_note_image;
use crate::preprocessing::ImageNormalizer;
use crate::Result;

/// The three scored security features, in report order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureKind {
    SecurityThread,
    Watermark,
    MicroLettering,
}

impl FeatureKind {
    pub const ALL: [FeatureKind; 3] = [
        FeatureKind::SecurityThread,
        FeatureKind::Watermark,
        FeatureKind::MicroLettering,
    ];

    /// Display name used in results
    pub fn name(&self) -> &'static str {
        match self {
            FeatureKind::SecurityThread => "Security Thread",
            FeatureKind::Watermark => "Watermark",
            FeatureKind::MicroLettering => "Micro Lettering",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            FeatureKind::SecurityThread => "Color-shifting security thread with RBI text",
            FeatureKind::Watermark => "Gandhi portrait watermark",
            FeatureKind::MicroLettering => "Micro printed RBI text",
        }
    }

    /// Key into the reference catalog's security feature table
    pub fn catalog_key(&self) -> &'static str {
        match self {
            FeatureKind::SecurityThread => "security_thread",
            FeatureKind::Watermark => "watermark",
            FeatureKind::MicroLettering => "micro_lettering",
        }
    }
}

/// One named detector outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureResult {
    pub name: String,
    pub detected: bool,
    pub confidence: f32,
    pub description: String,
}

impl FeatureResult {
    pub fn new(kind: FeatureKind, detection: Detection) -> Self {
        Self {
            name: kind.name().to_string(),
            detected: detection.detected,
            confidence: detection.confidence,
            description: kind.description().to_string(),
        }
    }

    pub fn status(&self) -> FeatureStatus {
        FeatureStatus::from_confidence(self.confidence)
    }
}

/// All feature results plus their unweighted mean confidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub features: Vec<FeatureResult>,
    pub overall_confidence: f32,
}

impl AggregateResult {
    /// Package detector outputs in report order
    pub fn from_detections(thread: Detection, watermark: Detection, micro: Detection) -> Self {
        let features: Vec<FeatureResult> = FeatureKind::ALL
            .iter()
            .zip([thread, watermark, micro])
            .map(|(&kind, detection)| FeatureResult::new(kind, detection))
            .collect();

        let overall_confidence =
            features.iter().map(|f| f.confidence).sum::<f32>() / features.len() as f32;

        Self {
            features,
            overall_confidence,
        }
    }

    pub fn feature(&self, kind: FeatureKind) -> Option<&FeatureResult> {
        self.features.iter().find(|f| f.name == kind.name())
    }

    pub fn verdict(&self) -> Verdict {
        Verdict::from_confidence(self.overall_confidence)
    }
}

/// Intermediate buffers of one pipeline run
#[derive(Debug)]
pub struct DebugOutput {
    /// Binarized normalizer output
    pub normalized: Mat,
    /// Closed green/blue hue mask
    pub thread_mask: Mat,
    /// Grayscale local-contrast map
    pub contrast_map: Mat,
    /// Dilated Canny edge map
    pub edge_map: Mat,
}

/// Detector decisions with the buffer each one was made on
struct DetectorRun {
    thread: (Detection, Mat),
    watermark: (Detection, Mat),
    micro_lettering: (Detection, Mat),
}

/// Runs the normalizer and all three detectors with one configuration
#[derive(Debug, Clone)]
pub struct FeatureAggregator {
    min_image_dimension: i32,
    normalizer: ImageNormalizer,
    thread: SecurityThreadDetector,
    watermark: WatermarkDetector,
    micro_lettering: MicroLetteringDetector,
}

impl Default for FeatureAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureAggregator {
    pub fn new() -> Self {
        Self::with_config(DetectionConfig::default())
    }

    pub fn with_config(config: DetectionConfig) -> Self {
        Self {
            min_image_dimension: config.min_image_dimension,
            normalizer: ImageNormalizer::with_config(config.normalizer),
            thread: SecurityThreadDetector::with_config(config.security_thread),
            watermark: WatermarkDetector::with_config(config.watermark),
            micro_lettering: MicroLetteringDetector::with_config(config.micro_lettering),
        }
    }

    /// Validate and binarize a note image
    pub fn normalize(&self, image: &Mat) -> Result<Mat> {
        validate_note_image(image, self.min_image_dimension)?;
        self.normalizer.normalize(image)
    }

    /// Score all features of `original`
    ///
    /// `processed` is the normalizer output. It is accepted so callers can
    /// keep the two-buffer pipeline shape, but no detector reads it.
    ///
    /// # Errors
    ///
    /// `InvalidImageFormat` if `original` fails validation; no detector runs
    /// in that case.
    pub fn analyze(&self, processed: &Mat, original: &Mat) -> Result<AggregateResult> {
        self.analyze_stages(processed, original).map(|(result, _)| result)
    }

    /// Normalize, analyze and keep every intermediate buffer
    ///
    /// The buffers are the ones the detectors decided on; nothing is
    /// computed twice.
    pub fn analyze_debug(&self, original: &Mat) -> Result<(AggregateResult, DebugOutput)> {
        let normalized = self.normalize(original)?;
        let (result, run) = self.analyze_stages(&normalized, original)?;

        let debug_output = DebugOutput {
            normalized,
            thread_mask: run.thread.1,
            contrast_map: run.watermark.1,
            edge_map: run.micro_lettering.1,
        };

        Ok((result, debug_output))
    }

    fn analyze_stages(
        &self,
        processed: &Mat,
        original: &Mat,
    ) -> Result<(AggregateResult, DetectorRun)> {
        validate_note_image(original, self.min_image_dimension)?;
        debug!(
            processed_rows = processed.rows(),
            processed_cols = processed.cols(),
            "aggregating features"
        );

        let run = self.run_detectors(original)?;
        let result = AggregateResult::from_detections(
            run.thread.0,
            run.watermark.0,
            run.micro_lettering.0,
        );

        info!(
            thread = result.features[0].confidence,
            watermark = result.features[1].confidence,
            micro_lettering = result.features[2].confidence,
            overall = result.overall_confidence,
            "feature analysis complete"
        );

        Ok((result, run))
    }

    #[cfg(not(feature = "parallel"))]
    fn run_detectors(&self, image: &Mat) -> Result<DetectorRun> {
        Ok(DetectorRun {
            thread: self.thread.detect_with_mask(image)?,
            watermark: self.watermark.detect_with_contrast(image)?,
            micro_lettering: self.micro_lettering.detect_with_edges(image)?,
        })
    }

    #[cfg(feature = "parallel")]
    fn run_detectors(&self, image: &Mat) -> Result<DetectorRun> {
        use crate::VerificationError;

        let copy = |m: &Mat| {
            m.try_clone()
                .map_err(|e| VerificationError::opencv("image copy", e))
        };
        let thread_image = copy(image)?;
        let watermark_image = copy(image)?;
        let micro_image = copy(image)?;

        let (thread, (watermark, micro_lettering)) = rayon::join(
            move || self.thread.detect_with_mask(&thread_image),
            move || {
                rayon::join(
                    move || self.watermark.detect_with_contrast(&watermark_image),
                    move || self.micro_lettering.detect_with_edges(&micro_image),
                )
            },
        );
        Ok(DetectorRun {
            thread: thread?,
            watermark: watermark?,
            micro_lettering: micro_lettering?,
        })
    }
}
