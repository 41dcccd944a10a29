//! Confidence banding for the overall verdict and per-feature status

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::verdict::{HIGH_CONFIDENCE_THRESHOLD, MEDIUM_CONFIDENCE_THRESHOLD};

/// Overall authenticity verdict derived from the aggregate confidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    High,
    Medium,
    Low,
}

impl Verdict {
    /// Band an overall confidence; both thresholds are exclusive
    pub fn from_confidence(confidence: f32) -> Self {
        if confidence > HIGH_CONFIDENCE_THRESHOLD {
            Verdict::High
        } else if confidence > MEDIUM_CONFIDENCE_THRESHOLD {
            Verdict::Medium
        } else {
            Verdict::Low
        }
    }

    /// Whether the result is good enough to record a verification
    pub fn can_submit(&self) -> bool {
        matches!(self, Verdict::High | Verdict::Medium)
    }

    pub fn message(&self) -> &'static str {
        match self {
            Verdict::High => "Note appears to be genuine",
            Verdict::Medium => "Some features need manual verification",
            Verdict::Low => "Note requires thorough verification",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Verdict::High => "HIGH CONFIDENCE",
            Verdict::Medium => "MEDIUM CONFIDENCE",
            Verdict::Low => "LOW CONFIDENCE",
        };
        write!(f, "{}: {}", label, self.message())
    }
}

/// Per-feature status shown next to each detector result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureStatus {
    Verified,
    Unclear,
    NotVerified,
}

impl FeatureStatus {
    pub fn from_confidence(confidence: f32) -> Self {
        if confidence > HIGH_CONFIDENCE_THRESHOLD {
            FeatureStatus::Verified
        } else if confidence > MEDIUM_CONFIDENCE_THRESHOLD {
            FeatureStatus::Unclear
        } else {
            FeatureStatus::NotVerified
        }
    }
}

impl fmt::Display for FeatureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            FeatureStatus::Verified => "VERIFIED",
            FeatureStatus::Unclear => "UNCLEAR",
            FeatureStatus::NotVerified => "NOT VERIFIED",
        })
    }
}
