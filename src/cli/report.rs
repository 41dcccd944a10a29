//! Verification report: detector results joined with catalog text

use serde::Serialize;
use std::fmt::Write as _;

use crate::analysis::{AggregateResult, FeatureStatus, Verdict};
use crate::reference::{Denomination, ReferenceCatalog};

/// One feature line of the report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureReport {
    pub name: String,
    pub detected: bool,
    pub confidence: f32,
    pub status: FeatureStatus,
    pub description: String,
    pub rbi_guideline: Option<String>,
}

/// Everything printed by `banknote-verify check`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationReport {
    pub denomination: Denomination,
    pub features: Vec<FeatureReport>,
    pub overall_confidence: f32,
    pub verdict: Verdict,
    pub can_submit: bool,
}

impl VerificationReport {
    pub fn compose(
        result: &AggregateResult,
        denomination: Denomination,
        catalog: &ReferenceCatalog,
    ) -> Self {
        let features = result
            .features
            .iter()
            .map(|feature| FeatureReport {
                name: feature.name.clone(),
                detected: feature.detected,
                confidence: feature.confidence,
                status: feature.status(),
                description: feature.description.clone(),
                rbi_guideline: catalog.get_guideline(&feature.name).map(str::to_string),
            })
            .collect();

        let verdict = result.verdict();
        Self {
            denomination,
            features,
            overall_confidence: result.overall_confidence,
            verdict,
            can_submit: verdict.can_submit(),
        }
    }

    pub fn to_json(&self, compact: bool) -> serde_json::Result<String> {
        if compact {
            serde_json::to_string(self)
        } else {
            serde_json::to_string_pretty(self)
        }
    }

    /// Human-readable summary
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{} note", self.denomination);
        let _ = writeln!(
            out,
            "Overall authenticity score: {:.1}%",
            self.overall_confidence * 100.0
        );
        let _ = writeln!(out, "{}", self.verdict);

        for feature in &self.features {
            let _ = writeln!(
                out,
                "  {:<16} {:<13} {:>5.1}%",
                feature.name,
                feature.status,
                feature.confidence * 100.0
            );
        }

        if !self.can_submit {
            let _ = writeln!(out, "Verification cannot be submitted at this confidence.");
        }
        out
    }
}
