//! Built-in pipeline check against synthetic fixtures

use opencv::core::Mat;

use crate::analysis::{AggregateResult, FeatureAggregator, FeatureKind};
use crate::fixtures;
use crate::Result;

/// Outcome of one fixture run
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    pub name: &'static str,
    pub passed: bool,
    pub detail: String,
}

/// Run every fixture through `aggregator` and compare against the
/// documented behavior
pub fn run_self_check(aggregator: &FeatureAggregator) -> Result<Vec<CheckOutcome>> {
    let mut outcomes = Vec::new();

    for (name, hue) in [
        ("green thread detected", fixtures::GREEN_HUE_DEGREES),
        ("blue thread detected", fixtures::BLUE_HUE_DEGREES),
    ] {
        let result = analyze(aggregator, &fixtures::vertical_thread(300, 400, hue)?)?;
        let thread = feature_confidence(&result, FeatureKind::SecurityThread);
        outcomes.push(CheckOutcome {
            name,
            passed: thread.0 && thread.1 == 0.9,
            detail: format!("thread detected={} confidence={:.2}", thread.0, thread.1),
        });
    }

    let result = analyze(aggregator, &fixtures::vertical_thread(300, 400, fixtures::RED_HUE_DEGREES)?)?;
    let thread = feature_confidence(&result, FeatureKind::SecurityThread);
    outcomes.push(CheckOutcome {
        name: "red band ignored",
        passed: !thread.0,
        detail: format!("thread detected={}", thread.0),
    });

    let result = analyze(aggregator, &fixtures::uniform_gray(200, 300, 128)?)?;
    let confidences: Vec<f32> = result.features.iter().map(|f| f.confidence).collect();
    outcomes.push(CheckOutcome {
        name: "uniform gray falls back",
        passed: confidences == [0.2f32, 0.3, 0.25] && result.features.iter().all(|f| !f.detected),
        detail: format!(
            "confidences={:?} overall={:.3}",
            confidences, result.overall_confidence
        ),
    });

    let result = analyze(aggregator, &fixtures::textured_oval(200, 300)?)?;
    let watermark = feature_confidence(&result, FeatureKind::Watermark);
    outcomes.push(CheckOutcome {
        name: "textured oval watermark detected",
        passed: watermark.0 && watermark.1 == 0.85,
        detail: format!("watermark detected={} confidence={:.2}", watermark.0, watermark.1),
    });

    for (name, image) in [
        ("vertical hatching is not micro text", fixtures::fine_hatching(200, 200, 8)?),
        ("horizontal hatching is not micro text", fixtures::horizontal_hatching(200, 200, 8)?),
    ] {
        let result = analyze(aggregator, &image)?;
        let micro = feature_confidence(&result, FeatureKind::MicroLettering);
        outcomes.push(CheckOutcome {
            name,
            passed: !micro.0 && micro.1 == 0.25,
            detail: format!("micro lettering detected={}", micro.0),
        });
    }

    let result = analyze(aggregator, &fixtures::micro_text_block(200, 200)?)?;
    let micro = feature_confidence(&result, FeatureKind::MicroLettering);
    outcomes.push(CheckOutcome {
        name: "micro text block detected",
        passed: micro.0,
        detail: format!("micro lettering confidence={:.2}", micro.1),
    });

    Ok(outcomes)
}

fn analyze(aggregator: &FeatureAggregator, image: &Mat) -> Result<AggregateResult> {
    let processed = aggregator.normalize(image)?;
    aggregator.analyze(&processed, image)
}

fn feature_confidence(result: &AggregateResult, kind: FeatureKind) -> (bool, f32) {
    result
        .feature(kind)
        .map(|f| (f.detected, f.confidence))
        .unwrap_or((false, 0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pipeline_passes_self_check() {
        let outcomes = run_self_check(&FeatureAggregator::new()).unwrap();
        assert_eq!(outcomes.len(), 8);
        for outcome in &outcomes {
            assert!(outcome.passed, "{}: {}", outcome.name, outcome.detail);
        }
    }
}
