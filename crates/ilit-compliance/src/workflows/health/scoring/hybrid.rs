use crate::workflows::health::domain::{ComponentScores, OverallStatus};

/// Confidence at which the advisory pass neither raises nor lowers the score.
pub const NEUTRAL_CONFIDENCE: f64 = 0.5;
const ADJUSTMENT_SCALE: f64 = 20.0;
const ADJUSTMENT_WEIGHT: f64 = 0.30;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HybridScore {
    pub rule_score: f64,
    pub health_score: f64,
    pub overall_status: OverallStatus,
}

/// Blends the weighted rule score with a bounded advisory adjustment of at most three points.
pub fn combine(scores: &ComponentScores, confidence: f64) -> HybridScore {
    let rule_score = scores.weighted();
    let confidence = clamp_confidence(confidence);
    let adjustment = (confidence - NEUTRAL_CONFIDENCE) * ADJUSTMENT_SCALE;
    let blended = (rule_score + adjustment * ADJUSTMENT_WEIGHT).clamp(0.0, 100.0);
    let health_score = round_two(blended);

    HybridScore {
        rule_score: round_two(rule_score),
        health_score,
        overall_status: OverallStatus::from_score(health_score),
    }
}

pub fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_finite() {
        confidence.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn round_two(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
