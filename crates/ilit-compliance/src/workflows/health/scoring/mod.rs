//! Component scores, rule findings, and the hybrid blend.

pub mod hybrid;
pub mod rules;

pub use hybrid::{clamp_confidence, combine, HybridScore, NEUTRAL_CONFIDENCE};
pub use rules::{assess, RuleAssessment};
