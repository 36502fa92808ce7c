//! Best-effort AI review layered on top of the rule findings.
//!
//! [`consult`] never fails: transport errors, timeouts, and unparseable output all produce a
//! degraded assessment with zero confidence so the rule score stands on its own.

pub mod gemini;

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::domain::{
    ComponentScores, FindingSource, HealthIssue, IssueKind, Recommendation, RecommendedAction,
    Severity,
};
use super::scoring::clamp_confidence;
use super::snapshot::PolicySnapshot;
use crate::workflows::remediation::domain::ActionPriority;

pub use gemini::GeminiAdvisor;

const MISSING_SUMMARY: &str = "No AI summary available";
const DEFAULT_CONFIDENCE: f64 = 0.5;

/// External inference service producing supplementary findings.
#[async_trait]
pub trait PolicyAdvisor: Send + Sync {
    /// Model identifier stored on every health check.
    fn model(&self) -> &str;

    async fn analyze(
        &self,
        snapshot: &PolicySnapshot,
        scores: &ComponentScores,
    ) -> Result<AdvisoryFindings, AdvisoryError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdvisoryFindings {
    pub summary: String,
    pub confidence: f64,
    pub issues: Vec<HealthIssue>,
    pub recommendations: Vec<Recommendation>,
}

/// Result handed to the orchestrator, degraded or not.
#[derive(Debug, Clone, PartialEq)]
pub struct AdvisoryAssessment {
    pub summary: String,
    pub confidence: f64,
    pub issues: Vec<HealthIssue>,
    pub recommendations: Vec<Recommendation>,
    pub degraded: bool,
}

impl AdvisoryAssessment {
    pub fn degraded(reason: impl std::fmt::Display) -> Self {
        Self {
            summary: format!("AI analysis failed: {reason}"),
            confidence: 0.0,
            issues: Vec::new(),
            recommendations: Vec::new(),
            degraded: true,
        }
    }
}

impl From<AdvisoryFindings> for AdvisoryAssessment {
    fn from(findings: AdvisoryFindings) -> Self {
        Self {
            summary: findings.summary,
            confidence: clamp_confidence(findings.confidence),
            issues: findings.issues,
            recommendations: findings.recommendations,
            degraded: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AdvisoryError {
    #[error("advisory service is disabled")]
    Disabled,
    #[error("advisory transport error: {0}")]
    Transport(String),
    #[error("advisory service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("advisory response was malformed: {0}")]
    Malformed(String),
    #[error("advisory call timed out after {0:?}")]
    Timeout(Duration),
}

/// Runs the advisory pass under `timeout`, degrading on any failure.
pub async fn consult(
    advisor: &dyn PolicyAdvisor,
    snapshot: &PolicySnapshot,
    scores: &ComponentScores,
    timeout: Duration,
) -> AdvisoryAssessment {
    let outcome = match tokio::time::timeout(timeout, advisor.analyze(snapshot, scores)).await {
        Ok(result) => result,
        Err(_) => Err(AdvisoryError::Timeout(timeout)),
    };

    match outcome {
        Ok(findings) => {
            tracing::info!(
                policy_id = %snapshot.policy.id,
                model = advisor.model(),
                confidence = findings.confidence,
                extra_issues = findings.issues.len(),
                "advisory analysis complete"
            );
            findings.into()
        }
        Err(error) => {
            tracing::warn!(
                policy_id = %snapshot.policy.id,
                model = advisor.model(),
                %error,
                "advisory analysis degraded"
            );
            AdvisoryAssessment::degraded(error)
        }
    }
}

/// Advisor used when no inference key is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledAdvisor;

#[async_trait]
impl PolicyAdvisor for DisabledAdvisor {
    fn model(&self) -> &str {
        "disabled"
    }

    async fn analyze(
        &self,
        _snapshot: &PolicySnapshot,
        _scores: &ComponentScores,
    ) -> Result<AdvisoryFindings, AdvisoryError> {
        Err(AdvisoryError::Disabled)
    }
}

#[derive(Debug, Deserialize)]
struct RawFindings {
    #[serde(default)]
    ai_summary: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    additional_insights: Vec<RawInsight>,
    #[serde(default)]
    ai_recommendations: Vec<RawRecommendation>,
}

#[derive(Debug, Deserialize)]
struct RawInsight {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    severity: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    requires_remediation: bool,
}

#[derive(Debug, Deserialize)]
struct RawRecommendation {
    #[serde(default)]
    action: String,
    #[serde(default)]
    priority: String,
    #[serde(default)]
    description: String,
}

/// Parses model output, tolerating a surrounding markdown code fence.
pub fn parse_findings(raw: &str) -> Result<AdvisoryFindings, AdvisoryError> {
    let body = strip_code_fence(raw);
    let parsed: RawFindings =
        serde_json::from_str(body).map_err(|e| AdvisoryError::Malformed(e.to_string()))?;

    let summary = parsed
        .ai_summary
        .map(|summary| summary.trim().to_string())
        .filter(|summary| !summary.is_empty())
        .unwrap_or_else(|| MISSING_SUMMARY.to_string());

    let issues = parsed
        .additional_insights
        .into_iter()
        .filter(|insight| !insight.description.trim().is_empty())
        .map(|insight| HealthIssue {
            kind: IssueKind::from_label(&insight.kind),
            severity: Severity::from_label(&insight.severity),
            description: insight.description.trim().to_string(),
            requires_remediation: insight.requires_remediation,
            source: FindingSource::Advisory,
        })
        .collect();

    let recommendations = parsed
        .ai_recommendations
        .into_iter()
        .filter(|rec| !rec.description.trim().is_empty())
        .map(|rec| Recommendation {
            action: RecommendedAction::from_label(&rec.action),
            priority: ActionPriority::from_label(&rec.priority),
            description: rec.description.trim().to_string(),
            source: FindingSource::Advisory,
        })
        .collect();

    Ok(AdvisoryFindings {
        summary,
        confidence: parsed.confidence.unwrap_or(DEFAULT_CONFIDENCE),
        issues,
        recommendations,
    })
}

fn strip_code_fence(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fenced_output() {
        let raw = "```json\n{\"ai_summary\":\"Funding is thin.\",\"confidence\":0.8,\
                   \"additional_insights\":[{\"type\":\"insufficient_funds\",\"severity\":\"high\",\
                   \"description\":\"Gift cadence slowing\",\"requires_remediation\":true}],\
                   \"ai_recommendations\":[{\"action\":\"fund_trust\",\"priority\":\"high\",\
                   \"description\":\"Request a gift before the next premium\"}]}\n```";
        let findings = parse_findings(raw).expect("parses");
        assert_eq!(findings.summary, "Funding is thin.");
        assert_eq!(findings.confidence, 0.8);
        assert_eq!(findings.issues.len(), 1);
        assert_eq!(findings.issues[0].kind, IssueKind::InsufficientFunds);
        assert_eq!(findings.issues[0].source, FindingSource::Advisory);
        assert_eq!(findings.recommendations[0].action, RecommendedAction::FundTrust);
    }

    #[test]
    fn fills_defaults_for_missing_fields() {
        let findings = parse_findings("{}").expect("parses");
        assert_eq!(findings.summary, MISSING_SUMMARY);
        assert_eq!(findings.confidence, DEFAULT_CONFIDENCE);
        assert!(findings.issues.is_empty());
    }

    #[test]
    fn unknown_labels_fall_back() {
        let raw = r#"{"additional_insights":[{"type":"weather","severity":"severe","description":"x"}]}"#;
        let findings = parse_findings(raw).expect("parses");
        assert_eq!(findings.issues[0].kind, IssueKind::Other);
        assert_eq!(findings.issues[0].severity, Severity::Low);
        assert!(!findings.issues[0].requires_remediation);
    }

    #[test]
    fn rejects_non_json() {
        assert!(matches!(
            parse_findings("The policy looks fine."),
            Err(AdvisoryError::Malformed(_))
        ));
    }

    #[test]
    fn degraded_assessment_has_zero_confidence() {
        let assessment = AdvisoryAssessment::degraded(AdvisoryError::Disabled);
        assert_eq!(assessment.confidence, 0.0);
        assert!(assessment.degraded);
        assert!(assessment.summary.contains("disabled"));
    }
}
