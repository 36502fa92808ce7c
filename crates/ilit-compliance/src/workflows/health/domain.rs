use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::portfolio::domain::record_id;
use crate::workflows::portfolio::{PolicyId, TrustId};
use crate::workflows::remediation::domain::{ActionPriority, ActionType};

record_id!(
    /// Identifier for a persisted health check.
    HealthCheckId
);

/// What started a health check run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckTrigger {
    #[default]
    Manual,
    Scheduled,
    Alert,
    Api,
}

impl CheckTrigger {
    pub const fn label(self) -> &'static str {
        match self {
            CheckTrigger::Manual => "manual",
            CheckTrigger::Scheduled => "scheduled",
            CheckTrigger::Alert => "alert",
            CheckTrigger::Api => "api",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Healthy,
    Warning,
    Critical,
    Unknown,
}

impl OverallStatus {
    pub fn from_score(score: f64) -> Self {
        if !score.is_finite() {
            OverallStatus::Unknown
        } else if score >= 80.0 {
            OverallStatus::Healthy
        } else if score >= 50.0 {
            OverallStatus::Warning
        } else {
            OverallStatus::Critical
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            OverallStatus::Healthy => "healthy",
            OverallStatus::Warning => "warning",
            OverallStatus::Critical => "critical",
            OverallStatus::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const fn label(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    pub fn from_label(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "critical" => Severity::Critical,
            "high" => Severity::High,
            "medium" => Severity::Medium,
            _ => Severity::Low,
        }
    }

    /// Actions are created only for these severities.
    pub const fn warrants_action(self) -> bool {
        matches!(self, Severity::Critical | Severity::High)
    }

    /// Remediation priority and due-date offset for an actionable issue.
    pub const fn action_terms(self) -> Option<(ActionPriority, i64)> {
        match self {
            Severity::Critical => Some((ActionPriority::Urgent, 3)),
            Severity::High => Some((ActionPriority::High, 7)),
            Severity::Medium | Severity::Low => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    PremiumDelinquent,
    LapseRisk,
    PaymentPattern,
    InsufficientFunds,
    CrummeyViolation,
    OwnershipIssue,
    Other,
}

impl IssueKind {
    pub const fn label(self) -> &'static str {
        match self {
            IssueKind::PremiumDelinquent => "premium_delinquent",
            IssueKind::LapseRisk => "lapse_risk",
            IssueKind::PaymentPattern => "payment_pattern",
            IssueKind::InsufficientFunds => "insufficient_funds",
            IssueKind::CrummeyViolation => "crummey_violation",
            IssueKind::OwnershipIssue => "ownership_issue",
            IssueKind::Other => "other",
        }
    }

    pub fn from_label(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "premium_delinquent" => IssueKind::PremiumDelinquent,
            "lapse_risk" => IssueKind::LapseRisk,
            "payment_pattern" => IssueKind::PaymentPattern,
            "insufficient_funds" => IssueKind::InsufficientFunds,
            "crummey_violation" => IssueKind::CrummeyViolation,
            "ownership_issue" => IssueKind::OwnershipIssue,
            _ => IssueKind::Other,
        }
    }

    pub const fn action_type(self) -> ActionType {
        match self {
            IssueKind::PremiumDelinquent => ActionType::PayPremium,
            IssueKind::InsufficientFunds => ActionType::FundTrust,
            IssueKind::CrummeyViolation => ActionType::ReviewCompliance,
            IssueKind::OwnershipIssue => ActionType::VerifyOwnership,
            IssueKind::LapseRisk | IssueKind::PaymentPattern | IssueKind::Other => {
                ActionType::Custom
            }
        }
    }
}

/// Where a finding came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingSource {
    Rules,
    Advisory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthIssue {
    pub kind: IssueKind,
    pub severity: Severity,
    pub description: String,
    pub requires_remediation: bool,
    pub source: FindingSource,
}

impl HealthIssue {
    pub(crate) fn rule(kind: IssueKind, severity: Severity, description: impl Into<String>) -> Self {
        Self {
            kind,
            severity,
            description: description.into(),
            requires_remediation: true,
            source: FindingSource::Rules,
        }
    }

    pub fn is_actionable(&self) -> bool {
        self.requires_remediation && self.severity.warrants_action()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendedAction {
    PayPremium,
    ContactTrustee,
    FundTrust,
    ReviewCompliance,
    VerifyOwnership,
    Other,
}

impl RecommendedAction {
    pub const fn label(self) -> &'static str {
        match self {
            RecommendedAction::PayPremium => "pay_premium",
            RecommendedAction::ContactTrustee => "contact_trustee",
            RecommendedAction::FundTrust => "fund_trust",
            RecommendedAction::ReviewCompliance => "review_compliance",
            RecommendedAction::VerifyOwnership => "verify_ownership",
            RecommendedAction::Other => "other",
        }
    }

    pub fn from_label(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "pay_premium" => RecommendedAction::PayPremium,
            "contact_trustee" => RecommendedAction::ContactTrustee,
            "fund_trust" => RecommendedAction::FundTrust,
            "review_compliance" => RecommendedAction::ReviewCompliance,
            "verify_ownership" => RecommendedAction::VerifyOwnership,
            _ => RecommendedAction::Other,
        }
    }

    /// Remediation action type this recommendation supports, if any.
    pub const fn action_type(self) -> Option<ActionType> {
        match self {
            RecommendedAction::PayPremium => Some(ActionType::PayPremium),
            RecommendedAction::FundTrust => Some(ActionType::FundTrust),
            RecommendedAction::ReviewCompliance => Some(ActionType::ReviewCompliance),
            RecommendedAction::VerifyOwnership => Some(ActionType::VerifyOwnership),
            RecommendedAction::ContactTrustee | RecommendedAction::Other => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub action: RecommendedAction,
    pub priority: ActionPriority,
    pub description: String,
    pub source: FindingSource,
}

impl Recommendation {
    pub(crate) fn rule(
        action: RecommendedAction,
        priority: ActionPriority,
        description: impl Into<String>,
    ) -> Self {
        Self {
            action,
            priority,
            description: description.into(),
            source: FindingSource::Rules,
        }
    }
}

pub const PREMIUM_WEIGHT: f64 = 0.40;
pub const COVERAGE_WEIGHT: f64 = 0.30;
pub const COMPLIANCE_WEIGHT: f64 = 0.30;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentScores {
    pub premium_payment: f64,
    pub coverage_adequacy: f64,
    pub compliance: f64,
}

impl ComponentScores {
    /// Weighted rule-based score before any advisory adjustment.
    pub fn weighted(&self) -> f64 {
        PREMIUM_WEIGHT * self.premium_payment
            + COVERAGE_WEIGHT * self.coverage_adequacy
            + COMPLIANCE_WEIGHT * self.compliance
    }
}

/// Immutable record of one health check run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCheck {
    pub id: HealthCheckId,
    pub policy_id: PolicyId,
    pub trust_id: TrustId,
    pub check_date: NaiveDate,
    pub checked_at: DateTime<Utc>,
    pub trigger: CheckTrigger,
    pub overall_status: OverallStatus,
    pub health_score: f64,
    /// Pure weighted rule score, stored for audit next to the hybrid score.
    pub rule_score: f64,
    pub component_scores: ComponentScores,
    pub issues: Vec<HealthIssue>,
    pub recommendations: Vec<Recommendation>,
    pub ai_summary: String,
    pub ai_confidence: f64,
    pub ai_model: String,
    pub remediation_required: bool,
    pub remediation_priority: ActionPriority,
}

/// Response returned to the caller of a health check run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthCheckSummary {
    pub health_check_id: HealthCheckId,
    pub policy_id: PolicyId,
    pub overall_status: OverallStatus,
    pub health_score: f64,
    pub rule_score: f64,
    pub component_scores: ComponentScores,
    pub issues_count: usize,
    pub remediation_actions_created: usize,
    pub notification_sent: bool,
    pub ai_confidence: f64,
}
