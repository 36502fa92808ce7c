use crate::workflows::health::domain::{
    ComponentScores, HealthIssue, IssueKind, Recommendation, RecommendedAction, Severity,
};
use crate::workflows::health::snapshot::PolicySnapshot;
use crate::workflows::portfolio::PolicyStatus;
use crate::workflows::remediation::domain::ActionPriority;

const CRITICAL_OVERDUE_DAYS: i64 = 30;
const HIGH_OVERDUE_DAYS: i64 = 15;
const PATTERN_LATE_DAYS: i64 = 15;
const FULL_COMPLIANCE_RATE: f64 = 0.95;
const MINIMUM_COMPLIANCE_RATE: f64 = 0.80;

/// Deterministic findings for one snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleAssessment {
    pub scores: ComponentScores,
    pub issues: Vec<HealthIssue>,
    pub recommendations: Vec<Recommendation>,
}

pub fn assess(snapshot: &PolicySnapshot) -> RuleAssessment {
    let mut issues = Vec::new();
    let mut recommendations = Vec::new();

    let premium_payment = premium_score(snapshot, &mut issues, &mut recommendations);
    let coverage_adequacy = coverage_score(snapshot, &mut issues, &mut recommendations);
    let compliance = compliance_score(snapshot, &mut issues, &mut recommendations);

    RuleAssessment {
        scores: ComponentScores {
            premium_payment,
            coverage_adequacy,
            compliance,
        },
        issues,
        recommendations,
    }
}

fn premium_score(
    snapshot: &PolicySnapshot,
    issues: &mut Vec<HealthIssue>,
    recommendations: &mut Vec<Recommendation>,
) -> f64 {
    match snapshot.policy.status {
        PolicyStatus::GracePeriod => {
            issues.push(HealthIssue::rule(
                IssueKind::PremiumDelinquent,
                Severity::Critical,
                "Policy is in grace period. Immediate payment required to prevent lapse.",
            ));
            recommendations.push(Recommendation::rule(
                RecommendedAction::PayPremium,
                ActionPriority::Urgent,
                "Pay overdue premium immediately to prevent policy lapse",
            ));
            20.0
        }
        PolicyStatus::Lapsed => {
            issues.push(HealthIssue::rule(
                IssueKind::LapseRisk,
                Severity::Critical,
                "Policy has lapsed. Reinstatement may be required.",
            ));
            0.0
        }
        PolicyStatus::Active => {
            let mut score = 100.0;

            if let Some(upcoming) = snapshot.upcoming_premium {
                let days_overdue = -upcoming.days_until_due(snapshot.as_of);
                if days_overdue > CRITICAL_OVERDUE_DAYS {
                    score = 30.0;
                    issues.push(HealthIssue::rule(
                        IssueKind::PremiumDelinquent,
                        Severity::Critical,
                        format!("Premium is {days_overdue} days overdue"),
                    ));
                } else if days_overdue > HIGH_OVERDUE_DAYS {
                    score = 60.0;
                    issues.push(HealthIssue::rule(
                        IssueKind::PremiumDelinquent,
                        Severity::High,
                        format!("Premium is {days_overdue} days overdue"),
                    ));
                }
            }

            if is_deteriorating(snapshot) {
                score = f64::min(score, 70.0);
                issues.push(HealthIssue {
                    requires_remediation: false,
                    ..HealthIssue::rule(
                        IssueKind::PaymentPattern,
                        Severity::Medium,
                        "Payment pattern showing increasing delays",
                    )
                });
                recommendations.push(Recommendation::rule(
                    RecommendedAction::ContactTrustee,
                    ActionPriority::Medium,
                    "Discuss payment timing with trustee to prevent future delays",
                ));
            }

            score
        }
    }
}

/// Three most recent payments are strictly later against their due dates, newest worst.
fn is_deteriorating(snapshot: &PolicySnapshot) -> bool {
    let offsets: Vec<i64> = snapshot
        .payments
        .iter()
        .take(3)
        .map(|payment| payment.days_late())
        .collect();

    match offsets.as_slice() {
        [latest, middle, oldest] => {
            latest > middle && middle > oldest && *latest > PATTERN_LATE_DAYS
        }
        _ => false,
    }
}

fn coverage_score(
    snapshot: &PolicySnapshot,
    issues: &mut Vec<HealthIssue>,
    recommendations: &mut Vec<Recommendation>,
) -> f64 {
    let annual_premium = snapshot.policy.annual_premium;
    if annual_premium <= 0.0 {
        return 100.0;
    }

    let assets = snapshot.trust_assets;
    let runway_years = assets / annual_premium;

    if runway_years < 1.0 {
        issues.push(HealthIssue::rule(
            IssueKind::InsufficientFunds,
            Severity::Critical,
            format!(
                "Trust assets ({}) insufficient to cover next premium ({})",
                whole_dollars(assets),
                whole_dollars(annual_premium)
            ),
        ));
        let shortfall = (annual_premium - assets).ceil();
        recommendations.push(Recommendation::rule(
            RecommendedAction::FundTrust,
            ActionPriority::Urgent,
            format!(
                "Trust needs immediate funding of at least {}",
                whole_dollars(shortfall)
            ),
        ));
        30.0
    } else if runway_years < 2.0 {
        issues.push(HealthIssue::rule(
            IssueKind::InsufficientFunds,
            Severity::High,
            format!("Limited funding runway: {runway_years:.1} years"),
        ));
        recommendations.push(Recommendation::rule(
            RecommendedAction::FundTrust,
            ActionPriority::High,
            "Plan trust funding to ensure 3+ years of premium coverage",
        ));
        65.0
    } else if runway_years < 3.0 {
        recommendations.push(Recommendation::rule(
            RecommendedAction::FundTrust,
            ActionPriority::Medium,
            "Consider additional trust funding for long-term sustainability",
        ));
        85.0
    } else {
        100.0
    }
}

fn compliance_score(
    snapshot: &PolicySnapshot,
    issues: &mut Vec<HealthIssue>,
    recommendations: &mut Vec<Recommendation>,
) -> f64 {
    let mut score = 100.0;

    let required = snapshot.beneficiaries.len() * snapshot.payments.len();
    if required > 0 {
        let delivered = snapshot.delivered_notice_count();
        let rate = delivered as f64 / required as f64;
        let percent = (rate * 100.0).round();

        if rate < MINIMUM_COMPLIANCE_RATE {
            score = 40.0;
            issues.push(HealthIssue::rule(
                IssueKind::CrummeyViolation,
                Severity::Critical,
                format!(
                    "Only {percent}% Crummey notice compliance ({delivered}/{required}). \
                     IRS gift tax issues may arise."
                ),
            ));
            recommendations.push(Recommendation::rule(
                RecommendedAction::ReviewCompliance,
                ActionPriority::Urgent,
                "Send missing Crummey notices and consult tax advisor about potential gift tax implications",
            ));
        } else if rate < FULL_COMPLIANCE_RATE {
            score = 75.0;
            issues.push(HealthIssue::rule(
                IssueKind::CrummeyViolation,
                Severity::Medium,
                format!("{percent}% Crummey notice compliance"),
            ));
        }
    }

    if !snapshot.policy.owner_indicates_trust() {
        score = f64::min(score, 50.0);
        let owner = snapshot.policy.owner.as_deref().unwrap_or_default();
        issues.push(HealthIssue::rule(
            IssueKind::OwnershipIssue,
            Severity::Critical,
            format!("Policy owner \"{owner}\" may not match trust structure"),
        ));
        recommendations.push(Recommendation::rule(
            RecommendedAction::VerifyOwnership,
            ActionPriority::Urgent,
            "Verify policy ownership matches ILIT structure to avoid estate tax issues",
        ));
    }

    score
}

fn whole_dollars(amount: f64) -> String {
    let formatted = crate::notifications::templates::currency(amount.round());
    formatted.trim_end_matches(".00").to_string()
}
