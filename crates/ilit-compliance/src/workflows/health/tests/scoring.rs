use super::common::*;
use crate::workflows::health::domain::{ComponentScores, IssueKind, OverallStatus, Severity};
use crate::workflows::health::scoring::{assess, combine};
use crate::store::MemoryStore;
use crate::workflows::crummey::NoticeStatus;
use crate::workflows::portfolio::PolicyStatus;

#[test]
fn critical_portfolio_scores_twenty_nine() {
    let store = MemoryStore::new();
    seed_critical(&store);

    let snapshot = snapshot(&store, CRITICAL_POLICY);
    assert_eq!(snapshot.trust_assets, 5_000.0);
    assert_eq!(snapshot.payments.len(), 5);
    assert_eq!(snapshot.delivered_notice_count(), 3);

    let assessment = assess(&snapshot);
    assert_eq!(
        assessment.scores,
        ComponentScores {
            premium_payment: 20.0,
            coverage_adequacy: 30.0,
            compliance: 40.0,
        }
    );

    let hybrid = combine(&assessment.scores, 0.5);
    assert_eq!(hybrid.rule_score, 29.0);
    assert_eq!(hybrid.health_score, 29.0);
    assert_eq!(hybrid.overall_status, OverallStatus::Critical);

    for kind in [
        IssueKind::PremiumDelinquent,
        IssueKind::InsufficientFunds,
        IssueKind::CrummeyViolation,
    ] {
        assert!(
            assessment
                .issues
                .iter()
                .any(|issue| issue.kind == kind && issue.severity == Severity::Critical),
            "missing critical {kind:?}"
        );
    }
}

#[test]
fn insufficient_funds_reports_whole_dollar_amounts() {
    let store = MemoryStore::new();
    seed_critical(&store);

    let assessment = assess(&snapshot(&store, CRITICAL_POLICY));
    let funding = assessment
        .issues
        .iter()
        .find(|issue| issue.kind == IssueKind::InsufficientFunds)
        .expect("funding issue");
    assert_eq!(
        funding.description,
        "Trust assets ($5,000) insufficient to cover next premium ($10,000)"
    );
    assert!(assessment
        .recommendations
        .iter()
        .any(|rec| rec.description == "Trust needs immediate funding of at least $5,000"));
}

#[test]
fn healthy_portfolio_has_no_findings() {
    let store = MemoryStore::new();
    seed_healthy(&store);

    let assessment = assess(&snapshot(&store, HEALTHY_POLICY));
    assert!(assessment.issues.is_empty(), "{:?}", assessment.issues);
    assert_eq!(assessment.scores.weighted(), 100.0);
}

#[test]
fn lapsed_policy_scores_zero_premium_with_lapse_risk() {
    let store = MemoryStore::new();
    seed_healthy(&store);
    let mut snapshot = snapshot(&store, HEALTHY_POLICY);
    snapshot.policy.status = PolicyStatus::Lapsed;

    let assessment = assess(&snapshot);
    assert_eq!(assessment.scores.premium_payment, 0.0);
    assert!(assessment
        .issues
        .iter()
        .any(|issue| issue.kind == IssueKind::LapseRisk && issue.severity == Severity::Critical));
}

#[test]
fn overdue_premium_thresholds() {
    let store = MemoryStore::new();
    seed_healthy(&store);
    let mut snapshot = snapshot(&store, HEALTHY_POLICY);

    snapshot.policy.next_premium_due = Some(date(2025, 5, 20));
    snapshot.upcoming_premium = snapshot.policy.upcoming_premium();
    let assessment = assess(&snapshot);
    assert_eq!(assessment.scores.premium_payment, 100.0);

    snapshot.policy.next_premium_due = Some(date(2025, 5, 10));
    snapshot.upcoming_premium = snapshot.policy.upcoming_premium();
    let assessment = assess(&snapshot);
    assert_eq!(assessment.scores.premium_payment, 60.0);

    snapshot.policy.next_premium_due = Some(date(2025, 4, 1));
    snapshot.upcoming_premium = snapshot.policy.upcoming_premium();
    let assessment = assess(&snapshot);
    assert_eq!(assessment.scores.premium_payment, 30.0);
    assert_eq!(assessment.issues[0].description, "Premium is 61 days overdue");
}

#[test]
fn worsening_payment_delays_cap_premium_score() {
    let store = MemoryStore::new();
    seed_healthy(&store);
    let mut snapshot = snapshot(&store, HEALTHY_POLICY);
    snapshot.payments = vec![
        payment("p3", HEALTHY_POLICY, 1_000.0, date(2025, 4, 21), date(2025, 4, 1)),
        payment("p2", HEALTHY_POLICY, 1_000.0, date(2025, 3, 11), date(2025, 3, 1)),
        payment("p1", HEALTHY_POLICY, 1_000.0, date(2025, 2, 3), date(2025, 2, 1)),
    ];

    let assessment = assess(&snapshot);
    assert_eq!(assessment.scores.premium_payment, 70.0);
    let pattern = assessment
        .issues
        .iter()
        .find(|issue| issue.kind == IssueKind::PaymentPattern)
        .expect("pattern issue");
    assert_eq!(pattern.severity, Severity::Medium);
    assert!(!pattern.requires_remediation);
}

#[test]
fn medium_compliance_gap_and_runway_bands() {
    let store = MemoryStore::new();
    seed_healthy(&store);
    let mut snapshot = snapshot(&store, HEALTHY_POLICY);

    // ten required notices, nine delivered
    snapshot.payments = (0..10)
        .map(|i| {
            let day = date(2025, 1, 1);
            payment(&format!("p{i}"), HEALTHY_POLICY, 100.0, day, day)
        })
        .collect();
    snapshot.notices = (0..10)
        .map(|i| {
            let status = if i == 0 {
                NoticeStatus::Failed
            } else {
                NoticeStatus::Sent
            };
            notice(
                &format!("n{i}"),
                HEALTHY_TRUST,
                "ben-ok",
                date(2025, 1, 2),
                date(2025, 2, 1),
                status,
            )
        })
        .collect();
    snapshot.trust_assets = 15_000.0;

    let assessment = assess(&snapshot);
    assert_eq!(assessment.scores.compliance, 75.0);
    assert_eq!(assessment.scores.coverage_adequacy, 65.0);
    assert!(assessment
        .issues
        .iter()
        .any(|issue| issue.description == "90% Crummey notice compliance"));
    assert!(assessment
        .issues
        .iter()
        .any(|issue| issue.description == "Limited funding runway: 1.5 years"));
}

#[test]
fn owner_outside_trust_is_critical() {
    let store = MemoryStore::new();
    seed_healthy(&store);
    let mut snapshot = snapshot(&store, HEALTHY_POLICY);
    snapshot.policy.owner = Some("Eleanor Hargrove".to_string());

    let assessment = assess(&snapshot);
    assert_eq!(assessment.scores.compliance, 50.0);
    let ownership = assessment
        .issues
        .iter()
        .find(|issue| issue.kind == IssueKind::OwnershipIssue)
        .expect("ownership issue");
    assert_eq!(ownership.severity, Severity::Critical);
}

#[test]
fn individual_trustee_as_owner_is_flagged() {
    let store = MemoryStore::new();
    seed_healthy(&store);
    let mut snapshot = snapshot(&store, HEALTHY_POLICY);
    snapshot.policy.owner = Some("Trustee John Smith".to_string());

    let assessment = assess(&snapshot);
    assert_eq!(assessment.scores.compliance, 50.0);
    assert!(assessment
        .issues
        .iter()
        .any(|issue| issue.kind == IssueKind::OwnershipIssue));
}

#[test]
fn hybrid_adjustment_stays_within_three_points() {
    let components = [
        (20.0, 30.0, 40.0),
        (100.0, 100.0, 100.0),
        (0.0, 0.0, 0.0),
        (70.0, 85.0, 75.0),
    ];
    for (premium_payment, coverage_adequacy, compliance) in components {
        let scores = ComponentScores {
            premium_payment,
            coverage_adequacy,
            compliance,
        };
        for step in 0..=20 {
            let confidence = f64::from(step) / 20.0;
            let hybrid = combine(&scores, confidence);
            assert!(
                (hybrid.health_score - hybrid.rule_score).abs() <= 3.0 + 1e-9,
                "confidence {confidence} moved {scores:?} too far"
            );
            assert!((0.0..=100.0).contains(&hybrid.health_score));
            assert_eq!(hybrid.overall_status, OverallStatus::from_score(hybrid.health_score));
        }
    }

    let scores = ComponentScores {
        premium_payment: 60.0,
        coverage_adequacy: 65.0,
        compliance: 75.0,
    };
    assert_eq!(combine(&scores, 0.5).health_score, 66.0);
    assert_eq!(combine(&scores, 0.0).health_score, 63.0);
    assert_eq!(combine(&scores, 1.0).health_score, 69.0);
    assert_eq!(combine(&scores, f64::NAN).health_score, 63.0);
}
