use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;

pub(super) use crate::store::fixtures::*;
use crate::store::{MemoryStore, Repositories};
use crate::workflows::crummey::NoticeStatus;
use crate::workflows::health::advisory::{AdvisoryError, AdvisoryFindings, PolicyAdvisor};
use crate::workflows::health::domain::{
    ComponentScores, FindingSource, HealthCheck, HealthIssue, IssueKind, Severity,
};
use crate::workflows::health::repository::HealthCheckRepository;
use crate::workflows::health::service::{HealthCheckService, HealthCheckSettings};
use crate::workflows::health::snapshot::PolicySnapshot;
use crate::workflows::portfolio::{PolicyId, PolicyStatus, RepositoryError};

pub(super) const CRITICAL_POLICY: &str = "pol-crit";
pub(super) const CRITICAL_TRUST: &str = "trust-crit";
pub(super) const HEALTHY_POLICY: &str = "pol-ok";
pub(super) const HEALTHY_TRUST: &str = "trust-ok";

pub(super) fn as_of() -> NaiveDate {
    date(2025, 6, 1)
}

/// Grace period, half a year of funding, and three of five required notices delivered.
pub(super) fn seed_critical(store: &MemoryStore) {
    let mut policy = policy(CRITICAL_POLICY, CRITICAL_TRUST);
    policy.status = PolicyStatus::GracePeriod;
    policy.next_premium_due = Some(date(2025, 5, 20));

    store.insert_trust(trust(CRITICAL_TRUST)).expect("trust");
    store.insert_policy(policy).expect("policy");
    store
        .insert_beneficiary(beneficiary("ben-crit", CRITICAL_TRUST, "Ada Hargrove"))
        .expect("beneficiary");
    store
        .record_gift(gift("gift-crit", CRITICAL_TRUST, 10_000.0, date(2024, 7, 1)))
        .expect("gift");

    let paid_on = [
        date(2024, 8, 1),
        date(2024, 10, 1),
        date(2024, 12, 1),
        date(2025, 2, 1),
        date(2025, 4, 1),
    ];
    for (index, paid) in paid_on.into_iter().enumerate() {
        store
            .record_payment(payment(
                &format!("pay-crit-{index}"),
                CRITICAL_POLICY,
                1_000.0,
                paid,
                paid,
            ))
            .expect("payment");
    }

    let notices = (0..3)
        .map(|index| {
            notice(
                &format!("ntc-crit-{index}"),
                CRITICAL_TRUST,
                "ben-crit",
                date(2024, 9 + index, 1),
                date(2024, 10 + index, 1),
                NoticeStatus::Sent,
            )
        })
        .collect();
    crate::workflows::crummey::NoticeRepository::insert_batch(store, notices).expect("notices");
}

/// Active, fully funded, and every required notice delivered.
pub(super) fn seed_healthy(store: &MemoryStore) {
    store.insert_trust(trust(HEALTHY_TRUST)).expect("trust");
    store
        .insert_policy(policy(HEALTHY_POLICY, HEALTHY_TRUST))
        .expect("policy");
    store
        .insert_beneficiary(beneficiary("ben-ok", HEALTHY_TRUST, "Theo Hargrove"))
        .expect("beneficiary");
    store
        .record_gift(gift("gift-ok", HEALTHY_TRUST, 50_000.0, date(2024, 1, 15)))
        .expect("gift");
    store
        .record_payment(payment(
            "pay-ok",
            HEALTHY_POLICY,
            10_000.0,
            date(2025, 1, 10),
            date(2025, 1, 15),
        ))
        .expect("payment");
    crate::workflows::crummey::NoticeRepository::insert_batch(
        store,
        vec![notice(
            "ntc-ok",
            HEALTHY_TRUST,
            "ben-ok",
            date(2025, 1, 20),
            date(2025, 2, 19),
            NoticeStatus::Sent,
        )],
    )
    .expect("notice");
}

pub(super) fn snapshot(store: &MemoryStore, policy_id: &str) -> PolicySnapshot {
    PolicySnapshot::assemble(store, store, &PolicyId::new(policy_id), as_of())
        .expect("snapshot assembles")
}

pub(super) fn service_with(
    repositories: &Repositories,
    advisor: Arc<dyn PolicyAdvisor>,
    mailer: Arc<RecordingMailer>,
) -> HealthCheckService {
    HealthCheckService::new(
        repositories,
        advisor,
        mailer,
        HealthCheckSettings {
            advisory_timeout: Duration::from_millis(200),
            ..HealthCheckSettings::default()
        },
    )
}

/// Advisor double returning a fixed confidence and optional extra findings.
pub(super) struct FixedAdvisor {
    pub(super) confidence: f64,
    pub(super) issues: Vec<HealthIssue>,
}

impl FixedAdvisor {
    pub(super) fn neutral() -> Arc<Self> {
        Arc::new(Self {
            confidence: 0.5,
            issues: Vec::new(),
        })
    }

    pub(super) fn with_confidence(confidence: f64) -> Arc<Self> {
        Arc::new(Self {
            confidence,
            issues: Vec::new(),
        })
    }

    pub(super) fn flagging_ownership() -> Arc<Self> {
        Arc::new(Self {
            confidence: 0.9,
            issues: vec![HealthIssue {
                kind: IssueKind::OwnershipIssue,
                severity: Severity::High,
                description: "Ownership change form predates trust formation".to_string(),
                requires_remediation: true,
                source: FindingSource::Advisory,
            }],
        })
    }
}

#[async_trait]
impl PolicyAdvisor for FixedAdvisor {
    fn model(&self) -> &str {
        "fixed-test-model"
    }

    async fn analyze(
        &self,
        _snapshot: &PolicySnapshot,
        _scores: &ComponentScores,
    ) -> Result<AdvisoryFindings, AdvisoryError> {
        Ok(AdvisoryFindings {
            summary: "Policy reviewed".to_string(),
            confidence: self.confidence,
            issues: self.issues.clone(),
            recommendations: Vec::new(),
        })
    }
}

pub(super) struct FailingAdvisor;

#[async_trait]
impl PolicyAdvisor for FailingAdvisor {
    fn model(&self) -> &str {
        "failing-test-model"
    }

    async fn analyze(
        &self,
        _snapshot: &PolicySnapshot,
        _scores: &ComponentScores,
    ) -> Result<AdvisoryFindings, AdvisoryError> {
        Err(AdvisoryError::Status {
            status: 503,
            body: "overloaded".to_string(),
        })
    }
}

pub(super) struct StalledAdvisor;

#[async_trait]
impl PolicyAdvisor for StalledAdvisor {
    fn model(&self) -> &str {
        "stalled-test-model"
    }

    async fn analyze(
        &self,
        _snapshot: &PolicySnapshot,
        _scores: &ComponentScores,
    ) -> Result<AdvisoryFindings, AdvisoryError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Err(AdvisoryError::Disabled)
    }
}

/// Health check storage that rejects every write.
pub(super) struct UnavailableChecks;

impl HealthCheckRepository for UnavailableChecks {
    fn insert(&self, _check: HealthCheck) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("disk full".to_string()))
    }

    fn latest_for_policy(
        &self,
        _policy_id: &PolicyId,
    ) -> Result<Option<HealthCheck>, RepositoryError> {
        Ok(None)
    }
}
