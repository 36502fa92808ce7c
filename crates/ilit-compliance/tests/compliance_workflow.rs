use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use ilit_compliance::notifications::{DeliveryReceipt, EmailMessage, MailError, Mailer};
use ilit_compliance::store::{MemoryStore, Repositories};
use ilit_compliance::workflows::crummey::{CrummeyService, NoticeStatus};
use ilit_compliance::workflows::gifts::{GiftFilter, GiftReportService};
use ilit_compliance::workflows::health::{
    CheckTrigger, DisabledAdvisor, HealthCheckService, HealthCheckSettings, OverallStatus,
};
use ilit_compliance::workflows::portfolio::{
    Beneficiary, BeneficiaryId, Gift, GiftId, Policy, PolicyId, PolicyStatus, PremiumFrequency,
    Trust, TrustId, TrustStatus,
};
use ilit_compliance::workflows::remediation::{ActionStatus, ActionType, RemediationService};

const TRUST: &str = "trust-ashford";
const POLICY: &str = "pol-ashford";

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

#[derive(Default)]
struct Outbox {
    sent: Mutex<Vec<EmailMessage>>,
}

impl Outbox {
    fn subjects(&self) -> Vec<String> {
        self.sent
            .lock()
            .expect("outbox mutex poisoned")
            .iter()
            .map(|message| message.subject.clone())
            .collect()
    }
}

#[async_trait]
impl Mailer for Outbox {
    async fn send(&self, message: EmailMessage) -> Result<DeliveryReceipt, MailError> {
        let mut sent = self.sent.lock().expect("outbox mutex poisoned");
        sent.push(message);
        Ok(DeliveryReceipt {
            provider_id: format!("outbox-{}", sent.len()),
        })
    }
}

fn seeded_store() -> (Arc<MemoryStore>, Repositories) {
    let store = Arc::new(MemoryStore::new());
    store
        .insert_trust(Trust {
            id: TrustId::new(TRUST),
            name: "Ashford Irrevocable Trust".to_string(),
            grantor_name: "Helen Ashford".to_string(),
            trustee_name: "Daniel Ruiz".to_string(),
            trustee_email: Some("daniel.ruiz@ashford-trust.example".to_string()),
            status: TrustStatus::Active,
        })
        .expect("trust stored");
    store
        .insert_policy(Policy {
            id: PolicyId::new(POLICY),
            trust_id: TrustId::new(TRUST),
            carrier: "Meridian Mutual".to_string(),
            policy_number: "MM-884120".to_string(),
            insured_name: Some("Helen Ashford".to_string()),
            owner: Some("Ashford Irrevocable Trust".to_string()),
            death_benefit: Some(5_000_000.0),
            annual_premium: 30_000.0,
            premium_frequency: PremiumFrequency::Annual,
            status: PolicyStatus::GracePeriod,
            next_premium_due: Some(date(2025, 5, 20)),
        })
        .expect("policy stored");
    for (id, name) in [("ben-clara", "Clara Ashford"), ("ben-owen", "Owen Ashford")] {
        store
            .insert_beneficiary(Beneficiary {
                id: BeneficiaryId::new(id),
                trust_id: TrustId::new(TRUST),
                name: name.to_string(),
                email: Some(format!("{id}@ashford.example")),
                relationship: Some("grandchild".to_string()),
                share_percentage: None,
            })
            .expect("beneficiary stored");
    }
    store
        .record_gift(Gift {
            id: GiftId::new("gift-2025-annual"),
            trust_id: TrustId::new(TRUST),
            donor_name: "Helen Ashford".to_string(),
            donor_email: Some("helen@ashford.example".to_string()),
            beneficiary_id: None,
            amount: 24_000.0,
            gift_date: date(2025, 5, 1),
        })
        .expect("gift stored");

    let repositories = Repositories::from_store(store.clone());
    (store, repositories)
}

#[tokio::test]
async fn gift_to_remediation_round_trip() {
    let (_store, repositories) = seeded_store();
    let outbox = Arc::new(Outbox::default());

    // Crummey notices: one per beneficiary, equal split, 30-day window.
    let notices = CrummeyService::new(&repositories, outbox.clone());
    let issued = notices
        .issue_for_gift(&GiftId::new("gift-2025-annual"), date(2025, 5, 1))
        .expect("notices issued");
    assert_eq!(issued.len(), 2);
    assert!(issued
        .iter()
        .all(|notice| notice.withdrawal_amount == 12_000.0
            && notice.withdrawal_deadline == date(2025, 5, 31)));

    for notice in &issued {
        let dispatch = notices
            .send(&notice.id, at(2025, 5, 2))
            .await
            .expect("notice sent");
        assert!(dispatch.delivered);
    }
    notices
        .record_exercise(&issued[0].id, at(2025, 5, 10))
        .expect("exercise recorded");

    // Health check: grace period plus under one year of premium runway.
    let health = HealthCheckService::new(
        &repositories,
        Arc::new(DisabledAdvisor),
        outbox.clone(),
        HealthCheckSettings::default(),
    );
    let summary = health
        .run(POLICY, CheckTrigger::Manual, at(2025, 6, 1))
        .await
        .expect("health check runs");
    assert_eq!(summary.overall_status, OverallStatus::Critical);
    assert_eq!(summary.ai_confidence, 0.0);
    assert_eq!(summary.remediation_actions_created, 2);
    assert!(summary.notification_sent);

    let latest = health
        .latest(&PolicyId::new(POLICY))
        .expect("latest check stored");
    assert_eq!(latest.id, summary.health_check_id);

    // Remediation: complete every open action in one batch.
    let remediation = RemediationService::new(&repositories, outbox.clone());
    let open = remediation
        .open_for_policy(&PolicyId::new(POLICY))
        .expect("open actions listed");
    assert_eq!(open.len(), summary.remediation_actions_created);
    assert!(open
        .iter()
        .any(|action| action.action_type == ActionType::PayPremium));

    let ids: Vec<_> = open.iter().map(|action| action.id.clone()).collect();
    let completed = remediation
        .complete(
            &ids,
            "Premium paid by wire on June 2; carrier confirmed reinstatement.",
            Some("Daniel Ruiz".to_string()),
            at(2025, 6, 2),
        )
        .expect("batch completed");
    assert!(completed
        .iter()
        .all(|action| action.status == ActionStatus::Completed));
    assert!(remediation
        .open_for_policy(&PolicyId::new(POLICY))
        .expect("open actions listed")
        .is_empty());

    // Expiry sweep: the exercised notice stays put, the other lapses.
    let sweep = notices
        .expire_overdue(date(2025, 6, 2), at(2025, 6, 2))
        .expect("sweep runs");
    assert_eq!(sweep.total_expired, 1);
    assert_eq!(sweep.expired_notice_ids, vec![issued[1].id.clone()]);

    // Gift tax: the undesignated gift exceeds the 2025 exclusion.
    let report = GiftReportService::new(&repositories)
        .summary(
            &GiftFilter {
                year: Some(2025),
                ..GiftFilter::default()
            },
            date(2025, 6, 2),
        )
        .expect("gift summary");
    assert_eq!(report.summary.len(), 1);
    assert_eq!(report.summary[0].excess_amount, 5_000.0);
    assert!(report.summary[0].requires_form_709);

    let subjects = outbox.subjects();
    assert!(subjects
        .iter()
        .any(|subject| subject.starts_with("[CRITICAL] Policy Health Alert")));
    assert_eq!(
        subjects
            .iter()
            .filter(|subject| subject.contains("Crummey"))
            .count(),
        2
    );
}

#[tokio::test]
async fn exercised_notice_is_not_marked_as_still_sent() {
    let (_store, repositories) = seeded_store();
    let notices = CrummeyService::new(&repositories, Arc::new(Outbox::default()));
    let issued = notices
        .issue_for_gift(&GiftId::new("gift-2025-annual"), date(2025, 5, 1))
        .expect("notices issued");

    let premature = notices
        .record_exercise(&issued[0].id, at(2025, 5, 3))
        .expect_err("pending notice cannot be exercised");
    assert!(premature.to_string().contains(NoticeStatus::Pending.label()));
}
