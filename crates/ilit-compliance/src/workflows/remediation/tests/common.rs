use std::sync::Arc;

pub(super) use crate::store::fixtures::*;
use crate::store::{MemoryStore, Repositories};
use crate::workflows::health::HealthCheckId;
use crate::workflows::portfolio::{PolicyId, TrustId};
use crate::workflows::remediation::{
    ActionId, ActionPriority, ActionStatus, ActionType, RemediationAction, RemediationRepository,
    RemediationService,
};

pub(super) const POLICY: &str = "pol-rem";

pub(super) fn action(id: &str, due_day: u32, status: ActionStatus) -> RemediationAction {
    RemediationAction {
        id: ActionId::new(id),
        health_check_id: HealthCheckId::new("hc-rem"),
        policy_id: PolicyId::new(POLICY),
        trust_id: TrustId::new("trust-rem"),
        action_type: ActionType::PayPremium,
        priority: ActionPriority::Urgent,
        title: "Policy is in grace period".to_string(),
        description: "Policy is in grace period. Immediate payment required to prevent lapse."
            .to_string(),
        due_date: date(2025, 6, due_day),
        status,
        assignment: None,
        completion: None,
        ai_suggested: false,
        recommendation_text: None,
        email_alert_sent: false,
        created_at: at(2025, 6, 1),
    }
}

/// Two open actions and one already completed.
pub(super) fn seeded() -> (Arc<MemoryStore>, Repositories) {
    let (store, repositories) = repositories();
    RemediationRepository::insert_batch(
        store.as_ref(),
        vec![
            action("act-open-1", 4, ActionStatus::Pending),
            action("act-open-2", 2, ActionStatus::InProgress),
            action("act-done", 3, ActionStatus::Completed),
        ],
    )
    .expect("actions stored");
    (store, repositories)
}

pub(super) fn service(repositories: &Repositories, mailer: Arc<RecordingMailer>) -> RemediationService {
    RemediationService::new(repositories, mailer)
}

pub(super) fn stored(store: &MemoryStore, id: &str) -> RemediationAction {
    RemediationRepository::fetch(store, &ActionId::new(id))
        .expect("fetch succeeds")
        .expect("action present")
}
