use std::sync::Arc;

pub(super) use crate::store::fixtures::*;
use crate::store::{MemoryStore, Repositories};
use crate::workflows::crummey::{
    CrummeyNotice, CrummeyService, DeadlineAlertService, NoticeRepository, NoticeState,
};

pub(super) const TRUST: &str = "trust-crummey";

/// Trust with two beneficiaries holding 60/40 withdrawal shares and one $20,000 gift.
pub(super) fn seed_trust(store: &MemoryStore) {
    store.insert_trust(trust(TRUST)).expect("trust");
    let mut first = beneficiary("ben-a", TRUST, "Ada Hargrove");
    first.share_percentage = Some(60.0);
    let mut second = beneficiary("ben-b", TRUST, "Ben Hargrove");
    second.share_percentage = Some(40.0);
    store.insert_beneficiary(first).expect("beneficiary");
    store.insert_beneficiary(second).expect("beneficiary");
    store
        .record_gift(gift("gift-c", TRUST, 20_000.0, date(2025, 3, 1)))
        .expect("gift");
}

pub(super) fn store_notice(store: &MemoryStore, notice: CrummeyNotice) {
    NoticeRepository::insert_batch(store, vec![notice]).expect("notice stored");
}

pub(super) fn stored(store: &MemoryStore, id: &str) -> CrummeyNotice {
    NoticeRepository::fetch(store, &crate::workflows::crummey::NoticeId::new(id))
        .expect("fetch succeeds")
        .expect("notice present")
}

pub(super) fn notice_service(
    repositories: &Repositories,
    mailer: Arc<RecordingMailer>,
) -> CrummeyService {
    CrummeyService::new(repositories, mailer)
}

pub(super) fn alert_service(
    repositories: &Repositories,
    mailer: Arc<RecordingMailer>,
) -> DeadlineAlertService {
    DeadlineAlertService::new(repositories, mailer)
}

pub(super) fn notice_state(repositories: &Repositories, mailer: Arc<RecordingMailer>) -> NoticeState {
    NoticeState {
        notices: notice_service(repositories, mailer.clone()),
        alerts: alert_service(repositories, mailer),
    }
}
