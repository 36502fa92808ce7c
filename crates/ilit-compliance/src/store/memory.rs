use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, NaiveDate, Utc};

use crate::notifications::{
    LogEntry, LogEntryId, NotificationKind, NotificationLog, NotificationOutcome,
};
use crate::workflows::crummey::{CrummeyNotice, NoticeId, NoticeRepository, NoticeStatus};
use crate::workflows::health::{HealthCheck, HealthCheckRepository};
use crate::workflows::portfolio::{
    Beneficiary, BeneficiaryId, Gift, GiftId, Policy, PolicyId, PolicyStatus, PortfolioRepository,
    PremiumPayment, RepositoryError, Trust, TrustId, TrustStatus,
};
use crate::workflows::remediation::{
    ActionId, ActionStatus, BatchCompletion, Completion, RemediationAction, RemediationRepository,
};

/// Process-local store implementing every repository contract behind a single lock.
///
/// Holding one lock for each call makes compare-and-set transitions, batch completion, and
/// the notification dedup key atomic with respect to concurrent sweeps.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
}

#[derive(Default)]
struct StoreState {
    policies: BTreeMap<PolicyId, Policy>,
    trusts: BTreeMap<TrustId, Trust>,
    beneficiaries: BTreeMap<BeneficiaryId, Beneficiary>,
    payments: Vec<PremiumPayment>,
    gifts: BTreeMap<GiftId, Gift>,
    notices: BTreeMap<NoticeId, CrummeyNotice>,
    health_checks: Vec<HealthCheck>,
    latest_checks: HashMap<PolicyId, usize>,
    actions: BTreeMap<ActionId, RemediationAction>,
    log: Vec<LogEntry>,
    dedup_keys: HashSet<(NoticeId, NotificationKind)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, StoreState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("memory store lock poisoned".to_string()))
    }

    pub fn insert_trust(&self, trust: Trust) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        insert_unique(&mut state.trusts, trust.id.clone(), trust)
    }

    pub fn insert_policy(&self, policy: Policy) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        insert_unique(&mut state.policies, policy.id.clone(), policy)
    }

    pub fn insert_beneficiary(&self, beneficiary: Beneficiary) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        insert_unique(&mut state.beneficiaries, beneficiary.id.clone(), beneficiary)
    }

    pub fn record_gift(&self, gift: Gift) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        insert_unique(&mut state.gifts, gift.id.clone(), gift)
    }

    pub fn record_payment(&self, payment: PremiumPayment) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        if state.payments.iter().any(|existing| existing.id == payment.id) {
            return Err(RepositoryError::Conflict);
        }
        state.payments.push(payment);
        Ok(())
    }

    /// Every notification log entry in insertion order.
    pub fn log_entries(&self) -> Result<Vec<LogEntry>, RepositoryError> {
        Ok(self.state()?.log.clone())
    }
}

fn insert_unique<K: Ord, V>(
    map: &mut BTreeMap<K, V>,
    key: K,
    value: V,
) -> Result<(), RepositoryError> {
    if map.contains_key(&key) {
        return Err(RepositoryError::Conflict);
    }
    map.insert(key, value);
    Ok(())
}

impl PortfolioRepository for MemoryStore {
    fn policy(&self, id: &PolicyId) -> Result<Option<Policy>, RepositoryError> {
        Ok(self.state()?.policies.get(id).cloned())
    }

    fn trust(&self, id: &TrustId) -> Result<Option<Trust>, RepositoryError> {
        Ok(self.state()?.trusts.get(id).cloned())
    }

    fn beneficiaries(&self, trust_id: &TrustId) -> Result<Vec<Beneficiary>, RepositoryError> {
        Ok(self
            .state()?
            .beneficiaries
            .values()
            .filter(|beneficiary| &beneficiary.trust_id == trust_id)
            .cloned()
            .collect())
    }

    fn beneficiary(&self, id: &BeneficiaryId) -> Result<Option<Beneficiary>, RepositoryError> {
        Ok(self.state()?.beneficiaries.get(id).cloned())
    }

    fn payments_since(
        &self,
        policy_id: &PolicyId,
        since: NaiveDate,
    ) -> Result<Vec<PremiumPayment>, RepositoryError> {
        let mut payments: Vec<PremiumPayment> = self
            .state()?
            .payments
            .iter()
            .filter(|payment| &payment.policy_id == policy_id && payment.payment_date >= since)
            .cloned()
            .collect();
        payments.sort_by(|a, b| b.payment_date.cmp(&a.payment_date));
        Ok(payments)
    }

    fn trust_payments(&self, trust_id: &TrustId) -> Result<Vec<PremiumPayment>, RepositoryError> {
        let state = self.state()?;
        let policy_ids: HashSet<&PolicyId> = state
            .policies
            .values()
            .filter(|policy| &policy.trust_id == trust_id)
            .map(|policy| &policy.id)
            .collect();
        Ok(state
            .payments
            .iter()
            .filter(|payment| policy_ids.contains(&payment.policy_id))
            .cloned()
            .collect())
    }

    fn policies_for_trust(&self, trust_id: &TrustId) -> Result<Vec<Policy>, RepositoryError> {
        Ok(self
            .state()?
            .policies
            .values()
            .filter(|policy| &policy.trust_id == trust_id)
            .cloned()
            .collect())
    }

    fn gift(&self, id: &GiftId) -> Result<Option<Gift>, RepositoryError> {
        Ok(self.state()?.gifts.get(id).cloned())
    }

    fn gifts_for_trust(&self, trust_id: &TrustId) -> Result<Vec<Gift>, RepositoryError> {
        Ok(self
            .state()?
            .gifts
            .values()
            .filter(|gift| &gift.trust_id == trust_id)
            .cloned()
            .collect())
    }

    fn all_gifts(&self) -> Result<Vec<Gift>, RepositoryError> {
        Ok(self.state()?.gifts.values().cloned().collect())
    }

    fn active_policies(&self) -> Result<Vec<Policy>, RepositoryError> {
        let state = self.state()?;
        Ok(state
            .policies
            .values()
            .filter(|policy| policy.status == PolicyStatus::Active)
            .filter(|policy| {
                state
                    .trusts
                    .get(&policy.trust_id)
                    .is_some_and(|trust| trust.status == TrustStatus::Active)
            })
            .cloned()
            .collect())
    }
}

impl NoticeRepository for MemoryStore {
    fn insert_batch(&self, notices: Vec<CrummeyNotice>) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        if notices
            .iter()
            .any(|notice| state.notices.contains_key(&notice.id))
        {
            return Err(RepositoryError::Conflict);
        }
        for notice in notices {
            state.notices.insert(notice.id.clone(), notice);
        }
        Ok(())
    }

    fn insert_for_gift(
        &self,
        gift_id: &GiftId,
        notices: Vec<CrummeyNotice>,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        let already_issued = state
            .notices
            .values()
            .any(|notice| &notice.gift_id == gift_id);
        if already_issued
            || notices.iter().any(|notice| {
                &notice.gift_id != gift_id || state.notices.contains_key(&notice.id)
            })
        {
            return Err(RepositoryError::Conflict);
        }
        for notice in notices {
            state.notices.insert(notice.id.clone(), notice);
        }
        Ok(())
    }

    fn fetch(&self, id: &NoticeId) -> Result<Option<CrummeyNotice>, RepositoryError> {
        Ok(self.state()?.notices.get(id).cloned())
    }

    fn for_trust_since(
        &self,
        trust_id: &TrustId,
        since: NaiveDate,
    ) -> Result<Vec<CrummeyNotice>, RepositoryError> {
        Ok(self
            .state()?
            .notices
            .values()
            .filter(|notice| &notice.trust_id == trust_id && notice.notice_date >= since)
            .cloned()
            .collect())
    }

    fn with_status(&self, status: NoticeStatus) -> Result<Vec<CrummeyNotice>, RepositoryError> {
        Ok(self
            .state()?
            .notices
            .values()
            .filter(|notice| notice.status == status)
            .cloned()
            .collect())
    }

    fn mark_sent(
        &self,
        id: &NoticeId,
        at: DateTime<Utc>,
    ) -> Result<CrummeyNotice, RepositoryError> {
        let mut state = self.state()?;
        let notice = state.notices.get_mut(id).ok_or(RepositoryError::NotFound)?;
        if notice.status != NoticeStatus::Pending {
            return Err(RepositoryError::Conflict);
        }
        notice.status = NoticeStatus::Sent;
        notice.sent_at = Some(at);
        Ok(notice.clone())
    }

    fn mark_failed(&self, id: &NoticeId) -> Result<CrummeyNotice, RepositoryError> {
        let mut state = self.state()?;
        let notice = state.notices.get_mut(id).ok_or(RepositoryError::NotFound)?;
        if notice.status != NoticeStatus::Pending {
            return Err(RepositoryError::Conflict);
        }
        notice.status = NoticeStatus::Failed;
        Ok(notice.clone())
    }

    fn mark_exercised(
        &self,
        id: &NoticeId,
        at: DateTime<Utc>,
    ) -> Result<CrummeyNotice, RepositoryError> {
        let mut state = self.state()?;
        let notice = state.notices.get_mut(id).ok_or(RepositoryError::NotFound)?;
        if notice.status != NoticeStatus::Sent {
            return Err(RepositoryError::Conflict);
        }
        if !notice.withdrawal_exercised {
            notice.withdrawal_exercised = true;
            notice.exercised_at = Some(at);
        }
        Ok(notice.clone())
    }

    fn expire_if_due(&self, id: &NoticeId, today: NaiveDate) -> Result<bool, RepositoryError> {
        let mut state = self.state()?;
        let notice = state.notices.get_mut(id).ok_or(RepositoryError::NotFound)?;
        if !notice.is_expirable(today) {
            return Ok(false);
        }
        notice.status = NoticeStatus::Expired;
        Ok(true)
    }
}

impl HealthCheckRepository for MemoryStore {
    fn insert(&self, check: HealthCheck) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        if state.health_checks.iter().any(|existing| existing.id == check.id) {
            return Err(RepositoryError::Conflict);
        }
        let index = state.health_checks.len();
        let is_latest = match state.latest_checks.get(&check.policy_id) {
            Some(&current) => check.checked_at >= state.health_checks[current].checked_at,
            None => true,
        };
        if is_latest {
            state.latest_checks.insert(check.policy_id.clone(), index);
        }
        state.health_checks.push(check);
        Ok(())
    }

    fn latest_for_policy(
        &self,
        policy_id: &PolicyId,
    ) -> Result<Option<HealthCheck>, RepositoryError> {
        let state = self.state()?;
        Ok(state
            .latest_checks
            .get(policy_id)
            .and_then(|&index| state.health_checks.get(index))
            .cloned())
    }
}

impl RemediationRepository for MemoryStore {
    fn insert_batch(&self, actions: Vec<RemediationAction>) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        if actions
            .iter()
            .any(|action| state.actions.contains_key(&action.id))
        {
            return Err(RepositoryError::Conflict);
        }
        for action in actions {
            state.actions.insert(action.id.clone(), action);
        }
        Ok(())
    }

    fn fetch(&self, id: &ActionId) -> Result<Option<RemediationAction>, RepositoryError> {
        Ok(self.state()?.actions.get(id).cloned())
    }

    fn update_open(
        &self,
        id: &ActionId,
        change: &mut dyn FnMut(&mut RemediationAction),
    ) -> Result<RemediationAction, RepositoryError> {
        let mut state = self.state()?;
        let action = state.actions.get_mut(id).ok_or(RepositoryError::NotFound)?;
        if action.status.is_terminal() {
            return Err(RepositoryError::Conflict);
        }
        change(action);
        Ok(action.clone())
    }

    fn complete_batch(
        &self,
        ids: &[ActionId],
        completion: &Completion,
    ) -> Result<BatchCompletion, RepositoryError> {
        let mut state = self.state()?;
        let mut missing = Vec::new();
        let mut terminal = Vec::new();
        for id in ids {
            match state.actions.get(id) {
                None => missing.push(id.clone()),
                Some(action) if action.status.is_terminal() => terminal.push(id.clone()),
                Some(_) => {}
            }
        }
        if !missing.is_empty() || !terminal.is_empty() {
            return Ok(BatchCompletion::Rejected { missing, terminal });
        }

        let mut completed = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(action) = state.actions.get_mut(id) {
                action.status = ActionStatus::Completed;
                action.completion = Some(completion.clone());
                completed.push(action.clone());
            }
        }
        Ok(BatchCompletion::Completed(completed))
    }

    fn mark_alerted(&self, ids: &[ActionId]) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        for id in ids {
            if let Some(action) = state.actions.get_mut(id) {
                action.email_alert_sent = true;
            }
        }
        Ok(())
    }

    fn open_for_policy(
        &self,
        policy_id: &PolicyId,
    ) -> Result<Vec<RemediationAction>, RepositoryError> {
        let mut actions: Vec<RemediationAction> = self
            .state()?
            .actions
            .values()
            .filter(|action| &action.policy_id == policy_id && !action.status.is_terminal())
            .cloned()
            .collect();
        actions.sort_by(|a, b| a.due_date.cmp(&b.due_date).then_with(|| a.id.cmp(&b.id)));
        Ok(actions)
    }
}

impl NotificationLog for MemoryStore {
    fn reserve(&self, entry: LogEntry) -> Result<Option<LogEntry>, RepositoryError> {
        let mut state = self.state()?;
        if entry.kind.is_deduplicated() {
            if let Some(notice_id) = &entry.notice_id {
                if !state.dedup_keys.insert((notice_id.clone(), entry.kind)) {
                    return Ok(None);
                }
            }
        }
        state.log.push(entry.clone());
        Ok(Some(entry))
    }

    fn finish(
        &self,
        id: &LogEntryId,
        outcome: NotificationOutcome,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        let entry = state
            .log
            .iter_mut()
            .find(|entry| &entry.id == id)
            .ok_or(RepositoryError::NotFound)?;
        entry.outcome = outcome;
        Ok(())
    }

    fn append(&self, entry: LogEntry) -> Result<(), RepositoryError> {
        self.state()?.log.push(entry);
        Ok(())
    }

    fn for_notice(&self, notice_id: &NoticeId) -> Result<Vec<LogEntry>, RepositoryError> {
        Ok(self
            .state()?
            .log
            .iter()
            .filter(|entry| entry.notice_id.as_ref() == Some(notice_id))
            .cloned()
            .collect())
    }
}
