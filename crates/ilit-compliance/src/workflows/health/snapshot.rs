use chrono::NaiveDate;
use serde::Serialize;

use crate::workflows::crummey::domain::CrummeyNotice;
use crate::workflows::crummey::repository::NoticeRepository;
use crate::workflows::gifts::sufficiency::available_trust_assets;
use crate::workflows::portfolio::{
    trailing_year_start, Beneficiary, Policy, PolicyId, PortfolioRepository, PremiumPayment,
    RepositoryError, Trust, UpcomingPremium,
};

/// Everything the scoring rules and the advisory pass look at for one policy.
#[derive(Debug, Clone, Serialize)]
pub struct PolicySnapshot {
    pub as_of: NaiveDate,
    pub policy: Policy,
    pub trust: Trust,
    /// Trailing twelve months, most recent first.
    pub payments: Vec<PremiumPayment>,
    pub upcoming_premium: Option<UpcomingPremium>,
    /// Trailing twelve months of notices for the owning trust.
    pub notices: Vec<CrummeyNotice>,
    pub beneficiaries: Vec<Beneficiary>,
    pub trust_assets: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("policy {0} not found")]
    PolicyNotFound(PolicyId),
    #[error("policy {0} does not resolve to a trust")]
    TrustNotFound(PolicyId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl PolicySnapshot {
    pub fn assemble(
        portfolio: &dyn PortfolioRepository,
        notices: &dyn NoticeRepository,
        policy_id: &PolicyId,
        as_of: NaiveDate,
    ) -> Result<Self, SnapshotError> {
        let policy = portfolio
            .policy(policy_id)?
            .ok_or_else(|| SnapshotError::PolicyNotFound(policy_id.clone()))?;
        let trust = portfolio
            .trust(&policy.trust_id)?
            .ok_or_else(|| SnapshotError::TrustNotFound(policy_id.clone()))?;

        let since = trailing_year_start(as_of);
        let mut payments = portfolio.payments_since(policy_id, since)?;
        payments.sort_by(|a, b| b.payment_date.cmp(&a.payment_date));

        let recent_notices = notices.for_trust_since(&trust.id, since)?;
        let beneficiaries = portfolio.beneficiaries(&trust.id)?;

        let gifts = portfolio.gifts_for_trust(&trust.id)?;
        let trust_payments = portfolio.trust_payments(&trust.id)?;
        let trust_assets = available_trust_assets(&gifts, &trust_payments);

        Ok(Self {
            as_of,
            upcoming_premium: policy.upcoming_premium(),
            policy,
            trust,
            payments,
            notices: recent_notices,
            beneficiaries,
            trust_assets,
        })
    }

    pub fn delivered_notice_count(&self) -> usize {
        self.notices
            .iter()
            .filter(|notice| notice.was_delivered())
            .count()
    }
}
