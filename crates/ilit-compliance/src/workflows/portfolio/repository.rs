use chrono::NaiveDate;

use super::domain::{
    Beneficiary, BeneficiaryId, Gift, GiftId, Policy, PolicyId, PremiumPayment, Trust, TrustId,
};

/// Read access to the policy, trust, payment, and gift records the engine scores against.
pub trait PortfolioRepository: Send + Sync {
    fn policy(&self, id: &PolicyId) -> Result<Option<Policy>, RepositoryError>;
    fn trust(&self, id: &TrustId) -> Result<Option<Trust>, RepositoryError>;
    fn beneficiaries(&self, trust_id: &TrustId) -> Result<Vec<Beneficiary>, RepositoryError>;
    fn beneficiary(&self, id: &BeneficiaryId) -> Result<Option<Beneficiary>, RepositoryError>;
    /// Payments on or after `since`, most recent payment date first.
    fn payments_since(
        &self,
        policy_id: &PolicyId,
        since: NaiveDate,
    ) -> Result<Vec<PremiumPayment>, RepositoryError>;
    /// Every payment recorded against the trust's policies.
    fn trust_payments(&self, trust_id: &TrustId) -> Result<Vec<PremiumPayment>, RepositoryError>;
    fn policies_for_trust(&self, trust_id: &TrustId) -> Result<Vec<Policy>, RepositoryError>;
    fn gift(&self, id: &GiftId) -> Result<Option<Gift>, RepositoryError>;
    fn gifts_for_trust(&self, trust_id: &TrustId) -> Result<Vec<Gift>, RepositoryError>;
    fn all_gifts(&self) -> Result<Vec<Gift>, RepositoryError>;
    /// Active policies whose owning trust is also active.
    fn active_policies(&self) -> Result<Vec<Policy>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
