use chrono::{DateTime, NaiveDate, Utc};

use super::domain::{CrummeyNotice, NoticeId, NoticeStatus};
use crate::workflows::portfolio::{GiftId, RepositoryError, TrustId};

/// Storage contract for notices. Every transition is a compare-and-set on the current status.
pub trait NoticeRepository: Send + Sync {
    fn insert_batch(&self, notices: Vec<CrummeyNotice>) -> Result<(), RepositoryError>;
    /// Stores the notices issued for a gift. `Conflict` when the gift already has notices.
    fn insert_for_gift(
        &self,
        gift_id: &GiftId,
        notices: Vec<CrummeyNotice>,
    ) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &NoticeId) -> Result<Option<CrummeyNotice>, RepositoryError>;
    /// Notices for a trust whose notice date is on or after `since`.
    fn for_trust_since(
        &self,
        trust_id: &TrustId,
        since: NaiveDate,
    ) -> Result<Vec<CrummeyNotice>, RepositoryError>;
    fn with_status(&self, status: NoticeStatus) -> Result<Vec<CrummeyNotice>, RepositoryError>;
    /// `pending` to `sent`. `Conflict` when the notice is no longer pending.
    fn mark_sent(&self, id: &NoticeId, at: DateTime<Utc>)
        -> Result<CrummeyNotice, RepositoryError>;
    /// `pending` to `failed`. `Conflict` when the notice is no longer pending.
    fn mark_failed(&self, id: &NoticeId) -> Result<CrummeyNotice, RepositoryError>;
    /// Sets the exercised flag on a `sent` notice. Already-exercised notices are returned as is.
    fn mark_exercised(
        &self,
        id: &NoticeId,
        at: DateTime<Utc>,
    ) -> Result<CrummeyNotice, RepositoryError>;
    /// `sent` to `expired` when unexercised and past deadline. Returns whether it transitioned.
    fn expire_if_due(&self, id: &NoticeId, today: NaiveDate) -> Result<bool, RepositoryError>;
}
