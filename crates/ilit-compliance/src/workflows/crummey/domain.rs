use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::portfolio::domain::record_id;
use crate::workflows::portfolio::{BeneficiaryId, GiftId, TrustId};

record_id!(
    /// Identifier for a Crummey withdrawal notice.
    NoticeId
);

pub const DEFAULT_WITHDRAWAL_PERIOD_DAYS: i64 = 30;

/// Lifecycle of a withdrawal notice: `pending` then `sent`, ending in `expired` or `failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeStatus {
    Pending,
    Sent,
    Expired,
    Failed,
}

impl NoticeStatus {
    pub const fn label(self) -> &'static str {
        match self {
            NoticeStatus::Pending => "pending",
            NoticeStatus::Sent => "sent",
            NoticeStatus::Expired => "expired",
            NoticeStatus::Failed => "failed",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, NoticeStatus::Expired | NoticeStatus::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrummeyNotice {
    pub id: NoticeId,
    pub gift_id: GiftId,
    pub trust_id: TrustId,
    pub beneficiary_id: BeneficiaryId,
    pub withdrawal_amount: f64,
    pub notice_date: NaiveDate,
    pub withdrawal_deadline: NaiveDate,
    pub status: NoticeStatus,
    pub withdrawal_exercised: bool,
    pub exercised_at: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
}

impl CrummeyNotice {
    /// Whether the notice reached the beneficiary. Expired notices that were sent still count.
    pub fn was_delivered(&self) -> bool {
        match self.status {
            NoticeStatus::Sent => true,
            NoticeStatus::Expired => self.sent_at.is_some(),
            NoticeStatus::Pending | NoticeStatus::Failed => false,
        }
    }

    pub fn is_expirable(&self, today: NaiveDate) -> bool {
        self.status == NoticeStatus::Sent
            && !self.withdrawal_exercised
            && self.withdrawal_deadline < today
    }

    pub fn days_remaining(&self, today: NaiveDate) -> i64 {
        (self.withdrawal_deadline - today).num_days()
    }
}
