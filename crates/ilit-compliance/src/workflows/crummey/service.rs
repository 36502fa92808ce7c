use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use super::domain::{CrummeyNotice, NoticeId, NoticeStatus, DEFAULT_WITHDRAWAL_PERIOD_DAYS};
use super::repository::NoticeRepository;
use crate::error::FailureKind;
use crate::notifications::log::next_entry_id;
use crate::notifications::templates::{self, CrummeyLetter};
use crate::notifications::{
    dispatch, LogEntry, Mailer, NotificationKind, NotificationLog, NotificationOutcome,
};
use crate::store::Repositories;
use crate::workflows::portfolio::{
    Beneficiary, BeneficiaryId, Gift, GiftId, PortfolioRepository, RepositoryError, TrustId,
};

static NOTICE_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_notice_id() -> NoticeId {
    let id = NOTICE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    NoticeId(format!("ntc-{id:06}"))
}

/// Issues, sends, exercises, and expires Crummey withdrawal notices.
pub struct CrummeyService {
    portfolio: Arc<dyn PortfolioRepository>,
    notices: Arc<dyn NoticeRepository>,
    log: Arc<dyn NotificationLog>,
    mailer: Arc<dyn Mailer>,
    withdrawal_period_days: i64,
}

impl CrummeyService {
    pub fn new(repositories: &Repositories, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            portfolio: Arc::clone(&repositories.portfolio),
            notices: Arc::clone(&repositories.notices),
            log: Arc::clone(&repositories.notification_log),
            mailer,
            withdrawal_period_days: DEFAULT_WITHDRAWAL_PERIOD_DAYS,
        }
    }

    pub fn with_withdrawal_period(mut self, days: i64) -> Self {
        self.withdrawal_period_days = days.max(1);
        self
    }

    /// Create one pending notice per eligible beneficiary of the gift's trust.
    ///
    /// A gift designated for a single beneficiary produces one notice for the full amount.
    /// Otherwise the amount is split by recorded share percentages, or equally when shares are
    /// missing.
    pub fn issue_for_gift(
        &self,
        gift_id: &GiftId,
        today: NaiveDate,
    ) -> Result<Vec<CrummeyNotice>, NoticeError> {
        let gift = self
            .portfolio
            .gift(gift_id)?
            .ok_or_else(|| NoticeError::GiftNotFound(gift_id.clone()))?;
        let beneficiaries = self.portfolio.beneficiaries(&gift.trust_id)?;
        if beneficiaries.is_empty() {
            return Err(NoticeError::NoBeneficiaries(gift.trust_id));
        }

        let deadline = gift.gift_date + Duration::days(self.withdrawal_period_days);
        let notices: Vec<CrummeyNotice> = withdrawal_shares(&gift, &beneficiaries)
            .into_iter()
            .map(|(beneficiary_id, amount)| CrummeyNotice {
                id: next_notice_id(),
                gift_id: gift.id.clone(),
                trust_id: gift.trust_id.clone(),
                beneficiary_id,
                withdrawal_amount: amount,
                notice_date: today,
                withdrawal_deadline: deadline,
                status: NoticeStatus::Pending,
                withdrawal_exercised: false,
                exercised_at: None,
                sent_at: None,
            })
            .collect();

        self.notices
            .insert_for_gift(&gift.id, notices.clone())
            .map_err(|error| match error {
                RepositoryError::Conflict => NoticeError::AlreadyIssued(gift.id.clone()),
                other => NoticeError::Repository(other),
            })?;
        tracing::info!(
            gift_id = %gift.id,
            trust_id = %gift.trust_id,
            notices = notices.len(),
            %deadline,
            "crummey notices issued"
        );
        Ok(notices)
    }

    /// Deliver a pending notice to its beneficiary. Transport failure marks it `failed`.
    pub async fn send(
        &self,
        notice_id: &NoticeId,
        now: DateTime<Utc>,
    ) -> Result<NoticeDispatch, NoticeError> {
        let notice = self
            .notices
            .fetch(notice_id)?
            .ok_or_else(|| NoticeError::NotFound(notice_id.clone()))?;
        if notice.status != NoticeStatus::Pending {
            return Err(NoticeError::AlreadyProcessed {
                id: notice.id,
                status: notice.status,
            });
        }

        let beneficiary = self
            .portfolio
            .beneficiary(&notice.beneficiary_id)?
            .ok_or_else(|| NoticeError::BeneficiaryNotFound(notice.beneficiary_id.clone()))?;
        let email = beneficiary
            .contact_email()
            .ok_or_else(|| NoticeError::MissingBeneficiaryEmail(beneficiary.id.clone()))?;
        let trust = self
            .portfolio
            .trust(&notice.trust_id)?
            .ok_or_else(|| NoticeError::TrustNotFound(notice.trust_id.clone()))?;

        let message = templates::crummey_notice(&CrummeyLetter {
            to: email,
            beneficiary_name: &beneficiary.name,
            trust_name: &trust.name,
            trustee_name: &trust.trustee_name,
            trustee_email: trust.trustee_contact(),
            withdrawal_amount: notice.withdrawal_amount,
            notice_date: notice.notice_date,
            withdrawal_deadline: notice.withdrawal_deadline,
        });

        let reservation = self
            .log
            .reserve(LogEntry {
                id: next_entry_id(),
                notice_id: Some(notice.id.clone()),
                kind: NotificationKind::CrummeyNotice,
                recipient: Some(email.to_string()),
                subject: Some(message.subject.clone()),
                outcome: NotificationOutcome::Reserved,
                logged_at: now,
            })?
            .ok_or_else(|| NoticeError::AlreadyProcessed {
                id: notice.id.clone(),
                status: notice.status,
            })?;

        let (updated, outcome) =
            match dispatch(self.mailer.as_ref(), message, "crummey_notice").await {
                Ok(receipt) => {
                    let updated = self.notices.mark_sent(&notice.id, now)?;
                    let outcome = NotificationOutcome::Delivered {
                        provider_id: receipt.provider_id,
                    };
                    (updated, outcome)
                }
                Err(error) => {
                    let updated = self.notices.mark_failed(&notice.id)?;
                    let outcome = NotificationOutcome::Failed {
                        reason: error.to_string(),
                    };
                    (updated, outcome)
                }
            };

        let dispatch_result = NoticeDispatch::new(updated, &outcome);
        if let Err(error) = self.log.finish(&reservation.id, outcome) {
            tracing::warn!(notice_id = %notice_id, %error, "failed to record notice delivery");
        }

        tracing::info!(
            notice_id = %notice_id,
            status = dispatch_result.notice.status.label(),
            "crummey notice dispatch finished"
        );
        Ok(dispatch_result)
    }

    /// Record the beneficiary exercising the withdrawal right.
    pub fn record_exercise(
        &self,
        notice_id: &NoticeId,
        now: DateTime<Utc>,
    ) -> Result<CrummeyNotice, NoticeError> {
        match self.notices.mark_exercised(notice_id, now) {
            Ok(notice) => {
                tracing::info!(notice_id = %notice_id, "withdrawal exercise recorded");
                Ok(notice)
            }
            Err(RepositoryError::NotFound) => Err(NoticeError::NotFound(notice_id.clone())),
            Err(RepositoryError::Conflict) => {
                let status = self
                    .notices
                    .fetch(notice_id)?
                    .map(|notice| notice.status)
                    .unwrap_or(NoticeStatus::Pending);
                Err(NoticeError::NotSent {
                    id: notice_id.clone(),
                    status,
                })
            }
            Err(other) => Err(other.into()),
        }
    }

    /// Expire every sent, unexercised notice whose deadline is before `today`.
    pub fn expire_overdue(
        &self,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<ExpirySweepReport, NoticeError> {
        let candidates: Vec<CrummeyNotice> = self
            .notices
            .with_status(NoticeStatus::Sent)?
            .into_iter()
            .filter(|notice| notice.is_expirable(today))
            .collect();

        let mut report = ExpirySweepReport {
            total_checked: candidates.len(),
            ..ExpirySweepReport::default()
        };

        for notice in candidates {
            if !self.notices.expire_if_due(&notice.id, today)? {
                continue;
            }
            report.total_expired += 1;

            let event = LogEntry {
                id: next_entry_id(),
                notice_id: Some(notice.id.clone()),
                kind: NotificationKind::NoticeExpired,
                recipient: None,
                subject: Some(format!("Crummey Notice Expired - ID: {}", notice.id)),
                outcome: NotificationOutcome::Recorded,
                logged_at: now,
            };
            if let Err(error) = self.log.append(event) {
                tracing::warn!(notice_id = %notice.id, %error, "failed to log notice expiration");
            }
            report.expired_notice_ids.push(notice.id);
        }

        tracing::info!(
            checked = report.total_checked,
            expired = report.total_expired,
            %today,
            "crummey expiration sweep finished"
        );
        Ok(report)
    }
}

fn withdrawal_shares(gift: &Gift, beneficiaries: &[Beneficiary]) -> Vec<(BeneficiaryId, f64)> {
    if let Some(designated) = &gift.beneficiary_id {
        if beneficiaries.iter().any(|b| &b.id == designated) {
            return vec![(designated.clone(), round_cents(gift.amount))];
        }
    }

    let shares: Option<Vec<f64>> = beneficiaries
        .iter()
        .map(|b| b.share_percentage.filter(|share| *share > 0.0))
        .collect();
    let total_share: f64 = shares.iter().flatten().sum();

    match shares {
        Some(shares) if total_share > 0.0 => beneficiaries
            .iter()
            .zip(shares)
            .map(|(b, share)| (b.id.clone(), round_cents(gift.amount * share / total_share)))
            .collect(),
        _ => {
            let each = round_cents(gift.amount / beneficiaries.len() as f64);
            beneficiaries.iter().map(|b| (b.id.clone(), each)).collect()
        }
    }
}

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Result of a send attempt. `delivered` is false when the transport failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoticeDispatch {
    pub notice: CrummeyNotice,
    pub delivered: bool,
    pub provider_id: Option<String>,
    pub failure: Option<String>,
}

impl NoticeDispatch {
    fn new(notice: CrummeyNotice, outcome: &NotificationOutcome) -> Self {
        let (delivered, provider_id, failure) = match outcome {
            NotificationOutcome::Delivered { provider_id } => {
                (true, Some(provider_id.clone()), None)
            }
            NotificationOutcome::Failed { reason } => (false, None, Some(reason.clone())),
            NotificationOutcome::Reserved | NotificationOutcome::Recorded => (false, None, None),
        };
        Self {
            notice,
            delivered,
            provider_id,
            failure,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExpirySweepReport {
    pub total_checked: usize,
    pub total_expired: usize,
    pub expired_notice_ids: Vec<NoticeId>,
}

/// Error raised by the notice service.
#[derive(Debug, thiserror::Error)]
pub enum NoticeError {
    #[error("notice {0} not found")]
    NotFound(NoticeId),
    #[error("gift {0} not found")]
    GiftNotFound(GiftId),
    #[error("beneficiary {0} not found")]
    BeneficiaryNotFound(BeneficiaryId),
    #[error("trust {0} not found")]
    TrustNotFound(TrustId),
    #[error("trust {0} has no beneficiaries to notify")]
    NoBeneficiaries(TrustId),
    #[error("beneficiary {0} has no email address")]
    MissingBeneficiaryEmail(BeneficiaryId),
    #[error("notices for gift {0} were already issued")]
    AlreadyIssued(GiftId),
    #[error("notice {id} was already processed (status {})", .status.label())]
    AlreadyProcessed { id: NoticeId, status: NoticeStatus },
    #[error("notice {id} is {} and cannot record an exercise", .status.label())]
    NotSent { id: NoticeId, status: NoticeStatus },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl NoticeError {
    pub fn kind(&self) -> FailureKind {
        match self {
            NoticeError::NotFound(_)
            | NoticeError::GiftNotFound(_)
            | NoticeError::BeneficiaryNotFound(_)
            | NoticeError::TrustNotFound(_)
            | NoticeError::Repository(RepositoryError::NotFound) => FailureKind::NotFound,
            NoticeError::NoBeneficiaries(_) | NoticeError::MissingBeneficiaryEmail(_) => {
                FailureKind::InvalidInput
            }
            NoticeError::AlreadyIssued(_)
            | NoticeError::AlreadyProcessed { .. }
            | NoticeError::NotSent { .. }
            | NoticeError::Repository(RepositoryError::Conflict) => FailureKind::Conflict,
            NoticeError::Repository(RepositoryError::Unavailable(_)) => {
                FailureKind::PersistenceFailed
            }
        }
    }
}
