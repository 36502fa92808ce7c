use std::sync::Arc;

use chrono::{DateTime, Days, Utc};
use serde::Serialize;

use super::domain::{CrummeyNotice, NoticeId, NoticeStatus};
use super::repository::NoticeRepository;
use crate::error::FailureKind;
use crate::notifications::log::next_entry_id;
use crate::notifications::templates::{self, DeadlineAlert};
use crate::notifications::{
    dispatch, LogEntry, Mailer, NotificationKind, NotificationLog, NotificationOutcome,
};
use crate::store::Repositories;
use crate::workflows::portfolio::{PortfolioRepository, RepositoryError};

pub const DEFAULT_ALERT_WINDOW_DAYS: i64 = 7;

/// Sweeps sent notices approaching their deadline and alerts the trustee once per notice.
pub struct DeadlineAlertService {
    portfolio: Arc<dyn PortfolioRepository>,
    notices: Arc<dyn NoticeRepository>,
    log: Arc<dyn NotificationLog>,
    mailer: Arc<dyn Mailer>,
    default_window_days: i64,
}

impl DeadlineAlertService {
    pub fn new(repositories: &Repositories, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            portfolio: Arc::clone(&repositories.portfolio),
            notices: Arc::clone(&repositories.notices),
            log: Arc::clone(&repositories.notification_log),
            mailer,
            default_window_days: DEFAULT_ALERT_WINDOW_DAYS,
        }
    }

    pub fn with_default_window(mut self, days: i64) -> Self {
        self.default_window_days = days;
        self
    }

    pub async fn run(
        &self,
        window_days: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<AlertSweepReport, AlertSweepError> {
        let window_days = window_days.unwrap_or(self.default_window_days);
        let today = now.date_naive();
        let horizon = u64::try_from(window_days)
            .ok()
            .filter(|days| *days > 0)
            .and_then(|days| today.checked_add_days(Days::new(days)))
            .ok_or(AlertSweepError::InvalidWindow(window_days))?;
        let candidates: Vec<CrummeyNotice> = self
            .notices
            .with_status(NoticeStatus::Sent)?
            .into_iter()
            .filter(|notice| {
                notice.withdrawal_deadline > today && notice.withdrawal_deadline <= horizon
            })
            .collect();

        let mut report = AlertSweepReport {
            window_days,
            ..AlertSweepReport::default()
        };

        for notice in candidates {
            report.total_checked += 1;
            match self.alert(&notice, now).await? {
                AlertOutcome::Sent(result) => {
                    report.alerts_sent += 1;
                    report.results.push(result);
                }
                AlertOutcome::Skipped(reason) => {
                    tracing::debug!(notice_id = %notice.id, ?reason, "deadline alert skipped");
                    report.alerts_skipped += 1;
                    report.skipped.push(SkippedAlert {
                        notice_id: notice.id,
                        reason,
                    });
                }
            }
        }

        tracing::info!(
            window_days,
            checked = report.total_checked,
            sent = report.alerts_sent,
            skipped = report.alerts_skipped,
            "deadline alert sweep finished"
        );
        Ok(report)
    }

    async fn alert(
        &self,
        notice: &CrummeyNotice,
        now: DateTime<Utc>,
    ) -> Result<AlertOutcome, AlertSweepError> {
        if notice.withdrawal_exercised {
            return Ok(AlertOutcome::Skipped(SkipReason::AlreadyExercised));
        }
        let Some(beneficiary) = self.portfolio.beneficiary(&notice.beneficiary_id)? else {
            return Ok(AlertOutcome::Skipped(SkipReason::MissingBeneficiary));
        };
        let Some(trust) = self.portfolio.trust(&notice.trust_id)? else {
            return Ok(AlertOutcome::Skipped(SkipReason::MissingTrust));
        };
        let Some(trustee_email) = trust.trustee_contact() else {
            return Ok(AlertOutcome::Skipped(SkipReason::MissingTrusteeEmail));
        };

        let days_remaining = notice.days_remaining(now.date_naive());
        let message = templates::deadline_alert(&DeadlineAlert {
            to: trustee_email,
            trustee_name: &trust.trustee_name,
            trust_name: &trust.name,
            beneficiary_name: &beneficiary.name,
            withdrawal_amount: notice.withdrawal_amount,
            withdrawal_deadline: notice.withdrawal_deadline,
            notice_date: notice.notice_date,
            days_remaining,
        });

        let reserved = self.log.reserve(LogEntry {
            id: next_entry_id(),
            notice_id: Some(notice.id.clone()),
            kind: NotificationKind::DeadlineAlert,
            recipient: Some(trustee_email.to_string()),
            subject: Some(message.subject.clone()),
            outcome: NotificationOutcome::Reserved,
            logged_at: now,
        })?;
        let Some(reservation) = reserved else {
            return Ok(AlertOutcome::Skipped(SkipReason::AlreadyAlerted));
        };

        let (outcome, result) =
            match dispatch(self.mailer.as_ref(), message, "deadline_alert").await {
                Ok(receipt) => {
                    let result = AlertResult {
                        notice_id: notice.id.clone(),
                        trustee_email: trustee_email.to_string(),
                        days_remaining,
                        provider_id: receipt.provider_id.clone(),
                    };
                    let outcome = NotificationOutcome::Delivered {
                        provider_id: receipt.provider_id,
                    };
                    (outcome, AlertOutcome::Sent(result))
                }
                Err(error) => {
                    let reason = error.to_string();
                    let outcome = NotificationOutcome::Failed {
                        reason: reason.clone(),
                    };
                    (outcome, AlertOutcome::Skipped(SkipReason::DeliveryFailed(reason)))
                }
            };

        if let Err(error) = self.log.finish(&reservation.id, outcome) {
            tracing::warn!(notice_id = %notice.id, %error, "failed to record deadline alert");
        }
        Ok(result)
    }
}

enum AlertOutcome {
    Sent(AlertResult),
    Skipped(SkipReason),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    AlreadyAlerted,
    AlreadyExercised,
    MissingBeneficiary,
    MissingTrust,
    MissingTrusteeEmail,
    DeliveryFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertResult {
    pub notice_id: NoticeId,
    pub trustee_email: String,
    pub days_remaining: i64,
    pub provider_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedAlert {
    pub notice_id: NoticeId,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AlertSweepReport {
    pub total_checked: usize,
    pub alerts_sent: usize,
    pub alerts_skipped: usize,
    pub window_days: i64,
    pub results: Vec<AlertResult>,
    pub skipped: Vec<SkippedAlert>,
}

#[derive(Debug, thiserror::Error)]
pub enum AlertSweepError {
    #[error("window_days must be a positive number of days within the calendar (got {0})")]
    InvalidWindow(i64),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl AlertSweepError {
    pub fn kind(&self) -> FailureKind {
        match self {
            AlertSweepError::InvalidWindow(_) => FailureKind::InvalidInput,
            AlertSweepError::Repository(_) => FailureKind::PersistenceFailed,
        }
    }
}
