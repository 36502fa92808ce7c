use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::crummey::domain::NoticeId;
use crate::workflows::portfolio::domain::record_id;
use crate::workflows::portfolio::RepositoryError;

record_id!(LogEntryId);

static LOG_SEQUENCE: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_entry_id() -> LogEntryId {
    let id = LOG_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    LogEntryId(format!("log-{id:06}"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    CrummeyNotice,
    DeadlineAlert,
    RemediationAlert,
    Assignment,
    NoticeExpired,
}

impl NotificationKind {
    pub const fn label(self) -> &'static str {
        match self {
            NotificationKind::CrummeyNotice => "crummey_notice",
            NotificationKind::DeadlineAlert => "deadline_alert",
            NotificationKind::RemediationAlert => "remediation_alert",
            NotificationKind::Assignment => "assignment",
            NotificationKind::NoticeExpired => "notice_expired",
        }
    }

    /// Kinds that may be recorded at most once per notice.
    pub const fn is_deduplicated(self) -> bool {
        matches!(
            self,
            NotificationKind::CrummeyNotice | NotificationKind::DeadlineAlert
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum NotificationOutcome {
    Reserved,
    Delivered { provider_id: String },
    Failed { reason: String },
    Recorded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: LogEntryId,
    pub notice_id: Option<NoticeId>,
    pub kind: NotificationKind,
    pub recipient: Option<String>,
    pub subject: Option<String>,
    pub outcome: NotificationOutcome,
    pub logged_at: DateTime<Utc>,
}

/// Append-only notification log with a unique `(notice_id, kind)` key for deduplicated kinds.
pub trait NotificationLog: Send + Sync {
    /// Claims the dedup key for `entry`. Returns `None` when another entry already holds it.
    fn reserve(&self, entry: LogEntry) -> Result<Option<LogEntry>, RepositoryError>;
    /// Records the delivery outcome on a reserved entry.
    fn finish(
        &self,
        id: &LogEntryId,
        outcome: NotificationOutcome,
    ) -> Result<(), RepositoryError>;
    fn append(&self, entry: LogEntry) -> Result<(), RepositoryError>;
    fn for_notice(&self, notice_id: &NoticeId) -> Result<Vec<LogEntry>, RepositoryError>;
}
