//! Crummey withdrawal notices: issuance, delivery, exercise, expiration, and deadline alerts.
//!
//! Every transition is a compare-and-set against the stored status, so concurrent sweeps can
//! run without double-expiring or double-alerting a notice.

pub mod alerts;
pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use alerts::{
    AlertResult, AlertSweepError, AlertSweepReport, DeadlineAlertService, SkipReason,
    SkippedAlert, DEFAULT_ALERT_WINDOW_DAYS,
};
pub use domain::{CrummeyNotice, NoticeId, NoticeStatus, DEFAULT_WITHDRAWAL_PERIOD_DAYS};
pub use repository::NoticeRepository;
pub use router::{notice_router, NoticeState};
pub use service::{CrummeyService, ExpirySweepReport, NoticeDispatch, NoticeError};
