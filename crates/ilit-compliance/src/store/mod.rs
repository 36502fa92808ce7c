//! Persistence wiring. Services take their collaborators from [`Repositories`], so a
//! database-backed implementation only has to provide the same trait objects.

pub mod memory;

#[cfg(test)]
pub(crate) mod fixtures;

use std::sync::Arc;

use crate::notifications::NotificationLog;
use crate::workflows::crummey::NoticeRepository;
use crate::workflows::health::HealthCheckRepository;
use crate::workflows::portfolio::PortfolioRepository;
use crate::workflows::remediation::RemediationRepository;

pub use memory::MemoryStore;

#[derive(Clone)]
pub struct Repositories {
    pub portfolio: Arc<dyn PortfolioRepository>,
    pub notices: Arc<dyn NoticeRepository>,
    pub health_checks: Arc<dyn HealthCheckRepository>,
    pub remediation: Arc<dyn RemediationRepository>,
    pub notification_log: Arc<dyn NotificationLog>,
}

impl Repositories {
    /// Backs every repository with the same in-memory store.
    pub fn from_store(store: Arc<MemoryStore>) -> Self {
        Self {
            portfolio: store.clone(),
            notices: store.clone(),
            health_checks: store.clone(),
            remediation: store.clone(),
            notification_log: store,
        }
    }
}
