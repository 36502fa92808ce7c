use super::domain::HealthCheck;
use crate::workflows::portfolio::{PolicyId, RepositoryError};

/// Append-only storage for health checks with an explicit latest-per-policy index.
pub trait HealthCheckRepository: Send + Sync {
    fn insert(&self, check: HealthCheck) -> Result<(), RepositoryError>;
    /// Most recent check for the policy by check time.
    fn latest_for_policy(&self, policy_id: &PolicyId)
        -> Result<Option<HealthCheck>, RepositoryError>;
}
