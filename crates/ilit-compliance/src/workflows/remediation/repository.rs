use super::domain::{ActionId, Completion, RemediationAction};
use crate::workflows::portfolio::{PolicyId, RepositoryError};

/// Storage contract for remediation actions.
///
/// `complete_batch` must check every precondition and apply every transition inside one
/// critical section so callers never observe a partially completed batch.
pub trait RemediationRepository: Send + Sync {
    /// Stores all actions or none of them.
    fn insert_batch(&self, actions: Vec<RemediationAction>) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &ActionId) -> Result<Option<RemediationAction>, RepositoryError>;
    /// Applies `change` to a non-terminal action and returns the updated record.
    ///
    /// Fails with `NotFound` for unknown ids and `Conflict` for completed or cancelled actions.
    fn update_open(
        &self,
        id: &ActionId,
        change: &mut dyn FnMut(&mut RemediationAction),
    ) -> Result<RemediationAction, RepositoryError>;
    fn complete_batch(
        &self,
        ids: &[ActionId],
        completion: &Completion,
    ) -> Result<BatchCompletion, RepositoryError>;
    /// Flags actions whose remediation alert was delivered.
    fn mark_alerted(&self, ids: &[ActionId]) -> Result<(), RepositoryError>;
    /// Pending and in-progress actions for a policy, soonest due first.
    fn open_for_policy(&self, policy_id: &PolicyId)
        -> Result<Vec<RemediationAction>, RepositoryError>;
}

/// Outcome of an all-or-nothing completion attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchCompletion {
    Completed(Vec<RemediationAction>),
    Rejected {
        missing: Vec<ActionId>,
        terminal: Vec<ActionId>,
    },
}
