//! Remediation actions raised by health checks: assignment, progress markers, cancellation,
//! and all-or-nothing completion with mandatory notes.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    ActionId, ActionPriority, ActionStatus, ActionType, Assignee, Assignment, Completion,
    CompletionNotes, NotesError, RemediationAction, MAX_COMPLETION_NOTES,
};
pub use repository::{BatchCompletion, RemediationRepository};
pub use router::remediation_router;
pub use service::{AssignRequest, AssignmentOutcome, RemediationError, RemediationService};
