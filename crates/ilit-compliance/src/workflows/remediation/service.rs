use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{
    ActionId, ActionStatus, Assignee, Assignment, Completion, CompletionNotes, NotesError,
    RemediationAction,
};
use super::repository::{BatchCompletion, RemediationRepository};
use crate::error::FailureKind;
use crate::notifications::log::next_entry_id;
use crate::notifications::templates::{self, AssignmentNotice};
use crate::notifications::{
    dispatch, LogEntry, Mailer, NotificationKind, NotificationLog, NotificationOutcome,
};
use crate::store::Repositories;
use crate::workflows::portfolio::{PolicyId, RepositoryError};

/// Assignment, progress, cancellation, and completion of remediation actions.
pub struct RemediationService {
    actions: Arc<dyn RemediationRepository>,
    log: Arc<dyn NotificationLog>,
    mailer: Arc<dyn Mailer>,
}

impl RemediationService {
    pub fn new(repositories: &Repositories, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            actions: Arc::clone(&repositories.remediation),
            log: Arc::clone(&repositories.notification_log),
            mailer,
        }
    }

    /// Assign an open action. The assignee is notified on a best-effort basis.
    pub async fn assign(
        &self,
        action_id: &ActionId,
        request: AssignRequest,
        now: DateTime<Utc>,
    ) -> Result<AssignmentOutcome, RemediationError> {
        let name = request.assignee_name.trim().to_string();
        let email = request.assignee_email.trim().to_string();
        if name.is_empty() {
            return Err(RemediationError::InvalidAssignee("assignee name is required"));
        }
        if email.is_empty() || !email.contains('@') {
            return Err(RemediationError::InvalidAssignee(
                "assignee email must be a valid address",
            ));
        }

        let assignment = Assignment {
            assignee: Assignee { name, email },
            assigned_at: now,
            assigned_by: request.assigned_by.filter(|by| !by.trim().is_empty()),
        };
        let action = self.update(action_id, &mut |action| {
            action.assignment = Some(assignment.clone());
        })?;

        let notification_sent = self.notify_assignee(&action, &assignment, now).await;
        tracing::info!(
            action_id = %action.id,
            assignee = %assignment.assignee.email,
            notification_sent,
            "remediation action assigned"
        );

        Ok(AssignmentOutcome {
            action,
            notification_sent,
        })
    }

    /// Move an open action between `pending` and `in_progress`.
    pub fn set_progress(
        &self,
        action_id: &ActionId,
        status: ActionStatus,
    ) -> Result<RemediationAction, RemediationError> {
        if status.is_terminal() {
            return Err(RemediationError::InvalidProgress(status));
        }
        self.update(action_id, &mut |action| action.status = status)
    }

    pub fn cancel(&self, action_id: &ActionId) -> Result<RemediationAction, RemediationError> {
        let action = self.update(action_id, &mut |action| {
            action.status = ActionStatus::Cancelled;
        })?;
        tracing::info!(action_id = %action.id, "remediation action cancelled");
        Ok(action)
    }

    /// Complete one or more actions with the same notes. Either every action completes or none do.
    pub fn complete(
        &self,
        action_ids: &[ActionId],
        notes: &str,
        completed_by: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Vec<RemediationAction>, RemediationError> {
        let mut seen = HashSet::new();
        let ids: Vec<ActionId> = action_ids
            .iter()
            .filter(|id| seen.insert((*id).clone()))
            .cloned()
            .collect();
        if ids.is_empty() {
            return Err(RemediationError::NoActions);
        }
        let notes = CompletionNotes::parse(notes)?;

        let completion = Completion {
            notes: notes.into_inner(),
            completed_at: now,
            completed_by: completed_by.filter(|by| !by.trim().is_empty()),
        };

        match self.actions.complete_batch(&ids, &completion)? {
            BatchCompletion::Completed(actions) => {
                tracing::info!(count = actions.len(), "remediation actions completed");
                Ok(actions)
            }
            BatchCompletion::Rejected { missing, .. } if !missing.is_empty() => {
                Err(RemediationError::NotFound(missing))
            }
            BatchCompletion::Rejected { terminal, .. } => Err(RemediationError::Closed(terminal)),
        }
    }

    pub fn open_for_policy(
        &self,
        policy_id: &PolicyId,
    ) -> Result<Vec<RemediationAction>, RemediationError> {
        Ok(self.actions.open_for_policy(policy_id)?)
    }

    fn update(
        &self,
        action_id: &ActionId,
        change: &mut dyn FnMut(&mut RemediationAction),
    ) -> Result<RemediationAction, RemediationError> {
        self.actions
            .update_open(action_id, change)
            .map_err(|error| match error {
                RepositoryError::NotFound => RemediationError::NotFound(vec![action_id.clone()]),
                RepositoryError::Conflict => RemediationError::Closed(vec![action_id.clone()]),
                other => RemediationError::Repository(other),
            })
    }

    async fn notify_assignee(
        &self,
        action: &RemediationAction,
        assignment: &Assignment,
        now: DateTime<Utc>,
    ) -> bool {
        let message = templates::assignment(&AssignmentNotice {
            to: &assignment.assignee.email,
            assignee_name: &assignment.assignee.name,
            action_type: action.action_type.label(),
            title: &action.title,
            description: &action.description,
            priority: action.priority.label(),
            due_date: action.due_date,
        });
        let subject = message.subject.clone();

        let outcome = match dispatch(self.mailer.as_ref(), message, "assignment").await {
            Ok(receipt) => NotificationOutcome::Delivered {
                provider_id: receipt.provider_id,
            },
            Err(error) => NotificationOutcome::Failed {
                reason: error.to_string(),
            },
        };
        let delivered = matches!(outcome, NotificationOutcome::Delivered { .. });

        let entry = LogEntry {
            id: next_entry_id(),
            notice_id: None,
            kind: NotificationKind::Assignment,
            recipient: Some(assignment.assignee.email.clone()),
            subject: Some(subject),
            outcome,
            logged_at: now,
        };
        if let Err(error) = self.log.append(entry) {
            tracing::warn!(action_id = %action.id, %error, "failed to log assignment email");
        }
        delivered
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct AssignRequest {
    pub assignee_name: String,
    pub assignee_email: String,
    #[serde(default)]
    pub assigned_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignmentOutcome {
    pub action: RemediationAction,
    pub notification_sent: bool,
}

/// Error raised by the remediation service.
#[derive(Debug, thiserror::Error)]
pub enum RemediationError {
    #[error("at least one action id is required")]
    NoActions,
    #[error("{0}")]
    InvalidAssignee(&'static str),
    #[error("status {} is not a progress marker", .0.label())]
    InvalidProgress(ActionStatus),
    #[error(transparent)]
    Notes(#[from] NotesError),
    #[error("remediation actions not found: {}", join_ids(.0))]
    NotFound(Vec<ActionId>),
    #[error("remediation actions already completed or cancelled: {}", join_ids(.0))]
    Closed(Vec<ActionId>),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl RemediationError {
    pub fn kind(&self) -> FailureKind {
        match self {
            RemediationError::NoActions
            | RemediationError::InvalidAssignee(_)
            | RemediationError::InvalidProgress(_)
            | RemediationError::Notes(_) => FailureKind::InvalidInput,
            RemediationError::NotFound(_)
            | RemediationError::Repository(RepositoryError::NotFound) => FailureKind::NotFound,
            RemediationError::Closed(_)
            | RemediationError::Repository(RepositoryError::Conflict) => FailureKind::Conflict,
            RemediationError::Repository(RepositoryError::Unavailable(_)) => {
                FailureKind::PersistenceFailed
            }
        }
    }
}

fn join_ids(ids: &[ActionId]) -> String {
    ids.iter()
        .map(ActionId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
