use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::health::domain::HealthCheckId;
use crate::workflows::portfolio::domain::record_id;
use crate::workflows::portfolio::{PolicyId, TrustId};

record_id!(
    /// Identifier for a tracked remediation task.
    ActionId
);

pub const MAX_COMPLETION_NOTES: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    PayPremium,
    FundTrust,
    ReviewCompliance,
    VerifyOwnership,
    Custom,
}

impl ActionType {
    pub const fn label(self) -> &'static str {
        match self {
            ActionType::PayPremium => "pay_premium",
            ActionType::FundTrust => "fund_trust",
            ActionType::ReviewCompliance => "review_compliance",
            ActionType::VerifyOwnership => "verify_ownership",
            ActionType::Custom => "custom",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl ActionPriority {
    pub const fn label(self) -> &'static str {
        match self {
            ActionPriority::Low => "low",
            ActionPriority::Medium => "medium",
            ActionPriority::High => "high",
            ActionPriority::Urgent => "urgent",
        }
    }

    /// Lenient parse used for advisory output; unknown labels fall back to `Low`.
    pub fn from_label(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "urgent" | "critical" => ActionPriority::Urgent,
            "high" => ActionPriority::High,
            "medium" => ActionPriority::Medium,
            _ => ActionPriority::Low,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl ActionStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ActionStatus::Pending => "pending",
            ActionStatus::InProgress => "in_progress",
            ActionStatus::Completed => "completed",
            ActionStatus::Cancelled => "cancelled",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, ActionStatus::Completed | ActionStatus::Cancelled)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignee {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub assignee: Assignee,
    pub assigned_at: DateTime<Utc>,
    #[serde(default)]
    pub assigned_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    pub notes: String,
    pub completed_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_by: Option<String>,
}

/// Task raised by a health check for a critical or high issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemediationAction {
    pub id: ActionId,
    pub health_check_id: HealthCheckId,
    pub policy_id: PolicyId,
    pub trust_id: TrustId,
    pub action_type: ActionType,
    pub priority: ActionPriority,
    pub title: String,
    pub description: String,
    pub due_date: NaiveDate,
    pub status: ActionStatus,
    pub assignment: Option<Assignment>,
    pub completion: Option<Completion>,
    pub ai_suggested: bool,
    pub recommendation_text: Option<String>,
    pub email_alert_sent: bool,
    pub created_at: DateTime<Utc>,
}

impl RemediationAction {
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.status.is_terminal() && self.due_date < today
    }
}

/// Completion notes that already passed the non-empty and length checks. The length limit
/// applies to the notes as submitted, before trimming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionNotes(String);

impl CompletionNotes {
    pub fn parse(raw: &str) -> Result<Self, NotesError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(NotesError::Empty);
        }
        let length = raw.chars().count();
        if length > MAX_COMPLETION_NOTES {
            return Err(NotesError::TooLong { length });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotesError {
    #[error("completion notes are required")]
    Empty,
    #[error("completion notes must be {MAX_COMPLETION_NOTES} characters or fewer (got {length})")]
    TooLong { length: usize },
}
