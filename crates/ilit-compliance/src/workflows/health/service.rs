use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Utc};
use serde::Serialize;

use super::advisory::{consult, PolicyAdvisor};
use super::domain::{
    CheckTrigger, FindingSource, HealthCheck, HealthCheckId, HealthCheckSummary, HealthIssue,
    OverallStatus, Recommendation, Severity,
};
use super::repository::HealthCheckRepository;
use super::scoring::{assess, combine};
use super::snapshot::{PolicySnapshot, SnapshotError};
use crate::error::FailureKind;
use crate::notifications::log::next_entry_id;
use crate::notifications::templates::{self, AlertAction, AlertIssue, RemediationAlert};
use crate::notifications::{
    dispatch, LogEntry, Mailer, NotificationKind, NotificationLog, NotificationOutcome,
};
use crate::store::Repositories;
use crate::workflows::crummey::repository::NoticeRepository;
use crate::workflows::portfolio::{Policy, PolicyId, PortfolioRepository, RepositoryError, Trust};
use crate::workflows::remediation::domain::{ActionId, ActionPriority, ActionStatus, RemediationAction};
use crate::workflows::remediation::repository::RemediationRepository;

const TITLE_LIMIT: usize = 100;
const RECENT_CHECK_HOURS: i64 = 24;
const STALE_CHECK_DAYS: i64 = 90;

static HEALTH_CHECK_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static ACTION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_health_check_id() -> HealthCheckId {
    let id = HEALTH_CHECK_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    HealthCheckId(format!("hc-{id:06}"))
}

pub(crate) fn next_action_id() -> ActionId {
    let id = ACTION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ActionId(format!("act-{id:06}"))
}

/// Tuning for health check runs.
#[derive(Debug, Clone, Copy)]
pub struct HealthCheckSettings {
    pub advisory_timeout: Duration,
    pub batch_size: usize,
    pub batch_pause: Duration,
}

impl Default for HealthCheckSettings {
    fn default() -> Self {
        Self {
            advisory_timeout: Duration::from_secs(20),
            batch_size: 50,
            batch_pause: Duration::ZERO,
        }
    }
}

/// Orchestrates snapshot assembly, scoring, persistence, and remediation follow-up.
pub struct HealthCheckService {
    portfolio: Arc<dyn PortfolioRepository>,
    notices: Arc<dyn NoticeRepository>,
    checks: Arc<dyn HealthCheckRepository>,
    remediation: Arc<dyn RemediationRepository>,
    log: Arc<dyn NotificationLog>,
    advisor: Arc<dyn PolicyAdvisor>,
    mailer: Arc<dyn Mailer>,
    settings: HealthCheckSettings,
}

impl HealthCheckService {
    pub fn new(
        repositories: &Repositories,
        advisor: Arc<dyn PolicyAdvisor>,
        mailer: Arc<dyn Mailer>,
        settings: HealthCheckSettings,
    ) -> Self {
        Self {
            portfolio: Arc::clone(&repositories.portfolio),
            notices: Arc::clone(&repositories.notices),
            checks: Arc::clone(&repositories.health_checks),
            remediation: Arc::clone(&repositories.remediation),
            log: Arc::clone(&repositories.notification_log),
            advisor,
            mailer,
            settings,
        }
    }

    /// Run one health check and persist the result.
    pub async fn run(
        &self,
        policy_id: &str,
        trigger: CheckTrigger,
        now: DateTime<Utc>,
    ) -> Result<HealthCheckSummary, HealthCheckError> {
        let policy_id = policy_id.trim();
        if policy_id.is_empty() {
            return Err(HealthCheckError::MissingPolicyId);
        }
        let policy_id = PolicyId::new(policy_id);
        let today = now.date_naive();

        let snapshot = PolicySnapshot::assemble(
            self.portfolio.as_ref(),
            self.notices.as_ref(),
            &policy_id,
            today,
        )?;

        let rules = assess(&snapshot);
        let advisory = consult(
            self.advisor.as_ref(),
            &snapshot,
            &rules.scores,
            self.settings.advisory_timeout,
        )
        .await;
        let hybrid = combine(&rules.scores, advisory.confidence);

        let mut issues = rules.issues;
        issues.extend(advisory.issues);
        let mut recommendations = rules.recommendations;
        recommendations.extend(advisory.recommendations);

        let check = HealthCheck {
            id: next_health_check_id(),
            policy_id: policy_id.clone(),
            trust_id: snapshot.trust.id.clone(),
            check_date: today,
            checked_at: now,
            trigger,
            overall_status: hybrid.overall_status,
            health_score: hybrid.health_score,
            rule_score: hybrid.rule_score,
            component_scores: rules.scores,
            remediation_required: issues.iter().any(|issue| issue.requires_remediation),
            remediation_priority: remediation_priority(&issues),
            issues,
            recommendations,
            ai_summary: advisory.summary,
            ai_confidence: advisory.confidence,
            ai_model: self.advisor.model().to_string(),
        };

        self.checks.insert(check.clone()).map_err(|error| {
            tracing::error!(policy_id = %policy_id, %error, "failed to persist health check");
            HealthCheckError::Persistence(error)
        })?;

        let actions = build_actions(&check, now);
        let created = if actions.is_empty() {
            Vec::new()
        } else {
            match self.remediation.insert_batch(actions.clone()) {
                Ok(()) => actions,
                Err(error) => {
                    tracing::warn!(
                        health_check_id = %check.id,
                        %error,
                        "failed to create remediation actions"
                    );
                    Vec::new()
                }
            }
        };

        let notification_sent = if created.is_empty() {
            false
        } else {
            self.send_remediation_alert(&snapshot.policy, &snapshot.trust, &check, &created, now)
                .await
        };

        tracing::info!(
            policy_id = %policy_id,
            health_check_id = %check.id,
            trigger = trigger.label(),
            status = check.overall_status.label(),
            score = check.health_score,
            rule_score = check.rule_score,
            actions = created.len(),
            notification_sent,
            "health check completed"
        );

        Ok(HealthCheckSummary {
            health_check_id: check.id,
            policy_id,
            overall_status: check.overall_status,
            health_score: check.health_score,
            rule_score: check.rule_score,
            component_scores: check.component_scores,
            issues_count: check.issues.len(),
            remediation_actions_created: created.len(),
            notification_sent,
            ai_confidence: check.ai_confidence,
        })
    }

    pub fn latest(&self, policy_id: &PolicyId) -> Result<HealthCheck, HealthCheckError> {
        self.checks
            .latest_for_policy(policy_id)?
            .ok_or_else(|| HealthCheckError::NoChecks(policy_id.clone()))
    }

    /// Check every active policy that was not checked in the last day, most pressing first.
    pub async fn run_scheduled(
        &self,
        now: DateTime<Utc>,
    ) -> Result<ScheduledRunReport, HealthCheckError> {
        let today = now.date_naive();
        let policies = self.portfolio.active_policies()?;
        let mut report = ScheduledRunReport {
            total_active: policies.len(),
            ..ScheduledRunReport::default()
        };

        let mut queue = Vec::new();
        for policy in policies {
            let latest = self.checks.latest_for_policy(&policy.id)?;
            if let Some(check) = &latest {
                if now - check.checked_at < ChronoDuration::hours(RECENT_CHECK_HOURS) {
                    report.skipped_recent += 1;
                    continue;
                }
            }
            let last_checked = latest.as_ref().map(|check| check.check_date);
            let priority = schedule_priority(&policy, last_checked, today);
            queue.push((priority, policy.id));
        }
        queue.sort_by(|a, b| b.0.cmp(&a.0));
        report.eligible = queue.len();

        let batch_size = self.settings.batch_size.max(1);
        let batch_count = queue.len().div_ceil(batch_size);
        for (index, batch) in queue.chunks(batch_size).enumerate() {
            tracing::info!(
                batch = index + 1,
                batch_count,
                size = batch.len(),
                "running health check batch"
            );
            for (priority, policy_id) in batch {
                match self.run(policy_id.as_str(), CheckTrigger::Scheduled, now).await {
                    Ok(summary) => {
                        report.checks_run += 1;
                        report.remediations_created += summary.remediation_actions_created;
                        if summary.notification_sent {
                            report.notifications_sent += 1;
                        }
                        match summary.overall_status {
                            OverallStatus::Healthy => report.healthy += 1,
                            OverallStatus::Warning => report.warning += 1,
                            OverallStatus::Critical => report.critical += 1,
                            OverallStatus::Unknown => {}
                        }
                    }
                    Err(error) => {
                        tracing::warn!(
                            policy_id = %policy_id,
                            priority = priority.label(),
                            %error,
                            "scheduled health check failed"
                        );
                        report.failures.push(ScheduledFailure {
                            policy_id: policy_id.clone(),
                            error: error.to_string(),
                        });
                    }
                }
            }
            if index + 1 < batch_count && !self.settings.batch_pause.is_zero() {
                tokio::time::sleep(self.settings.batch_pause).await;
            }
        }

        tracing::info!(
            eligible = report.eligible,
            checks_run = report.checks_run,
            critical = report.critical,
            failures = report.failures.len(),
            "scheduled health checks finished"
        );
        Ok(report)
    }

    async fn send_remediation_alert(
        &self,
        policy: &Policy,
        trust: &Trust,
        check: &HealthCheck,
        actions: &[RemediationAction],
        now: DateTime<Utc>,
    ) -> bool {
        let Some(trustee_email) = trust.trustee_contact() else {
            tracing::info!(
                trust_id = %trust.id,
                "no trustee email on file; skipping remediation alert"
            );
            return false;
        };

        let message = templates::remediation_alert(&RemediationAlert {
            to: trustee_email,
            trustee_name: &trust.trustee_name,
            trust_name: &trust.name,
            carrier: &policy.carrier,
            policy_number: &policy.policy_number,
            overall_status: check.overall_status.label(),
            health_score: check.health_score,
            check_date: check.check_date,
            issues: check
                .issues
                .iter()
                .filter(|issue| issue.severity.warrants_action())
                .map(|issue| AlertIssue {
                    severity: issue.severity.label(),
                    description: &issue.description,
                })
                .collect(),
            actions: actions
                .iter()
                .map(|action| AlertAction {
                    title: &action.title,
                    priority: action.priority.label(),
                    due_date: action.due_date,
                })
                .collect(),
        });
        let subject = message.subject.clone();

        let outcome = match dispatch(self.mailer.as_ref(), message, "remediation_alert").await {
            Ok(receipt) => {
                let ids: Vec<ActionId> = actions.iter().map(|action| action.id.clone()).collect();
                if let Err(error) = self.remediation.mark_alerted(&ids) {
                    tracing::warn!(
                        health_check_id = %check.id,
                        %error,
                        "failed to flag alerted actions"
                    );
                }
                NotificationOutcome::Delivered {
                    provider_id: receipt.provider_id,
                }
            }
            Err(error) => NotificationOutcome::Failed {
                reason: error.to_string(),
            },
        };
        let delivered = matches!(outcome, NotificationOutcome::Delivered { .. });

        let entry = LogEntry {
            id: next_entry_id(),
            notice_id: None,
            kind: NotificationKind::RemediationAlert,
            recipient: Some(trustee_email.to_string()),
            subject: Some(subject),
            outcome,
            logged_at: now,
        };
        if let Err(error) = self.log.append(entry) {
            tracing::warn!(health_check_id = %check.id, %error, "failed to log remediation alert");
        }

        delivered
    }
}

fn remediation_priority(issues: &[HealthIssue]) -> ActionPriority {
    if issues.iter().any(|issue| issue.severity == Severity::Critical) {
        ActionPriority::Urgent
    } else if issues.iter().any(|issue| issue.severity == Severity::High) {
        ActionPriority::High
    } else {
        ActionPriority::Medium
    }
}

/// One action per actionable issue, paired with the first recommendation for the same action type.
pub(crate) fn build_actions(check: &HealthCheck, now: DateTime<Utc>) -> Vec<RemediationAction> {
    check
        .issues
        .iter()
        .filter(|issue| issue.is_actionable())
        .filter_map(|issue| {
            let (priority, due_in_days) = issue.severity.action_terms()?;
            let action_type = issue.kind.action_type();
            let recommendation_text = check
                .recommendations
                .iter()
                .find(|rec| rec.action.action_type() == Some(action_type))
                .map(|rec: &Recommendation| rec.description.clone());

            Some(RemediationAction {
                id: next_action_id(),
                health_check_id: check.id.clone(),
                policy_id: check.policy_id.clone(),
                trust_id: check.trust_id.clone(),
                action_type,
                priority,
                title: issue.description.chars().take(TITLE_LIMIT).collect(),
                description: issue.description.clone(),
                due_date: check.check_date + ChronoDuration::days(due_in_days),
                status: ActionStatus::Pending,
                assignment: None,
                completion: None,
                ai_suggested: issue.source == FindingSource::Advisory,
                recommendation_text,
                email_alert_sent: false,
                created_at: now,
            })
        })
        .collect()
}

fn schedule_priority(
    policy: &Policy,
    last_checked: Option<NaiveDate>,
    today: NaiveDate,
) -> ActionPriority {
    let due_in = policy
        .upcoming_premium()
        .map(|upcoming| upcoming.days_until_due(today));

    let mut priority = match due_in {
        Some(days) if (0..=7).contains(&days) => ActionPriority::Urgent,
        Some(days) if (8..=30).contains(&days) => ActionPriority::High,
        _ => ActionPriority::Low,
    };

    match last_checked {
        None => priority = priority.max(ActionPriority::High),
        Some(date) if (today - date).num_days() > STALE_CHECK_DAYS => {
            priority = priority.max(ActionPriority::Medium)
        }
        Some(_) => {}
    }

    priority
}

/// Totals from a scheduled batch run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScheduledRunReport {
    pub total_active: usize,
    pub skipped_recent: usize,
    pub eligible: usize,
    pub checks_run: usize,
    pub healthy: usize,
    pub warning: usize,
    pub critical: usize,
    pub remediations_created: usize,
    pub notifications_sent: usize,
    pub failures: Vec<ScheduledFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduledFailure {
    pub policy_id: PolicyId,
    pub error: String,
}

/// Error raised by the health check service.
#[derive(Debug, thiserror::Error)]
pub enum HealthCheckError {
    #[error("policy_id is required")]
    MissingPolicyId,
    #[error("no health checks recorded for policy {0}")]
    NoChecks(PolicyId),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error("failed to persist health check: {0}")]
    Persistence(RepositoryError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl HealthCheckError {
    pub fn kind(&self) -> FailureKind {
        match self {
            HealthCheckError::MissingPolicyId => FailureKind::InvalidInput,
            HealthCheckError::NoChecks(_)
            | HealthCheckError::Snapshot(SnapshotError::PolicyNotFound(_))
            | HealthCheckError::Snapshot(SnapshotError::TrustNotFound(_)) => FailureKind::NotFound,
            HealthCheckError::Snapshot(SnapshotError::Repository(_))
            | HealthCheckError::Persistence(_)
            | HealthCheckError::Repository(_) => FailureKind::PersistenceFailed,
        }
    }
}
