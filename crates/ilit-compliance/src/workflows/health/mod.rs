//! Policy health checks: snapshot assembly, rule scoring, the advisory pass, and the
//! remediation follow-up that closes the loop on critical findings.

pub mod advisory;
pub mod domain;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;
pub mod snapshot;

#[cfg(test)]
mod tests;

pub use advisory::{
    consult, AdvisoryAssessment, AdvisoryError, AdvisoryFindings, DisabledAdvisor, GeminiAdvisor,
    PolicyAdvisor,
};
pub use domain::{
    CheckTrigger, ComponentScores, FindingSource, HealthCheck, HealthCheckId, HealthCheckSummary,
    HealthIssue, IssueKind, OverallStatus, Recommendation, RecommendedAction, Severity,
};
pub use repository::HealthCheckRepository;
pub use router::health_router;
pub use service::{
    HealthCheckError, HealthCheckService, HealthCheckSettings, ScheduledFailure,
    ScheduledRunReport,
};
pub use snapshot::{PolicySnapshot, SnapshotError};
