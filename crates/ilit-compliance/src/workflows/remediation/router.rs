use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;

use super::domain::{ActionId, ActionStatus};
use super::service::{AssignRequest, RemediationService};
use crate::error::failure_response;
use crate::workflows::portfolio::PolicyId;

#[derive(Debug, Deserialize)]
pub struct ProgressRequest {
    pub status: ActionStatus,
}

#[derive(Debug, Deserialize)]
pub struct CompleteRequest {
    pub action_ids: Vec<ActionId>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub completed_by: Option<String>,
}

/// Router exposing the remediation task lifecycle.
pub fn remediation_router(service: Arc<RemediationService>) -> Router {
    Router::new()
        .route(
            "/api/v1/remediation/:action_id/assign",
            post(assign_handler),
        )
        .route(
            "/api/v1/remediation/:action_id/progress",
            post(progress_handler),
        )
        .route(
            "/api/v1/remediation/:action_id/cancel",
            post(cancel_handler),
        )
        .route("/api/v1/remediation/complete", post(complete_handler))
        .route(
            "/api/v1/policies/:policy_id/remediation",
            get(open_actions_handler),
        )
        .with_state(service)
}

pub(crate) async fn assign_handler(
    State(service): State<Arc<RemediationService>>,
    Path(action_id): Path<String>,
    Json(request): Json<AssignRequest>,
) -> Response {
    match service
        .assign(&ActionId(action_id), request, Utc::now())
        .await
    {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(error) => failure_response(error.kind(), error),
    }
}

pub(crate) async fn progress_handler(
    State(service): State<Arc<RemediationService>>,
    Path(action_id): Path<String>,
    Json(request): Json<ProgressRequest>,
) -> Response {
    match service.set_progress(&ActionId(action_id), request.status) {
        Ok(action) => (StatusCode::OK, Json(action)).into_response(),
        Err(error) => failure_response(error.kind(), error),
    }
}

pub(crate) async fn cancel_handler(
    State(service): State<Arc<RemediationService>>,
    Path(action_id): Path<String>,
) -> Response {
    match service.cancel(&ActionId(action_id)) {
        Ok(action) => (StatusCode::OK, Json(action)).into_response(),
        Err(error) => failure_response(error.kind(), error),
    }
}

pub(crate) async fn complete_handler(
    State(service): State<Arc<RemediationService>>,
    Json(request): Json<CompleteRequest>,
) -> Response {
    match service.complete(
        &request.action_ids,
        &request.notes,
        request.completed_by,
        Utc::now(),
    ) {
        Ok(actions) => (StatusCode::OK, Json(actions)).into_response(),
        Err(error) => failure_response(error.kind(), error),
    }
}

pub(crate) async fn open_actions_handler(
    State(service): State<Arc<RemediationService>>,
    Path(policy_id): Path<String>,
) -> Response {
    match service.open_for_policy(&PolicyId(policy_id)) {
        Ok(actions) => (StatusCode::OK, Json(actions)).into_response(),
        Err(error) => failure_response(error.kind(), error),
    }
}
