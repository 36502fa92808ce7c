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

use super::domain::CheckTrigger;
use super::service::HealthCheckService;
use crate::error::failure_response;
use crate::workflows::portfolio::PolicyId;

#[derive(Debug, Default, Deserialize)]
pub struct RunRequest {
    #[serde(default)]
    pub trigger: Option<CheckTrigger>,
}

/// Router exposing on-demand, latest, and scheduled health checks.
pub fn health_router(service: Arc<HealthCheckService>) -> Router {
    Router::new()
        .route(
            "/api/v1/policies/:policy_id/health-checks",
            post(run_handler),
        )
        .route(
            "/api/v1/policies/:policy_id/health-checks/latest",
            get(latest_handler),
        )
        .route("/api/v1/health-checks/scheduled", post(scheduled_handler))
        .with_state(service)
}

pub(crate) async fn run_handler(
    State(service): State<Arc<HealthCheckService>>,
    Path(policy_id): Path<String>,
    payload: Option<Json<RunRequest>>,
) -> Response {
    let trigger = payload
        .and_then(|Json(request)| request.trigger)
        .unwrap_or(CheckTrigger::Api);

    match service.run(&policy_id, trigger, Utc::now()).await {
        Ok(summary) => (StatusCode::CREATED, Json(summary)).into_response(),
        Err(error) => failure_response(error.kind(), error),
    }
}

pub(crate) async fn latest_handler(
    State(service): State<Arc<HealthCheckService>>,
    Path(policy_id): Path<String>,
) -> Response {
    match service.latest(&PolicyId(policy_id)) {
        Ok(check) => (StatusCode::OK, Json(check)).into_response(),
        Err(error) => failure_response(error.kind(), error),
    }
}

pub(crate) async fn scheduled_handler(State(service): State<Arc<HealthCheckService>>) -> Response {
    match service.run_scheduled(Utc::now()).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(error) => failure_response(error.kind(), error),
    }
}
