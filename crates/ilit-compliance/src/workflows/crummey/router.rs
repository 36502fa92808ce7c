use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;

use super::alerts::DeadlineAlertService;
use super::domain::NoticeId;
use super::service::CrummeyService;
use crate::error::failure_response;
use crate::workflows::portfolio::GiftId;

/// Shared state for the notice endpoints.
pub struct NoticeState {
    pub notices: CrummeyService,
    pub alerts: DeadlineAlertService,
}

#[derive(Debug, Default, Deserialize)]
pub struct AlertSweepRequest {
    #[serde(default)]
    pub window_days: Option<i64>,
}

/// Router exposing notice issuance, delivery, exercise, and the recurring sweeps.
pub fn notice_router(state: Arc<NoticeState>) -> Router {
    Router::new()
        .route("/api/v1/gifts/:gift_id/notices", post(issue_handler))
        .route("/api/v1/notices/:notice_id/send", post(send_handler))
        .route("/api/v1/notices/:notice_id/exercise", post(exercise_handler))
        .route("/api/v1/notices/sweeps/expire", post(expire_handler))
        .route(
            "/api/v1/notices/sweeps/deadline-alerts",
            post(deadline_alert_handler),
        )
        .with_state(state)
}

pub(crate) async fn issue_handler(
    State(state): State<Arc<NoticeState>>,
    Path(gift_id): Path<String>,
) -> Response {
    match state
        .notices
        .issue_for_gift(&GiftId(gift_id), Utc::now().date_naive())
    {
        Ok(notices) => (StatusCode::CREATED, Json(notices)).into_response(),
        Err(error) => failure_response(error.kind(), error),
    }
}

pub(crate) async fn send_handler(
    State(state): State<Arc<NoticeState>>,
    Path(notice_id): Path<String>,
) -> Response {
    match state.notices.send(&NoticeId(notice_id), Utc::now()).await {
        Ok(dispatch) => (StatusCode::OK, Json(dispatch)).into_response(),
        Err(error) => failure_response(error.kind(), error),
    }
}

pub(crate) async fn exercise_handler(
    State(state): State<Arc<NoticeState>>,
    Path(notice_id): Path<String>,
) -> Response {
    match state.notices.record_exercise(&NoticeId(notice_id), Utc::now()) {
        Ok(notice) => (StatusCode::OK, Json(notice)).into_response(),
        Err(error) => failure_response(error.kind(), error),
    }
}

pub(crate) async fn expire_handler(State(state): State<Arc<NoticeState>>) -> Response {
    let now = Utc::now();
    match state.notices.expire_overdue(now.date_naive(), now) {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(error) => failure_response(error.kind(), error),
    }
}

pub(crate) async fn deadline_alert_handler(
    State(state): State<Arc<NoticeState>>,
    payload: Option<Json<AlertSweepRequest>>,
) -> Response {
    let window_days = payload.and_then(|Json(request)| request.window_days);
    match state.alerts.run(window_days, Utc::now()).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(error) => failure_response(error.kind(), error),
    }
}
