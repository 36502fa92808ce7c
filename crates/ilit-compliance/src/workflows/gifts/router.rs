use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;

use super::exclusion::GiftFilter;
use super::service::GiftReportService;
use crate::error::failure_response;
use crate::workflows::portfolio::TrustId;

#[derive(Debug, Default, Deserialize)]
pub struct GiftTaxQuery {
    pub year: Option<i32>,
    pub donor: Option<String>,
    pub trust_id: Option<String>,
}

impl GiftTaxQuery {
    fn filter(self) -> GiftFilter {
        GiftFilter {
            year: self.year,
            donor: self.donor,
            trust_id: self.trust_id.map(TrustId),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SufficiencyQuery {
    pub lookahead_days: Option<i64>,
}

/// Router exposing the gift-tax report and fund-sufficiency checks.
pub fn gift_router(service: Arc<GiftReportService>) -> Router {
    Router::new()
        .route("/api/v1/gift-tax/summary", get(summary_handler))
        .route("/api/v1/gift-tax/export", get(export_handler))
        .route(
            "/api/v1/trusts/:trust_id/fund-sufficiency",
            get(sufficiency_handler),
        )
        .with_state(service)
}

pub(crate) async fn summary_handler(
    State(service): State<Arc<GiftReportService>>,
    Query(query): Query<GiftTaxQuery>,
) -> Response {
    match service.summary(&query.filter(), Utc::now().date_naive()) {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(error) => failure_response(error.kind(), error),
    }
}

pub(crate) async fn export_handler(
    State(service): State<Arc<GiftReportService>>,
    Query(query): Query<GiftTaxQuery>,
) -> Response {
    let file_name = match query.year {
        Some(year) => format!("gift-tax-summary-{year}.csv"),
        None => "gift-tax-summary-all.csv".to_string(),
    };
    match service.export_csv(&query.filter(), Utc::now().date_naive()) {
        Ok(body) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{file_name}\""),
                ),
            ],
            body,
        )
            .into_response(),
        Err(error) => failure_response(error.kind(), error),
    }
}

pub(crate) async fn sufficiency_handler(
    State(service): State<Arc<GiftReportService>>,
    Path(trust_id): Path<String>,
    Query(query): Query<SufficiencyQuery>,
) -> Response {
    match service.fund_sufficiency(
        &TrustId(trust_id),
        query.lookahead_days,
        Utc::now().date_naive(),
    ) {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(error) => failure_response(error.kind(), error),
    }
}
