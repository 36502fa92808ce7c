use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;

use super::common::*;
use crate::workflows::gifts::{gift_router, GiftReportService};

#[tokio::test]
async fn export_route_serves_csv_attachment() {
    let (_store, repositories) = seeded();
    let router = gift_router(Arc::new(GiftReportService::new(&repositories)));

    let response = router
        .oneshot(
            Request::get("/api/v1/gift-tax/export?year=2025")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/csv"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"gift-tax-summary-2025.csv\""
    );
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    assert_eq!(String::from_utf8_lossy(&bytes).lines().count(), 4);
}

#[tokio::test]
async fn sufficiency_route_validates_inputs() {
    let (_store, repositories) = seeded();
    let router = gift_router(Arc::new(GiftReportService::new(&repositories)));

    let invalid = router
        .clone()
        .oneshot(
            Request::get(format!(
                "/api/v1/trusts/{FAMILY_TRUST}/fund-sufficiency?lookahead_days=0"
            ))
            .body(Body::empty())
            .expect("request builds"),
        )
        .await
        .expect("router responds");
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

    let missing = router
        .oneshot(
            Request::get("/api/v1/trusts/trust-unknown/fund-sufficiency")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}
