use super::common::*;
use crate::error::FailureKind;
use crate::workflows::gifts::{GiftReportError, GiftReportService};
use crate::workflows::portfolio::TrustId;

#[test]
fn premium_inside_window_drives_the_shortfall() {
    let (_store, repositories) = seeded();
    let service = GiftReportService::new(&repositories);

    let report = service
        .fund_sufficiency(&TrustId::new(PRICE_TRUST), None, today())
        .expect("assessment succeeds");

    assert_eq!(report.lookahead_days, 90);
    assert_eq!(report.available_funds, 15_000.0);
    assert_eq!(report.required_funds, 30_000.0);
    assert_eq!(report.shortfall, 15_000.0);
    assert!(!report.is_sufficient);
    assert_eq!(report.sufficiency_ratio, Some(0.5));
    assert_eq!(report.months_of_coverage, Some(6));
    assert_eq!(report.message, "Shortfall of 15000.00 for upcoming premiums");
}

#[test]
fn premium_outside_window_is_not_required() {
    let (_store, repositories) = seeded();
    let service = GiftReportService::new(&repositories);

    let report = service
        .fund_sufficiency(&TrustId::new(PRICE_TRUST), Some(30), today())
        .expect("assessment succeeds");

    assert_eq!(report.required_funds, 0.0);
    assert!(report.is_sufficient);
    assert_eq!(report.sufficiency_ratio, None);
    assert_eq!(report.months_of_coverage, None);
    assert_eq!(
        report.message,
        "Sufficient funds available for upcoming premiums"
    );
}

#[test]
fn well_funded_trust_is_sufficient() {
    let (_store, repositories) = seeded();
    let service = GiftReportService::new(&repositories);

    let report = service
        .fund_sufficiency(&TrustId::new(FAMILY_TRUST), Some(60), today())
        .expect("assessment succeeds");

    assert_eq!(report.available_funds, 55_000.0);
    assert_eq!(report.required_funds, 10_000.0);
    assert!(report.is_sufficient);
    assert_eq!(report.months_of_coverage, Some(66));
}

#[test]
fn rejects_bad_lookahead_and_unknown_trust() {
    let (_store, repositories) = seeded();
    let service = GiftReportService::new(&repositories);

    let invalid = service
        .fund_sufficiency(&TrustId::new(FAMILY_TRUST), Some(0), today())
        .expect_err("zero lookahead rejected");
    assert!(matches!(invalid, GiftReportError::InvalidLookahead(0)));
    assert_eq!(invalid.kind(), FailureKind::InvalidInput);

    let missing = service
        .fund_sufficiency(&TrustId::new("trust-unknown"), None, today())
        .expect_err("unknown trust");
    assert_eq!(missing.kind(), FailureKind::NotFound);
}

#[test]
fn lookahead_past_the_calendar_is_invalid() {
    let (_store, repositories) = seeded();
    let service = GiftReportService::new(&repositories);

    for lookahead in [1_000_000_000, i64::MAX] {
        let error = service
            .fund_sufficiency(&TrustId::new(FAMILY_TRUST), Some(lookahead), today())
            .expect_err("lookahead rejected");
        assert!(matches!(error, GiftReportError::InvalidLookahead(days) if days == lookahead));
        assert_eq!(error.kind(), FailureKind::InvalidInput);
    }
}
