use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::workflows::portfolio::{Gift, Policy, PremiumPayment, TrustId};

pub const DEFAULT_LOOKAHEAD_DAYS: i64 = 90;

/// Funds contributed to the trust less the premiums it has already paid.
pub fn available_trust_assets(gifts: &[Gift], payments: &[PremiumPayment]) -> f64 {
    let contributed: f64 = gifts.iter().map(|gift| gift.amount).sum();
    let paid: f64 = payments.iter().map(|payment| payment.amount).sum();
    contributed - paid
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundSufficiency {
    pub trust_id: TrustId,
    pub check_date: NaiveDate,
    pub lookahead_days: i64,
    pub available_funds: f64,
    pub required_funds: f64,
    pub shortfall: f64,
    pub is_sufficient: bool,
    /// Available over required; absent when nothing falls due in the window.
    pub sufficiency_ratio: Option<f64>,
    pub months_of_coverage: Option<i64>,
    pub message: String,
}

/// Last day of a lookahead window, or `None` when the window is empty or leaves the calendar.
pub fn lookahead_horizon(today: NaiveDate, lookahead_days: i64) -> Option<NaiveDate> {
    let days = u64::try_from(lookahead_days).ok().filter(|days| *days > 0)?;
    today.checked_add_days(Days::new(days))
}

/// Compares available trust assets with the annual premiums of policies due inside the window.
pub fn assess_fund_sufficiency(
    trust_id: &TrustId,
    gifts: &[Gift],
    payments: &[PremiumPayment],
    policies: &[Policy],
    today: NaiveDate,
    horizon: NaiveDate,
) -> FundSufficiency {
    let lookahead_days = (horizon - today).num_days();
    let available_funds = available_trust_assets(gifts, payments);
    let required_funds: f64 = policies
        .iter()
        .filter(|policy| {
            policy
                .next_premium_due
                .is_some_and(|due| due >= today && due <= horizon)
        })
        .map(|policy| policy.annual_premium)
        .sum();

    let is_sufficient = available_funds >= required_funds;
    let shortfall = if is_sufficient {
        0.0
    } else {
        required_funds - available_funds
    };
    let sufficiency_ratio = (required_funds > 0.0).then(|| available_funds / required_funds);
    let months_of_coverage = sufficiency_ratio.map(|ratio| (ratio * 12.0).floor() as i64);
    let message = if is_sufficient {
        "Sufficient funds available for upcoming premiums".to_string()
    } else {
        format!("Shortfall of {shortfall:.2} for upcoming premiums")
    };

    FundSufficiency {
        trust_id: trust_id.clone(),
        check_date: today,
        lookahead_days,
        available_funds,
        required_funds,
        shortfall,
        is_sufficient,
        sufficiency_ratio,
        months_of_coverage,
        message,
    }
}
