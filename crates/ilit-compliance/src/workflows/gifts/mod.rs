//! Gift reporting: annual-exclusion tracking for Form 709 preparation and the trust
//! fund-sufficiency aggregate that also feeds coverage scoring.

pub mod exclusion;
pub mod router;
pub mod service;
pub mod sufficiency;

#[cfg(test)]
mod tests;

pub use exclusion::{
    annual_exclusion, GiftFilter, GiftSummaryRow, GiftTaxSummary, LabelledGift, SummaryTotals,
};
pub use router::gift_router;
pub use service::{GiftReportError, GiftReportService};
pub use sufficiency::{
    assess_fund_sufficiency, available_trust_assets, lookahead_horizon, FundSufficiency,
    DEFAULT_LOOKAHEAD_DAYS,
};
