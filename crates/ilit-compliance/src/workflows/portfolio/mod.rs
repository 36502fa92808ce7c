//! Policy, trust, beneficiary, payment, and gift records shared by every compliance workflow.

pub mod domain;
pub mod repository;

pub use domain::{
    trailing_year_start, Beneficiary, BeneficiaryId, Gift, GiftId, PaymentId, PaymentMethod,
    Policy, PolicyId, PolicyStatus, PremiumFrequency, PremiumPayment, Trust, TrustId, TrustStatus,
    UpcomingPremium,
};
pub use repository::{PortfolioRepository, RepositoryError};
