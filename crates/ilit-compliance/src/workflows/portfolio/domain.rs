use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

pub(crate) use record_id;

record_id!(
    /// Identifier for an insurance policy owned by a trust.
    PolicyId
);
record_id!(
    /// Identifier for an ILIT.
    TrustId
);
record_id!(BeneficiaryId);
record_id!(GiftId);
record_id!(PaymentId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyStatus {
    Active,
    GracePeriod,
    Lapsed,
}

impl PolicyStatus {
    pub const fn label(self) -> &'static str {
        match self {
            PolicyStatus::Active => "active",
            PolicyStatus::GracePeriod => "grace_period",
            PolicyStatus::Lapsed => "lapsed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PremiumFrequency {
    Annual,
    SemiAnnual,
    Quarterly,
    Monthly,
}

impl PremiumFrequency {
    pub const fn installments_per_year(self) -> u32 {
        match self {
            PremiumFrequency::Annual => 1,
            PremiumFrequency::SemiAnnual => 2,
            PremiumFrequency::Quarterly => 4,
            PremiumFrequency::Monthly => 12,
        }
    }
}

/// Life insurance policy held by an ILIT.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    pub id: PolicyId,
    pub trust_id: TrustId,
    pub carrier: String,
    pub policy_number: String,
    #[serde(default)]
    pub insured_name: Option<String>,
    /// Owner of record as printed on the policy.
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub death_benefit: Option<f64>,
    pub annual_premium: f64,
    pub premium_frequency: PremiumFrequency,
    pub status: PolicyStatus,
    #[serde(default)]
    pub next_premium_due: Option<NaiveDate>,
}

impl Policy {
    pub fn installment_amount(&self) -> f64 {
        self.annual_premium / f64::from(self.premium_frequency.installments_per_year())
    }

    /// The single next-due premium record, if the carrier has published one.
    pub fn upcoming_premium(&self) -> Option<UpcomingPremium> {
        self.next_premium_due.map(|due_date| UpcomingPremium {
            due_date,
            amount_due: self.installment_amount(),
        })
    }

    /// Whether the owner of record names a trust, i.e. contains the word "trust". Policies
    /// without a recorded owner are not flagged.
    pub fn owner_indicates_trust(&self) -> bool {
        match self.owner.as_deref() {
            Some(owner) => owner
                .split(|c: char| !c.is_alphanumeric())
                .any(|word| word.eq_ignore_ascii_case("trust")),
            None => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UpcomingPremium {
    pub due_date: NaiveDate,
    pub amount_due: f64,
}

impl UpcomingPremium {
    /// Negative when the premium is overdue.
    pub fn days_until_due(&self, today: NaiveDate) -> i64 {
        (self.due_date - today).num_days()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustStatus {
    Active,
    Inactive,
    Terminated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trust {
    pub id: TrustId,
    pub name: String,
    pub grantor_name: String,
    pub trustee_name: String,
    #[serde(default)]
    pub trustee_email: Option<String>,
    pub status: TrustStatus,
}

impl Trust {
    pub fn trustee_contact(&self) -> Option<&str> {
        self.trustee_email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Beneficiary {
    pub id: BeneficiaryId,
    pub trust_id: TrustId,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub relationship: Option<String>,
    /// Withdrawal share in percent (0-100).
    #[serde(default)]
    pub share_percentage: Option<f64>,
}

impl Beneficiary {
    pub fn contact_email(&self) -> Option<&str> {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Check,
    Wire,
    Ach,
    Other,
}

/// Recorded premium payment. Never mutated once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PremiumPayment {
    pub id: PaymentId,
    pub policy_id: PolicyId,
    pub amount: f64,
    pub payment_date: NaiveDate,
    pub due_date: NaiveDate,
    pub method: PaymentMethod,
}

impl PremiumPayment {
    /// Days between the due date and the payment; negative for early payments.
    pub fn days_late(&self) -> i64 {
        (self.payment_date - self.due_date).num_days()
    }
}

/// Contribution from a donor into a trust.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gift {
    pub id: GiftId,
    pub trust_id: TrustId,
    pub donor_name: String,
    #[serde(default)]
    pub donor_email: Option<String>,
    /// Beneficiary the gift is designated for, when the donor named one.
    #[serde(default)]
    pub beneficiary_id: Option<BeneficiaryId>,
    pub amount: f64,
    pub gift_date: NaiveDate,
}

/// Start of the trailing twelve-month window ending on `as_of`.
pub fn trailing_year_start(as_of: NaiveDate) -> NaiveDate {
    as_of
        .checked_sub_months(chrono::Months::new(12))
        .unwrap_or_else(|| as_of - Duration::days(365))
}
