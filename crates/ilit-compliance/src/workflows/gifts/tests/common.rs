use std::sync::Arc;

use chrono::NaiveDate;

pub(super) use crate::store::fixtures::*;
use crate::store::{MemoryStore, Repositories};
use crate::workflows::portfolio::{BeneficiaryId, Gift};

pub(super) const FAMILY_TRUST: &str = "trust-hargrove";
pub(super) const PRICE_TRUST: &str = "trust-price";

pub(super) fn today() -> NaiveDate {
    date(2025, 6, 1)
}

fn designated(id: &str, amount: f64, gift_date: NaiveDate, beneficiary: &str) -> Gift {
    Gift {
        beneficiary_id: Some(BeneficiaryId::new(beneficiary)),
        ..gift(id, FAMILY_TRUST, amount, gift_date)
    }
}

/// Two trusts, two donors, and gifts spread over 2024 and 2025.
///
/// The family trust holds $55,000 of gifts against a $10,000 premium due in July. The Price
/// trust holds $20,000 less a $5,000 payment against a $30,000 premium due in August.
pub(super) fn seeded() -> (Arc<MemoryStore>, Repositories) {
    let (store, repositories) = repositories();

    store.insert_trust(trust(FAMILY_TRUST)).expect("trust stored");
    let mut price = trust(PRICE_TRUST);
    price.name = "Price Legacy ILIT".to_string();
    store.insert_trust(price).expect("trust stored");

    store
        .insert_beneficiary(beneficiary("ben-amelia", FAMILY_TRUST, "Amelia Hargrove"))
        .expect("beneficiary stored");
    store
        .insert_beneficiary(beneficiary("ben-theo", FAMILY_TRUST, "Theo Hargrove"))
        .expect("beneficiary stored");

    let mut family_policy = policy("pol-family", FAMILY_TRUST);
    family_policy.next_premium_due = Some(date(2025, 7, 15));
    store.insert_policy(family_policy).expect("policy stored");

    let mut price_policy = policy("pol-price", PRICE_TRUST);
    price_policy.annual_premium = 30_000.0;
    price_policy.next_premium_due = Some(date(2025, 8, 1));
    store.insert_policy(price_policy).expect("policy stored");

    for gift in [
        designated("gift-1", 12_000.0, date(2025, 2, 10), "ben-amelia"),
        designated("gift-2", 10_000.0, date(2025, 7, 1), "ben-amelia"),
        designated("gift-3", 15_000.0, date(2025, 3, 1), "ben-theo"),
        designated("gift-4", 18_000.0, date(2024, 5, 1), "ben-amelia"),
        Gift {
            donor_name: "Walter Price".to_string(),
            donor_email: None,
            ..gift("gift-5", PRICE_TRUST, 20_000.0, date(2025, 4, 1))
        },
    ] {
        store.record_gift(gift).expect("gift stored");
    }

    store
        .record_payment(payment(
            "pay-price",
            "pol-price",
            5_000.0,
            date(2024, 8, 1),
            date(2024, 8, 1),
        ))
        .expect("payment stored");

    (store, repositories)
}
