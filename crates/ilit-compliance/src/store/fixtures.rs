//! Portfolio records and doubles shared by the workflow test suites.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use super::{MemoryStore, Repositories};
use crate::notifications::{DeliveryReceipt, EmailMessage, MailError, Mailer};
use crate::workflows::crummey::{CrummeyNotice, NoticeId, NoticeStatus};
use crate::workflows::portfolio::{
    Beneficiary, BeneficiaryId, Gift, GiftId, PaymentId, PaymentMethod, Policy, PolicyId,
    PolicyStatus, PremiumFrequency, PremiumPayment, Trust, TrustId, TrustStatus,
};

pub(crate) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(crate) fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(crate) fn trust(id: &str) -> Trust {
    Trust {
        id: TrustId::new(id),
        name: "Hargrove Family ILIT".to_string(),
        grantor_name: "Eleanor Hargrove".to_string(),
        trustee_name: "Marcus Bell".to_string(),
        trustee_email: Some("trustee@hargrove-ilit.example".to_string()),
        status: TrustStatus::Active,
    }
}

pub(crate) fn policy(id: &str, trust_id: &str) -> Policy {
    Policy {
        id: PolicyId::new(id),
        trust_id: TrustId::new(trust_id),
        carrier: "Northwind Life".to_string(),
        policy_number: format!("NW-{id}"),
        insured_name: Some("Eleanor Hargrove".to_string()),
        owner: Some("Hargrove Family ILIT Trust".to_string()),
        death_benefit: Some(2_000_000.0),
        annual_premium: 10_000.0,
        premium_frequency: PremiumFrequency::Annual,
        status: PolicyStatus::Active,
        next_premium_due: None,
    }
}

pub(crate) fn beneficiary(id: &str, trust_id: &str, name: &str) -> Beneficiary {
    Beneficiary {
        id: BeneficiaryId::new(id),
        trust_id: TrustId::new(trust_id),
        name: name.to_string(),
        email: Some(format!("{id}@beneficiary.example")),
        relationship: Some("child".to_string()),
        share_percentage: None,
    }
}

pub(crate) fn gift(id: &str, trust_id: &str, amount: f64, gift_date: NaiveDate) -> Gift {
    Gift {
        id: GiftId::new(id),
        trust_id: TrustId::new(trust_id),
        donor_name: "Eleanor Hargrove".to_string(),
        donor_email: Some("eleanor@hargrove.example".to_string()),
        beneficiary_id: None,
        amount,
        gift_date,
    }
}

pub(crate) fn payment(
    id: &str,
    policy_id: &str,
    amount: f64,
    payment_date: NaiveDate,
    due_date: NaiveDate,
) -> PremiumPayment {
    PremiumPayment {
        id: PaymentId::new(id),
        policy_id: PolicyId::new(policy_id),
        amount,
        payment_date,
        due_date,
        method: PaymentMethod::Ach,
    }
}

pub(crate) fn notice(
    id: &str,
    trust_id: &str,
    beneficiary_id: &str,
    notice_date: NaiveDate,
    withdrawal_deadline: NaiveDate,
    status: NoticeStatus,
) -> CrummeyNotice {
    CrummeyNotice {
        id: NoticeId::new(id),
        gift_id: GiftId::new("gift-fixture"),
        trust_id: TrustId::new(trust_id),
        beneficiary_id: BeneficiaryId::new(beneficiary_id),
        withdrawal_amount: 5_000.0,
        notice_date,
        withdrawal_deadline,
        status,
        withdrawal_exercised: false,
        exercised_at: None,
        sent_at: (status != NoticeStatus::Pending).then(|| {
            notice_date
                .and_hms_opt(9, 0, 0)
                .expect("valid time")
                .and_utc()
        }),
    }
}

pub(crate) fn repositories() -> (Arc<MemoryStore>, Repositories) {
    let store = Arc::new(MemoryStore::new());
    let repositories = Repositories::from_store(store.clone());
    (store, repositories)
}

/// Mailer double that records every message and optionally fails delivery.
#[derive(Default)]
pub(crate) struct RecordingMailer {
    sent: Mutex<Vec<EmailMessage>>,
    failing: bool,
}

impl RecordingMailer {
    pub(crate) fn delivering() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn failing() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::default(),
            failing: true,
        })
    }

    pub(crate) fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().expect("mailer mutex poisoned").clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: EmailMessage) -> Result<DeliveryReceipt, MailError> {
        if self.failing {
            return Err(MailError::Transport("connection refused".to_string()));
        }
        let mut sent = self.sent.lock().expect("mailer mutex poisoned");
        sent.push(message);
        Ok(DeliveryReceipt {
            provider_id: format!("msg-{}", sent.len()),
        })
    }
}
