use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate, Utc};
use clap::Args;
use ilit_compliance::config::SweepConfig;
use ilit_compliance::error::{AppError, FailureKind};
use ilit_compliance::store::{MemoryStore, Repositories};
use ilit_compliance::workflows::gifts::GiftFilter;
use ilit_compliance::workflows::health::{DisabledAdvisor, HealthCheckSettings};
use ilit_compliance::workflows::portfolio::{
    Beneficiary, BeneficiaryId, Gift, GiftId, PaymentId, PaymentMethod, Policy, PolicyId,
    PolicyStatus, PremiumFrequency, PremiumPayment, RepositoryError, Trust, TrustId, TrustStatus,
};
use serde::Serialize;

use crate::infra::{noon_utc, DryRunMailer, Services};

const DEMO_GIFTS: [&str; 2] = ["gift-whitfield-annual", "gift-okafor-annual"];
const DEMO_TRUSTS: [&str; 2] = ["trust-whitfield", "trust-okafor"];

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Override the reporting date (defaults to today).
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Deadline alert window in days.
    #[arg(long, default_value_t = 14)]
    pub(crate) window_days: i64,
    /// Print full JSON reports instead of the condensed summary.
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(value).map_err(std::io::Error::from)?;
    println!("{rendered}");
    Ok(())
}

fn seeding_failed(error: RepositoryError) -> AppError {
    AppError::workflow(FailureKind::PersistenceFailed, error)
}

/// Two trusts relative to `today`: one well run, one in trouble.
///
/// The Whitfield trust is funded for years, pays on time, and owns its policy. The Okafor
/// trust is in the grace period, short of cash, and its policy is still owned by the insured.
pub(crate) fn seed_demo_portfolio(store: &MemoryStore, today: NaiveDate) -> Result<(), AppError> {
    let days = |n: i64| today - Duration::days(n);

    store
        .insert_trust(Trust {
            id: TrustId::new(DEMO_TRUSTS[0]),
            name: "Whitfield Family ILIT".to_string(),
            grantor_name: "Robert Whitfield".to_string(),
            trustee_name: "Grace Lin".to_string(),
            trustee_email: Some("grace.lin@whitfield-trust.example".to_string()),
            status: TrustStatus::Active,
        })
        .map_err(seeding_failed)?;
    store
        .insert_trust(Trust {
            id: TrustId::new(DEMO_TRUSTS[1]),
            name: "Okafor Legacy Trust".to_string(),
            grantor_name: "Chidi Okafor".to_string(),
            trustee_name: "Ngozi Okafor".to_string(),
            trustee_email: Some("ngozi@okafor-legacy.example".to_string()),
            status: TrustStatus::Active,
        })
        .map_err(seeding_failed)?;

    store
        .insert_policy(Policy {
            id: PolicyId::new("pol-whitfield-1"),
            trust_id: TrustId::new(DEMO_TRUSTS[0]),
            carrier: "Northwind Life".to_string(),
            policy_number: "NW-20418837".to_string(),
            insured_name: Some("Robert Whitfield".to_string()),
            owner: Some("Whitfield Family ILIT Trust".to_string()),
            death_benefit: Some(3_000_000.0),
            annual_premium: 18_000.0,
            premium_frequency: PremiumFrequency::Annual,
            status: PolicyStatus::Active,
            next_premium_due: Some(today + Duration::days(20)),
        })
        .map_err(seeding_failed)?;
    store
        .insert_policy(Policy {
            id: PolicyId::new("pol-okafor-1"),
            trust_id: TrustId::new(DEMO_TRUSTS[1]),
            carrier: "Meridian Mutual".to_string(),
            policy_number: "MM-55102".to_string(),
            insured_name: Some("Chidi Okafor".to_string()),
            owner: Some("Chidi Okafor".to_string()),
            death_benefit: Some(1_500_000.0),
            annual_premium: 25_000.0,
            premium_frequency: PremiumFrequency::Quarterly,
            status: PolicyStatus::GracePeriod,
            next_premium_due: Some(days(25)),
        })
        .map_err(seeding_failed)?;

    for (id, trust, name, share) in [
        ("ben-whitfield-ava", DEMO_TRUSTS[0], "Ava Whitfield", Some(50.0)),
        ("ben-whitfield-leo", DEMO_TRUSTS[0], "Leo Whitfield", Some(50.0)),
        ("ben-okafor-ada", DEMO_TRUSTS[1], "Ada Okafor", None),
    ] {
        store
            .insert_beneficiary(Beneficiary {
                id: BeneficiaryId::new(id),
                trust_id: TrustId::new(trust),
                name: name.to_string(),
                email: Some(format!("{id}@family.example")),
                relationship: Some("child".to_string()),
                share_percentage: share,
            })
            .map_err(seeding_failed)?;
    }

    store
        .record_gift(Gift {
            id: GiftId::new(DEMO_GIFTS[0]),
            trust_id: TrustId::new(DEMO_TRUSTS[0]),
            donor_name: "Robert Whitfield".to_string(),
            donor_email: Some("robert@whitfield.example".to_string()),
            beneficiary_id: None,
            amount: 90_000.0,
            gift_date: days(10),
        })
        .map_err(seeding_failed)?;
    store
        .record_gift(Gift {
            id: GiftId::new(DEMO_GIFTS[1]),
            trust_id: TrustId::new(DEMO_TRUSTS[1]),
            donor_name: "Chidi Okafor".to_string(),
            donor_email: None,
            beneficiary_id: Some(BeneficiaryId::new("ben-okafor-ada")),
            amount: 12_000.0,
            gift_date: days(20),
        })
        .map_err(seeding_failed)?;

    for (index, offset) in [345_i64, 710, 1075].into_iter().enumerate() {
        store
            .record_payment(PremiumPayment {
                id: PaymentId::new(format!("pay-whitfield-{}", index + 1)),
                policy_id: PolicyId::new("pol-whitfield-1"),
                amount: 18_000.0,
                payment_date: days(offset + 2),
                due_date: days(offset),
                method: PaymentMethod::Ach,
            })
            .map_err(seeding_failed)?;
    }
    for (index, late) in [4_i64, 12, 21].into_iter().enumerate() {
        let due = days(115 + 90 * (2 - index as i64));
        store
            .record_payment(PremiumPayment {
                id: PaymentId::new(format!("pay-okafor-{}", index + 1)),
                policy_id: PolicyId::new("pol-okafor-1"),
                amount: 6_250.0,
                payment_date: due + Duration::days(late),
                due_date: due,
                method: PaymentMethod::Check,
            })
            .map_err(seeding_failed)?;
    }

    Ok(())
}

fn demo_services(repositories: &Repositories) -> Services {
    Services::new(
        repositories,
        Arc::new(DisabledAdvisor),
        Arc::new(DryRunMailer::default()),
        HealthCheckSettings::default(),
        SweepConfig::default(),
    )
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        today,
        window_days,
        json,
    } = args;
    let today = today.unwrap_or_else(|| Utc::now().date_naive());
    let now = noon_utc(today);

    let store = Arc::new(MemoryStore::new());
    seed_demo_portfolio(&store, today)?;
    let repositories = Repositories::from_store(store.clone());
    let services = demo_services(&repositories);

    println!("ILIT compliance demo ({today})");

    println!("\nCrummey notices");
    for gift_id in DEMO_GIFTS {
        let issued = services
            .notices
            .notices
            .issue_for_gift(&GiftId::new(gift_id), today)
            .map_err(|err| AppError::workflow(err.kind(), err))?;
        for notice in issued {
            let dispatch = services
                .notices
                .notices
                .send(&notice.id, now)
                .await
                .map_err(|err| AppError::workflow(err.kind(), err))?;
            println!(
                "- {} -> {} | {:.2} withdrawable until {} | {}",
                notice.id,
                notice.beneficiary_id,
                notice.withdrawal_amount,
                notice.withdrawal_deadline,
                dispatch.notice.status.label()
            );
        }
    }

    println!("\nPolicy health");
    let scheduled = services
        .health
        .run_scheduled(now)
        .await
        .map_err(|err| AppError::workflow(err.kind(), err))?;
    if json {
        print_json(&scheduled)?;
    }
    for policy_id in ["pol-whitfield-1", "pol-okafor-1"] {
        let check = services
            .health
            .latest(&PolicyId::new(policy_id))
            .map_err(|err| AppError::workflow(err.kind(), err))?;
        println!(
            "- {}: {} ({:.2}, rule score {:.2})",
            policy_id,
            check.overall_status.label(),
            check.health_score,
            check.rule_score
        );
        for issue in &check.issues {
            println!(
                "    [{}] {}",
                issue.severity.label(),
                issue.description
            );
        }
    }

    println!("\nOpen remediation");
    let open = services
        .remediation
        .open_for_policy(&PolicyId::new("pol-okafor-1"))
        .map_err(|err| AppError::workflow(err.kind(), err))?;
    for action in &open {
        println!(
            "- {} {} due {}: {}",
            action.priority.label(),
            action.action_type.label(),
            action.due_date,
            action.title
        );
    }

    println!("\nDeadline alerts (next {window_days} days)");
    let alerts = services
        .notices
        .alerts
        .run(Some(window_days), now)
        .await
        .map_err(|err| AppError::workflow(err.kind(), err))?;
    println!(
        "- {} checked | {} sent | {} skipped",
        alerts.total_checked, alerts.alerts_sent, alerts.alerts_skipped
    );

    println!("\nGift tax ({})", today.year());
    let summary = services
        .gifts
        .summary(
            &GiftFilter {
                year: Some(today.year()),
                ..GiftFilter::default()
            },
            today,
        )
        .map_err(|err| AppError::workflow(err.kind(), err))?;
    if json {
        print_json(&summary)?;
    }
    for row in &summary.summary {
        println!(
            "- {} -> {} ({}): {:.2} | 709 required: {}",
            row.donor_name,
            row.beneficiary_name,
            row.trust_name,
            row.total_gifts,
            if row.requires_form_709 { "yes" } else { "no" }
        );
    }

    println!("\nFund sufficiency");
    for trust_id in DEMO_TRUSTS {
        let report = services
            .gifts
            .fund_sufficiency(&TrustId::new(trust_id), None, today)
            .map_err(|err| AppError::workflow(err.kind(), err))?;
        println!("- {}: {}", trust_id, report.message);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ilit_compliance::workflows::health::OverallStatus;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date")
    }

    fn seeded_services() -> Services {
        let store = Arc::new(MemoryStore::new());
        seed_demo_portfolio(&store, today()).expect("demo portfolio seeds");
        demo_services(&Repositories::from_store(store))
    }

    #[test]
    fn seeding_twice_conflicts() {
        let store = MemoryStore::new();
        seed_demo_portfolio(&store, today()).expect("first seed");
        let error = seed_demo_portfolio(&store, today()).expect_err("duplicate ids");
        assert!(error.to_string().contains("persistence_failed"));
    }

    #[tokio::test]
    async fn demo_portfolio_separates_healthy_and_critical_trusts() {
        let services = seeded_services();
        let issued = services
            .notices
            .notices
            .issue_for_gift(&GiftId::new(DEMO_GIFTS[0]), today())
            .expect("notices issued");
        assert_eq!(issued.len(), 2);
        for notice in &issued {
            services
                .notices
                .notices
                .send(&notice.id, noon_utc(today()))
                .await
                .expect("notice sent");
        }

        let report = services
            .health
            .run_scheduled(noon_utc(today()))
            .await
            .expect("scheduled run");
        assert_eq!(report.checks_run, 1);

        let healthy = services
            .health
            .latest(&PolicyId::new("pol-whitfield-1"))
            .expect("check stored");
        assert_eq!(healthy.overall_status, OverallStatus::Healthy);

        let troubled = services
            .health
            .run(
                "pol-okafor-1",
                ilit_compliance::workflows::health::CheckTrigger::Manual,
                noon_utc(today()),
            )
            .await
            .expect("manual run");
        assert_eq!(troubled.overall_status, OverallStatus::Critical);
        assert!(troubled.remediation_actions_created >= 2);
    }
}
