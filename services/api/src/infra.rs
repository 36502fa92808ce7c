use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use ilit_compliance::config::{AppConfig, SweepConfig};
use ilit_compliance::error::AppError;
use ilit_compliance::notifications::resend::{ResendMailer, UnconfiguredMailer};
use ilit_compliance::notifications::{DeliveryReceipt, EmailMessage, MailError, Mailer};
use ilit_compliance::store::Repositories;
use ilit_compliance::workflows::crummey::{CrummeyService, DeadlineAlertService, NoticeState};
use ilit_compliance::workflows::gifts::GiftReportService;
use ilit_compliance::workflows::health::{
    DisabledAdvisor, GeminiAdvisor, HealthCheckService, HealthCheckSettings, PolicyAdvisor,
};
use ilit_compliance::workflows::remediation::RemediationService;
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Every workflow service wired against one set of repositories.
#[derive(Clone)]
pub(crate) struct Services {
    pub(crate) health: Arc<HealthCheckService>,
    pub(crate) notices: Arc<NoticeState>,
    pub(crate) remediation: Arc<RemediationService>,
    pub(crate) gifts: Arc<GiftReportService>,
}

impl Services {
    pub(crate) fn from_config(
        config: &AppConfig,
        repositories: &Repositories,
        advisor: Arc<dyn PolicyAdvisor>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let settings = HealthCheckSettings {
            advisory_timeout: config.advisory.timeout,
            ..HealthCheckSettings::default()
        };
        Self::new(repositories, advisor, mailer, settings, config.sweeps)
    }

    pub(crate) fn new(
        repositories: &Repositories,
        advisor: Arc<dyn PolicyAdvisor>,
        mailer: Arc<dyn Mailer>,
        settings: HealthCheckSettings,
        sweeps: SweepConfig,
    ) -> Self {
        let notices = NoticeState {
            notices: CrummeyService::new(repositories, mailer.clone())
                .with_withdrawal_period(sweeps.withdrawal_period_days),
            alerts: DeadlineAlertService::new(repositories, mailer.clone())
                .with_default_window(sweeps.alert_window_days),
        };

        Self {
            health: Arc::new(HealthCheckService::new(
                repositories,
                advisor,
                mailer.clone(),
                settings,
            )),
            notices: Arc::new(notices),
            remediation: Arc::new(RemediationService::new(repositories, mailer)),
            gifts: Arc::new(GiftReportService::new(repositories)),
        }
    }
}

/// Builds the advisory and mail adapters from configuration, falling back to inert
/// implementations when a provider key is missing.
pub(crate) fn external_adapters(
    config: &AppConfig,
) -> Result<(Arc<dyn PolicyAdvisor>, Arc<dyn Mailer>), AppError> {
    let client = reqwest::Client::builder()
        .timeout(config.advisory.timeout)
        .build()?;

    let advisor: Arc<dyn PolicyAdvisor> =
        match GeminiAdvisor::from_config(client.clone(), &config.advisory) {
            Some(advisor) => {
                info!(model = %config.advisory.model, "advisory analysis enabled");
                Arc::new(advisor)
            }
            None => {
                warn!("no advisory api key configured; health checks run rule-only");
                Arc::new(DisabledAdvisor)
            }
        };

    let mailer: Arc<dyn Mailer> = match ResendMailer::from_config(client, &config.mail) {
        Some(mailer) => Arc::new(mailer),
        None => {
            warn!("no mail api key configured; notifications will be recorded as failed");
            Arc::new(UnconfiguredMailer)
        }
    };

    Ok((advisor, mailer))
}

/// Mailer used by the CLI demo: accepts every message and only logs it.
#[derive(Default)]
pub(crate) struct DryRunMailer {
    sequence: AtomicU64,
}

#[async_trait]
impl Mailer for DryRunMailer {
    async fn send(&self, message: EmailMessage) -> Result<DeliveryReceipt, MailError> {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        info!(to = %message.to, subject = %message.subject, "dry-run email");
        Ok(DeliveryReceipt {
            provider_id: format!("dry-run-{id}"),
        })
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

/// Noon UTC on `date`, so sweeps driven from the command line see a stable "now".
pub(crate) fn noon_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(12, 0, 0)
        .map(|noon| noon.and_utc())
        .unwrap_or_else(Utc::now)
}
