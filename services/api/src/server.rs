use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Utc;
use ilit_compliance::config::AppConfig;
use ilit_compliance::error::AppError;
use ilit_compliance::store::{MemoryStore, Repositories};
use ilit_compliance::telemetry;
use tracing::info;

use crate::cli::ServeArgs;
use crate::demo::seed_demo_portfolio;
use crate::infra::{external_adapters, AppState, Services};
use crate::routes::with_compliance_routes;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(MemoryStore::new());
    if args.seed_demo {
        seed_demo_portfolio(&store, Utc::now().date_naive())?;
        info!("demo portfolio seeded");
    }
    let repositories = Repositories::from_store(store);
    let (advisor, mailer) = external_adapters(&config)?;
    let services = Services::from_config(&config, &repositories, advisor, mailer);

    let app = with_compliance_routes(&services)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "ilit compliance engine ready");

    axum::serve(listener, app).await?;
    Ok(())
}
