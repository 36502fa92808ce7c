use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use ilit_compliance::config::AppConfig;
use ilit_compliance::error::AppError;
use ilit_compliance::store::{MemoryStore, Repositories};
use ilit_compliance::telemetry;
use std::sync::Arc;

use crate::demo::{print_json, run_demo, seed_demo_portfolio, DemoArgs};
use crate::infra::{external_adapters, noon_utc, Services};
use crate::server;

#[derive(Parser, Debug)]
#[command(
    name = "ILIT Compliance Engine",
    about = "Serve and operate the ILIT compliance and policy health engine",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Run one of the recurring sweeps once and print its report
    Sweep {
        #[command(subcommand)]
        command: SweepCommand,
    },
    /// Walk a demo portfolio through notices, health checks, and reporting
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum SweepCommand {
    /// Expire sent notices whose withdrawal deadline has passed
    Expire(SweepArgs),
    /// Alert trustees about withdrawal deadlines inside the window
    Alerts {
        #[command(flatten)]
        sweep: SweepArgs,
        /// Override the configured alert window in days
        #[arg(long)]
        window_days: Option<i64>,
    },
    /// Health-check every active policy not checked in the last day
    Health(SweepArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Load the demo portfolio into the in-memory store before serving
    #[arg(long)]
    pub(crate) seed_demo: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct SweepArgs {
    /// Evaluation date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Run against the demo portfolio instead of an empty store
    #[arg(long)]
    pub(crate) seed_demo: bool,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Sweep { command } => run_sweep(command).await,
        Command::Demo(args) => run_demo(args).await,
    }
}

async fn run_sweep(command: SweepCommand) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let args = match &command {
        SweepCommand::Expire(args) | SweepCommand::Health(args) => args,
        SweepCommand::Alerts { sweep, .. } => sweep,
    };
    let today = args.today.unwrap_or_else(|| Utc::now().date_naive());
    let now = noon_utc(today);

    let store = Arc::new(MemoryStore::new());
    if args.seed_demo {
        seed_demo_portfolio(&store, today)?;
    }
    let repositories = Repositories::from_store(store);
    let (advisor, mailer) = external_adapters(&config)?;
    let services = Services::from_config(&config, &repositories, advisor, mailer);

    match command {
        SweepCommand::Expire(_) => {
            let report = services
                .notices
                .notices
                .expire_overdue(today, now)
                .map_err(|err| AppError::workflow(err.kind(), err))?;
            print_json(&report)
        }
        SweepCommand::Alerts { window_days, .. } => {
            let report = services
                .notices
                .alerts
                .run(window_days, now)
                .await
                .map_err(|err| AppError::workflow(err.kind(), err))?;
            print_json(&report)
        }
        SweepCommand::Health(_) => {
            let report = services
                .health
                .run_scheduled(now)
                .await
                .map_err(|err| AppError::workflow(err.kind(), err))?;
            print_json(&report)
        }
    }
}
