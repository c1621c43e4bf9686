use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use cronwatch_monitor::{Monitor, MonitorOptions, RunOutcome};
use cronwatch_notify::SmtpNotifier;
use cronwatch_store::store::SqliteJobStore;

#[derive(Parser)]
#[command(
    name = "cronwatch",
    about = "Monitor scheduled jobs that failed or run for too long"
)]
struct Cli {
    /// Display the report instead of sending mail
    #[arg(long)]
    dump: bool,

    /// Config file path (defaults to ~/.cronwatch/config.json5)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Job database path (overrides the config file)
    #[arg(long)]
    db: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => cronwatch_config::load_config_from(path)?,
        None => cronwatch_config::load_config()?,
    };

    let db_path = cli.db.unwrap_or_else(|| config.db_path.clone());
    let store = SqliteJobStore::open(&db_path)?;
    let notifier = SmtpNotifier::new(&config.mailer)?;

    let monitor = Monitor::new(
        MonitorOptions {
            lock_timeout_secs: config.monitor.lock_timeout_secs,
            dump: cli.dump,
            receivers: config.monitor.receivers,
            notify_when_healthy: config.monitor.notify_when_healthy,
        },
        Arc::new(store),
        Arc::new(notifier),
    );

    let rt = tokio::runtime::Runtime::new()?;
    let outcome = rt.block_on(monitor.run())?;

    match outcome {
        RunOutcome::SkippedNoReceivers => {
            println!("No receivers configured. Add receivers to the config or run with --dump.");
        }
        RunOutcome::Dumped { output } => print!("{output}"),
        RunOutcome::Notified { delivered, failed } => {
            if failed.is_empty() {
                tracing::info!(delivered, "monitoring report delivered");
            } else {
                tracing::warn!(
                    delivered,
                    failed = failed.len(),
                    "monitoring report only partially delivered"
                );
            }
        }
        RunOutcome::Healthy => {
            tracing::info!("all scheduled jobs healthy, nothing to report");
        }
    }

    Ok(())
}
