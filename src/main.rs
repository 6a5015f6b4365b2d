mod calendar;
mod config;
mod cycle;
mod detector;
mod error;
mod fetcher;
mod message;
mod notifier;
mod scheduler;
mod state;
mod types;

#[cfg(test)]
mod testing;

use std::fs::OpenOptions;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::cycle::CycleRunner;
use crate::error::Result;
use crate::fetcher::AnybuddyFetcher;
use crate::scheduler::Poller;
use crate::state::JsonFileStore;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = init_tracing(&cfg) {
        eprintln!("Logging setup error: {e}");
        std::process::exit(1);
    }

    let run_once = cfg.run_once || std::env::args().skip(1).any(|arg| arg == "--once");

    if let Err(e) = run(cfg, run_once).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(cfg: &Config) -> Result<()> {
    let filter = EnvFilter::new(&cfg.log_level);
    match &cfg.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
    Ok(())
}

async fn run(cfg: Config, run_once: bool) -> Result<()> {
    let fetcher = Arc::new(AnybuddyFetcher::new(&cfg)?);
    let notifier = notifier::from_config(&cfg)?;
    let store = Box::new(JsonFileStore::new(&cfg.state_path));
    info!(
        venue = %cfg.venue_id,
        activity = %cfg.activity,
        weekdays = ?cfg.target_weekdays,
        lead_hours = cfg.lead_window_hours,
        "State file: {}",
        store.path().display()
    );

    let mut runner = CycleRunner::new(&cfg, fetcher, notifier, store);

    if run_once {
        match runner.run().await {
            Ok(outcome) => info!(
                status = %outcome.result.status,
                notified = outcome.notified,
                persisted = outcome.persisted,
                "Cycle complete"
            ),
            Err(e) => error!("Cycle failed: {e}"),
        }
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let poller = Poller::new(runner, Duration::from_secs(cfg.poll_interval_secs));
    let handle = tokio::spawn(poller.run(shutdown_rx));

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested, waiting for the current cycle to finish");
    shutdown_tx.send(true).ok();

    if let Err(e) = handle.await {
        error!("Poller task ended abnormally: {e}");
    }
    Ok(())
}
