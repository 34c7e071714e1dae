//! Phoenix: a systemd watchdog-supervised service.
//!
//! This is the application entry point. It parses the command line, loads
//! configuration from TOML, initializes tracing, wires the notifier, work unit
//! and hang hook into a liveness supervisor, and runs it until SIGTERM.

use std::path::{Path, PathBuf};

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use phoenix::config::{AppConfig, LoggingConfig, DEFAULT_CONFIG_PATH, DEFAULT_LOG_FILTER};
use phoenix::notify::{self, SystemdNotifier};
use phoenix::work::{HangInjector, IdleWork, SentinelFile, WorkUnit};
use phoenix::{LivenessSupervisor, StopReason};

/// Phoenix: a service that proves its liveness to systemd
#[derive(Parser, Debug)]
#[command(name = "phoenix", version, about)]
struct Args {
    /// Path to configuration file (defaults apply if the default path is missing)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level filter (e.g., "phoenix=debug")
    #[arg(short, long)]
    log_level: Option<String>,

    /// Enable the simulated hang hook using this sentinel file
    #[arg(long, value_name = "PATH")]
    crash_file: Option<PathBuf>,
}

fn load_config(path: Option<&Path>) -> Result<AppConfig, phoenix::config::ConfigError> {
    match path {
        Some(path) => AppConfig::load(path),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => AppConfig::load(DEFAULT_CONFIG_PATH),
        None => Ok(AppConfig::default()),
    }
}

fn init_tracing(log_level: Option<String>, logging: &LoggingConfig) {
    // Priority: CLI > env > default
    let log_filter = log_level
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

    let registry =
        tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::new(&log_filter));

    if logging.is_json() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())?;
    init_tracing(args.log_level, &config.logging);

    if let Some(path) = args.crash_file {
        config.hang.enabled = true;
        config.hang.sentinel_path = path;
    }

    tracing::info!(pid = std::process::id(), "Phoenix starting");

    let timings = config.supervisor.timings()?;
    tracing::info!(
        work_period = ?timings.work_period(),
        watchdog_interval = ?timings.watchdog_interval(),
        notifier = ?config.notifier.kind,
        "Loaded configuration"
    );

    if let Some(unit_timeout) = SystemdNotifier::unit_watchdog() {
        tracing::info!(unit_timeout = ?unit_timeout, "systemd watchdog enabled for this unit");
        if timings.work_period() >= unit_timeout {
            tracing::warn!(
                work_period = ?timings.work_period(),
                unit_timeout = ?unit_timeout,
                "Work period is not below the unit's WatchdogSec; heartbeats will arrive too late"
            );
        }
    }

    let notifier = notify::from_kind(config.notifier.kind);

    let work: Box<dyn WorkUnit> = if config.hang.enabled {
        tracing::warn!(
            sentinel = %config.hang.sentinel_path.display(),
            "Simulated hang hook enabled"
        );
        Box::new(HangInjector::new(
            IdleWork,
            SentinelFile::new(config.hang.sentinel_path.clone()),
        ))
    } else {
        Box::new(IdleWork)
    };

    let supervisor = LivenessSupervisor::new(timings, work, notifier).with_signal_handlers()?;

    let outcome = supervisor.run().await?;

    match outcome.reason {
        StopReason::ShutdownRequested => Ok(()),
        StopReason::WorkFailed(e) => Err(e.into()),
    }
}
