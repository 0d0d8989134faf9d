//! probe-worker
//!
//! Probes configured databases and caches on a fixed interval and records
//! every change in their health state.
//!
//! # Architecture Overview
//!
//! ```text
//!   config.json ──▶ ConfigWatcher ──┐            SIGHUP ──┐
//!                                   ▼                     ▼
//!                             ┌──────────────────────────────┐
//!                             │          Supervisor          │
//!                             │  re-read config → reload()   │
//!                             └──────────────┬───────────────┘
//!                                            ▼
//!                             ┌──────────────────────────────┐
//!                             │          Scheduler           │
//!                             │  generation N (one token)    │
//!                             │  ┌──────────┐ ┌──────────┐   │
//!                             │  │CheckLoop │ │CheckLoop │ … │
//!                             │  └────┬─────┘ └────┬─────┘   │
//!                             └───────┼────────────┼─────────┘
//!                                     ▼            ▼
//!                               Prober::check  Prober::check
//!                                     │            │
//!                                     ▼            ▼
//!                             ┌──────────────────────────────┐
//!                             │  StatusRecorder (dedup)      │
//!                             │  → database_status_log       │
//!                             └──────────────────────────────┘
//! ```

use std::path::PathBuf;
use clap::Parser;
use tokio::sync::mpsc;

use probe_worker::config::ConfigWatcher;
use probe_worker::lifecycle::{bootstrap, spawn_signal_handler, Shutdown};
use probe_worker::observability::logging::{init_logging, LogFormat};
use probe_worker::probe::ProberRegistry;

#[derive(Parser)]
#[command(name = "probe-worker", version)]
#[command(about = "Periodically probes databases and caches and records health transitions")]
struct Args {
    /// Configuration file (JSON, or TOML when ending in .toml).
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.log_format);

    tracing::info!("probe-worker v{} starting", env!("CARGO_PKG_VERSION"));

    let shutdown = Shutdown::new();
    let (reload_tx, reload_rx) = mpsc::unbounded_channel();

    // Watch before the first load so an edit made during startup still
    // queues a reload. Kept alive for the lifetime of the process.
    let _watcher = match ConfigWatcher::new(&args.config, reload_tx.clone()).run() {
        Ok(watcher) => Some(watcher),
        Err(e) => {
            tracing::warn!(error = %e, "Config watcher unavailable, reload with SIGHUP instead");
            None
        }
    };

    let supervisor = match bootstrap(
        &args.config,
        ProberRegistry::with_defaults(),
        reload_rx,
        shutdown.clone(),
    )
    .await
    {
        Ok(supervisor) => supervisor,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            return Err(e.into());
        }
    };

    spawn_signal_handler(shutdown, reload_tx);

    let board = supervisor.scheduler().board();
    let report = supervisor.run().await;

    for (identity, status) in board.snapshot() {
        tracing::info!(
            identity = %identity,
            epoch = status.epoch,
            state = ?status.state,
            checks = status.checks,
            failures = status.failures,
            "Final target status"
        );
    }

    tracing::info!(
        reloads_applied = report.applied,
        reloads_unchanged = report.unchanged,
        reloads_rejected = report.rejected,
        last_epoch = ?report.last_epoch,
        "Shutdown complete"
    );
    Ok(())
}
