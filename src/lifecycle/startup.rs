//! Startup orchestration.
//!
//! Fail fast: an unreadable configuration or an unreachable status store is
//! fatal, and nothing is scheduled until both are in place.

use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::config::{load_config, ConfigError, ReloadTrigger};
use crate::lifecycle::{Shutdown, Supervisor};
use crate::observability::metrics;
use crate::probe::ProberRegistry;
use crate::scheduler::{Scheduler, SchedulerError};
use crate::storage::{self, StorageError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to initialize status storage: {0}")]
    Storage(#[from] StorageError),

    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),

    #[error("failed to start metrics endpoint: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

/// Load configuration, connect storage and start generation 0.
pub async fn bootstrap(
    config_path: &Path,
    registry: ProberRegistry,
    reloads: mpsc::UnboundedReceiver<ReloadTrigger>,
    shutdown: Shutdown,
) -> Result<Supervisor, StartupError> {
    let config = load_config(config_path)?;
    tracing::info!(
        path = ?config_path,
        targets = config.databases.len(),
        interval_secs = config.interval,
        storage = %config.storage.kind,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|_| StartupError::MetricsAddress(config.observability.metrics_address.clone()))?;
        metrics::init_metrics(addr)?;
    }

    let recorder = storage::connect(&config.storage).await?;

    let mut scheduler = Scheduler::new(registry, recorder);
    scheduler.start(config)?;

    Ok(Supervisor::new(scheduler, config_path, reloads, shutdown))
}
