//! Reload driver.
//!
//! The supervisor owns the scheduler and is the only caller of
//! `Scheduler::reload`, so reloads are serialized by construction. Triggers
//! carry no payload: on each one the configuration is re-read from disk.

use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::{load_config, ReloadTrigger};
use crate::lifecycle::Shutdown;
use crate::scheduler::{GenerationSummary, Scheduler};

/// Quiet period after a trigger; editors often emit several events per save.
pub const RELOAD_DEBOUNCE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadOutcome {
    Applied(GenerationSummary),
    Unchanged,
    Rejected(String),
}

/// Counters returned when the supervisor exits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupervisorReport {
    pub applied: u64,
    pub unchanged: u64,
    pub rejected: u64,
    pub last_epoch: Option<u64>,
}

pub struct Supervisor {
    scheduler: Scheduler,
    config_path: PathBuf,
    reloads: mpsc::UnboundedReceiver<ReloadTrigger>,
    shutdown: Shutdown,
    debounce: Duration,
    report: SupervisorReport,
}

impl Supervisor {
    pub fn new(
        scheduler: Scheduler,
        config_path: &Path,
        reloads: mpsc::UnboundedReceiver<ReloadTrigger>,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            scheduler,
            config_path: config_path.to_path_buf(),
            reloads,
            shutdown,
            debounce: RELOAD_DEBOUNCE,
            report: SupervisorReport::default(),
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Serve reload triggers until shutdown, then drain the scheduler.
    pub async fn run(mut self) -> SupervisorReport {
        let mut reloads_open = true;

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.wait() => break,
                trigger = self.reloads.recv(), if reloads_open => match trigger {
                    Some(ReloadTrigger) => self.handle_trigger().await,
                    None => {
                        reloads_open = false;
                        tracing::warn!("Reload channel closed, configuration changes will be ignored");
                    }
                },
            }
        }

        self.report.last_epoch = self.scheduler.epoch();
        self.scheduler.shutdown().await;
        self.report
    }

    async fn handle_trigger(&mut self) {
        tokio::select! {
            _ = tokio::time::sleep(self.debounce) => {}
            _ = self.shutdown.wait() => return,
        }
        while self.reloads.try_recv().is_ok() {}

        self.apply_reload().await;
    }

    /// Re-read the configuration file and replace the running generation.
    pub async fn apply_reload(&mut self) -> ReloadOutcome {
        tracing::info!(path = ?self.config_path, "Reloading configuration");

        let config = match load_config(&self.config_path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!("Failed to reload config: {}. Keeping current configuration.", e);
                self.report.rejected += 1;
                return ReloadOutcome::Rejected(e.to_string());
            }
        };

        if let Some(active) = self.scheduler.active_config() {
            if *active == config {
                tracing::info!("Configuration unchanged, keeping current generation");
                self.report.unchanged += 1;
                return ReloadOutcome::Unchanged;
            }
            if active.storage != config.storage || active.observability != config.observability {
                tracing::warn!("Storage and observability changes take effect after a restart");
            }
        }

        match self.scheduler.reload(config).await {
            Ok(summary) => {
                self.report.applied += 1;
                ReloadOutcome::Applied(summary)
            }
            Err(e) => {
                tracing::error!("Failed to reload config: {}. Keeping current configuration.", e);
                self.report.rejected += 1;
                ReloadOutcome::Rejected(e.to_string())
            }
        }
    }
}
