//! Dynamic check scheduler.
//!
//! # Data Flow
//! ```text
//! MonitorConfig
//!     → plan(): one Prober per valid, unique target
//!     → generation.rs: one CheckLoop task per Prober, shared token
//!
//! reload(new config):
//!     validate new config (reject → old generation untouched)
//!     → cancel current token, drain its loops
//!     → plan() + launch generation N+1
//! ```
//!
//! # Design Decisions
//! - At most one generation is running at any instant: the next one is
//!   launched only after the previous one has fully drained
//! - Cancellation is per generation, not per loop
//! - Bad target entries are skipped, never fatal to a (re)load
//! - The active configuration is published through an `ArcSwapOption` for
//!   readers; the scheduler itself only reads the value it was given

use std::collections::HashSet;
use std::sync::Arc;
use arc_swap::ArcSwapOption;
use serde::Serialize;
use thiserror::Error;

use crate::config::validation::{join_errors, validate_config, ValidationError};
use crate::config::MonitorConfig;
use crate::health::LoopSettings;
use crate::observability::metrics;
use crate::probe::{Prober, ProberRegistry};
use crate::storage::StatusRecorder;

pub mod board;
pub mod generation;

pub use board::{TargetBoard, TargetStatus};
pub use generation::{Generation, TeardownReport};

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("scheduler already running generation {0}")]
    AlreadyStarted(u64),

    #[error("invalid configuration: {}", join_errors(.0))]
    InvalidConfig(Vec<ValidationError>),
}

/// A configuration entry that produced no check loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedTarget {
    /// Position in the `databases` list.
    pub index: usize,
    pub kind: String,
    pub host: String,
    pub reason: String,
}

/// What a start or reload scheduled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationSummary {
    pub epoch: u64,
    pub scheduled: Vec<String>,
    pub skipped: Vec<SkippedTarget>,
}

/// Build the probers a configuration asks for.
///
/// Unsupported kinds, malformed entries and repeated identities are returned
/// as skipped instead of failing the whole plan.
pub fn plan(
    registry: &ProberRegistry,
    config: &MonitorConfig,
) -> (Vec<Arc<dyn Prober>>, Vec<SkippedTarget>) {
    let mut probers: Vec<Arc<dyn Prober>> = Vec::with_capacity(config.databases.len());
    let mut skipped = Vec::new();
    let mut seen = HashSet::new();

    for (index, entry) in config.databases.iter().enumerate() {
        let skip = |reason: String| SkippedTarget {
            index,
            kind: entry.kind.clone(),
            host: entry.host.clone(),
            reason,
        };

        match registry.build(entry) {
            Ok(prober) => {
                if seen.insert(prober.identity().to_string()) {
                    probers.push(prober);
                } else {
                    skipped.push(skip(format!("duplicate identity '{}'", prober.identity())));
                }
            }
            Err(e) => skipped.push(skip(e.to_string())),
        }
    }

    (probers, skipped)
}

pub struct Scheduler {
    registry: ProberRegistry,
    recorder: Arc<dyn StatusRecorder>,
    board: Arc<TargetBoard>,
    active: Arc<ArcSwapOption<MonitorConfig>>,
    current: Option<Generation>,
    next_epoch: u64,
}

impl Scheduler {
    pub fn new(registry: ProberRegistry, recorder: Arc<dyn StatusRecorder>) -> Self {
        Self {
            registry,
            recorder,
            board: Arc::new(TargetBoard::new()),
            active: Arc::new(ArcSwapOption::empty()),
            current: None,
            next_epoch: 0,
        }
    }

    /// Launch the first generation.
    pub fn start(&mut self, config: MonitorConfig) -> Result<GenerationSummary, SchedulerError> {
        if let Some(current) = &self.current {
            return Err(SchedulerError::AlreadyStarted(current.epoch()));
        }
        validate_config(&config).map_err(SchedulerError::InvalidConfig)?;
        Ok(self.launch(config))
    }

    /// Replace the running generation with one built from `config`.
    ///
    /// An invalid configuration is rejected before anything is cancelled.
    /// Otherwise the current generation is cancelled and fully drained before
    /// the new one starts, so no two generations ever tick concurrently.
    pub async fn reload(&mut self, config: MonitorConfig) -> Result<GenerationSummary, SchedulerError> {
        validate_config(&config).map_err(SchedulerError::InvalidConfig)?;

        if let Some(previous) = self.current.take() {
            let report = previous.teardown().await;
            tracing::info!(
                epoch = report.epoch,
                stopped = report.stopped,
                elapsed_ms = report.elapsed.as_millis() as u64,
                "Generation drained"
            );
        }

        Ok(self.launch(config))
    }

    /// Cancel and drain the running generation, if any.
    pub async fn shutdown(&mut self) -> Option<TeardownReport> {
        let previous = self.current.take()?;
        let report = previous.teardown().await;
        self.active.store(None);
        metrics::record_generation(report.epoch, 0);
        tracing::info!(
            epoch = report.epoch,
            stopped = report.stopped,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Scheduler stopped"
        );
        Some(report)
    }

    fn launch(&mut self, config: MonitorConfig) -> GenerationSummary {
        let epoch = self.next_epoch;
        self.next_epoch += 1;

        let (probers, skipped) = plan(&self.registry, &config);
        for entry in &skipped {
            tracing::warn!(
                epoch,
                index = entry.index,
                kind = %entry.kind,
                host = %entry.host,
                reason = %entry.reason,
                "Skipping target"
            );
        }

        let keep: HashSet<String> = probers.iter().map(|p| p.identity().to_string()).collect();
        self.board.retain(&keep);

        let settings = LoopSettings {
            interval: config.interval(),
            probe_timeout: config.probe_timeout(),
        };
        let generation = Generation::launch(
            epoch,
            probers,
            settings,
            self.recorder.clone(),
            self.board.clone(),
        );

        let summary = GenerationSummary {
            epoch,
            scheduled: generation.identities().to_vec(),
            skipped,
        };

        metrics::record_generation(epoch, generation.running());
        tracing::info!(
            epoch,
            targets = summary.scheduled.len(),
            skipped = summary.skipped.len(),
            interval_secs = config.interval,
            probe_timeout_secs = settings.probe_timeout.as_secs(),
            "Generation started"
        );

        self.active.store(Some(Arc::new(config)));
        self.current = Some(generation);
        summary
    }

    /// Epoch of the running generation.
    pub fn epoch(&self) -> Option<u64> {
        self.current.as_ref().map(Generation::epoch)
    }

    pub fn running_loops(&self) -> usize {
        self.current.as_ref().map_or(0, Generation::running)
    }

    pub fn identities(&self) -> Vec<String> {
        self.current
            .as_ref()
            .map(|g| g.identities().to_vec())
            .unwrap_or_default()
    }

    pub fn active_config(&self) -> Option<Arc<MonitorConfig>> {
        self.active.load_full()
    }

    /// Shared read handle on the active configuration.
    pub fn config_handle(&self) -> Arc<ArcSwapOption<MonitorConfig>> {
        self.active.clone()
    }

    pub fn board(&self) -> Arc<TargetBoard> {
        self.board.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TargetConfig;

    fn pg(host: &str, db: &str) -> TargetConfig {
        TargetConfig::new("postgres", host, db).with_credentials("u", "p")
    }

    #[test]
    fn test_plan_skips_bad_and_duplicate_entries() {
        let config = MonitorConfig::new(
            vec![
                pg("a", "app"),
                TargetConfig::new("mysql", "b", "app"),
                pg("a", "app"),
                TargetConfig::new("redis", "", ""),
                TargetConfig::new("redis", "c", ""),
            ],
            5,
        );

        let (probers, skipped) = plan(&ProberRegistry::with_defaults(), &config);
        let identities: Vec<_> = probers.iter().map(|p| p.identity().to_string()).collect();
        assert_eq!(identities, vec!["a_postgresql_app", "c_redis_db"]);

        let indexes: Vec<_> = skipped.iter().map(|s| s.index).collect();
        assert_eq!(indexes, vec![1, 2, 3]);
        assert!(skipped[0].reason.contains("unsupported"));
        assert!(skipped[1].reason.contains("duplicate"));
    }

    #[tokio::test]
    async fn test_start_twice_is_rejected() {
        let recorder = Arc::new(crate::storage::DedupRecorder::new(crate::storage::MemoryStore::new()));
        let mut scheduler = Scheduler::new(ProberRegistry::with_defaults(), recorder);

        let summary = scheduler.start(MonitorConfig::new(vec![pg("a", "app")], 60)).unwrap();
        assert_eq!(summary.epoch, 0);
        assert!(matches!(
            scheduler.start(MonitorConfig::new(Vec::new(), 60)),
            Err(SchedulerError::AlreadyStarted(0))
        ));

        scheduler.shutdown().await;
        assert_eq!(scheduler.epoch(), None);
        assert!(scheduler.active_config().is_none());
    }

    #[tokio::test]
    async fn test_oversized_interval_never_schedules() {
        let recorder = Arc::new(crate::storage::DedupRecorder::new(crate::storage::MemoryStore::new()));
        let mut scheduler = Scheduler::new(ProberRegistry::with_defaults(), recorder);

        let result = scheduler.start(MonitorConfig::new(vec![pg("a", "app")], u64::MAX));
        assert!(matches!(
            result,
            Err(SchedulerError::InvalidConfig(ref errors))
                if errors == &[ValidationError::IntervalTooLarge(u64::MAX)]
        ));
        assert_eq!(scheduler.epoch(), None);
        assert_eq!(scheduler.running_loops(), 0);

        scheduler.start(MonitorConfig::new(vec![pg("a", "app")], 60)).unwrap();
        let mut huge_timeout = MonitorConfig::new(vec![pg("a", "app")], 60);
        huge_timeout.probe_timeout_secs = Some(u64::MAX);
        assert!(scheduler.reload(huge_timeout).await.is_err());
        assert_eq!(scheduler.epoch(), Some(0));

        scheduler.shutdown().await;
    }

    #[tokio::test]
    async fn test_invalid_reload_keeps_generation() {
        let recorder = Arc::new(crate::storage::DedupRecorder::new(crate::storage::MemoryStore::new()));
        let mut scheduler = Scheduler::new(ProberRegistry::with_defaults(), recorder);
        scheduler.start(MonitorConfig::new(vec![pg("a", "app")], 60)).unwrap();

        let result = scheduler.reload(MonitorConfig::new(vec![pg("b", "app")], 0)).await;
        assert!(matches!(result, Err(SchedulerError::InvalidConfig(_))));
        assert_eq!(scheduler.epoch(), Some(0));
        assert_eq!(scheduler.identities(), vec!["a_postgresql_app"]);
        assert_eq!(scheduler.running_loops(), 1);

        scheduler.shutdown().await;
    }
}
