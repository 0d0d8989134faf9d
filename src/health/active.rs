//! Active health checking: the per-target check loop.
//!
//! # Responsibilities
//! - Periodically probe one target
//! - Forward every outcome to the status recorder
//! - Stop when the owning generation is cancelled
//!
//! # States
//! ```text
//! Running --(cancelled)--> Stopped
//! ```
//! A tick already in progress when cancellation arrives finishes (bounded by
//! its deadline) and is recorded; no new tick starts afterwards.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::health::HealthState;
use crate::observability::metrics;
use crate::probe::{ProbeError, Prober};
use crate::scheduler::board::TargetBoard;
use crate::storage::StatusRecorder;

/// Timing shared by every loop of a generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSettings {
    pub interval: Duration,
    pub probe_timeout: Duration,
}

pub struct CheckLoop {
    prober: Arc<dyn Prober>,
    settings: LoopSettings,
    recorder: Arc<dyn StatusRecorder>,
    board: Arc<TargetBoard>,
    cancel: CancellationToken,
    epoch: u64,
}

impl CheckLoop {
    pub fn new(
        prober: Arc<dyn Prober>,
        settings: LoopSettings,
        recorder: Arc<dyn StatusRecorder>,
        board: Arc<TargetBoard>,
        cancel: CancellationToken,
        epoch: u64,
    ) -> Self {
        Self {
            prober,
            settings,
            recorder,
            board,
            cancel,
            epoch,
        }
    }

    pub async fn run(self) {
        let identity = self.prober.identity().to_string();
        tracing::debug!(
            identity = %identity,
            epoch = self.epoch,
            interval_secs = self.settings.interval.as_secs_f64(),
            "Check loop starting"
        );

        // First tick one interval after start; a slow tick delays the next
        // one instead of bunching ticks up.
        let period = self.settings.interval;
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    break;
                }
                _ = ticker.tick() => {
                    self.tick(&identity).await;
                }
            }
        }

        tracing::debug!(identity = %identity, epoch = self.epoch, "Check loop stopped");
    }

    /// Run one probe and record its outcome.
    async fn tick(&self, identity: &str) -> HealthState {
        let started = Instant::now();
        let deadline = started + self.settings.probe_timeout;

        // Enforced here too so a prober that ignores its deadline cannot
        // hold up a generation teardown.
        let outcome = match time::timeout_at(deadline, self.prober.check(deadline)).await {
            Ok(result) => result,
            Err(_) => Err(ProbeError::Timeout(self.settings.probe_timeout)),
        };
        let state = HealthState::from(&outcome);

        if let Err(e) = &outcome {
            tracing::warn!(identity = %identity, epoch = self.epoch, error = %e, "Check failed");
        }
        metrics::record_probe(identity, state, started.elapsed());

        self.recorder.record_status(identity, state).await;
        self.board
            .observe(identity, self.epoch, outcome.map_err(|e| e.to_string()));
        state
    }
}
