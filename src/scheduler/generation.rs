//! One scheduling epoch.
//!
//! A generation owns the check loops spawned for one loaded configuration and
//! the single cancellation token they all share. Teardown cancels the token
//! once and then drains the loops; every loop stops at its next wait point,
//! after finishing the tick it may be running.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::health::{CheckLoop, LoopSettings};
use crate::probe::Prober;
use crate::scheduler::board::TargetBoard;
use crate::storage::StatusRecorder;

pub struct Generation {
    epoch: u64,
    cancel: CancellationToken,
    loops: JoinSet<()>,
    identities: Vec<String>,
}

/// Outcome of draining a generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeardownReport {
    pub epoch: u64,
    pub stopped: usize,
    pub panicked: usize,
    pub elapsed: Duration,
}

impl Generation {
    /// Spawn one check loop per prober under a fresh token.
    pub(crate) fn launch(
        epoch: u64,
        probers: Vec<Arc<dyn Prober>>,
        settings: LoopSettings,
        recorder: Arc<dyn StatusRecorder>,
        board: Arc<TargetBoard>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let mut loops = JoinSet::new();
        let mut identities = Vec::with_capacity(probers.len());

        for prober in probers {
            identities.push(prober.identity().to_string());
            board.adopt(prober.identity(), epoch);

            let check_loop = CheckLoop::new(
                prober,
                settings,
                recorder.clone(),
                board.clone(),
                cancel.clone(),
                epoch,
            );
            loops.spawn(check_loop.run());
        }

        Self {
            epoch,
            cancel,
            loops,
            identities,
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn identities(&self) -> &[String] {
        &self.identities
    }

    /// Loops spawned for this generation that have not been drained.
    pub fn running(&self) -> usize {
        self.loops.len()
    }

    /// Cancel every loop and wait for all of them to return.
    ///
    /// Bounded by the probe timeout plus the status write timeout: an
    /// in-flight tick cannot outlive its deadline and its record call gives
    /// up after the write timeout.
    pub async fn teardown(mut self) -> TeardownReport {
        let started = Instant::now();
        self.cancel.cancel();

        let mut stopped = 0;
        let mut panicked = 0;
        while let Some(result) = self.loops.join_next().await {
            match result {
                Ok(()) => stopped += 1,
                Err(e) => {
                    panicked += 1;
                    tracing::error!(epoch = self.epoch, error = %e, "Check loop ended abnormally");
                }
            }
        }

        TeardownReport {
            epoch: self.epoch,
            stopped,
            panicked,
            elapsed: started.elapsed(),
        }
    }
}

impl Drop for Generation {
    // Dropping the JoinSet aborts the tasks; cancel first so loops parked at
    // their wait point exit cleanly.
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
