//! Per-target status board.
//!
//! Informational view of what every check loop last observed. Written by the
//! loops after each tick, pruned by the scheduler between generations. Never
//! consulted for de-duplication; that is the recorder's job.

use std::collections::HashSet;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;

use crate::health::HealthState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetStatus {
    /// Generation whose loop owns this target.
    pub epoch: u64,
    pub state: Option<HealthState>,
    pub checks: u64,
    pub failures: u64,
    pub last_error: Option<String>,
    pub last_checked: Option<DateTime<Utc>>,
}

impl TargetStatus {
    fn new(epoch: u64) -> Self {
        Self {
            epoch,
            state: None,
            checks: 0,
            failures: 0,
            last_error: None,
            last_checked: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct TargetBoard {
    targets: DashMap<String, TargetStatus>,
}

impl TargetBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand `identity` to generation `epoch`, keeping its history.
    pub fn adopt(&self, identity: &str, epoch: u64) {
        self.targets
            .entry(identity.to_string())
            .and_modify(|status| status.epoch = epoch)
            .or_insert_with(|| TargetStatus::new(epoch));
    }

    /// Drop every identity not in `keep`.
    pub fn retain(&self, keep: &HashSet<String>) {
        self.targets.retain(|identity, _| keep.contains(identity));
    }

    pub fn observe(&self, identity: &str, epoch: u64, outcome: Result<(), String>) {
        let mut status = self
            .targets
            .entry(identity.to_string())
            .or_insert_with(|| TargetStatus::new(epoch));

        status.epoch = epoch;
        status.checks += 1;
        status.last_checked = Some(Utc::now());
        match outcome {
            Ok(()) => {
                status.state = Some(HealthState::Normal);
                status.last_error = None;
            }
            Err(e) => {
                status.state = Some(HealthState::Abnormal);
                status.failures += 1;
                status.last_error = Some(e);
            }
        }
    }

    pub fn get(&self, identity: &str) -> Option<TargetStatus> {
        self.targets.get(identity).map(|entry| entry.value().clone())
    }

    /// Every tracked target, sorted by identity.
    pub fn snapshot(&self) -> Vec<(String, TargetStatus)> {
        let mut all: Vec<_> = self
            .targets
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
