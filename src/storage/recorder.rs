//! De-duplicating status recorder.
//!
//! Keeps the last known state per identity and forwards a state to the store
//! only when it differs. Each identity has its own lock, held across the store
//! write, so two concurrent calls for the same identity cannot both persist
//! the same state while other identities proceed independently. Writes are
//! bounded by a timeout; a write that times out counts as failed.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::health::HealthState;
use crate::observability::metrics;
use crate::storage::{StatusRecorder, StatusStore, StorageError};

/// Upper bound for a single store write.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(5);

type Slot = Arc<Mutex<Option<HealthState>>>;

pub struct DedupRecorder<S> {
    store: S,
    last: DashMap<String, Slot>,
    write_timeout: Duration,
}

impl<S: StatusStore> DedupRecorder<S> {
    pub fn new(store: S) -> Self {
        Self::with_states(store, HashMap::new())
    }

    /// Start from the states already persisted by a previous run.
    pub async fn seeded(store: S) -> Result<Self, StorageError> {
        let last = store.last_states().await?;
        Ok(Self::with_states(store, last))
    }

    fn with_states(store: S, states: HashMap<String, HealthState>) -> Self {
        let last = states
            .into_iter()
            .map(|(identity, state)| (identity, Arc::new(Mutex::new(Some(state)))))
            .collect();
        Self {
            store,
            last,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }

    pub fn with_write_timeout(mut self, write_timeout: Duration) -> Self {
        self.write_timeout = write_timeout;
        self
    }

    fn slot(&self, identity: &str) -> Slot {
        // Clone the Arc so the map shard is not held across an await.
        self.last.entry(identity.to_string()).or_default().clone()
    }

    /// Record `state` if it is a transition. Returns whether a write happened.
    pub async fn record(&self, identity: &str, state: HealthState) -> Result<bool, StorageError> {
        let slot = self.slot(identity);
        let mut last = slot.lock().await;
        if *last == Some(state) {
            return Ok(false);
        }

        tokio::time::timeout(self.write_timeout, self.store.append(identity, state))
            .await
            .map_err(|_| StorageError::Timeout(self.write_timeout))??;
        *last = Some(state);
        Ok(true)
    }

    pub async fn last_state(&self, identity: &str) -> Option<HealthState> {
        let slot = self.last.get(identity)?.value().clone();
        let state = *slot.lock().await;
        state
    }

    /// Number of identities the recorder has seen.
    pub fn known_targets(&self) -> usize {
        self.last.len()
    }
}

#[async_trait]
impl<S: StatusStore> StatusRecorder for DedupRecorder<S> {
    async fn record_status(&self, identity: &str, state: HealthState) {
        match self.record(identity, state).await {
            Ok(true) => {
                metrics::record_status_write(true);
                tracing::info!(identity = %identity, state = %state, "Health state changed");
            }
            Ok(false) => {}
            Err(e) => {
                metrics::record_status_write(false);
                tracing::error!(identity = %identity, state = %state, error = %e, "Failed to record status");
            }
        }
    }
}
