//! In-process status store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::health::HealthState;
use crate::storage::{StatusStore, StorageError};

/// One persisted transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusRecord {
    pub identity: String,
    pub state: HealthState,
    pub recorded_at: DateTime<Utc>,
}

/// Keeps every appended transition in memory. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<Mutex<Vec<StatusRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every transition in append order.
    pub fn records(&self) -> Vec<StatusRecord> {
        self.lock().clone()
    }

    /// States recorded for one identity, oldest first.
    pub fn states_for(&self, identity: &str) -> Vec<HealthState> {
        self.lock()
            .iter()
            .filter(|r| r.identity == identity)
            .map(|r| r.state)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<StatusRecord>> {
        // A panic while holding the lock cannot leave the Vec half-written.
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl StatusStore for MemoryStore {
    async fn append(&self, identity: &str, state: HealthState) -> Result<(), StorageError> {
        self.lock().push(StatusRecord {
            identity: identity.to_string(),
            state,
            recorded_at: Utc::now(),
        });
        Ok(())
    }

    async fn last_states(&self) -> Result<HashMap<String, HealthState>, StorageError> {
        let mut last = HashMap::new();
        for record in self.lock().iter() {
            last.insert(record.identity.clone(), record.state);
        }
        Ok(last)
    }
}
