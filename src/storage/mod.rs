//! Status storage subsystem.
//!
//! # Data Flow
//! ```text
//! check loop outcome
//!     → StatusRecorder::record_status(identity, state)
//!     → recorder.rs (drop if equal to the last known state)
//!     → StatusStore::append (postgres.rs row / memory.rs entry)
//! ```
//!
//! # Design Decisions
//! - Only transitions are persisted, never heartbeats
//! - Write failures after startup are logged and swallowed; a write that
//!   does not finish within its timeout is a failure
//! - An unreachable store at startup is fatal

use std::collections::HashMap;
use std::sync::Arc;
use async_trait::async_trait;
use thiserror::Error;

use crate::config::StorageConfig;
use crate::health::HealthState;

pub mod memory;
pub mod postgres;
pub mod recorder;

pub use memory::{MemoryStore, StatusRecord};
pub use postgres::PostgresStore;
pub use recorder::{DedupRecorder, DEFAULT_WRITE_TIMEOUT};

/// Errors from the status store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("status store unreachable: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("status write failed: {0}")]
    Write(#[source] sqlx::Error),

    #[error("status query failed: {0}")]
    Query(#[source] sqlx::Error),

    #[error("status write exceeded {0:?}")]
    Timeout(std::time::Duration),

    #[error("unsupported storage type '{0}'")]
    Unsupported(String),
}

/// Receives every check outcome. Fire-and-forget for the caller.
#[async_trait]
pub trait StatusRecorder: Send + Sync {
    async fn record_status(&self, identity: &str, state: HealthState);
}

/// Append-only sink for health transitions.
#[async_trait]
pub trait StatusStore: Send + Sync {
    async fn append(&self, identity: &str, state: HealthState) -> Result<(), StorageError>;

    /// Last persisted state per identity, used to seed de-duplication.
    async fn last_states(&self) -> Result<HashMap<String, HealthState>, StorageError> {
        Ok(HashMap::new())
    }
}

/// Build the recorder described by `config`.
///
/// The postgres store is connected eagerly so an unreachable store fails
/// here, before any check loop starts.
pub async fn connect(config: &StorageConfig) -> Result<Arc<dyn StatusRecorder>, StorageError> {
    match config.kind.as_str() {
        "memory" => {
            tracing::info!("Using in-memory status storage");
            Ok(Arc::new(DedupRecorder::new(MemoryStore::new())))
        }
        "postgres" => {
            let store = PostgresStore::connect(config).await?;
            store.ensure_schema().await?;
            let recorder = DedupRecorder::seeded(store).await?;
            tracing::info!(
                host = %config.host,
                dbname = %config.dbname,
                known_targets = recorder.known_targets(),
                "Connected to postgres status storage"
            );
            Ok(Arc::new(recorder))
        }
        other => Err(StorageError::Unsupported(other.to_string())),
    }
}
