//! PostgreSQL status store.
//!
//! One row per health transition in `database_status_log`.

use std::collections::HashMap;
use std::time::Duration;
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::PgPool;

use crate::config::StorageConfig;
use crate::health::HealthState;
use crate::storage::{StatusStore, StorageError};

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS database_status_log (
    id BIGSERIAL PRIMARY KEY,
    database_name TEXT NOT NULL,
    status TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
)";

#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect and verify the store is reachable.
    pub async fn connect(config: &StorageConfig) -> Result<Self, StorageError> {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.dbname)
            .ssl_mode(PgSslMode::Disable);

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_with(options)
            .await
            .map_err(StorageError::Connect)?;

        Ok(Self { pool })
    }

    pub async fn ensure_schema(&self) -> Result<(), StorageError> {
        sqlx::query(CREATE_TABLE)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Query)?;
        Ok(())
    }
}

#[async_trait]
impl StatusStore for PostgresStore {
    async fn append(&self, identity: &str, state: HealthState) -> Result<(), StorageError> {
        sqlx::query("INSERT INTO database_status_log (database_name, status) VALUES ($1, $2)")
            .bind(identity)
            .bind(state.as_str())
            .execute(&self.pool)
            .await
            .map_err(StorageError::Write)?;
        Ok(())
    }

    async fn last_states(&self) -> Result<HashMap<String, HealthState>, StorageError> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT DISTINCT ON (database_name) database_name, status \
             FROM database_status_log ORDER BY database_name, id DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Query)?;

        let mut last = HashMap::with_capacity(rows.len());
        for (identity, status) in rows {
            match status.parse::<HealthState>() {
                Ok(state) => {
                    last.insert(identity, state);
                }
                Err(e) => tracing::warn!(identity = %identity, error = %e, "Ignoring unknown stored status"),
            }
        }
        Ok(last)
    }
}
