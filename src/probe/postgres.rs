//! PostgreSQL reachability probe.
//!
//! Opens a dedicated connection, pings it, runs `SELECT 1` and closes it.

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use sqlx::{Connection, PgConnection};
use tokio::time::{timeout_at, Instant};

use crate::probe::{budget, ProbeError, Prober, Target};

pub struct PostgresProber {
    identity: String,
    options: PgConnectOptions,
}

impl PostgresProber {
    pub fn new(target: &Target) -> Self {
        let options = PgConnectOptions::new()
            .host(target.host())
            .port(target.port())
            .username(target.user())
            .password(target.password())
            .database(target.dbname())
            .ssl_mode(PgSslMode::Disable);

        Self {
            identity: target.identity().to_string(),
            options,
        }
    }

    async fn ping_and_query(&self) -> Result<i32, ProbeError> {
        let mut conn = PgConnection::connect_with(&self.options)
            .await
            .map_err(|e| ProbeError::Connect(e.to_string()))?;

        conn.ping()
            .await
            .map_err(|e| ProbeError::Connect(e.to_string()))?;

        let result: i32 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&mut conn)
            .await
            .map_err(|e| ProbeError::Query(e.to_string()))?;

        if let Err(e) = conn.close().await {
            tracing::debug!(identity = %self.identity, error = %e, "Failed to close probe connection");
        }
        Ok(result)
    }
}

#[async_trait]
impl Prober for PostgresProber {
    fn identity(&self) -> &str {
        &self.identity
    }

    async fn check(&self, deadline: Instant) -> Result<(), ProbeError> {
        let granted = budget(deadline);
        let result = timeout_at(deadline, self.ping_and_query())
            .await
            .map_err(|_| ProbeError::Timeout(granted))??;

        if result != 1 {
            return Err(ProbeError::UnexpectedReply(format!("SELECT 1 returned {}", result)));
        }

        tracing::debug!(identity = %self.identity, result, "Postgres probe succeeded");
        Ok(())
    }
}
