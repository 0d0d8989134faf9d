//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the worker.
//! Field names follow the on-disk `config.json` layout; all types derive
//! Serde traits so the same structures load from JSON or TOML.

use std::time::Duration;
use serde::{Deserialize, Serialize};

/// Upper bound for the derived probe timeout when none is configured.
const MAX_DEFAULT_PROBE_TIMEOUT_SECS: u64 = 10;

/// Root configuration for the probe worker.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MonitorConfig {
    /// Backend targets to probe.
    #[serde(default)]
    pub databases: Vec<TargetConfig>,

    /// Check interval in seconds.
    pub interval: u64,

    /// Per-probe deadline in seconds. Defaults to `min(interval, 10)`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probe_timeout_secs: Option<u64>,

    /// Where status transitions are persisted.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Metrics settings.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl MonitorConfig {
    /// Create a configuration with the given targets and interval and
    /// in-memory storage.
    pub fn new(databases: Vec<TargetConfig>, interval_secs: u64) -> Self {
        Self {
            databases,
            interval: interval_secs,
            probe_timeout_secs: None,
            storage: StorageConfig::memory(),
            observability: ObservabilityConfig::default(),
        }
    }

    /// The tick period of every check loop.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval)
    }

    /// The deadline granted to a single probe.
    pub fn probe_timeout(&self) -> Duration {
        let secs = self
            .probe_timeout_secs
            .unwrap_or_else(|| self.interval.min(MAX_DEFAULT_PROBE_TIMEOUT_SECS));
        Duration::from_secs(secs)
    }
}

/// A single configured backend endpoint, as written in the file.
///
/// The `type` string is kept raw here; it is resolved against the supported
/// kinds when the scheduler builds its probers so that an unknown kind only
/// drops this entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TargetConfig {
    /// Backend kind, e.g. "postgres" or "redis".
    #[serde(rename = "type")]
    pub kind: String,

    pub host: String,

    /// Port; 0 selects the default port of the kind.
    #[serde(default)]
    pub port: u16,

    #[serde(default)]
    pub user: String,

    #[serde(default)]
    pub password: String,

    /// Database name (postgres) or numeric database index (redis).
    #[serde(default)]
    pub dbname: String,
}

impl TargetConfig {
    /// Convenience constructor used by tools and tests.
    pub fn new(kind: &str, host: &str, dbname: &str) -> Self {
        Self {
            kind: kind.to_string(),
            host: host.to_string(),
            port: 0,
            user: String::new(),
            password: String::new(),
            dbname: dbname.to_string(),
        }
    }

    pub fn with_credentials(mut self, user: &str, password: &str) -> Self {
        self.user = user.to_string();
        self.password = password.to_string();
        self
    }
}

/// Status storage configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage backend: "postgres" or "memory".
    #[serde(rename = "type")]
    pub kind: String,

    pub host: String,

    pub port: u16,

    pub user: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub password: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub dbname: String,

    /// Connection pool size for the postgres store.
    pub max_connections: u32,
}

impl StorageConfig {
    /// Storage that keeps transitions in process memory.
    pub fn memory() -> Self {
        Self {
            kind: "memory".to_string(),
            ..Self::default()
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            kind: "postgres".to_string(),
            host: String::new(),
            port: 5432,
            user: String::new(),
            password: String::new(),
            dbname: String::new(),
            max_connections: 4,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Expose a Prometheus scrape endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
