//! Resolved backend targets.
//!
//! A [`Target`] is built from one `TargetConfig` entry. Construction resolves
//! the kind, fills in the default port and derives the identity; it fails for
//! unknown kinds and for entries that cannot be probed.

use std::fmt;
use std::str::FromStr;
use serde::Serialize;
use thiserror::Error;
use crate::config::TargetConfig;

/// Supported backend kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Postgres,
    Redis,
}

impl TargetKind {
    pub fn default_port(&self) -> u16 {
        match self {
            TargetKind::Postgres => 5432,
            TargetKind::Redis => 6379,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Postgres => "postgres",
            TargetKind::Redis => "redis",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetKind {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(TargetKind::Postgres),
            "redis" => Ok(TargetKind::Redis),
            other => Err(TargetError::Unsupported(other.to_string())),
        }
    }
}

/// Why a configured entry cannot be scheduled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetError {
    #[error("unsupported target type '{0}'")]
    Unsupported(String),

    #[error("malformed {kind} target: {reason}")]
    Malformed { kind: TargetKind, reason: String },
}

/// One configured backend endpoint with its derived identity.
#[derive(Clone, PartialEq, Eq)]
pub struct Target {
    kind: TargetKind,
    host: String,
    port: u16,
    user: String,
    password: String,
    dbname: String,
    identity: String,
}

impl Target {
    pub fn from_config(config: &TargetConfig) -> Result<Self, TargetError> {
        let kind: TargetKind = config.kind.parse()?;
        let malformed = |reason: &str| TargetError::Malformed {
            kind,
            reason: reason.to_string(),
        };

        let host = config.host.trim();
        if host.is_empty() {
            return Err(malformed("host is empty"));
        }
        let dbname = config.dbname.trim();

        match kind {
            TargetKind::Postgres => {
                if dbname.is_empty() {
                    return Err(malformed("dbname is empty"));
                }
                if config.user.trim().is_empty() {
                    return Err(malformed("user is empty"));
                }
            }
            TargetKind::Redis => {
                if !dbname.is_empty() && dbname.parse::<u32>().is_err() {
                    return Err(malformed("dbname must be a numeric database index"));
                }
            }
        }

        let identity = match kind {
            TargetKind::Postgres => format!("{}_postgresql_{}", host, dbname),
            TargetKind::Redis if dbname.is_empty() => format!("{}_redis_db", host),
            TargetKind::Redis => format!("{}_redis_{}", host, dbname),
        };

        let port = if config.port == 0 { kind.default_port() } else { config.port };

        Ok(Self {
            kind,
            host: host.to_string(),
            port,
            user: config.user.trim().to_string(),
            password: config.password.clone(),
            dbname: dbname.to_string(),
            identity,
        })
    }

    pub fn kind(&self) -> TargetKind {
        self.kind
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn dbname(&self) -> &str {
        &self.dbname
    }

    /// Stable key used for status de-duplication and log correlation.
    pub fn identity(&self) -> &str {
        &self.identity
    }
}

// Hand-written so the password never reaches a log line.
impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target")
            .field("kind", &self.kind)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("dbname", &self.dbname)
            .field("identity", &self.identity)
            .finish()
    }
}
