//! Backend probing subsystem.
//!
//! # Data Flow
//! ```text
//! TargetConfig (raw entry)
//!     → target.rs (resolve kind, derive identity)
//!     → registry.rs (kind → factory, once per generation)
//!     → postgres.rs / redis.rs (one Prober per target)
//!     → Prober::check(deadline) from the check loop
//! ```
//!
//! # Design Decisions
//! - Probers never record status; the check loop does
//! - Every check runs under the caller's deadline
//! - A fresh connection per check, nothing is pooled across ticks

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

pub mod postgres;
pub mod redis;
pub mod registry;
pub mod target;

pub use registry::{ProberFactory, ProberRegistry};
pub use target::{Target, TargetError, TargetKind};

/// Errors produced by a single reachability check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("unexpected reply: {0}")]
    UnexpectedReply(String),

    #[error("probe exceeded its {0:?} deadline")]
    Timeout(Duration),
}

/// The capability every backend kind provides.
#[async_trait]
pub trait Prober: Send + Sync {
    /// Stable identity of the probed target.
    fn identity(&self) -> &str;

    /// Check reachability, returning no later than `deadline`.
    async fn check(&self, deadline: Instant) -> Result<(), ProbeError>;
}

/// Time left until `deadline`, for error reporting.
pub(crate) fn budget(deadline: Instant) -> Duration {
    deadline.saturating_duration_since(Instant::now())
}
