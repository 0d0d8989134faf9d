//! Prober registry.
//!
//! Maps each [`TargetKind`] to the factory that builds its prober. The
//! scheduler consults the registry once per generation; a kind without a
//! factory is treated like an unsupported type and the entry is skipped.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::TargetConfig;
use crate::probe::postgres::PostgresProber;
use crate::probe::redis::RedisProber;
use crate::probe::{ProbeError, Prober, Target, TargetError, TargetKind};

/// Builds a prober for one resolved target.
pub type ProberFactory =
    Arc<dyn Fn(&Target) -> Result<Arc<dyn Prober>, ProbeError> + Send + Sync>;

/// Why an entry produced no prober.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Target(#[from] TargetError),

    #[error("failed to construct {kind} prober: {source}")]
    Construct { kind: TargetKind, source: ProbeError },
}

#[derive(Clone, Default)]
pub struct ProberRegistry {
    factories: HashMap<TargetKind, ProberFactory>,
}

impl ProberRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in postgres and redis probers.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(
            TargetKind::Postgres,
            Arc::new(|target: &Target| Ok(Arc::new(PostgresProber::new(target)) as Arc<dyn Prober>)),
        );
        registry.register(
            TargetKind::Redis,
            Arc::new(|target: &Target| Ok(Arc::new(RedisProber::new(target)?) as Arc<dyn Prober>)),
        );
        registry
    }

    /// Register (or replace) the factory for `kind`.
    pub fn register(&mut self, kind: TargetKind, factory: ProberFactory) {
        self.factories.insert(kind, factory);
    }

    pub fn supports(&self, kind: TargetKind) -> bool {
        self.factories.contains_key(&kind)
    }

    /// Resolve one configuration entry into a prober.
    pub fn build(&self, config: &TargetConfig) -> Result<Arc<dyn Prober>, BuildError> {
        let target = Target::from_config(config)?;
        let factory = self
            .factories
            .get(&target.kind())
            .ok_or_else(|| TargetError::Unsupported(target.kind().to_string()))?;

        factory(&target).map_err(|source| BuildError::Construct {
            kind: target.kind(),
            source,
        })
    }
}
