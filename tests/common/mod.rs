//! Shared utilities for scheduler integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;

use probe_worker::config::{MonitorConfig, TargetConfig};
use probe_worker::probe::{ProbeError, Prober, ProberRegistry, Target, TargetKind};
use probe_worker::scheduler::Scheduler;
use probe_worker::storage::{DedupRecorder, MemoryStore};

/// How a mock target answers.
#[derive(Debug, Clone, Default)]
#[allow(dead_code)]
pub struct Behaviour {
    /// Time spent inside each check.
    pub delay: Duration,
    /// Number of initial checks that fail.
    pub fail_first: usize,
    /// Never answer; only the deadline ends the check.
    pub hang: bool,
}

/// Per-identity counters, shared across generations.
#[derive(Debug, Default)]
pub struct TargetLedger {
    pub calls: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

#[derive(Default)]
pub struct ProbeLedger {
    targets: DashMap<String, Arc<TargetLedger>>,
    behaviours: Mutex<std::collections::HashMap<String, Behaviour>>,
}

#[allow(dead_code)]
impl ProbeLedger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn configure(&self, identity: &str, behaviour: Behaviour) {
        self.behaviours.lock().unwrap().insert(identity.to_string(), behaviour);
    }

    pub fn calls(&self, identity: &str) -> usize {
        self.entry(identity).calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self, identity: &str) -> usize {
        self.entry(identity).max_in_flight.load(Ordering::SeqCst)
    }

    fn entry(&self, identity: &str) -> Arc<TargetLedger> {
        self.targets.entry(identity.to_string()).or_default().clone()
    }

    fn behaviour(&self, identity: &str) -> Behaviour {
        self.behaviours.lock().unwrap().get(identity).cloned().unwrap_or_default()
    }
}

/// Decrements the in-flight counter even when the check is dropped at its
/// deadline.
struct InFlight(Arc<TargetLedger>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct MockProber {
    identity: String,
    ledger: Arc<ProbeLedger>,
}

#[async_trait]
impl Prober for MockProber {
    fn identity(&self) -> &str {
        &self.identity
    }

    async fn check(&self, _deadline: Instant) -> Result<(), ProbeError> {
        let entry = self.ledger.entry(&self.identity);
        let call = entry.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let now = entry.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        entry.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(entry);

        let behaviour = self.ledger.behaviour(&self.identity);
        if behaviour.hang {
            std::future::pending::<()>().await;
        }
        if !behaviour.delay.is_zero() {
            tokio::time::sleep(behaviour.delay).await;
        }
        if call <= behaviour.fail_first {
            return Err(ProbeError::Connect("connection refused".into()));
        }
        Ok(())
    }
}

/// Registry whose postgres and redis kinds are served by mock probers.
pub fn mock_registry(ledger: &Arc<ProbeLedger>) -> ProberRegistry {
    let mut registry = ProberRegistry::new();
    for kind in [TargetKind::Postgres, TargetKind::Redis] {
        let ledger = ledger.clone();
        registry.register(
            kind,
            Arc::new(move |target: &Target| {
                Ok(Arc::new(MockProber {
                    identity: target.identity().to_string(),
                    ledger: ledger.clone(),
                }) as Arc<dyn Prober>)
            }),
        );
    }
    registry
}

pub fn postgres(host: &str, dbname: &str) -> TargetConfig {
    TargetConfig::new("postgres", host, dbname).with_credentials("monitor", "secret")
}

#[allow(dead_code)]
pub fn redis(host: &str) -> TargetConfig {
    TargetConfig::new("redis", host, "")
}

#[allow(dead_code)]
pub fn config(targets: Vec<TargetConfig>, interval_secs: u64, probe_timeout_secs: u64) -> MonitorConfig {
    let mut config = MonitorConfig::new(targets, interval_secs);
    config.probe_timeout_secs = Some(probe_timeout_secs);
    config
}

/// A scheduler wired to mock probers and an in-memory store.
pub fn scheduler(ledger: &Arc<ProbeLedger>) -> (Scheduler, MemoryStore) {
    let store = MemoryStore::new();
    let recorder = Arc::new(DedupRecorder::new(store.clone()));
    (Scheduler::new(mock_registry(ledger), recorder), store)
}
