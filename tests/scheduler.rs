//! Scheduler behaviour under paused time.
//!
//! Targets are served by mock probers (see `common`), so every test controls
//! exactly when a check succeeds, fails, stalls or hangs.

mod common;

use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use tokio::time::{sleep, Instant};

use common::{config, postgres, redis, Behaviour, ProbeLedger};
use probe_worker::config::TargetConfig;
use probe_worker::health::HealthState;
use probe_worker::scheduler::Scheduler;
use probe_worker::storage::{DedupRecorder, MemoryStore, StatusStore, StorageError, DEFAULT_WRITE_TIMEOUT};

#[tokio::test(start_paused = true)]
async fn test_one_loop_per_target() {
    let ledger = ProbeLedger::new();
    let (mut scheduler, _store) = common::scheduler(&ledger);

    let summary = scheduler
        .start(config(
            vec![postgres("db1", "app"), postgres("db2", "app"), redis("cache")],
            5,
            2,
        ))
        .unwrap();

    assert_eq!(summary.epoch, 0);
    assert_eq!(
        summary.scheduled,
        vec!["db1_postgresql_app", "db2_postgresql_app", "cache_redis_db"]
    );
    assert!(summary.skipped.is_empty());
    assert_eq!(scheduler.running_loops(), 3);

    sleep(Duration::from_millis(5_500)).await;
    for identity in &summary.scheduled {
        assert_eq!(ledger.calls(identity), 1, "{identity} should have ticked once");
    }

    scheduler.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_first_tick_waits_one_interval() {
    let ledger = ProbeLedger::new();
    let (mut scheduler, store) = common::scheduler(&ledger);
    scheduler.start(config(vec![postgres("db1", "app")], 5, 2)).unwrap();

    sleep(Duration::from_millis(4_900)).await;
    assert_eq!(ledger.calls("db1_postgresql_app"), 0);
    assert!(store.is_empty());

    sleep(Duration::from_millis(200)).await;
    assert_eq!(ledger.calls("db1_postgresql_app"), 1);

    scheduler.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_steady_targets_record_once() {
    let ledger = ProbeLedger::new();
    let (mut scheduler, store) = common::scheduler(&ledger);
    scheduler
        .start(config(vec![postgres("db1", "app"), postgres("db2", "app")], 5, 2))
        .unwrap();

    sleep(Duration::from_secs(12)).await;

    for identity in ["db1_postgresql_app", "db2_postgresql_app"] {
        assert_eq!(ledger.calls(identity), 2);
        assert_eq!(store.states_for(identity), vec![HealthState::Normal]);
    }
    assert_eq!(store.len(), 2);

    scheduler.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_unsupported_target_does_not_block_others() {
    let ledger = ProbeLedger::new();
    let (mut scheduler, store) = common::scheduler(&ledger);

    let summary = scheduler
        .start(config(
            vec![TargetConfig::new("mysql", "legacy", "app"), postgres("db1", "app")],
            1,
            1,
        ))
        .unwrap();

    assert_eq!(summary.scheduled, vec!["db1_postgresql_app"]);
    assert_eq!(summary.skipped.len(), 1);
    assert_eq!(summary.skipped[0].index, 0);
    assert_eq!(summary.skipped[0].kind, "mysql");
    assert_eq!(scheduler.running_loops(), 1);

    sleep(Duration::from_millis(1_500)).await;
    assert_eq!(store.states_for("db1_postgresql_app"), vec![HealthState::Normal]);

    scheduler.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_transitions_are_recorded() {
    let ledger = ProbeLedger::new();
    ledger.configure(
        "db1_postgresql_app",
        Behaviour {
            fail_first: 2,
            ..Default::default()
        },
    );
    let (mut scheduler, store) = common::scheduler(&ledger);
    scheduler.start(config(vec![postgres("db1", "app")], 1, 1)).unwrap();

    sleep(Duration::from_millis(4_500)).await;

    assert_eq!(ledger.calls("db1_postgresql_app"), 4);
    assert_eq!(
        store.states_for("db1_postgresql_app"),
        vec![HealthState::Abnormal, HealthState::Normal]
    );

    let status = scheduler.board().get("db1_postgresql_app").unwrap();
    assert_eq!(status.checks, 4);
    assert_eq!(status.failures, 2);
    assert_eq!(status.state, Some(HealthState::Normal));
    assert!(status.last_error.is_none());

    scheduler.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_reload_replaces_target_set() {
    let ledger = ProbeLedger::new();
    let (mut scheduler, _store) = common::scheduler(&ledger);
    scheduler.start(config(vec![postgres("a", "app")], 2, 1)).unwrap();

    sleep(Duration::from_millis(4_500)).await;
    assert_eq!(ledger.calls("a_postgresql_app"), 2);

    let summary = scheduler
        .reload(config(vec![postgres("b", "app")], 2, 1))
        .await
        .unwrap();
    assert_eq!(summary.epoch, 1);
    assert_eq!(summary.scheduled, vec!["b_postgresql_app"]);
    assert_eq!(scheduler.epoch(), Some(1));
    assert_eq!(scheduler.identities(), vec!["b_postgresql_app"]);

    // B ticks within one interval of the reload.
    sleep(Duration::from_millis(2_100)).await;
    assert_eq!(ledger.calls("b_postgresql_app"), 1);

    // A never ticks again.
    sleep(Duration::from_secs(10)).await;
    assert_eq!(ledger.calls("a_postgresql_app"), 2);

    let board = scheduler.board();
    assert!(board.get("a_postgresql_app").is_none());
    assert_eq!(board.get("b_postgresql_app").unwrap().epoch, 1);

    scheduler.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_reload_keeps_history_of_surviving_targets() {
    let ledger = ProbeLedger::new();
    let (mut scheduler, store) = common::scheduler(&ledger);
    scheduler.start(config(vec![postgres("a", "app")], 1, 1)).unwrap();

    sleep(Duration::from_millis(2_500)).await;
    scheduler
        .reload(config(vec![postgres("a", "app"), redis("cache")], 1, 1))
        .await
        .unwrap();
    sleep(Duration::from_millis(1_500)).await;

    let status = scheduler.board().get("a_postgresql_app").unwrap();
    assert_eq!(status.epoch, 1);
    assert_eq!(status.checks, 3);

    // Still normal across the reload, so nothing new is written for it.
    assert_eq!(store.states_for("a_postgresql_app"), vec![HealthState::Normal]);
    assert_eq!(store.states_for("cache_redis_db"), vec![HealthState::Normal]);

    scheduler.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_generations_never_overlap() {
    let ledger = ProbeLedger::new();
    ledger.configure(
        "slow_postgresql_app",
        Behaviour {
            delay: Duration::from_millis(1_500),
            ..Default::default()
        },
    );
    let (mut scheduler, _store) = common::scheduler(&ledger);
    scheduler.start(config(vec![postgres("slow", "app")], 1, 2)).unwrap();

    for round in 0..10u64 {
        sleep(Duration::from_millis(700 + 300 * (round % 3))).await;
        scheduler
            .reload(config(vec![postgres("slow", "app")], 1 + round % 2, 2))
            .await
            .unwrap();
    }
    sleep(Duration::from_secs(5)).await;

    assert!(ledger.calls("slow_postgresql_app") > 0);
    assert_eq!(ledger.max_in_flight("slow_postgresql_app"), 1);
    assert_eq!(scheduler.epoch(), Some(10));

    scheduler.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_teardown_bounded_by_probe_timeout() {
    let ledger = ProbeLedger::new();
    ledger.configure(
        "stuck_postgresql_app",
        Behaviour {
            hang: true,
            ..Default::default()
        },
    );
    let (mut scheduler, store) = common::scheduler(&ledger);
    scheduler.start(config(vec![postgres("stuck", "app")], 1, 3)).unwrap();

    // First tick starts at 1s and is abandoned at its 4s deadline.
    sleep(Duration::from_millis(1_500)).await;
    assert_eq!(ledger.calls("stuck_postgresql_app"), 1);

    let started = Instant::now();
    let report = scheduler.shutdown().await.unwrap();
    assert!(started.elapsed() <= Duration::from_secs(3));
    assert_eq!(report.stopped, 1);
    assert_eq!(report.panicked, 0);

    // The in-flight tick still lands as a failure.
    assert_eq!(store.states_for("stuck_postgresql_app"), vec![HealthState::Abnormal]);
    let status = scheduler.board().get("stuck_postgresql_app").unwrap();
    assert!(status.last_error.unwrap().contains("deadline"));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_all_loops() {
    let ledger = ProbeLedger::new();
    let (mut scheduler, _store) = common::scheduler(&ledger);
    scheduler
        .start(config(vec![postgres("db1", "app"), redis("cache")], 1, 1))
        .unwrap();

    sleep(Duration::from_millis(2_500)).await;
    let report = scheduler.shutdown().await.unwrap();
    assert_eq!(report.epoch, 0);
    assert_eq!(report.stopped, 2);
    assert_eq!(scheduler.running_loops(), 0);
    assert!(scheduler.active_config().is_none());

    let before = ledger.calls("db1_postgresql_app");
    sleep(Duration::from_secs(10)).await;
    assert_eq!(ledger.calls("db1_postgresql_app"), before);
    assert!(scheduler.shutdown().await.is_none());
}

/// Status store whose writes for one identity never complete.
#[derive(Clone, Default)]
struct StalledStore {
    inner: MemoryStore,
}

#[async_trait]
impl StatusStore for StalledStore {
    async fn append(&self, identity: &str, state: HealthState) -> Result<(), StorageError> {
        if identity == "a_postgresql_app" {
            std::future::pending::<()>().await;
        }
        self.inner.append(identity, state).await
    }
}

#[tokio::test(start_paused = true)]
async fn test_stalled_status_write_is_contained() {
    let ledger = ProbeLedger::new();
    let store = StalledStore::default();
    let recorder = Arc::new(DedupRecorder::new(store.clone()).with_write_timeout(Duration::from_secs(5)));
    let mut scheduler = Scheduler::new(common::mock_registry(&ledger), recorder);
    scheduler
        .start(config(vec![postgres("a", "app"), postgres("b", "app")], 1, 1))
        .unwrap();

    sleep(Duration::from_millis(3_500)).await;
    assert_eq!(ledger.calls("b_postgresql_app"), 3);
    assert_eq!(store.inner.states_for("b_postgresql_app"), vec![HealthState::Normal]);
    assert!(store.inner.states_for("a_postgresql_app").is_empty());

    // a is parked in a write that gives up 5s after its 1s tick.
    let started = Instant::now();
    let report = scheduler.shutdown().await.unwrap();
    assert!(started.elapsed() <= Duration::from_secs(1) + DEFAULT_WRITE_TIMEOUT);
    assert_eq!(report.stopped, 2);
}
