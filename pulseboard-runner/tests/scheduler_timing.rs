//! Refresh scheduler timing and teardown, on tokio's paused clock.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pulseboard_core::data::FetchError;
use pulseboard_core::domain::{RecordKind, SlotOrigin, SlotReport, Snapshot};
use pulseboard_runner::{
    DashboardState, LoadStatus, RefreshError, RefreshScheduler, SchedulerPhase, SlotFailure,
    SnapshotSource, MIN_INTERVAL,
};

/// Counts calls; a refresh takes `delay` and fails once `fail_from` is reached.
struct ScriptedSource {
    calls: AtomicUsize,
    delay: Duration,
    slow_first_only: bool,
    fail_from: Option<usize>,
}

impl ScriptedSource {
    fn new(delay: Duration) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            delay,
            slow_first_only: false,
            fail_from: None,
        }
    }

    fn slow_first_only(mut self) -> Self {
        self.slow_first_only = true;
        self
    }

    fn failing_from(mut self, call: usize) -> Self {
        self.fail_from = Some(call);
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotSource for ScriptedSource {
    async fn refresh(&self) -> Result<Snapshot, RefreshError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if n == 1 || !self.slow_first_only {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail_from.is_some_and(|from| n >= from) {
            return Err(RefreshError {
                failures: vec![SlotFailure {
                    kind: RecordKind::Metrics,
                    source: "scripted".into(),
                    error: FetchError::Network(format!("call {n} failed")),
                }],
            });
        }
        let slots = RecordKind::ALL
            .into_iter()
            .map(|kind| SlotReport {
                kind,
                source: "scripted".into(),
                origin: SlotOrigin::Live,
                len: 0,
            })
            .collect();
        Ok(Snapshot::new(vec![], vec![], vec![], vec![], slots))
    }
}

fn scheduler(source: Arc<ScriptedSource>, every: Duration) -> RefreshScheduler {
    RefreshScheduler::new(source, Arc::new(DashboardState::new()), every)
}

#[tokio::test(start_paused = true)]
async fn first_tick_is_immediate_then_periodic() {
    let source = Arc::new(ScriptedSource::new(Duration::ZERO));
    let sched = scheduler(source.clone(), Duration::from_secs(30));
    assert!(sched.start());

    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(source.calls(), 1);
    assert_eq!(sched.state().status(), LoadStatus::Ready);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(source.calls(), 2);
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(source.calls(), 4);
    assert_eq!(sched.completed_ticks(), 4);

    assert!(sched.stop());
    sched.join().await;
}

#[tokio::test(start_paused = true)]
async fn start_twice_is_a_no_op() {
    let source = Arc::new(ScriptedSource::new(Duration::ZERO));
    let sched = scheduler(source.clone(), Duration::from_secs(30));
    assert!(sched.start());
    assert!(!sched.start());
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(source.calls(), 1);
    sched.stop();
}

#[tokio::test(start_paused = true)]
async fn stop_is_idempotent() {
    let source = Arc::new(ScriptedSource::new(Duration::ZERO));
    let sched = scheduler(source, Duration::from_secs(30));
    assert!(!sched.stop());
    sched.start();
    assert!(sched.stop());
    assert!(!sched.stop());
    assert_eq!(sched.phase(), SchedulerPhase::Stopped);
    assert!(!sched.is_running());
}

#[tokio::test(start_paused = true)]
async fn in_flight_refresh_after_stop_is_discarded() {
    let source = Arc::new(ScriptedSource::new(Duration::from_secs(5)));
    let sched = scheduler(source.clone(), Duration::from_secs(30));
    sched.start();

    // First refresh is in flight.
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(source.calls(), 1);
    assert_eq!(sched.phase(), SchedulerPhase::Fetching);

    sched.stop();
    // Let the delayed refresh resolve, and then some.
    tokio::time::sleep(Duration::from_secs(120)).await;
    sched.join().await;

    assert_eq!(source.calls(), 1);
    assert_eq!(sched.state().status(), LoadStatus::Loading);
    assert!(sched.state().snapshot().is_none());
    assert_eq!(sched.phase(), SchedulerPhase::Stopped);
    assert_eq!(sched.completed_ticks(), 0);
}

#[tokio::test(start_paused = true)]
async fn failure_keeps_the_last_good_snapshot() {
    let source = Arc::new(ScriptedSource::new(Duration::ZERO).failing_from(2));
    let sched = scheduler(source, Duration::from_secs(10));
    sched.start();

    tokio::time::sleep(Duration::from_millis(1)).await;
    let good = sched.state().snapshot().unwrap();

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(sched.state().status(), LoadStatus::Stale);
    assert_eq!(sched.phase(), SchedulerPhase::Error);
    assert!(Arc::ptr_eq(&good, &sched.state().snapshot().unwrap()));
    assert!(sched.state().last_error().unwrap().contains("call 2 failed"));
    sched.stop();
}

#[tokio::test(start_paused = true)]
async fn first_load_failure_is_blocking() {
    let source = Arc::new(ScriptedSource::new(Duration::ZERO).failing_from(1));
    let sched = scheduler(source, Duration::from_secs(10));
    sched.start();
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(sched.state().status(), LoadStatus::Failed);
    sched.stop();
}

#[tokio::test(start_paused = true)]
async fn slow_refresh_skips_missed_ticks() {
    // The first refresh outlasts two intervals. The ticks at 10s and 20s are
    // collapsed into one at 25s, then the schedule resumes at 30s and 40s.
    let source = Arc::new(ScriptedSource::new(Duration::from_secs(25)).slow_first_only());
    let sched = scheduler(source.clone(), Duration::from_secs(10));
    sched.start();
    tokio::time::sleep(Duration::from_secs(45)).await;
    assert_eq!(source.calls(), 4);
    sched.stop();
}

#[tokio::test(start_paused = true)]
async fn restart_after_stop_opens_a_new_session() {
    let source = Arc::new(ScriptedSource::new(Duration::ZERO));
    let sched = scheduler(source.clone(), Duration::from_secs(30));
    sched.start();
    tokio::time::sleep(Duration::from_millis(1)).await;
    sched.stop();
    sched.join().await;

    assert!(sched.start());
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(source.calls(), 2);
    assert_eq!(sched.phase(), SchedulerPhase::Idle);
    sched.stop();
}

#[tokio::test(start_paused = true)]
async fn phase_changes_are_published() {
    let source = Arc::new(ScriptedSource::new(Duration::from_secs(2)));
    let sched = scheduler(source, Duration::from_secs(30));
    let mut rx = sched.subscribe();
    sched.start();

    rx.changed().await.unwrap();
    assert_eq!(*rx.borrow_and_update(), SchedulerPhase::Fetching);
    rx.changed().await.unwrap();
    assert_eq!(*rx.borrow_and_update(), SchedulerPhase::Idle);

    sched.stop();
    rx.changed().await.unwrap();
    assert_eq!(*rx.borrow(), SchedulerPhase::Stopped);
}

#[tokio::test(start_paused = true)]
async fn error_returns_to_idle_before_the_next_fetch() {
    let source = Arc::new(ScriptedSource::new(Duration::from_secs(2)).failing_from(1));
    let sched = scheduler(source, Duration::from_secs(10));
    let mut rx = sched.subscribe();
    sched.start();

    let mut seen = Vec::new();
    for _ in 0..4 {
        rx.changed().await.unwrap();
        seen.push(*rx.borrow_and_update());
    }
    assert_eq!(
        seen,
        vec![
            SchedulerPhase::Fetching,
            SchedulerPhase::Error,
            SchedulerPhase::Idle,
            SchedulerPhase::Fetching,
        ]
    );
    sched.stop();
}

#[tokio::test(start_paused = true)]
async fn zero_interval_is_raised_to_the_minimum() {
    let source = Arc::new(ScriptedSource::new(Duration::ZERO));
    let sched = scheduler(source.clone(), Duration::ZERO);
    assert_eq!(sched.interval(), MIN_INTERVAL);

    assert!(sched.start());
    tokio::time::sleep(MIN_INTERVAL * 3).await;
    assert!(source.calls() >= 3);
    assert!(sched.stop());
    sched.join().await;
}
