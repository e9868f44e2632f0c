//! Refresh scheduler: periodic ticks driving the view state.
//!
//! One spawned task per run. The first tick fires immediately, then once per
//! interval; missed ticks are skipped, never replayed. Phase changes are
//! published on a `watch` channel.
//!
//! Teardown is by session: `stop()` revokes the run's session token in the
//! view state, so a refresh still in flight when `stop()` returns settles
//! and is discarded.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::aggregator::SnapshotSource;
use crate::view_state::{DashboardState, SessionToken};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerPhase {
    /// Waiting for the next tick.
    Idle,
    /// A refresh is in flight.
    Fetching,
    /// The last tick failed; waiting for the next one.
    Error,
    /// `stop()` was called.
    Stopped,
}

impl fmt::Display for SchedulerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SchedulerPhase::Idle => "idle",
            SchedulerPhase::Fetching => "fetching",
            SchedulerPhase::Error => "error",
            SchedulerPhase::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

struct Run {
    token: SessionToken,
    shutdown: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

/// Shortest accepted refresh interval; `new` raises anything below it.
pub const MIN_INTERVAL: Duration = Duration::from_millis(10);

pub struct RefreshScheduler {
    source: Arc<dyn SnapshotSource>,
    state: Arc<DashboardState>,
    interval: Duration,
    phase: Arc<watch::Sender<SchedulerPhase>>,
    ticks: Arc<AtomicU64>,
    run: Mutex<Option<Run>>,
}

impl RefreshScheduler {
    pub fn new(
        source: Arc<dyn SnapshotSource>,
        state: Arc<DashboardState>,
        interval: Duration,
    ) -> Self {
        if interval < MIN_INTERVAL {
            warn!(?interval, "refresh interval too short, using the minimum");
        }
        let (phase, _) = watch::channel(SchedulerPhase::Idle);
        Self {
            source,
            state,
            interval: interval.max(MIN_INTERVAL),
            phase: Arc::new(phase),
            ticks: Arc::new(AtomicU64::new(0)),
            run: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn state(&self) -> &Arc<DashboardState> {
        &self.state
    }

    pub fn phase(&self) -> SchedulerPhase {
        *self.phase.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SchedulerPhase> {
        self.phase.subscribe()
    }

    /// Ticks whose outcome reached the view state.
    pub fn completed_ticks(&self) -> u64 {
        self.ticks.load(Ordering::Acquire)
    }

    fn lock_run(&self) -> MutexGuard<'_, Option<Run>> {
        self.run.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_running(&self) -> bool {
        self.lock_run()
            .as_ref()
            .is_some_and(|run| self.state.is_session_active(run.token))
    }

    /// Spawn the refresh loop. Returns `false` if a run is already active.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> bool {
        let mut run = self.lock_run();
        if run
            .as_ref()
            .is_some_and(|r| self.state.is_session_active(r.token))
        {
            return false;
        }

        let token = self.state.open_session();
        let (shutdown, shutdown_rx) = watch::channel(false);
        // Leaves `Stopped` from a previous run; a no-op when already idle.
        self.phase.send_if_modified(|p| {
            let changed = *p != SchedulerPhase::Idle;
            *p = SchedulerPhase::Idle;
            changed
        });

        let handle = tokio::spawn(refresh_loop(
            Arc::clone(&self.source),
            Arc::clone(&self.state),
            token,
            self.interval,
            Arc::clone(&self.phase),
            Arc::clone(&self.ticks),
            shutdown_rx,
        ));
        info!(interval_ms = self.interval.as_millis() as u64, "scheduler started");
        *run = Some(Run {
            token,
            shutdown,
            handle: Some(handle),
        });
        true
    }

    /// Stop the current run. Idempotent; returns whether a run was stopped.
    ///
    /// After this returns the run can no longer write the view state, even
    /// if its refresh is still in flight.
    pub fn stop(&self) -> bool {
        let run = self.lock_run();
        let Some(run) = run.as_ref() else {
            return false;
        };
        if !self.state.close_session(run.token) {
            return false;
        }
        let _ = run.shutdown.send(true);
        self.phase.send_replace(SchedulerPhase::Stopped);
        info!("scheduler stopped");
        true
    }

    /// Wait for the loop task of the last run to exit.
    pub async fn join(&self) {
        let handle = self.lock_run().as_mut().and_then(|run| run.handle.take());
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                warn!(error = %err, "refresh loop ended abnormally");
            }
        }
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Publish `next` unless the scheduler has been stopped.
fn set_phase(phase: &watch::Sender<SchedulerPhase>, next: SchedulerPhase) {
    phase.send_if_modified(|current| {
        if *current == SchedulerPhase::Stopped || *current == next {
            false
        } else {
            *current = next;
            true
        }
    });
}

async fn refresh_loop(
    source: Arc<dyn SnapshotSource>,
    state: Arc<DashboardState>,
    token: SessionToken,
    interval: Duration,
    phase: Arc<watch::Sender<SchedulerPhase>>,
    ticks: Arc<AtomicU64>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.changed() => break,
        }
        if *shutdown.borrow() || !state.is_session_active(token) {
            break;
        }

        // `Error` holds until the next tick, which returns to `Idle` first.
        if *phase.borrow() == SchedulerPhase::Error {
            set_phase(&phase, SchedulerPhase::Idle);
            tokio::task::yield_now().await;
        }
        set_phase(&phase, SchedulerPhase::Fetching);
        let outcome = source.refresh().await;
        let failed = outcome.is_err();

        if !state.apply(token, outcome) {
            debug!("refresh settled after stop, result discarded");
            break;
        }
        let n = ticks.fetch_add(1, Ordering::AcqRel) + 1;
        debug!(tick = n, failed, "tick applied");
        set_phase(
            &phase,
            if failed {
                SchedulerPhase::Error
            } else {
                SchedulerPhase::Idle
            },
        );
    }
}
