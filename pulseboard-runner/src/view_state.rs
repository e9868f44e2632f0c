//! View state: the single holder of the snapshot the view renders.
//!
//! The snapshot is replaced whole under a write lock. Writers must hold the
//! current session token; closing the session takes the same lock, so once
//! `close_session` returns no write from that session can land.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use pulseboard_core::domain::Snapshot;
use serde::Serialize;

use crate::aggregator::RefreshError;

/// What the view should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStatus {
    /// No refresh has resolved yet.
    Loading,
    /// Latest refresh succeeded with every slot live.
    Ready,
    /// Latest refresh succeeded but some slot is fallback or empty-on-failure.
    Degraded,
    /// Latest refresh failed; the previous snapshot is still shown.
    Stale,
    /// The first refresh failed; there is nothing to show.
    Failed,
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LoadStatus::Loading => "loading",
            LoadStatus::Ready => "ready",
            LoadStatus::Degraded => "degraded",
            LoadStatus::Stale => "stale",
            LoadStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Write capability for one scheduler run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionToken(u64);

#[derive(Debug)]
struct Inner {
    snapshot: Option<Arc<Snapshot>>,
    status: LoadStatus,
    last_error: Option<String>,
    last_update: Option<DateTime<Utc>>,
    connected: bool,
    session: Option<SessionToken>,
}

/// Read-only copy of the view state at one instant.
#[derive(Debug, Clone)]
pub struct ViewState {
    pub snapshot: Option<Arc<Snapshot>>,
    pub status: LoadStatus,
    pub last_error: Option<String>,
    pub last_update: Option<DateTime<Utc>>,
    pub connected: bool,
}

impl ViewState {
    pub fn connection_label(&self) -> &'static str {
        connection_label(self.connected)
    }

    pub fn updated_label(&self, now: DateTime<Utc>) -> String {
        format_last_update(self.last_update, now)
    }
}

#[derive(Debug)]
pub struct DashboardState {
    inner: RwLock<Inner>,
    next_session: AtomicU64,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new()
    }
}

impl DashboardState {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                snapshot: None,
                status: LoadStatus::Loading,
                last_error: None,
                last_update: None,
                connected: false,
                session: None,
            }),
            next_session: AtomicU64::new(1),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a new writer session, revoking any previous one.
    pub fn open_session(&self) -> SessionToken {
        let token = SessionToken(self.next_session.fetch_add(1, Ordering::Relaxed));
        self.write().session = Some(token);
        token
    }

    /// Revoke `token`. Returns whether it was the active session.
    pub fn close_session(&self, token: SessionToken) -> bool {
        let mut inner = self.write();
        if inner.session == Some(token) {
            inner.session = None;
            true
        } else {
            false
        }
    }

    pub fn is_session_active(&self, token: SessionToken) -> bool {
        self.read().session == Some(token)
    }

    /// Apply one tick's outcome. Returns `false` (and changes nothing) when
    /// `token` is no longer the active session.
    pub fn apply(&self, token: SessionToken, outcome: Result<Snapshot, RefreshError>) -> bool {
        let mut inner = self.write();
        if inner.session != Some(token) {
            return false;
        }
        match outcome {
            Ok(snapshot) => {
                inner.status = if snapshot.is_degraded() {
                    LoadStatus::Degraded
                } else {
                    LoadStatus::Ready
                };
                inner.connected = snapshot.slots.iter().any(|s| s.is_live());
                inner.last_update = Some(snapshot.taken_at);
                inner.last_error = None;
                inner.snapshot = Some(Arc::new(snapshot));
            }
            Err(err) => {
                inner.status = if inner.snapshot.is_some() {
                    LoadStatus::Stale
                } else {
                    LoadStatus::Failed
                };
                inner.connected = false;
                inner.last_error = Some(err.to_string());
            }
        }
        true
    }

    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.read().snapshot.clone()
    }

    pub fn status(&self) -> LoadStatus {
        self.read().status
    }

    pub fn last_error(&self) -> Option<String> {
        self.read().last_error.clone()
    }

    pub fn view(&self) -> ViewState {
        let inner = self.read();
        ViewState {
            snapshot: inner.snapshot.clone(),
            status: inner.status,
            last_error: inner.last_error.clone(),
            last_update: inner.last_update,
            connected: inner.connected,
        }
    }
}

pub fn connection_label(connected: bool) -> &'static str {
    if connected {
        "Live APIs"
    } else {
        "Offline"
    }
}

/// Relative "updated" label: `Never`, `12s ago`, `3m ago`, `2h ago`.
pub fn format_last_update(last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(last) = last else {
        return "Never".to_string();
    };
    let seconds = (now - last).num_seconds().max(0);
    if seconds < 60 {
        return format!("{seconds}s ago");
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{minutes}m ago");
    }
    format!("{}h ago", minutes / 60)
}
