//! Aggregator: one refresh tick, four concurrent fetches, one snapshot.
//!
//! Each slot's fetch goes through the fallback policy first. Whatever is
//! still a failure after that is handled by the assembly policy, applied the
//! same way to all four slots within a tick.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use pulseboard_core::data::{ChannelSource, ChartSource, FetchError, MetricsSource, TableSource};
use pulseboard_core::domain::{RecordKind, SlotOrigin, SlotReport, Snapshot};
use pulseboard_core::fallback::{with_fallback, FallbackData, FallbackPolicy, Sourced};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// What a slot failure that survived the fallback policy does to the tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssemblyPolicy {
    /// Any failed slot rejects the whole refresh.
    #[default]
    AllOrNothing,
    /// Failed slots are left empty; the snapshot still resolves.
    PerSlot,
}

impl fmt::Display for AssemblyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssemblyPolicy::AllOrNothing => f.write_str("all_or_nothing"),
            AssemblyPolicy::PerSlot => f.write_str("per_slot"),
        }
    }
}

/// One slot that produced no records this tick.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotFailure {
    pub kind: RecordKind,
    pub source: String,
    pub error: FetchError,
}

impl fmt::Display for SlotFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.kind, self.source, self.error)
    }
}

/// A rejected refresh, listing every slot that failed.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("refresh failed: {}", list(.failures))]
pub struct RefreshError {
    pub failures: Vec<SlotFailure>,
}

fn list(failures: &[SlotFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl RefreshError {
    pub fn kinds(&self) -> Vec<RecordKind> {
        self.failures.iter().map(|f| f.kind).collect()
    }
}

/// Anything the scheduler can ask for a fresh snapshot.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn refresh(&self) -> Result<Snapshot, RefreshError>;
}

/// The adapter behind each slot.
#[derive(Clone)]
pub struct SourceSet {
    pub metrics: Arc<dyn MetricsSource>,
    pub chart: Arc<dyn ChartSource>,
    pub table: Arc<dyn TableSource>,
    pub channels: Arc<dyn ChannelSource>,
}

impl SourceSet {
    /// One adapter serving all four slots.
    pub fn uniform<S>(source: Arc<S>) -> Self
    where
        S: MetricsSource + ChartSource + TableSource + ChannelSource + 'static,
    {
        Self {
            metrics: source.clone(),
            chart: source.clone(),
            table: source.clone(),
            channels: source,
        }
    }

    pub fn source_name(&self, kind: RecordKind) -> &str {
        match kind {
            RecordKind::Metrics => self.metrics.name(),
            RecordKind::Chart => self.chart.name(),
            RecordKind::Table => self.table.name(),
            RecordKind::Channels => self.channels.name(),
        }
    }
}

pub struct Aggregator {
    sources: SourceSet,
    fallback: FallbackPolicy,
    assembly: AssemblyPolicy,
    fallback_data: FallbackData,
    last_fingerprint: Mutex<Option<String>>,
}

impl Aggregator {
    pub fn new(sources: SourceSet) -> Self {
        Self {
            sources,
            fallback: FallbackPolicy::default(),
            assembly: AssemblyPolicy::default(),
            fallback_data: FallbackData::default(),
            last_fingerprint: Mutex::new(None),
        }
    }

    pub fn with_fallback_policy(mut self, policy: FallbackPolicy) -> Self {
        self.fallback = policy;
        self
    }

    pub fn with_assembly_policy(mut self, policy: AssemblyPolicy) -> Self {
        self.assembly = policy;
        self
    }

    pub fn with_fallback_data(mut self, data: FallbackData) -> Self {
        self.fallback_data = data;
        self
    }

    pub fn sources(&self) -> &SourceSet {
        &self.sources
    }

    pub fn assembly_policy(&self) -> AssemblyPolicy {
        self.assembly
    }

    /// Run the four fetches concurrently and assemble a snapshot.
    pub async fn refresh(&self) -> Result<Snapshot, RefreshError> {
        let s = &self.sources;
        let data = &self.fallback_data;
        let (metrics, chart, table, channels) = tokio::join!(
            with_fallback(self.fallback, s.metrics.name(), s.metrics.fetch_metrics(), || {
                data.metrics()
            }),
            with_fallback(self.fallback, s.chart.name(), s.chart.fetch_chart(), || {
                data.chart()
            }),
            with_fallback(self.fallback, s.table.name(), s.table.fetch_table(), || {
                data.table()
            }),
            with_fallback(self.fallback, s.channels.name(), s.channels.fetch_channels(), || {
                data.channels()
            }),
        );

        let mut slots = Vec::with_capacity(RecordKind::ALL.len());
        let mut failures = Vec::new();
        let metrics = self.settle(RecordKind::Metrics, metrics, &mut slots, &mut failures);
        let chart = self.settle(RecordKind::Chart, chart, &mut slots, &mut failures);
        let table = self.settle(RecordKind::Table, table, &mut slots, &mut failures);
        let channels = self.settle(RecordKind::Channels, channels, &mut slots, &mut failures);

        let rejected = match self.assembly {
            AssemblyPolicy::AllOrNothing => !failures.is_empty(),
            AssemblyPolicy::PerSlot => failures.len() == RecordKind::ALL.len(),
        };
        if rejected {
            let err = RefreshError { failures };
            warn!(policy = %self.assembly, error = %err, "refresh rejected");
            return Err(err);
        }

        let snapshot = Snapshot::new(metrics, chart, table, channels, slots);
        self.log_snapshot(&snapshot);
        Ok(snapshot)
    }

    fn settle<T>(
        &self,
        kind: RecordKind,
        result: Result<Sourced<T>, FetchError>,
        slots: &mut Vec<SlotReport>,
        failures: &mut Vec<SlotFailure>,
    ) -> Vec<T> {
        let source = self.sources.source_name(kind).to_string();
        let (records, origin) = match result {
            Ok(sourced) => (sourced.records, sourced.origin),
            Err(error) => {
                warn!(slot = %kind, source = %source, error = %error, "slot failed");
                let origin = SlotOrigin::Failed {
                    error: error.to_string(),
                };
                failures.push(SlotFailure {
                    kind,
                    source: source.clone(),
                    error,
                });
                (Vec::new(), origin)
            }
        };
        slots.push(SlotReport {
            kind,
            source,
            origin,
            len: records.len(),
        });
        records
    }

    fn log_snapshot(&self, snapshot: &Snapshot) {
        let fingerprint = snapshot.fingerprint();
        let mut last = self
            .last_fingerprint
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let changed = last.as_deref() != Some(fingerprint.as_str());
        info!(
            fingerprint = &fingerprint[..12],
            changed,
            degraded = snapshot.is_degraded(),
            metrics = snapshot.metrics.len(),
            chart = snapshot.chart.len(),
            table = snapshot.table.len(),
            channels = snapshot.channels.len(),
            "snapshot assembled"
        );
        *last = Some(fingerprint);
    }
}

#[async_trait]
impl SnapshotSource for Aggregator {
    async fn refresh(&self) -> Result<Snapshot, RefreshError> {
        Aggregator::refresh(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulseboard_core::data::SyntheticSource;

    #[tokio::test]
    async fn synthetic_sources_fill_every_slot() {
        let agg = Aggregator::new(SourceSet::uniform(Arc::new(SyntheticSource::new(Some(4)))));
        let snap = agg.refresh().await.unwrap();
        assert_eq!(snap.slots.len(), 4);
        assert!(!snap.is_degraded());
        for kind in RecordKind::ALL {
            let slot = snap.slot(kind).unwrap();
            assert_eq!(slot.source, "synthetic");
            assert_eq!(slot.len, snap.len_of(kind));
        }
    }

    #[test]
    fn refresh_error_lists_failed_slots() {
        let err = RefreshError {
            failures: vec![
                SlotFailure {
                    kind: RecordKind::Metrics,
                    source: "coingecko".into(),
                    error: FetchError::Network("timed out".into()),
                },
                SlotFailure {
                    kind: RecordKind::Table,
                    source: "coingecko".into(),
                    error: FetchError::Status {
                        status: 429,
                        url: "https://x/coins/markets".into(),
                    },
                },
            ],
        };
        assert_eq!(err.kinds(), vec![RecordKind::Metrics, RecordKind::Table]);
        assert_eq!(
            err.to_string(),
            "refresh failed: metrics (coingecko): network unreachable: timed out; \
             table (coingecko): HTTP 429 from https://x/coins/markets"
        );
    }

    #[test]
    fn assembly_policy_default_is_all_or_nothing() {
        assert_eq!(AssemblyPolicy::default(), AssemblyPolicy::AllOrNothing);
        assert_eq!(AssemblyPolicy::PerSlot.to_string(), "per_slot");
    }
}
