//! Snapshot: the immutable bundle of the four record lists for one tick.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{CampaignRow, ChannelSlice, ChartPoint, MetricSnapshot};

/// The four record lists a snapshot carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Metrics,
    Chart,
    Table,
    Channels,
}

impl RecordKind {
    pub const ALL: [RecordKind; 4] = [
        RecordKind::Metrics,
        RecordKind::Chart,
        RecordKind::Table,
        RecordKind::Channels,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Metrics => "metrics",
            RecordKind::Chart => "chart",
            RecordKind::Table => "table",
            RecordKind::Channels => "channels",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a slot's records came from this tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "origin", rename_all = "snake_case")]
pub enum SlotOrigin {
    /// The adapter answered.
    Live,
    /// The adapter failed and static substitute data was used.
    Fallback { reason: String },
    /// The adapter failed and nothing replaced it; the slot is empty.
    Failed { error: String },
}

/// Per-slot provenance. An empty live slot (`len == 0`, `Live`) is a valid
/// answer and is distinguishable from a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotReport {
    pub kind: RecordKind,
    pub source: String,
    #[serde(flatten)]
    pub origin: SlotOrigin,
    pub len: usize,
}

impl SlotReport {
    pub fn is_live(&self) -> bool {
        matches!(self.origin, SlotOrigin::Live)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.origin, SlotOrigin::Failed { .. })
    }
}

/// One complete dashboard state as of one refresh tick.
///
/// Snapshots are shared behind `Arc` and replaced whole; nothing edits one
/// after assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub taken_at: DateTime<Utc>,
    pub metrics: Vec<MetricSnapshot>,
    pub chart: Vec<ChartPoint>,
    pub table: Vec<CampaignRow>,
    pub channels: Vec<ChannelSlice>,
    pub slots: Vec<SlotReport>,
}

impl Snapshot {
    pub fn new(
        metrics: Vec<MetricSnapshot>,
        chart: Vec<ChartPoint>,
        table: Vec<CampaignRow>,
        channels: Vec<ChannelSlice>,
        slots: Vec<SlotReport>,
    ) -> Self {
        Self {
            taken_at: Utc::now(),
            metrics,
            chart,
            table,
            channels,
            slots,
        }
    }

    pub fn slot(&self, kind: RecordKind) -> Option<&SlotReport> {
        self.slots.iter().find(|s| s.kind == kind)
    }

    /// True when any slot is served from fallback data or failed outright.
    pub fn is_degraded(&self) -> bool {
        self.slots.iter().any(|s| !s.is_live())
    }

    pub fn failed_slots(&self) -> Vec<RecordKind> {
        self.slots
            .iter()
            .filter(|s| s.is_failed())
            .map(|s| s.kind)
            .collect()
    }

    pub fn len_of(&self, kind: RecordKind) -> usize {
        match kind {
            RecordKind::Metrics => self.metrics.len(),
            RecordKind::Chart => self.chart.len(),
            RecordKind::Table => self.table.len(),
            RecordKind::Channels => self.channels.len(),
        }
    }

    /// BLAKE3 digest of the four record lists (capture time excluded).
    ///
    /// Two ticks that produced identical data share a fingerprint.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for bytes in [
            serde_json::to_vec(&self.metrics),
            serde_json::to_vec(&self.chart),
            serde_json::to_vec(&self.table),
            serde_json::to_vec(&self.channels),
        ]
        .into_iter()
        .flatten()
        {
            hasher.update(&(bytes.len() as u64).to_le_bytes());
            hasher.update(&bytes);
        }
        hasher.finalize().to_hex().to_string()
    }
}
