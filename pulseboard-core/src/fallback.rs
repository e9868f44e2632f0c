//! Fallback policy: what a failed adapter call turns into.
//!
//! The primary call is awaited exactly once. On failure the policy either
//! substitutes static data (keeping the error as the reason) or hands the
//! error back to the aggregator.

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::data::provider::{FetchError, FetchResult};
use crate::data::synthetic::{fallback_channels, fallback_metrics, SyntheticSource};
use crate::domain::{CampaignRow, ChannelSlice, ChartPoint, MetricSnapshot, SlotOrigin};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackPolicy {
    /// Replace a failed slot with static data.
    #[default]
    Substitute,
    /// Surface the failure to the aggregator.
    Propagate,
}

impl fmt::Display for FallbackPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackPolicy::Substitute => f.write_str("substitute"),
            FallbackPolicy::Propagate => f.write_str("propagate"),
        }
    }
}

impl FromStr for FallbackPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "substitute" => Ok(FallbackPolicy::Substitute),
            "propagate" => Ok(FallbackPolicy::Propagate),
            other => Err(format!("unknown fallback policy '{other}'")),
        }
    }
}

/// Records plus where they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Sourced<T> {
    pub records: Vec<T>,
    pub origin: SlotOrigin,
}

impl<T> Sourced<T> {
    pub fn live(records: Vec<T>) -> Self {
        Self {
            records,
            origin: SlotOrigin::Live,
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self.origin, SlotOrigin::Live)
    }
}

/// Await `primary` once and apply `policy` to its failure.
pub async fn with_fallback<T, Fut, F>(
    policy: FallbackPolicy,
    source: &str,
    primary: Fut,
    fallback: F,
) -> Result<Sourced<T>, FetchError>
where
    Fut: Future<Output = FetchResult<T>>,
    F: FnOnce() -> Vec<T>,
{
    match primary.await {
        Ok(records) => Ok(Sourced::live(records)),
        Err(err) => match policy {
            FallbackPolicy::Propagate => Err(err),
            FallbackPolicy::Substitute => {
                warn!(source, error = %err, "adapter failed, using fallback data");
                Ok(Sourced {
                    records: fallback(),
                    origin: SlotOrigin::Fallback {
                        reason: err.to_string(),
                    },
                })
            }
        },
    }
}

/// Substitute lists, one per record kind.
///
/// Metrics and channels are fixed; chart and table come from the synthetic
/// generator so they look like the live shape.
#[derive(Debug)]
pub struct FallbackData {
    generator: SyntheticSource,
}

impl FallbackData {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            generator: SyntheticSource::new(seed),
        }
    }

    pub fn with_anchor(mut self, today: NaiveDate) -> Self {
        self.generator = self.generator.with_anchor(today);
        self
    }

    pub fn metrics(&self) -> Vec<MetricSnapshot> {
        fallback_metrics()
    }

    pub fn chart(&self) -> Vec<ChartPoint> {
        self.generator.chart()
    }

    pub fn table(&self) -> Vec<CampaignRow> {
        self.generator.table()
    }

    pub fn channels(&self) -> Vec<ChannelSlice> {
        fallback_channels()
    }
}

impl Default for FallbackData {
    fn default() -> Self {
        Self::new(None)
    }
}
