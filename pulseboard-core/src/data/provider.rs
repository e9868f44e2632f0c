//! Source adapter traits and structured fetch errors.
//!
//! One trait per record kind, so a source can serve any subset of the four
//! slots (CoinGecko serves metrics and the table, JSONPlaceholder the chart and
//! channels, CoinCap and the synthetic generator all four). The aggregator
//! holds one trait object per slot and never sees concrete adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{CampaignRow, ChannelSlice, ChartPoint, MetricSnapshot};

/// Why an adapter could not produce its records.
///
/// Every variant is a real failure. An upstream that answers with zero rows is
/// an `Ok(vec![])`, never an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("network unreachable: {0}")]
    Network(String),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("malformed payload from {source_name}: {detail}")]
    Malformed { source_name: String, detail: String },

    #[error("HTTP client unavailable: {0}")]
    Client(String),
}

impl FetchError {
    pub fn malformed(source_name: &str, detail: impl Into<String>) -> Self {
        FetchError::Malformed {
            source_name: source_name.to_string(),
            detail: detail.into(),
        }
    }

    /// Network or HTTP-status failures, as opposed to payload problems.
    pub fn is_transport(&self) -> bool {
        matches!(self, FetchError::Network(_) | FetchError::Status { .. })
    }
}

pub type FetchResult<T> = Result<Vec<T>, FetchError>;

#[async_trait]
pub trait MetricsSource: Send + Sync {
    fn name(&self) -> &str;
    async fn fetch_metrics(&self) -> FetchResult<MetricSnapshot>;
}

#[async_trait]
pub trait ChartSource: Send + Sync {
    fn name(&self) -> &str;
    async fn fetch_chart(&self) -> FetchResult<ChartPoint>;
}

#[async_trait]
pub trait TableSource: Send + Sync {
    fn name(&self) -> &str;
    async fn fetch_table(&self) -> FetchResult<CampaignRow>;
}

#[async_trait]
pub trait ChannelSource: Send + Sync {
    fn name(&self) -> &str;
    async fn fetch_channels(&self) -> FetchResult<ChannelSlice>;
}
