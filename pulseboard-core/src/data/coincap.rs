//! CoinCap adapter: serves all four slots from `/assets` and
//! `/assets/{id}/history`.
//!
//! CoinCap encodes every number as a JSON string. A present but unparseable
//! string is a malformed payload; a missing or null one reads as zero.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use tracing::debug;

use super::provider::{
    ChannelSource, ChartSource, FetchError, FetchResult, MetricsSource, TableSource,
};
use super::transport::{decode, JsonTransport};
use crate::domain::{
    into_daily_series, row_date_label, CampaignRow, CampaignStatus, ChannelSlice, ChartPoint,
    MetricIcon, MetricSnapshot,
};
use crate::format::{format_count, format_currency, format_percent, round2};

pub const COINCAP_SOURCE: &str = "coincap";
pub const COINCAP_BASE_URL: &str = "https://api.coincap.io/v2";

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Asset {
    id: String,
    name: String,
    symbol: String,
    market_cap_usd: Option<String>,
    volume_usd24_hr: Option<String>,
    change_percent24_hr: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryPoint {
    price_usd: Option<String>,
    time: i64,
}

fn num(field: &str, raw: Option<&str>) -> Result<f64, FetchError> {
    match raw {
        None => Ok(0.0),
        Some(s) => s.trim().parse::<f64>().map_err(|_| {
            FetchError::malformed(COINCAP_SOURCE, format!("`{field}` is not a number: {s:?}"))
        }),
    }
}

/// Parsed numeric view of one asset.
struct AssetFigures {
    market_cap: f64,
    volume: f64,
    change: f64,
}

impl Asset {
    fn figures(&self) -> Result<AssetFigures, FetchError> {
        Ok(AssetFigures {
            market_cap: num("marketCapUsd", self.market_cap_usd.as_deref())?,
            volume: num("volumeUsd24Hr", self.volume_usd24_hr.as_deref())?,
            change: num("changePercent24Hr", self.change_percent24_hr.as_deref())?,
        })
    }
}

/// Average 24h change weighted by `weight`; zero when the weights sum to zero.
fn weighted_change(figures: &[AssetFigures], weight: impl Fn(&AssetFigures) -> f64) -> f64 {
    let total: f64 = figures.iter().map(&weight).sum();
    if total > 0.0 {
        figures.iter().map(|f| f.change * weight(f)).sum::<f64>() / total
    } else {
        0.0
    }
}

/// CoinCap v2 public API.
pub struct CoinCapSource {
    transport: Arc<dyn JsonTransport>,
    base_url: String,
    summary_limit: usize,
    table_limit: usize,
    history_days: usize,
    history_asset: String,
    today: Option<NaiveDate>,
}

impl CoinCapSource {
    pub fn new(transport: Arc<dyn JsonTransport>, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            summary_limit: 5,
            table_limit: 12,
            history_days: 30,
            history_asset: "bitcoin".to_string(),
            today: None,
        }
    }

    pub fn with_table_limit(mut self, limit: usize) -> Self {
        self.table_limit = limit;
        self
    }

    pub fn with_history_days(mut self, days: usize) -> Self {
        self.history_days = days;
        self
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn assets_url(&self, limit: usize) -> String {
        format!("{}/assets?limit={limit}", self.base_url)
    }

    pub fn history_url(&self) -> String {
        format!(
            "{}/assets/{}/history?interval=d1",
            self.base_url, self.history_asset
        )
    }

    async fn assets(&self, limit: usize) -> Result<Vec<Asset>, FetchError> {
        let body = self.transport.get_json(&self.assets_url(limit)).await?;
        let envelope: Envelope<Asset> = decode(COINCAP_SOURCE, body)?;
        Ok(envelope.data.into_iter().take(limit).collect())
    }

    /// Four cards over the top assets; no assets means no cards.
    fn summarize(assets: &[Asset]) -> FetchResult<MetricSnapshot> {
        if assets.is_empty() {
            return Ok(Vec::new());
        }
        let figures = assets
            .iter()
            .map(Asset::figures)
            .collect::<Result<Vec<_>, _>>()?;

        let total_cap: f64 = figures.iter().map(|f| f.market_cap).sum();
        let total_volume: f64 = figures.iter().map(|f| f.volume).sum();
        let avg_change = if figures.is_empty() {
            0.0
        } else {
            figures.iter().map(|f| f.change).sum::<f64>() / figures.len() as f64
        };
        let n = figures.len();

        Ok(vec![
            MetricSnapshot::new(
                format!("Total Market Cap (Top {n})"),
                format_currency(total_cap),
                weighted_change(&figures, |f| f.market_cap),
                MetricIcon::DollarSign,
            ),
            MetricSnapshot::new(
                format!("24h Volume (Top {n})"),
                format_currency(total_volume),
                weighted_change(&figures, |f| f.volume),
                MetricIcon::Users,
            ),
            MetricSnapshot::new(
                "Tracked Assets",
                format_count(n as u64),
                0.0,
                MetricIcon::Target,
            ),
            MetricSnapshot::new(
                format!("Avg. 24h Change (Top {n})"),
                format_percent(avg_change),
                avg_change,
                MetricIcon::TrendingUp,
            ),
        ])
    }

    fn parse_history(&self, body: serde_json::Value) -> FetchResult<ChartPoint> {
        let envelope: Envelope<HistoryPoint> = decode(COINCAP_SOURCE, body)?;
        let mut points = Vec::with_capacity(envelope.data.len());
        for item in envelope.data {
            let day = DateTime::<Utc>::from_timestamp_millis(item.time)
                .ok_or_else(|| {
                    FetchError::malformed(COINCAP_SOURCE, format!("invalid time {}", item.time))
                })?
                .date_naive();
            let price = num("priceUsd", item.price_usd.as_deref())?;
            points.push(ChartPoint::new(
                day,
                price,
                price / 20.0,
                price / 100.0,
                price * 2.0,
                price / 5.0,
            ));
        }
        let series = into_daily_series(points);
        let skip = series.len().saturating_sub(self.history_days);
        Ok(series.into_iter().skip(skip).collect())
    }
}

#[async_trait]
impl MetricsSource for CoinCapSource {
    fn name(&self) -> &str {
        COINCAP_SOURCE
    }

    async fn fetch_metrics(&self) -> FetchResult<MetricSnapshot> {
        let assets = self.assets(self.summary_limit).await?;
        Self::summarize(&assets)
    }
}

#[async_trait]
impl ChartSource for CoinCapSource {
    fn name(&self) -> &str {
        COINCAP_SOURCE
    }

    async fn fetch_chart(&self) -> FetchResult<ChartPoint> {
        let body = self.transport.get_json(&self.history_url()).await?;
        let points = self.parse_history(body)?;
        debug!(source = COINCAP_SOURCE, points = points.len(), "chart fetched");
        Ok(points)
    }
}

#[async_trait]
impl TableSource for CoinCapSource {
    fn name(&self) -> &str {
        COINCAP_SOURCE
    }

    async fn fetch_table(&self) -> FetchResult<CampaignRow> {
        let assets = self.assets(self.table_limit).await?;
        let date = row_date_label(self.today.unwrap_or_else(|| Utc::now().date_naive()));
        assets
            .into_iter()
            .map(|asset| {
                let f = asset.figures()?;
                Ok(CampaignRow::new(
                    asset.id,
                    asset.name,
                    asset.symbol,
                    f.market_cap,
                    f.volume,
                    round2(f.change),
                    CampaignStatus::from_ctr(f.change),
                    date.clone(),
                ))
            })
            .collect()
    }
}

#[async_trait]
impl ChannelSource for CoinCapSource {
    fn name(&self) -> &str {
        COINCAP_SOURCE
    }

    async fn fetch_channels(&self) -> FetchResult<ChannelSlice> {
        let assets = self.assets(self.summary_limit).await?;
        assets
            .into_iter()
            .enumerate()
            .map(|(i, asset)| {
                let f = asset.figures()?;
                Ok(ChannelSlice::new(
                    asset.name,
                    f.market_cap,
                    ChannelSlice::palette_color(i),
                ))
            })
            .collect()
    }
}
