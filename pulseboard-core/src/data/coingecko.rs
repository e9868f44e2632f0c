//! CoinGecko adapter: headline metrics from `/global`, campaign rows from
//! `/coins/markets`.
//!
//! Crypto figures stand in for marketing figures: total market cap is shown as
//! revenue, 24h volume as active users, and each coin becomes a campaign.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracing::debug;

use super::provider::{FetchError, FetchResult, MetricsSource, TableSource};
use super::transport::{decode, JsonTransport};
use crate::domain::{
    row_date_label, CampaignRow, CampaignStatus, MetricIcon, MetricSnapshot, MARKETING_CHANNELS,
};
use crate::format::{format_currency, format_number, round2};

pub const COINGECKO_SOURCE: &str = "coingecko";
pub const COINGECKO_BASE_URL: &str = "https://api.coingecko.com/api/v3";

#[derive(Debug, Deserialize)]
struct GlobalResponse {
    data: GlobalData,
}

#[derive(Debug, Deserialize)]
struct GlobalData {
    total_market_cap: HashMap<String, f64>,
    total_volume: HashMap<String, f64>,
    market_cap_percentage: HashMap<String, f64>,
    #[serde(default)]
    market_cap_change_percentage_24h_usd: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct MarketCoin {
    id: String,
    name: String,
    current_price: Option<f64>,
    market_cap_rank: Option<u32>,
    price_change_percentage_24h: Option<f64>,
}

/// CoinGecko public API (no key).
pub struct CoinGeckoSource {
    transport: Arc<dyn JsonTransport>,
    base_url: String,
    per_page: usize,
    today: Option<NaiveDate>,
}

impl CoinGeckoSource {
    pub fn new(transport: Arc<dyn JsonTransport>, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            per_page: 12,
            today: None,
        }
    }

    pub fn with_per_page(mut self, per_page: usize) -> Self {
        self.per_page = per_page;
        self
    }

    /// Pin the date stamped on table rows.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn global_url(&self) -> String {
        format!("{}/global", self.base_url)
    }

    pub fn markets_url(&self) -> String {
        format!(
            "{}/coins/markets?vs_currency=usd&order=market_cap_desc&per_page={}&page=1",
            self.base_url, self.per_page
        )
    }

    fn parse_global(body: serde_json::Value) -> FetchResult<MetricSnapshot> {
        let global: GlobalResponse = decode(COINGECKO_SOURCE, body)?;
        let data = global.data;
        let usd = |map: &HashMap<String, f64>, field: &str| {
            map.get("usd").copied().ok_or_else(|| {
                FetchError::malformed(
                    COINGECKO_SOURCE,
                    format!("`data.{field}.usd` is missing"),
                )
            })
        };
        let market_cap = usd(&data.total_market_cap, "total_market_cap")?;
        let volume = usd(&data.total_volume, "total_volume")?;
        let dominance = data.market_cap_percentage.get("btc").copied().ok_or_else(|| {
            FetchError::malformed(
                COINGECKO_SOURCE,
                "`data.market_cap_percentage.btc` is missing",
            )
        })?;
        let day_change = data.market_cap_change_percentage_24h_usd.unwrap_or(0.0);
        let growth = round2(dominance - 40.0);

        Ok(vec![
            MetricSnapshot::new(
                "Total Revenue",
                format_currency(market_cap),
                day_change,
                MetricIcon::DollarSign,
            ),
            MetricSnapshot::new(
                "Active Users",
                format_number((volume / 1_000_000.0).round()),
                day_change,
                MetricIcon::Users,
            ),
            MetricSnapshot::new(
                "Conversions",
                format_number((dominance * 1_000.0).round()),
                day_change,
                MetricIcon::Target,
            ),
            MetricSnapshot::new(
                "Growth Rate",
                format!("{growth}%"),
                growth,
                MetricIcon::TrendingUp,
            ),
        ])
    }

    fn parse_markets(&self, body: serde_json::Value) -> FetchResult<CampaignRow> {
        let coins: Vec<MarketCoin> = decode(COINGECKO_SOURCE, body)?;
        let date = row_date_label(self.today.unwrap_or_else(|| Utc::now().date_naive()));
        Ok(coins
            .into_iter()
            .take(self.per_page)
            .enumerate()
            .map(|(i, coin)| {
                let ctr = round2(coin.price_change_percentage_24h.unwrap_or(0.0));
                CampaignRow::new(
                    coin.id,
                    format!("{} Campaign", coin.name),
                    MARKETING_CHANNELS[i % MARKETING_CHANNELS.len()],
                    (coin.current_price.unwrap_or(0.0) * 1_000.0).round(),
                    f64::from(coin.market_cap_rank.unwrap_or(0)) * 50.0,
                    ctr,
                    CampaignStatus::from_ctr(ctr),
                    date.clone(),
                )
            })
            .collect())
    }
}

#[async_trait]
impl MetricsSource for CoinGeckoSource {
    fn name(&self) -> &str {
        COINGECKO_SOURCE
    }

    async fn fetch_metrics(&self) -> FetchResult<MetricSnapshot> {
        let body = self.transport.get_json(&self.global_url()).await?;
        let metrics = Self::parse_global(body)?;
        debug!(source = COINGECKO_SOURCE, cards = metrics.len(), "metrics fetched");
        Ok(metrics)
    }
}

#[async_trait]
impl TableSource for CoinGeckoSource {
    fn name(&self) -> &str {
        COINGECKO_SOURCE
    }

    async fn fetch_table(&self) -> FetchResult<CampaignRow> {
        let body = self.transport.get_json(&self.markets_url()).await?;
        let rows = self.parse_markets(body)?;
        debug!(source = COINGECKO_SOURCE, rows = rows.len(), "table fetched");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::transport::FixtureTransport;
    use crate::domain::Trend;
    use serde_json::json;

    const BASE: &str = "https://cg.test/api/v3";

    fn global_body() -> serde_json::Value {
        json!({
            "data": {
                "active_cryptocurrencies": 13_000,
                "total_market_cap": {"usd": 2_450_000_000_000.0_f64, "eur": 1.0},
                "total_volume": {"usd": 98_700_000_000.0_f64},
                "market_cap_percentage": {"btc": 52.5, "eth": 17.1},
                "market_cap_change_percentage_24h_usd": -1.23456
            }
        })
    }

    #[tokio::test]
    async fn global_maps_to_four_cards() {
        let t = Arc::new(FixtureTransport::new().with_json(format!("{BASE}/global"), global_body()));
        let src = CoinGeckoSource::new(t, BASE);
        let cards = src.fetch_metrics().await.unwrap();
        assert_eq!(cards.len(), 4);
        assert_eq!(cards[0].value, "$2450.00b");
        assert_eq!(cards[0].change, -1.23);
        assert_eq!(cards[0].trend, Trend::Down);
        assert_eq!(cards[1].value, "98.70k");
        assert_eq!(cards[3].value, "12.5%");
        assert_eq!(cards[2].value, "52.50k");
        assert_eq!(cards[3].trend, Trend::Up);
    }

    #[tokio::test]
    async fn missing_data_field_is_malformed() {
        let t = Arc::new(
            FixtureTransport::new().with_json(format!("{BASE}/global"), json!({"status": "ok"})),
        );
        let err = CoinGeckoSource::new(t, BASE).fetch_metrics().await.unwrap_err();
        assert!(matches!(err, FetchError::Malformed { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn missing_usd_quote_is_malformed() {
        let mut body = global_body();
        body["data"]["total_volume"] = json!({"eur": 1.0});
        let t = Arc::new(FixtureTransport::new().with_json(format!("{BASE}/global"), body));
        let err = CoinGeckoSource::new(t, BASE).fetch_metrics().await.unwrap_err();
        assert!(err.to_string().contains("total_volume"), "{err}");
    }

    #[tokio::test]
    async fn markets_map_to_rows() {
        let src_url = CoinGeckoSource::new(Arc::new(FixtureTransport::new()), BASE)
            .with_per_page(2)
            .markets_url();
        let body = json!([
            {"id": "bitcoin", "name": "Bitcoin", "current_price": 64_000.5,
             "market_cap_rank": 1, "price_change_percentage_24h": 2.567},
            {"id": "ethereum", "name": "Ethereum", "current_price": 3_100.0,
             "market_cap_rank": 2, "price_change_percentage_24h": null},
            {"id": "tether", "name": "Tether", "current_price": 1.0,
             "market_cap_rank": 3, "price_change_percentage_24h": 0.01}
        ]);
        let t = Arc::new(FixtureTransport::new().with_json(src_url, body));
        let src = CoinGeckoSource::new(t, BASE)
            .with_per_page(2)
            .with_today(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        let rows = src.fetch_table().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].campaign, "Bitcoin Campaign");
        assert_eq!(rows[0].channel, "Google Ads");
        assert_eq!(rows[0].revenue, 64_000_500.0);
        assert_eq!(rows[0].conversions, 50.0);
        assert_eq!(rows[0].ctr, 2.57);
        assert_eq!(rows[0].status, CampaignStatus::Active);
        assert_eq!(rows[1].ctr, 0.0);
        assert_eq!(rows[1].status, CampaignStatus::Paused);
        assert_eq!(rows[1].date, "Jan 01, 2024");
    }

    #[tokio::test]
    async fn http_error_propagates() {
        let t = Arc::new(FixtureTransport::new().with_error(
            format!("{BASE}/global"),
            FetchError::Status { status: 429, url: format!("{BASE}/global") },
        ));
        let err = CoinGeckoSource::new(t, BASE).fetch_metrics().await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 429, .. }));
    }

    #[test]
    fn trailing_slash_on_base_is_ignored() {
        let src = CoinGeckoSource::new(Arc::new(FixtureTransport::new()), format!("{BASE}/"));
        assert_eq!(src.global_url(), format!("{BASE}/global"));
    }
}
