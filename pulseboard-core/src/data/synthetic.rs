//! Synthetic marketing data.
//!
//! Serves all four slots without touching the network. Values are jittered
//! around fixed baselines so consecutive refreshes look alive; pass a seed to
//! make them reproducible. The same module owns the fixed substitute lists the
//! fallback policy hands out when a live adapter fails.

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};

use super::provider::{ChannelSource, ChartSource, FetchResult, MetricsSource, TableSource};
use crate::domain::{
    into_daily_series, row_date_label, CampaignRow, CampaignStatus, ChannelSlice, ChartPoint,
    MetricIcon, MetricSnapshot, MARKETING_CHANNELS,
};
use crate::format::{format_currency, format_number, format_percent, round2};
use crate::rng::Jitter;

pub const SYNTHETIC_SOURCE: &str = "synthetic";

/// Baselines the synthetic cards jitter around; also the fixed fallback cards.
const BASE_REVENUE: f64 = 847_392.0;
const BASE_USERS: f64 = 24_847.0;
const BASE_CONVERSIONS: f64 = 18_394.0;
const BASE_GROWTH: f64 = 15.2;

const CAMPAIGN_NAMES: [&str; 12] = [
    "Summer Sale",
    "Black Friday",
    "Product Launch",
    "Brand Awareness",
    "Retargeting",
    "Holiday Special",
    "Spring Collection",
    "Email Newsletter",
    "Influencer Collab",
    "Back to School",
    "Flash Sale",
    "Loyalty Program",
];

/// Static generator for every record kind.
#[derive(Debug)]
pub struct SyntheticSource {
    jitter: Jitter,
    anchor: Option<NaiveDate>,
    chart_days: usize,
    table_rows: usize,
}

impl SyntheticSource {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            jitter: Jitter::new(seed),
            anchor: None,
            chart_days: 30,
            table_rows: CAMPAIGN_NAMES.len(),
        }
    }

    /// Pin "today" so generated dates do not depend on the wall clock.
    pub fn with_anchor(mut self, today: NaiveDate) -> Self {
        self.anchor = Some(today);
        self
    }

    pub fn with_chart_days(mut self, days: usize) -> Self {
        self.chart_days = days;
        self
    }

    pub fn with_table_rows(mut self, rows: usize) -> Self {
        self.table_rows = rows;
        self
    }

    fn today(&self) -> NaiveDate {
        self.anchor.unwrap_or_else(|| Utc::now().date_naive())
    }

    pub fn metrics(&self) -> Vec<MetricSnapshot> {
        let j = &self.jitter;
        let revenue = BASE_REVENUE * j.uniform(0.95, 1.05);
        let users = BASE_USERS * j.uniform(0.95, 1.05);
        let conversions = BASE_CONVERSIONS * j.uniform(0.95, 1.05);
        let growth = round2(BASE_GROWTH + j.uniform(-2.0, 2.0));
        vec![
            MetricSnapshot::new(
                "Total Revenue",
                format_currency(revenue.round()),
                j.uniform(-5.0, 15.0),
                MetricIcon::DollarSign,
            ),
            MetricSnapshot::new(
                "Active Users",
                format_number(users.round()),
                j.uniform(-5.0, 15.0),
                MetricIcon::Users,
            ),
            MetricSnapshot::new(
                "Conversions",
                format_number(conversions.round()),
                j.uniform(-5.0, 15.0),
                MetricIcon::Target,
            ),
            MetricSnapshot::new(
                "Growth Rate",
                format_percent(growth),
                growth - BASE_GROWTH,
                MetricIcon::TrendingUp,
            ),
        ]
    }

    /// One point per day for the last `chart_days` days, oldest first.
    pub fn chart(&self) -> Vec<ChartPoint> {
        let today = self.today();
        let points = (0..self.chart_days)
            .map(|i| {
                let day = today - Duration::days((self.chart_days - 1 - i) as i64);
                let users = self.jitter.uniform(500.0, 1_500.0).round();
                ChartPoint::new(
                    day,
                    self.jitter.uniform(5_000.0, 15_000.0).round(),
                    users,
                    (users * 0.15).round(),
                    (users * 8.0).round(),
                    (users * 0.8).round(),
                )
            })
            .collect();
        into_daily_series(points)
    }

    /// Campaign rows with ids `c1..cN`; statuses are drawn at random.
    pub fn table(&self) -> Vec<CampaignRow> {
        let today = self.today();
        (0..self.table_rows)
            .map(|i| {
                let status = self
                    .jitter
                    .pick(&CampaignStatus::ALL)
                    .unwrap_or(CampaignStatus::Active);
                CampaignRow::new(
                    format!("c{}", i + 1),
                    CAMPAIGN_NAMES[i % CAMPAIGN_NAMES.len()],
                    MARKETING_CHANNELS[i % MARKETING_CHANNELS.len()],
                    self.jitter.uniform(1_000.0, 50_000.0).round(),
                    self.jitter.uniform(10.0, 500.0).round(),
                    round2(self.jitter.uniform(0.5, 8.0)),
                    status,
                    row_date_label(today - Duration::days(i as i64)),
                )
            })
            .collect()
    }

    pub fn channels(&self) -> Vec<ChannelSlice> {
        fallback_channels()
    }
}

/// Fixed cards used when the metrics adapter fails.
pub fn fallback_metrics() -> Vec<MetricSnapshot> {
    vec![
        MetricSnapshot::new(
            "Total Revenue",
            format_currency(BASE_REVENUE),
            12.5,
            MetricIcon::DollarSign,
        ),
        MetricSnapshot::new(
            "Active Users",
            format_number(BASE_USERS),
            8.2,
            MetricIcon::Users,
        ),
        MetricSnapshot::new(
            "Conversions",
            format_number(BASE_CONVERSIONS),
            -2.4,
            MetricIcon::Target,
        ),
        MetricSnapshot::new(
            "Growth Rate",
            format!("{BASE_GROWTH}%"),
            BASE_GROWTH,
            MetricIcon::TrendingUp,
        ),
    ]
}

/// Fixed channel split used when the channel adapter fails.
pub fn fallback_channels() -> Vec<ChannelSlice> {
    [
        ("Google Ads", 35.0),
        ("Facebook", 25.0),
        ("Instagram", 20.0),
        ("LinkedIn", 12.0),
        ("Other", 8.0),
    ]
    .into_iter()
    .enumerate()
    .map(|(i, (name, value))| ChannelSlice::new(name, value, ChannelSlice::palette_color(i)))
    .collect()
}

#[async_trait]
impl MetricsSource for SyntheticSource {
    fn name(&self) -> &str {
        SYNTHETIC_SOURCE
    }

    async fn fetch_metrics(&self) -> FetchResult<MetricSnapshot> {
        Ok(self.metrics())
    }
}

#[async_trait]
impl ChartSource for SyntheticSource {
    fn name(&self) -> &str {
        SYNTHETIC_SOURCE
    }

    async fn fetch_chart(&self) -> FetchResult<ChartPoint> {
        Ok(self.chart())
    }
}

#[async_trait]
impl TableSource for SyntheticSource {
    fn name(&self) -> &str {
        SYNTHETIC_SOURCE
    }

    async fn fetch_table(&self) -> FetchResult<CampaignRow> {
        Ok(self.table())
    }
}

#[async_trait]
impl ChannelSource for SyntheticSource {
    fn name(&self) -> &str {
        SYNTHETIC_SOURCE
    }

    async fn fetch_channels(&self) -> FetchResult<ChannelSlice> {
        Ok(self.channels())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{has_unique_ids, is_daily_series};

    fn anchor() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    #[test]
    fn chart_covers_thirty_days_ending_today() {
        let src = SyntheticSource::new(Some(1)).with_anchor(anchor());
        let chart = src.chart();
        assert_eq!(chart.len(), 30);
        assert!(is_daily_series(&chart));
        assert_eq!(chart.last().unwrap().day, anchor());
        for p in &chart {
            assert_eq!(p.conversions, (p.users * 0.15).round());
            assert_eq!(p.impressions, (p.users * 8.0).round());
        }
    }

    #[test]
    fn table_ids_unique_and_rows_valid() {
        let src = SyntheticSource::new(Some(2)).with_anchor(anchor());
        let rows = src.table();
        assert_eq!(rows.len(), 12);
        assert!(has_unique_ids(&rows));
        assert!(rows.iter().all(CampaignRow::is_well_formed));
        assert_eq!(rows[0].date, "Mar 15, 2024");
    }

    #[test]
    fn seeded_sources_agree() {
        let a = SyntheticSource::new(Some(9)).with_anchor(anchor());
        let b = SyntheticSource::new(Some(9)).with_anchor(anchor());
        assert_eq!(a.table(), b.table());
        assert_eq!(a.metrics(), b.metrics());
    }

    #[test]
    fn metrics_trends_agree_with_change() {
        let src = SyntheticSource::new(None);
        for _ in 0..50 {
            assert!(src.metrics().iter().all(MetricSnapshot::is_consistent));
        }
    }

    #[test]
    fn fallback_lists_are_fixed() {
        assert_eq!(fallback_metrics(), fallback_metrics());
        assert_eq!(fallback_metrics()[0].value, "$847.39k");
        assert_eq!(fallback_metrics()[3].value, "15.2%");
        let channels = fallback_channels();
        let total: f64 = channels.iter().map(|c| c.value).sum();
        assert_eq!(total, 100.0);
        assert!(channels.iter().all(ChannelSlice::has_hex_color));
    }

    #[tokio::test]
    async fn trait_methods_delegate() {
        let src = SyntheticSource::new(Some(3)).with_anchor(anchor()).with_table_rows(4);
        assert_eq!(src.fetch_table().await.unwrap().len(), 4);
        assert_eq!(src.fetch_channels().await.unwrap().len(), 5);
        assert_eq!(MetricsSource::name(&src), "synthetic");
    }
}
