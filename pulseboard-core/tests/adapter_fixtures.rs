//! Integration tests for the source adapters against frozen API payloads.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use pulseboard_core::data::{
    ChannelSource, ChartSource, CoinCapSource, CoinGeckoSource, FetchError, FixtureTransport,
    JsonPlaceholderSource, MetricsSource, TableSource,
};
use pulseboard_core::domain::{
    has_unique_ids, is_daily_series, CampaignRow, CampaignStatus, ChannelSlice, MetricSnapshot,
    Trend,
};

const COINGECKO: &str = "https://api.coingecko.test/api/v3";
const COINCAP: &str = "https://api.coincap.test/v2";
const JSONPLACEHOLDER: &str = "https://jsonplaceholder.test";

fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn fixture(name: &str) -> serde_json::Value {
    let text = std::fs::read_to_string(fixture_dir().join(name))
        .unwrap_or_else(|e| panic!("fixture {name}: {e}"));
    serde_json::from_str(&text).unwrap_or_else(|e| panic!("fixture {name} is not JSON: {e}"))
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
}

// ── CoinGecko ───────────────────────────────────────────────────────

#[tokio::test]
async fn coingecko_global_fixture_maps_to_cards() {
    let transport = FixtureTransport::new()
        .with_json(format!("{COINGECKO}/global"), fixture("coingecko_global.json"));
    let src = CoinGeckoSource::new(Arc::new(transport), COINGECKO);

    let cards = src.fetch_metrics().await.unwrap();
    let titles: Vec<&str> = cards.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(
        titles,
        vec!["Total Revenue", "Active Users", "Conversions", "Growth Rate"]
    );
    assert_eq!(cards[0].value, "$2387.65b");
    assert_eq!(cards[0].trend, Trend::Up);
    assert_eq!(cards[1].value, "87.46k");
    assert_eq!(cards[2].value, "54.25k");
    assert_eq!(cards[3].value, "14.25%");
    assert_eq!(cards[3].change, 14.25);
    assert!(cards.iter().all(MetricSnapshot::is_consistent));
}

#[tokio::test]
async fn coingecko_markets_fixture_respects_per_page() {
    let urls = CoinGeckoSource::new(Arc::new(FixtureTransport::new()), COINGECKO).with_per_page(5);
    let transport =
        FixtureTransport::new().with_json(urls.markets_url(), fixture("coingecko_markets.json"));
    let src = CoinGeckoSource::new(Arc::new(transport), COINGECKO)
        .with_per_page(5)
        .with_today(today());

    let rows = src.fetch_table().await.unwrap();
    assert_eq!(rows.len(), 5);
    assert!(has_unique_ids(&rows));
    assert!(rows.iter().all(CampaignRow::is_well_formed));
    assert_eq!(rows[0].revenue, 67_250_120.0);
    assert_eq!(rows[4].conversions, 250.0);

    let statuses: Vec<CampaignStatus> = rows.iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        vec![
            CampaignStatus::Active,
            CampaignStatus::Paused,
            CampaignStatus::Paused,
            CampaignStatus::Paused,
            CampaignStatus::Active,
        ]
    );
    assert!(rows.iter().all(|r| r.date == "Jun 10, 2024"));
}

#[tokio::test]
async fn coingecko_upstream_outage_is_an_error_not_an_empty_list() {
    let transport = FixtureTransport::new();
    let src = CoinGeckoSource::new(Arc::new(transport), COINGECKO);
    let err = src.fetch_table().await.unwrap_err();
    assert!(err.is_transport(), "{err:?}");
}

// ── CoinCap ─────────────────────────────────────────────────────────

fn coincap_transport(src: &CoinCapSource) -> FixtureTransport {
    FixtureTransport::new()
        .with_json(src.assets_url(5), fixture("coincap_assets.json"))
        .with_json(src.assets_url(3), fixture("coincap_assets.json"))
        .with_json(src.history_url(), fixture("coincap_history.json"))
}

fn coincap() -> CoinCapSource {
    let urls = CoinCapSource::new(Arc::new(FixtureTransport::new()), COINCAP);
    let transport = coincap_transport(&urls);
    CoinCapSource::new(Arc::new(transport), COINCAP)
        .with_table_limit(3)
        .with_history_days(3)
        .with_today(today())
}

#[tokio::test]
async fn coincap_metrics_summarize_top_five() {
    let cards = coincap().fetch_metrics().await.unwrap();
    assert_eq!(cards.len(), 4);
    assert_eq!(cards[0].title, "Total Market Cap (Top 5)");
    assert_eq!(cards[0].value, "$2000.00b");
    assert_eq!(cards[0].trend, Trend::Up);
    assert_eq!(cards[2].value, "5");
    assert_eq!(cards[3].value, "-0.05%");
    assert_eq!(cards[3].trend, Trend::Down);
}

#[tokio::test]
async fn coincap_table_is_capped_at_the_requested_limit() {
    let rows = coincap().fetch_table().await.unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].channel, "BTC");
    assert_eq!(rows[1].status, CampaignStatus::Paused);
    assert_eq!(rows[1].ctr, -2.5);
}

#[tokio::test]
async fn coincap_history_keeps_the_most_recent_days() {
    let chart = coincap().fetch_chart().await.unwrap();
    assert_eq!(chart.len(), 3);
    assert!(is_daily_series(&chart));
    assert_eq!(chart[0].date, "Jun 02");
    assert_eq!(chart[0].revenue, 65_000.0);
    assert_eq!(chart[0].users, 3_250.0);
    assert_eq!(chart[2].clicks, 13_400.0);
}

#[tokio::test]
async fn coincap_channels_use_the_palette() {
    let slices = coincap().fetch_channels().await.unwrap();
    assert_eq!(slices.len(), 5);
    assert!(slices.iter().all(ChannelSlice::has_hex_color));
    assert_eq!(slices[0].name, "Bitcoin");
}

#[tokio::test]
async fn coincap_string_number_garbage_is_malformed() {
    let urls = CoinCapSource::new(Arc::new(FixtureTransport::new()), COINCAP);
    let mut body = fixture("coincap_assets.json");
    body["data"][1]["marketCapUsd"] = serde_json::json!("lots");
    let transport = FixtureTransport::new().with_json(urls.assets_url(5), body);
    let err = CoinCapSource::new(Arc::new(transport), COINCAP)
        .fetch_channels()
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Malformed { .. }), "{err:?}");
}

// ── JSONPlaceholder ─────────────────────────────────────────────────

fn jsonplaceholder() -> JsonPlaceholderSource {
    let urls = JsonPlaceholderSource::new(Arc::new(FixtureTransport::new()), JSONPLACEHOLDER);
    let transport = FixtureTransport::new()
        .with_json(urls.posts_url(), fixture("jsonplaceholder_posts.json"))
        .with_json(urls.users_url(), fixture("jsonplaceholder_users.json"));
    JsonPlaceholderSource::new(Arc::new(transport), JSONPLACEHOLDER).with_today(today())
}

#[tokio::test]
async fn jsonplaceholder_posts_become_the_last_ten_days() {
    let chart = jsonplaceholder().fetch_chart().await.unwrap();
    assert_eq!(chart.len(), 10);
    assert!(is_daily_series(&chart));
    assert_eq!(chart[0].date, "Jun 01");
    assert_eq!(chart[9].date, "Jun 10");
    assert!(chart.iter().all(|p| p.is_well_formed()));
}

#[tokio::test]
async fn jsonplaceholder_is_not_reproducible_without_a_seed() {
    let src = jsonplaceholder();
    let a = src.fetch_chart().await.unwrap();
    let b = src.fetch_chart().await.unwrap();
    // Same shape, jittered values.
    assert_eq!(a.len(), b.len());
    assert_ne!(a, b);
}

#[tokio::test]
async fn jsonplaceholder_users_become_five_channels() {
    let slices = jsonplaceholder().fetch_channels().await.unwrap();
    let names: Vec<&str> = slices.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Google Ads", "Facebook", "Instagram", "LinkedIn", "Other"]
    );
    assert_eq!(slices[0].value, 35.0);
}
