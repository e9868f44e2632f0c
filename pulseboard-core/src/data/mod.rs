//! Source adapters and the transport they share.

pub mod coincap;
pub mod coingecko;
pub mod jsonplaceholder;
pub mod openweather;
pub mod provider;
pub mod synthetic;
pub mod transport;

pub use coincap::{CoinCapSource, COINCAP_BASE_URL, COINCAP_SOURCE};
pub use coingecko::{CoinGeckoSource, COINGECKO_BASE_URL, COINGECKO_SOURCE};
pub use jsonplaceholder::{JsonPlaceholderSource, JSONPLACEHOLDER_BASE_URL, JSONPLACEHOLDER_SOURCE};
pub use openweather::{
    CityPerformance, OpenWeatherSource, GEO_CITIES, OPENWEATHER_BASE_URL, OPENWEATHER_DEMO_KEY,
};
pub use provider::{ChannelSource, ChartSource, FetchError, FetchResult, MetricsSource, TableSource};
pub use synthetic::{fallback_channels, fallback_metrics, SyntheticSource, SYNTHETIC_SOURCE};
pub use transport::{decode, FixtureTransport, HttpTransport, JsonTransport};
