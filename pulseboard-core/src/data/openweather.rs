//! OpenWeatherMap adapter for the geographic panel.
//!
//! Current temperature per city is mapped to a simulated campaign performance
//! score. Cities are fetched concurrently; a city that fails is skipped rather
//! than failing the panel.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::provider::FetchError;
use super::transport::{decode, JsonTransport};

pub const OPENWEATHER_SOURCE: &str = "openweather";
pub const OPENWEATHER_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const OPENWEATHER_DEMO_KEY: &str = "demo";

pub const GEO_CITIES: [&str; 5] = ["London", "New York", "Tokyo", "Sydney", "Berlin"];

/// One city on the geographic panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityPerformance {
    pub city: String,
    /// Rounded degrees Celsius.
    pub temperature: f64,
    /// `round(50 + 2 * temperature)`.
    pub performance: f64,
}

impl CityPerformance {
    pub fn from_temperature(city: impl Into<String>, temp: f64) -> Self {
        let temp = if temp.is_finite() { temp } else { 0.0 };
        Self {
            city: city.into(),
            temperature: temp.round(),
            performance: (50.0 + temp * 2.0).round(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WeatherResponse {
    name: String,
    main: WeatherMain,
}

#[derive(Debug, Deserialize)]
struct WeatherMain {
    temp: f64,
}

pub struct OpenWeatherSource {
    transport: Arc<dyn JsonTransport>,
    base_url: String,
    api_key: String,
    cities: Vec<String>,
}

impl OpenWeatherSource {
    pub fn new(
        transport: Arc<dyn JsonTransport>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            cities: GEO_CITIES.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn with_cities<I, S>(mut self, cities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cities = cities.into_iter().map(Into::into).collect();
        self
    }

    /// Query values are form-encoded, so `&`, `#` and spaces in a city name
    /// stay inside `q`.
    pub fn weather_url(&self, city: &str) -> Result<String, FetchError> {
        let url = reqwest::Url::parse_with_params(
            &format!("{}/weather", self.base_url),
            &[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ],
        )
        .map_err(|err| FetchError::Client(format!("bad weather url: {err}")))?;
        Ok(url.into())
    }

    /// Fetch every configured city; results keep the configured city order.
    /// Never fails: an unreachable upstream yields an empty list.
    pub async fn fetch_geographic(&self) -> Vec<CityPerformance> {
        let mut set = JoinSet::new();
        for (i, city) in self.cities.iter().enumerate() {
            let url = match self.weather_url(city) {
                Ok(url) => url,
                Err(err) => {
                    warn!(source = OPENWEATHER_SOURCE, city = %city, error = %err, "city skipped");
                    continue;
                }
            };
            let transport = Arc::clone(&self.transport);
            set.spawn(async move {
                let result = fetch_city(transport.as_ref(), &url).await;
                (i, result)
            });
        }

        let mut found = Vec::with_capacity(self.cities.len());
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((i, Ok(city))) => found.push((i, city)),
                Ok((i, Err(err))) => {
                    warn!(source = OPENWEATHER_SOURCE, city = %self.cities[i], error = %err, "city skipped");
                }
                Err(err) => warn!(source = OPENWEATHER_SOURCE, error = %err, "city task aborted"),
            }
        }
        found.sort_by_key(|(i, _)| *i);
        debug!(source = OPENWEATHER_SOURCE, cities = found.len(), "geographic fetched");
        found.into_iter().map(|(_, c)| c).collect()
    }
}

async fn fetch_city(transport: &dyn JsonTransport, url: &str) -> Result<CityPerformance, FetchError> {
    let body = transport.get_json(url).await?;
    let weather: WeatherResponse = decode(OPENWEATHER_SOURCE, body)?;
    Ok(CityPerformance::from_temperature(weather.name, weather.main.temp))
}
