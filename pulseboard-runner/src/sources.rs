//! Profile wiring: which adapter serves which slot.

use std::sync::Arc;

use pulseboard_core::data::{
    CoinCapSource, CoinGeckoSource, FetchError, HttpTransport, JsonPlaceholderSource,
    JsonTransport, OpenWeatherSource, SyntheticSource,
};
use pulseboard_core::fallback::FallbackData;

use crate::aggregator::{Aggregator, SourceSet};
use crate::config::{DashboardConfig, Profile};

/// The `reqwest` transport configured from `[http]`.
pub fn http_transport(config: &DashboardConfig) -> Result<Arc<dyn JsonTransport>, FetchError> {
    let transport = HttpTransport::new(config.timeout(), &config.http.user_agent)?;
    Ok(Arc::new(transport))
}

/// Adapters for the configured profile. The synthetic profile never touches
/// `transport`.
pub fn build_sources(config: &DashboardConfig, transport: Arc<dyn JsonTransport>) -> SourceSet {
    let seed = config.synthetic.seed;
    match config.refresh.profile {
        Profile::Classic => {
            let gecko = Arc::new(CoinGeckoSource::new(
                Arc::clone(&transport),
                config.http.coingecko_url.as_str(),
            ));
            let placeholder = Arc::new(
                JsonPlaceholderSource::new(transport, config.http.jsonplaceholder_url.as_str())
                    .with_seed(seed),
            );
            SourceSet {
                metrics: gecko.clone(),
                chart: placeholder.clone(),
                table: gecko,
                channels: placeholder,
            }
        }
        Profile::Coincap => SourceSet::uniform(Arc::new(CoinCapSource::new(
            transport,
            config.http.coincap_url.as_str(),
        ))),
        Profile::Synthetic => SourceSet::uniform(Arc::new(SyntheticSource::new(seed))),
    }
}

/// Aggregator for the configured profile and policies.
pub fn build_aggregator(config: &DashboardConfig, transport: Arc<dyn JsonTransport>) -> Aggregator {
    Aggregator::new(build_sources(config, transport))
        .with_fallback_policy(config.policy.fallback)
        .with_assembly_policy(config.policy.assembly)
        .with_fallback_data(FallbackData::new(config.synthetic.seed))
}

pub fn geographic_source(
    config: &DashboardConfig,
    transport: Arc<dyn JsonTransport>,
) -> OpenWeatherSource {
    OpenWeatherSource::new(
        transport,
        config.http.openweather_url.as_str(),
        config.http.openweather_key.as_str(),
    )
}
