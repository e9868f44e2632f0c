//! Dashboard configuration, loaded from TOML.
//!
//! Every section is optional; a missing key takes the value from the embedded
//! default. Load order: an explicit `--config` path, then `pulseboard.toml`
//! in the working directory, then the embedded default.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use pulseboard_core::data::{
    COINCAP_BASE_URL, COINGECKO_BASE_URL, JSONPLACEHOLDER_BASE_URL, OPENWEATHER_BASE_URL,
    OPENWEATHER_DEMO_KEY,
};
use pulseboard_core::fallback::FallbackPolicy;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::aggregator::AssemblyPolicy;

pub const CONFIG_FILE_NAME: &str = "pulseboard.toml";

/// Default configuration embedded in the binary.
pub const DEFAULT_CONFIG: &str = r#"
[refresh]
profile = "classic"

[policy]
fallback = "substitute"
assembly = "all_or_nothing"

[http]
timeout_secs = 10

[table]
page_size = 8
"#;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Named wiring of adapters to the four slots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// CoinGecko metrics and table, JSONPlaceholder chart and channels.
    #[default]
    Classic,
    /// CoinCap for all four slots.
    Coincap,
    /// Offline generator for all four slots.
    Synthetic,
}

impl Profile {
    pub const ALL: [Profile; 3] = [Profile::Classic, Profile::Coincap, Profile::Synthetic];

    pub fn default_interval(&self) -> Duration {
        match self {
            Profile::Classic => Duration::from_secs(60),
            Profile::Coincap => Duration::from_secs(120),
            Profile::Synthetic => Duration::from_secs(30),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Classic => "classic",
            Profile::Coincap => "coincap",
            Profile::Synthetic => "synthetic",
        }
    }

    /// Whether this profile reaches the network.
    pub fn is_live(&self) -> bool {
        !matches!(self, Profile::Synthetic)
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Profile::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown profile '{s}' (expected classic, coincap or synthetic)"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RefreshConfig {
    pub profile: Profile,
    /// Overrides the profile's interval.
    pub interval_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyConfig {
    pub fallback: FallbackPolicy,
    pub assembly: AssemblyPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
    pub coingecko_url: String,
    pub coincap_url: String,
    pub jsonplaceholder_url: String,
    pub openweather_url: String,
    pub openweather_key: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: concat!("pulseboard/", env!("CARGO_PKG_VERSION")).to_string(),
            coingecko_url: COINGECKO_BASE_URL.to_string(),
            coincap_url: COINCAP_BASE_URL.to_string(),
            jsonplaceholder_url: JSONPLACEHOLDER_BASE_URL.to_string(),
            openweather_url: OPENWEATHER_BASE_URL.to_string(),
            openweather_key: OPENWEATHER_DEMO_KEY.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TableConfig {
    pub page_size: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self { page_size: 8 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyntheticConfig {
    /// Fixes the jitter sequence; unset means a fresh sequence per run.
    pub seed: Option<u64>,
}

/// Full dashboard configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    pub refresh: RefreshConfig,
    pub policy: PolicyConfig,
    pub http: HttpConfig,
    pub table: TableConfig,
    pub synthetic: SyntheticConfig,
}

impl DashboardConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: DashboardConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Resolve the configuration for a run.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            info!(path = %path.display(), "loading config");
            return Self::from_file(path);
        }
        let local = Path::new(CONFIG_FILE_NAME);
        if local.exists() {
            info!(path = %local.display(), "loading config");
            return Self::from_file(local);
        }
        info!("using default embedded configuration");
        Self::from_toml(DEFAULT_CONFIG)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.refresh.interval_secs == Some(0) {
            return Err(ConfigError::Invalid {
                field: "refresh.interval_secs",
                reason: "must be greater than zero".into(),
            });
        }
        if self.http.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "http.timeout_secs",
                reason: "must be greater than zero".into(),
            });
        }
        if self.table.page_size == 0 {
            return Err(ConfigError::Invalid {
                field: "table.page_size",
                reason: "must be greater than zero".into(),
            });
        }
        for (field, url) in [
            ("http.coingecko_url", &self.http.coingecko_url),
            ("http.coincap_url", &self.http.coincap_url),
            ("http.jsonplaceholder_url", &self.http.jsonplaceholder_url),
            ("http.openweather_url", &self.http.openweather_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("'{url}' is not an http(s) URL"),
                });
            }
        }
        Ok(())
    }

    /// Tick interval: the explicit override, else the profile default.
    pub fn interval(&self) -> Duration {
        self.refresh
            .interval_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| self.refresh.profile.default_interval())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }
}
