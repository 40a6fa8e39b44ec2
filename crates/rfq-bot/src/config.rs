//! Application configuration.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use rfq_core::{Address, Asset};
use rfq_risk::TradeDuration;
use rfq_selector::{Direction, FeedConfig, OrderQuery};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Env var overriding the configuration file path.
pub const CONFIG_ENV: &str = "RFQ_CONFIG";

/// Env var supplying the order source bearer token.
pub const API_TOKEN_ENV: &str = "RFQ_API_TOKEN";

/// Order source endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSourceConfig {
    /// Orders endpoint returning `{ data: { orders, market_data } }`.
    #[serde(default = "default_order_source_url")]
    pub url: String,
    /// Request timeout (ms). Default: 10,000.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Bearer token. `RFQ_API_TOKEN` takes precedence.
    #[serde(default)]
    pub api_token: Option<String>,
    /// Referrer address attached to submission payloads.
    #[serde(default)]
    pub referrer: Option<String>,
}

fn default_order_source_url() -> String {
    "http://127.0.0.1:8080/api/orders".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

impl Default for OrderSourceConfig {
    fn default() -> Self {
        Self {
            url: default_order_source_url(),
            timeout_ms: default_timeout_ms(),
            api_token: None,
            referrer: None,
        }
    }
}

/// Polling cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerSettings {
    /// Poll interval (ms). Default: 30,000.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Result age after which the published result is reported stale (ms).
    /// Default: 90,000 (three missed polls).
    #[serde(default = "default_stale_after_ms")]
    pub stale_after_ms: u64,
}

fn default_interval_ms() -> u64 {
    30_000
}

fn default_stale_after_ms() -> u64 {
    90_000
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            stale_after_ms: default_stale_after_ms(),
        }
    }
}

/// Query the watcher selects for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    #[serde(default = "default_direction")]
    pub direction: Direction,
    #[serde(default = "default_asset")]
    pub asset: Asset,
    /// Only consider options expiring within this bucket's horizon.
    #[serde(default)]
    pub duration: Option<TradeDuration>,
}

fn default_direction() -> Direction {
    Direction::Moon
}

fn default_asset() -> Asset {
    Asset::Btc
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            direction: default_direction(),
            asset: default_asset(),
            duration: None,
        }
    }
}

impl QueryConfig {
    #[must_use]
    pub fn to_query(&self) -> OrderQuery {
        let query = OrderQuery::new(self.direction, self.asset);
        match self.duration {
            Some(duration) => query.with_duration(duration),
            None => query,
        }
    }
}

/// Logging and metrics export.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log filter used when `RUST_LOG` is unset.
    #[serde(default)]
    pub log_level: Option<String>,
    /// Write the Prometheus text export here on shutdown.
    #[serde(default)]
    pub metrics_path: Option<String>,
}

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub order_source: OrderSourceConfig,
    #[serde(default)]
    pub poller: PollerSettings,
    #[serde(default)]
    pub query: QueryConfig,
    /// Price feed to asset mapping.
    #[serde(default)]
    pub feeds: Vec<FeedConfig>,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Config path: CLI arg > `RFQ_CONFIG` > default.
    #[must_use]
    pub fn resolve_path(cli: Option<String>) -> String {
        cli.or_else(|| std::env::var(CONFIG_ENV).ok())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
    }

    /// Load from `path`, falling back to defaults when the file does not exist.
    ///
    /// Returns whether the file was found.
    pub fn load(path: &str) -> AppResult<(Self, bool)> {
        if Path::new(path).exists() {
            Ok((Self::from_file(path)?, true))
        } else {
            Ok((Self::default(), false))
        }
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Check settings that deserialization alone cannot.
    pub fn validate(&self) -> AppResult<()> {
        if self.order_source.url.trim().is_empty() {
            return Err(AppError::Config("order_source.url is empty".to_string()));
        }
        if self.order_source.timeout_ms == 0 {
            return Err(AppError::Config("order_source.timeout_ms must be > 0".to_string()));
        }
        if self.poller.interval_ms == 0 {
            return Err(AppError::Config("poller.interval_ms must be > 0".to_string()));
        }
        if self.feeds.is_empty() {
            return Err(AppError::Config(
                "no [[feeds]] configured; every order is resolved to an asset by its price feed"
                    .to_string(),
            ));
        }
        self.referrer()?;
        Ok(())
    }

    /// Bearer token: `RFQ_API_TOKEN` if set, else the configured one.
    #[must_use]
    pub fn api_token(&self) -> Option<String> {
        std::env::var(API_TOKEN_ENV)
            .ok()
            .filter(|t| !t.is_empty())
            .or_else(|| self.order_source.api_token.clone())
    }

    /// Parsed referrer address, if configured.
    pub fn referrer(&self) -> AppResult<Option<Address>> {
        self.order_source
            .referrer
            .as_deref()
            .map(|text| {
                Address::from_str(text.trim())
                    .map_err(|e| AppError::Config(format!("invalid referrer `{text}`: {e}")))
            })
            .transpose()
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poller.interval_ms)
    }

    #[must_use]
    pub fn stale_after(&self) -> Duration {
        Duration::from_millis(self.poller.stale_after_ms)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.order_source.timeout_ms)
    }
}
