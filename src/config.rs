use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::coinbase::{DEFAULT_PRODUCT_ID, DEFAULT_WS_URL};
use crate::engine::EngineConfig;
use crate::error::AppError;
use crate::error_tracker::ErrorAlignment;
use crate::forecaster::ForecastMode;
use crate::report::ReportFormat;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
pub const PRODUCT_ID_ENV: &str = "TICKER_PRODUCT_ID";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub engine: EngineSection,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
    #[serde(default)]
    pub product_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineSection {
    #[serde(default)]
    pub forecast_mode: ForecastMode,
    #[serde(default)]
    pub refit_every: usize,
    #[serde(default)]
    pub error_alignment: ErrorAlignment,
    #[serde(default = "default_true")]
    pub wait_for_first_quote: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub format: ReportFormat,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

fn default_ws_url() -> String {
    DEFAULT_WS_URL.to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            ws_url: default_ws_url(),
            product_id: String::new(),
        }
    }
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            forecast_mode: ForecastMode::default(),
            refit_every: 0,
            error_alignment: ErrorAlignment::default(),
            wait_for_first_quote: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl EngineSection {
    /// Engine settings; sampling cadence stays at the built-in constants.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            forecast_mode: self.forecast_mode,
            refit_every: self.refit_every,
            error_alignment: self.error_alignment,
            wait_for_first_quote: self.wait_for_first_quote,
            ..EngineConfig::default()
        }
    }
}

/// Pick the instrument: CLI argument, then environment, then config file.
/// Blank values fall through; if all are blank the default product is used.
/// The result is upper-cased to match Coinbase product ids (`eth-usd` becomes
/// `ETH-USD`).
pub fn resolve_product_id(cli: Option<&str>, env: Option<&str>, configured: &str) -> String {
    [cli, env, Some(configured)]
        .into_iter()
        .flatten()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
        .unwrap_or(DEFAULT_PRODUCT_ID)
        .to_ascii_uppercase()
}

impl Config {
    /// Load `config/default.toml` if present (built-in defaults otherwise),
    /// after reading `.env` into the environment.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config_path = Path::new(DEFAULT_CONFIG_PATH);
        let config = if config_path.exists() {
            let config_str = std::fs::read_to_string(config_path)
                .with_context(|| format!("failed to read {}", config_path.display()))?;
            Self::from_toml_str(&config_str)
                .with_context(|| format!("failed to parse {}", config_path.display()))?
        } else {
            Self::from_toml_str("")?
        };

        Ok(config)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(AppError::from)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.feed.ws_url)
            .with_context(|| format!("feed.ws_url '{}' is not a valid URL", self.feed.ws_url))?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(AppError::Config(format!(
                "feed.ws_url must use ws:// or wss://, got '{}'",
                url.scheme()
            ))
            .into());
        }
        if self.engine.forecast_mode == ForecastMode::Refit && self.engine.refit_every > 0 {
            return Err(AppError::Config(
                "engine.refit_every only applies to forecast_mode = \"incremental\"".to_string(),
            )
            .into());
        }
        Ok(())
    }

    /// Instrument to subscribe to, given an optional CLI argument.
    pub fn product_id(&self, cli: Option<&str>) -> String {
        let env = std::env::var(PRODUCT_ID_ENV).ok();
        resolve_product_id(cli, env.as_deref(), &self.feed.product_id)
    }
}
