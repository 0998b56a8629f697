//! Configuration structures.

use overnight_backtest::BacktestConfig;
use overnight_engine::{RatingConfig, SizingConfig};
use overnight_trader::LiveConfig;
use serde::{Deserialize, Serialize};

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub alpaca: AlpacaSettings,
    #[serde(default)]
    pub rating: RatingConfig,
    #[serde(default)]
    pub sizing: SizingConfig,
    #[serde(default)]
    pub live: LiveConfig,
    #[serde(default)]
    pub backtest: BacktestConfig,
}

/// General app settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "overnight".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Alpaca API configuration: which environment variables carry the
/// credentials, and whether to trade against the paper endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlpacaSettings {
    pub api_key_env: String,
    pub api_secret_env: String,
    pub paper: bool,
}

impl Default for AlpacaSettings {
    fn default() -> Self {
        Self {
            api_key_env: "ALPACA_API_KEY".to_string(),
            api_secret_env: "ALPACA_API_SECRET".to_string(),
            paper: true,
        }
    }
}
