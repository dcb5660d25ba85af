use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::io;

pub const DEFAULT_GAMMA_URL: &str = "https://gamma-api.polymarket.com";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub system: SystemConfig,
    #[serde(default)]
    pub alerts: AlertConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SystemConfig {
    #[serde(default = "default_history_path")]
    pub history_path: String,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default)]
    pub digest_mode: bool,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_market_url_base")]
    pub market_url_base: String,
}

/// Thresholds and denylist used by the alert rules.
#[derive(Debug, Clone, Deserialize)]
pub struct AlertConfig {
    /// Minimum volume (USD) for a new market to alert regardless of price movement.
    #[serde(default = "default_high_volume")]
    pub high_volume_threshold: f64,
    /// Minimum |delta| in percentage points for a new market.
    #[serde(default = "default_volatility")]
    pub volatility_threshold: f64,
    /// Minimum |delta - previous delta| in percentage points for a known market.
    #[serde(default = "default_increment")]
    pub increment_threshold: f64,
    #[serde(default = "default_exclude_keywords")]
    pub exclude_keywords: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_top_volume")]
    pub top_volume: usize,
    #[serde(default = "default_top_gainers")]
    pub top_gainers: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    #[serde(default)]
    pub csv_logging: bool,
    #[serde(default = "default_csv_log_path")]
    pub csv_log_path: String,
    #[serde(default)]
    pub telegram_enabled: bool,
}

fn default_history_path() -> String { "history.json".to_string() }
fn default_interval_secs() -> u64 { 3600 }
fn default_log_level() -> String { "info".to_string() }
fn default_market_url_base() -> String { "https://polymarket.com/event".to_string() }
fn default_high_volume() -> f64 { 150_000.0 }
fn default_volatility() -> f64 { 5.0 }
fn default_increment() -> f64 { 2.0 }
fn default_exclude_keywords() -> Vec<String> { vec!["Taiwan".to_string(), "台灣".to_string()] }
fn default_top_volume() -> usize { 5 }
fn default_top_gainers() -> usize { 3 }
fn default_csv_log_path() -> String { "alerts.csv".to_string() }

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            history_path: default_history_path(),
            interval_secs: default_interval_secs(),
            digest_mode: false,
            log_level: default_log_level(),
            market_url_base: default_market_url_base(),
        }
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            high_volume_threshold: default_high_volume(),
            volatility_threshold: default_volatility(),
            increment_threshold: default_increment(),
            exclude_keywords: default_exclude_keywords(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_volume: default_top_volume(),
            top_gainers: default_top_gainers(),
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            csv_logging: false,
            csv_log_path: default_csv_log_path(),
            telegram_enabled: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    pub polymarket_gamma_url: String,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        Self::parse(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path))
    }

    /// Like `load`, but a missing file yields the built-in defaults.
    pub fn load_or_default(path: &str) -> Result<Self> {
        match fs::metadata(path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            _ => Self::load(path),
        }
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }
}

impl EnvConfig {
    pub fn load() -> Self {
        dotenv::dotenv().ok();

        Self {
            telegram_bot_token: non_empty_var("TELEGRAM_BOT_TOKEN"),
            telegram_chat_id: non_empty_var("TELEGRAM_CHAT_ID"),
            polymarket_gamma_url: std::env::var("POLYMARKET_GAMMA_URL")
                .unwrap_or_else(|_| DEFAULT_GAMMA_URL.to_string()),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
