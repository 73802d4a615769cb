//! Configuration types for fxbot

use crate::window::Granularity;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub venue: VenueConfig,
    pub feed: FeedConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub risk: RiskConfig,
    pub telemetry: TelemetryConfig,
    /// Per-instrument trade settings, keyed by symbol
    pub instruments: HashMap<String, InstrumentSettings>,
}

/// Venue REST API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct VenueConfig {
    pub base_url: String,
    pub api_id: String,
    pub api_key: String,
    pub api_secret: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Attempts per request before reporting failure
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    /// Fixed delay between attempts in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_timeout_secs() -> u64 {
    10
}
fn default_retry_attempts() -> u32 {
    3
}
fn default_retry_delay_ms() -> u64 {
    1000
}

/// Push feed configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    pub ws_url: String,
    pub web_id: String,
    pub web_key: String,
    pub web_secret: String,
    /// Bar granularity for the rolling windows
    #[serde(default)]
    pub granularity: Granularity,
    /// Interval between new-bar poll checks in seconds
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

fn default_poll_interval_secs() -> u64 {
    10
}

/// Data directory and signal log configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// Directory for window checkpoints and the instrument registry
    #[serde(default = "default_data_dir")]
    pub dir: PathBuf,
    /// How many recent signal rows the log retains
    #[serde(default = "default_signal_log_size")]
    pub signal_log_size: usize,
    /// Optional JSON dump of the signal log for external inspection
    #[serde(default)]
    pub signal_log_path: Option<PathBuf>,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}
fn default_signal_log_size() -> usize {
    10
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
            signal_log_size: default_signal_log_size(),
            signal_log_path: None,
        }
    }
}

/// Risk budget configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RiskConfig {
    /// Monetary amount risked per trade if the stop-loss is hit
    #[serde(default = "default_trade_risk")]
    pub trade_risk: Decimal,
}

fn default_trade_risk() -> Decimal {
    dec!(0.05)
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            trade_risk: default_trade_risk(),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    pub log_level: String,
    /// Prometheus exporter port; metrics disabled when absent
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

/// Per-instrument signal and trade settings
#[derive(Debug, Clone, Deserialize)]
pub struct InstrumentSettings {
    /// Moving-average period for the Bollinger bands
    #[serde(default = "default_ma_period")]
    pub ma_period: usize,
    /// Standard-deviation multiplier for the bands
    #[serde(default = "default_std_mult")]
    pub std_mult: Decimal,
    /// RSI lookback period
    #[serde(default = "default_momentum_period")]
    pub momentum_period: usize,
    /// Maximum tradeable spread (ask close - bid close)
    #[serde(default = "default_max_spread")]
    pub max_spread: Decimal,
    /// Minimum projected gain worth reporting
    #[serde(default = "default_min_gain")]
    pub min_gain: Decimal,
    /// Risk:reward ratio used for the stop-loss distance
    #[serde(default = "default_risk_reward")]
    pub risk_reward: Decimal,
    /// Minimum absolute stop-loss distance (prevents zero-width stops)
    #[serde(default = "default_min_stop_distance")]
    pub min_stop_distance: Decimal,
}

fn default_ma_period() -> usize {
    12
}
fn default_std_mult() -> Decimal {
    dec!(2.0)
}
fn default_momentum_period() -> usize {
    14
}
fn default_max_spread() -> Decimal {
    dec!(1.0)
}
fn default_min_gain() -> Decimal {
    dec!(0.06)
}
fn default_risk_reward() -> Decimal {
    dec!(3)
}
fn default_min_stop_distance() -> Decimal {
    dec!(0.1)
}

impl Default for InstrumentSettings {
    fn default() -> Self {
        Self {
            ma_period: default_ma_period(),
            std_mult: default_std_mult(),
            momentum_period: default_momentum_period(),
            max_spread: default_max_spread(),
            min_gain: default_min_gain(),
            risk_reward: default_risk_reward(),
            min_stop_distance: default_min_stop_distance(),
        }
    }
}

impl InstrumentSettings {
    /// Rows required before indicators are trustworthy
    pub fn min_window_rows(&self) -> usize {
        self.momentum_period.max(self.ma_period).max(200)
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
