//! Process configuration.
//!
//! Settings load from a TOML file with `GRID_BOT`-prefixed environment
//! variables layered on top, e.g. `GRID_BOT__BOT__ACCOUNT_ID=...` or
//! `GRID_BOT__SUBMIT__MAX_RETRIES=5`.

use std::time::Duration;

pub use config::ConfigError;
use config::{Config, File};
use serde::Deserialize;

use crate::grid::config::GridParams;
use crate::venue::types::{Commitment, MarketRules};
use crate::venue::SubmitPolicy;

/// Main configuration struct
#[derive(Debug, Deserialize)]
pub struct Settings {
    /// Bot identity and mode
    pub bot: BotSettings,
    /// Grid strategy parameters
    pub grid: GridParams,
    /// Submission retry policy
    #[serde(default)]
    pub submit: SubmitSettings,
    /// Paper venue simulation
    #[serde(default)]
    pub paper: PaperSettings,
    /// Logging configuration
    #[serde(default)]
    pub log: LogSettings,
}

#[derive(Debug, Deserialize)]
pub struct BotSettings {
    /// Account identifier notifications are filtered against
    pub account_id: String,
    /// Execution mode; only "paper" is wired in this build
    #[serde(default = "default_mode")]
    pub mode: String,
}

fn default_mode() -> String {
    "paper".to_string()
}

#[derive(Debug, Deserialize)]
pub struct SubmitSettings {
    /// Submission attempts before giving up
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Confirmation wait for the first attempt; later attempts scale it
    #[serde(default = "default_confirm_timeout_ms")]
    pub confirm_timeout_ms: u64,
    /// First retry delay; later delays double it
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    /// Durability tier confirmations wait for
    #[serde(default)]
    pub commitment: Commitment,
}

impl SubmitSettings {
    /// Convert to the submitter's policy type
    pub fn policy(&self) -> SubmitPolicy {
        SubmitPolicy {
            max_retries: self.max_retries,
            base_timeout: Duration::from_millis(self.confirm_timeout_ms),
            backoff_base: Duration::from_millis(self.backoff_base_ms),
            commitment: self.commitment,
        }
    }
}

impl Default for SubmitSettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            confirm_timeout_ms: default_confirm_timeout_ms(),
            backoff_base_ms: default_backoff_base_ms(),
            commitment: Commitment::default(),
        }
    }
}

fn default_max_retries() -> u32 {
    3
}

fn default_confirm_timeout_ms() -> u64 {
    30_000
}

fn default_backoff_base_ms() -> u64 {
    2_000
}

#[derive(Debug, Deserialize)]
pub struct PaperSettings {
    /// Simulated price at startup
    #[serde(default = "default_initial_price")]
    pub initial_price: f64,
    /// Smallest price increment of the simulated market
    #[serde(default = "default_tick_size")]
    pub tick_size: f64,
    /// Smallest order size the simulated market accepts
    #[serde(default = "default_min_order_size")]
    pub min_order_size: f64,
    /// Largest per-step move of the simulated price, as a fraction
    #[serde(default = "default_walk_step_pct")]
    pub walk_step_pct: f64,
    /// Milliseconds between simulated price steps
    #[serde(default = "default_walk_interval_ms")]
    pub walk_interval_ms: u64,
}

impl PaperSettings {
    /// Rounding rules of the simulated market
    pub fn market_rules(&self) -> MarketRules {
        MarketRules::new(self.tick_size, self.min_order_size)
    }
}

impl Default for PaperSettings {
    fn default() -> Self {
        Self {
            initial_price: default_initial_price(),
            tick_size: default_tick_size(),
            min_order_size: default_min_order_size(),
            walk_step_pct: default_walk_step_pct(),
            walk_interval_ms: default_walk_interval_ms(),
        }
    }
}

fn default_initial_price() -> f64 {
    100.0
}

fn default_tick_size() -> f64 {
    0.01
}

fn default_min_order_size() -> f64 {
    0.001
}

fn default_walk_step_pct() -> f64 {
    0.002
}

fn default_walk_interval_ms() -> u64 {
    500
}

#[derive(Debug, Deserialize)]
pub struct LogSettings {
    /// Log level: "error", "warn", "info", "debug", "trace"
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Settings {
    /// Load settings from a configuration file, then apply env overrides
    pub fn new(config_path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name(config_path))
            // e.g. GRID_BOT__BOT__ACCOUNT_ID=... overrides the file
            .add_source(config::Environment::with_prefix("GRID_BOT").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
