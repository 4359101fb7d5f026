//! Scanner configuration
//!
//! Endpoint from `.env` (`RPC_URL`, optional `NETWORK`), everything else
//! from a TOML scan file:
//!
//! ```toml
//! [general]
//! network = "optimism"
//! window_size = 2000
//! workers = 8
//!
//! [[range]]
//! start = 105235063
//! end = 107000000
//! ```
//!
//! Created: 2026-10-02

use crate::events::RetryPolicy;
use crate::types::Network;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Endpoint settings from the environment
#[derive(Debug, Clone)]
pub struct Environment {
    pub rpc_url: String,
    pub network: Option<Network>,
}

impl Environment {
    /// Read `.env` (if present) and the process environment
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();
        let rpc_url = std::env::var("RPC_URL").context("RPC_URL not set")?;
        let network = match std::env::var("NETWORK") {
            Ok(name) => Some(name.parse()?),
            Err(_) => None,
        };
        Ok(Self { rpc_url, network })
    }

    /// Leading part of the endpoint, for logs (keeps API keys out)
    pub fn rpc_url_prefix(&self) -> String {
        self.rpc_url.chars().take(30).collect()
    }
}

/// Top-level TOML scan file
#[derive(Debug, Clone, Deserialize)]
pub struct ScannerConfig {
    pub general: GeneralConfig,
    #[serde(rename = "range", default)]
    pub ranges: Vec<RangeConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_network")]
    pub network: Network,
    #[serde(default = "default_window_size")]
    pub window_size: u64,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,
    #[serde(default = "default_results_db")]
    pub results_db: PathBuf,
    #[serde(default = "default_prices_file")]
    pub prices_file: PathBuf,
    #[serde(default = "default_checkpoint_dir")]
    pub checkpoint_dir: PathBuf,
    /// "text" or "json"
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

fn default_network() -> Network { Network::Optimism }
fn default_window_size() -> u64 { 2000 }
fn default_workers() -> usize { std::thread::available_parallelism().map_or(1, |n| n.get()) }
fn default_request_timeout() -> u64 { 60 }
fn default_max_retries() -> u32 { 3 }
fn default_retry_delay() -> u64 { 5 }
fn default_results_db() -> PathBuf { PathBuf::from("data/results.db") }
fn default_prices_file() -> PathBuf { PathBuf::from("data/prices.json") }
fn default_checkpoint_dir() -> PathBuf { PathBuf::from("data/checkpoints") }
fn default_log_format() -> String { "text".to_string() }

/// One pre-divided block range (inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RangeConfig {
    pub start: u64,
    pub end: u64,
}

impl ScannerConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse TOML configuration")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.general.window_size == 0 {
            anyhow::bail!("window_size must be at least 1");
        }
        for (i, range) in self.ranges.iter().enumerate() {
            if range.end < range.start {
                anyhow::bail!("range {} ends before it starts ({} > {})", i, range.start, range.end);
            }
        }
        Ok(())
    }

    pub fn range(&self, index: usize) -> Result<RangeConfig> {
        self.ranges
            .get(index)
            .copied()
            .with_context(|| format!("No range at index {} ({} configured)", index, self.ranges.len()))
    }
}

impl GeneralConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_secs(self.retry_delay_secs))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}
