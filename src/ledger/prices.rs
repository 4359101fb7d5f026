//! Time-indexed reference prices
//!
//! Loaded once from a JSON file mapping asset addresses to
//! `[[timestamp_ms, price], ...]` series quoted in the reference asset
//! (ETH), plus an `eth_to_usd` series for fiat conversion.
//!
//! Lookup takes a block timestamp in seconds. The first bracket
//! `p[i].ts <= t <= p[i+1].ts` answers with `p[i]`; a timestamp outside
//! every bracket degrades to the latest known price with a warning.
//!
//! Created: 2026-10-02

use crate::types::NATIVE_ASSET;
use alloy::primitives::Address;
use anyhow::{Context, Result};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

/// Key of the reference→fiat series
pub const ETH_TO_USD_KEY: &str = "eth_to_usd";

/// `(timestamp_ms, price)` points in ascending time order
type Series = Vec<(u64, Decimal)>;

#[derive(Debug, Clone, Default)]
pub struct PriceTable {
    assets: HashMap<Address, Series>,
    eth_usd: Series,
    /// Wrapped native asset, at parity with the reference
    wrapped: Address,
}

impl PriceTable {
    pub fn load<P: AsRef<Path>>(path: P, wrapped: Address) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read price file: {}", path.display()))?;
        let table = Self::from_json(&content, wrapped)
            .with_context(|| format!("Failed to parse price file: {}", path.display()))?;
        info!(
            "Loaded prices for {} assets ({} ETH/USD points) from {}",
            table.assets.len(),
            table.eth_usd.len(),
            path.display()
        );
        Ok(table)
    }

    pub fn from_json(content: &str, wrapped: Address) -> Result<Self> {
        let raw: HashMap<String, Vec<(f64, f64)>> = serde_json::from_str(content)?;

        let mut table = Self {
            wrapped,
            ..Self::default()
        };
        for (key, points) in raw {
            let series = to_series(&key, points);
            if key == ETH_TO_USD_KEY {
                table.eth_usd = series;
                continue;
            }
            match key.parse::<Address>() {
                Ok(asset) => {
                    table.assets.insert(asset, series);
                }
                Err(_) => warn!("Ignoring price series with invalid key '{}'", key),
            }
        }
        Ok(table)
    }

    /// Price of one whole unit of `asset` in the reference asset
    pub fn price_eth(&self, asset: Address, timestamp: u64) -> Option<Decimal> {
        if asset == NATIVE_ASSET || asset == self.wrapped {
            return Some(Decimal::ONE);
        }
        let series = self.assets.get(&asset)?;
        lookup(series, timestamp, &asset.to_checksum(None))
    }

    /// Reference→fiat rate
    pub fn eth_usd(&self, timestamp: u64) -> Option<Decimal> {
        lookup(&self.eth_usd, timestamp, ETH_TO_USD_KEY)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

fn to_series(key: &str, points: Vec<(f64, f64)>) -> Series {
    let mut series: Series = points
        .into_iter()
        .filter_map(|(ts, price)| {
            if !ts.is_finite() || ts < 0.0 {
                return None;
            }
            Some((ts as u64, Decimal::from_f64(price)?))
        })
        .collect();
    series.sort_by_key(|(ts, _)| *ts);
    if series.is_empty() {
        warn!("Price series '{}' has no usable points", key);
    }
    series
}

fn lookup(series: &[(u64, Decimal)], timestamp: u64, label: &str) -> Option<Decimal> {
    let t = timestamp.saturating_mul(1000);
    if let Some(pair) = series.windows(2).find(|w| w[0].0 <= t && t <= w[1].0) {
        return Some(pair[0].1);
    }

    let (_, latest) = series.last()?;
    warn!(
        "No price bracket for {} at {}; using latest price. Consider updating the price file",
        label, timestamp
    );
    Some(*latest)
}
