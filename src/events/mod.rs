//! Event Fetcher
//!
//! Log retrieval per topic and window, and normalization of raw JSON-RPC
//! logs (hex strings) into canonical `Event`s.
//!
//! Created: 2026-10-02

pub mod fetcher;
pub mod retry;
pub mod topics;

pub use fetcher::{fetch_logs, fetch_window};
pub use retry::{FetchError, RetryPolicy};

use crate::types::Event;
use alloy::primitives::{Address, Bytes, B256};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RawLogError {
    #[error("missing field {0} (pending log?)")]
    Missing(&'static str),

    #[error("malformed {field}: {value}")]
    Malformed { field: &'static str, value: String },
}

/// `eth_getLogs` entry as returned over the wire
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLog {
    pub address: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub data: String,
    pub block_number: Option<String>,
    pub transaction_hash: Option<String>,
    pub transaction_index: Option<String>,
    pub log_index: Option<String>,
}

impl RawLog {
    pub fn normalize(&self) -> Result<Event, RawLogError> {
        let address: Address = self.address.parse().map_err(|_| RawLogError::Malformed {
            field: "address",
            value: self.address.clone(),
        })?;

        let topics = self
            .topics
            .iter()
            .map(|t| {
                t.parse::<B256>().map_err(|_| RawLogError::Malformed {
                    field: "topic",
                    value: t.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let data = hex::decode(strip_prefix(&self.data)).map_err(|_| RawLogError::Malformed {
            field: "data",
            value: self.data.clone(),
        })?;

        let hash = required(&self.transaction_hash, "transactionHash")?;
        let transaction_hash = hash.parse::<B256>().map_err(|_| RawLogError::Malformed {
            field: "transactionHash",
            value: hash.to_string(),
        })?;

        Ok(Event {
            address,
            topics,
            data: Bytes::from(data),
            block_number: quantity(&self.block_number, "blockNumber")?,
            transaction_hash,
            transaction_index: quantity(&self.transaction_index, "transactionIndex")?,
            log_index: quantity(&self.log_index, "logIndex")?,
        })
    }
}

fn strip_prefix(s: &str) -> &str {
    s.strip_prefix("0x").unwrap_or(s)
}

fn required<'a>(value: &'a Option<String>, field: &'static str) -> Result<&'a str, RawLogError> {
    value.as_deref().ok_or(RawLogError::Missing(field))
}

/// Hex quantity (`"0x1a"`) to integer
fn quantity(value: &Option<String>, field: &'static str) -> Result<u64, RawLogError> {
    let raw = required(value, field)?;
    u64::from_str_radix(strip_prefix(raw), 16).map_err(|_| RawLogError::Malformed {
        field,
        value: raw.to_string(),
    })
}
