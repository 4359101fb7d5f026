//! Chain Access
//!
//! The `ChainClient` trait is the only way the pipeline talks to a node:
//! log queries (one topic per call), block/transaction objects, and raw
//! `eth_call` for metadata. `rpc::RpcChain` is the alloy-backed client.
//!
//! Created: 2026-10-02

pub mod rpc;

#[cfg(test)]
pub mod mock;

pub use rpc::{LogQueryStrategy, RpcChain};

use crate::types::{BlockInfo, Event, TransactionInfo};
use alloy::primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Failures from a single remote call
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("provider error: {0}")]
    Provider(String),

    /// The call reached the node but reverted or returned undecodable data
    #[error("call failed: {0}")]
    Call(String),

    #[error("{0} not found")]
    NotFound(String),
}

/// Remote chain-data endpoint
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Logs for exactly one event signature over an inclusive block range
    async fn logs(&self, from_block: u64, to_block: u64, topic: B256) -> Result<Vec<Event>, ChainError>;

    async fn block(&self, number: u64) -> Result<BlockInfo, ChainError>;

    /// Transaction summary combined from the transaction and its receipt
    async fn transaction(&self, hash: B256) -> Result<TransactionInfo, ChainError>;

    /// Read-only contract call with pre-encoded calldata
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError>;
}
