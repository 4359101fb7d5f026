//! Process-wide metadata cache
//!
//! Clones share the same maps, so every worker sees every resolution.
//! Entries are never evicted. Concurrent resolution of the same key is
//! allowed and the last write wins; all writers store the same value.

use alloy::primitives::{Address, U256};
use dashmap::DashMap;
use std::sync::Arc;

/// Which constituent of a two-asset pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolSide {
    Token0,
    Token1,
}

#[derive(Debug, Clone, Default)]
pub struct MetadataCache {
    /// `None` records a pool whose accessor reverted
    pool_tokens: Arc<DashMap<(Address, PoolSide), Option<Address>>>,
    names: Arc<DashMap<Address, String>>,
    /// Raw outcome; the caller applies its own fallback
    decimals: Arc<DashMap<Address, Option<u8>>>,
    coins: Arc<DashMap<(Address, U256), Address>>,
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pool_token(&self, pool: Address, side: PoolSide) -> Option<Option<Address>> {
        self.pool_tokens.get(&(pool, side)).map(|e| *e.value())
    }

    pub fn set_pool_token(&self, pool: Address, side: PoolSide, token: Option<Address>) {
        self.pool_tokens.insert((pool, side), token);
    }

    pub fn name(&self, token: Address) -> Option<String> {
        self.names.get(&token).map(|e| e.value().clone())
    }

    pub fn set_name(&self, token: Address, name: String) {
        self.names.insert(token, name);
    }

    pub fn decimals(&self, token: Address) -> Option<Option<u8>> {
        self.decimals.get(&token).map(|e| *e.value())
    }

    pub fn set_decimals(&self, token: Address, decimals: Option<u8>) {
        self.decimals.insert(token, decimals);
    }

    pub fn coin(&self, pool: Address, index: U256) -> Option<Address> {
        self.coins.get(&(pool, index)).map(|e| *e.value())
    }

    pub fn set_coin(&self, pool: Address, index: U256, coin: Address) {
        self.coins.insert((pool, index), coin);
    }

    /// Number of cached entries across all maps
    pub fn len(&self) -> usize {
        self.pool_tokens.len() + self.names.len() + self.decimals.len() + self.coins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
