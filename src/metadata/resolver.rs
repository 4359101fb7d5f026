//! Read-through metadata resolution
//!
//! Every field is resolved by trying ABI shapes in a fixed order. A shape
//! that reverts or returns undecodable data falls through to the next one,
//! and exhaustion is a valid terminal outcome that gets cached like any
//! other. Transport failures and timeouts are not resolutions: they fall
//! through the same way but nothing is cached, so a later block retries.
//!
//! Created: 2026-10-02

use super::cache::{MetadataCache, PoolSide};
use crate::chain::{ChainClient, ChainError};
use crate::contracts::{ICurvePoolInt128, ICurvePoolUint256, IERC20Bytes32Name, IERC20Metadata, IUniswapPool};
use alloy::primitives::{Address, U256};
use alloy::sol_types::SolCall;
use std::sync::Arc;
use tracing::debug;

/// What a decimals lookup returns when every shape fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecimalsFallback {
    /// Unresolved stays unknown (cycle accounting)
    Unknown,
    /// Unresolved reads as zero (flash-loan asset decimals)
    Zero,
}

impl DecimalsFallback {
    pub fn apply(self, raw: Option<u8>) -> Option<u8> {
        match self {
            DecimalsFallback::Unknown => raw,
            DecimalsFallback::Zero => Some(raw.unwrap_or(0)),
        }
    }
}

enum Lookup<T> {
    Found(T),
    /// Reverted or undecodable; this shape will never work
    Failed,
    /// Transport problem; do not cache
    Transient,
}

impl<T> Lookup<T> {
    fn found(self) -> Option<T> {
        match self {
            Lookup::Found(v) => Some(v),
            _ => None,
        }
    }
}

/// Stable-pool coin accessor variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CoinShape {
    CoinsInt128,
    CoinsUint256,
    UnderlyingInt128,
    UnderlyingUint256,
}

/// Order in which coin accessors are tried
const COIN_SHAPES: &[CoinShape] = &[
    CoinShape::CoinsInt128,
    CoinShape::CoinsUint256,
    CoinShape::UnderlyingInt128,
    CoinShape::UnderlyingUint256,
];

#[derive(Clone)]
pub struct MetadataResolver {
    chain: Arc<dyn ChainClient>,
    cache: MetadataCache,
}

impl MetadataResolver {
    pub fn new(chain: Arc<dyn ChainClient>, cache: MetadataCache) -> Self {
        Self { chain, cache }
    }

    pub fn cache(&self) -> &MetadataCache {
        &self.cache
    }

    async fn try_call<Call: SolCall>(&self, to: Address, call: Call) -> Lookup<Call::Return> {
        match self.chain.call(to, call.abi_encode().into()).await {
            Ok(output) => match Call::abi_decode_returns(&output) {
                Ok(value) => Lookup::Found(value),
                Err(e) => {
                    debug!("{} on {}: undecodable return: {}", Call::SIGNATURE, to, e);
                    Lookup::Failed
                }
            },
            Err(ChainError::Call(e)) | Err(ChainError::NotFound(e)) => {
                debug!("{} on {} failed: {}", Call::SIGNATURE, to, e);
                Lookup::Failed
            }
            Err(e) => {
                debug!("{} on {}: {}", Call::SIGNATURE, to, e);
                Lookup::Transient
            }
        }
    }

    async fn pool_token(&self, pool: Address, side: PoolSide) -> Option<Address> {
        if let Some(cached) = self.cache.pool_token(pool, side) {
            return cached;
        }

        let lookup = match side {
            PoolSide::Token0 => self.try_call(pool, IUniswapPool::token0Call {}).await,
            PoolSide::Token1 => self.try_call(pool, IUniswapPool::token1Call {}).await,
        };
        match lookup {
            Lookup::Found(token) => {
                self.cache.set_pool_token(pool, side, Some(token));
                Some(token)
            }
            Lookup::Failed => {
                self.cache.set_pool_token(pool, side, None);
                None
            }
            Lookup::Transient => None,
        }
    }

    /// `(token0, token1)` of a two-asset pool; `None` if either accessor fails
    pub async fn pool_tokens(&self, pool: Address) -> Option<(Address, Address)> {
        let token0 = self.pool_token(pool, PoolSide::Token0).await?;
        let token1 = self.pool_token(pool, PoolSide::Token1).await?;
        Some((token0, token1))
    }

    /// Display name: string `name()`, then bytes32 `name()`, then the
    /// checksummed address
    pub async fn token_name(&self, token: Address) -> String {
        if let Some(name) = self.cache.name(token) {
            return name;
        }

        let mut transient = false;

        match self.try_call(token, IERC20Metadata::nameCall {}).await {
            Lookup::Found(name) => {
                self.cache.set_name(token, name.clone());
                return name;
            }
            Lookup::Transient => transient = true,
            Lookup::Failed => {}
        }

        match self.try_call(token, IERC20Bytes32Name::nameCall {}).await {
            Lookup::Found(raw) => {
                let end = raw.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
                let name = String::from_utf8_lossy(&raw[..end]).into_owned();
                self.cache.set_name(token, name.clone());
                return name;
            }
            Lookup::Transient => transient = true,
            Lookup::Failed => {}
        }

        let name = token.to_checksum(None);
        if !transient {
            self.cache.set_name(token, name.clone());
        }
        name
    }

    /// Decimal precision with the caller's exhaustion default
    pub async fn token_decimals(&self, token: Address, fallback: DecimalsFallback) -> Option<u8> {
        if let Some(raw) = self.cache.decimals(token) {
            return fallback.apply(raw);
        }

        let raw = match self.try_call(token, IERC20Metadata::decimalsCall {}).await {
            Lookup::Found(decimals) => {
                self.cache.set_decimals(token, Some(decimals));
                Some(decimals)
            }
            Lookup::Failed => {
                self.cache.set_decimals(token, None);
                None
            }
            Lookup::Transient => None,
        };
        fallback.apply(raw)
    }

    /// Coin addresses for the sold and bought indices of a stable-swap pool.
    /// One ABI shape must resolve both indices.
    pub async fn stable_pool_coins(&self, pool: Address, sold: U256, bought: U256) -> Option<(Address, Address)> {
        if let (Some(a), Some(b)) = (self.cache.coin(pool, sold), self.cache.coin(pool, bought)) {
            return Some((a, b));
        }

        for &shape in COIN_SHAPES {
            if let Some((a, b)) = self.coins_by(shape, pool, sold, bought).await {
                self.cache.set_coin(pool, sold, a);
                self.cache.set_coin(pool, bought, b);
                return Some((a, b));
            }
        }

        debug!("No coin shape resolved indices {}/{} on pool {}", sold, bought, pool);
        None
    }

    async fn coins_by(&self, shape: CoinShape, pool: Address, sold: U256, bought: U256) -> Option<(Address, Address)> {
        match shape {
            CoinShape::CoinsInt128 | CoinShape::UnderlyingInt128 => {
                // int128 shapes only apply to indices that fit
                let (sold, bought) = (i128::try_from(sold).ok()?, i128::try_from(bought).ok()?);
                if shape == CoinShape::CoinsInt128 {
                    self.coins_int128(pool, sold, bought).await
                } else {
                    self.underlying_int128(pool, sold, bought).await
                }
            }
            CoinShape::CoinsUint256 => self.coins_uint256(pool, sold, bought).await,
            CoinShape::UnderlyingUint256 => self.underlying_uint256(pool, sold, bought).await,
        }
    }

    async fn coins_int128(&self, pool: Address, sold: i128, bought: i128) -> Option<(Address, Address)> {
        let a = self.try_call(pool, ICurvePoolInt128::coinsCall { i: sold }).await.found()?;
        let b = self.try_call(pool, ICurvePoolInt128::coinsCall { i: bought }).await.found()?;
        Some((a, b))
    }

    async fn coins_uint256(&self, pool: Address, sold: U256, bought: U256) -> Option<(Address, Address)> {
        let a = self.try_call(pool, ICurvePoolUint256::coinsCall { i: sold }).await.found()?;
        let b = self.try_call(pool, ICurvePoolUint256::coinsCall { i: bought }).await.found()?;
        Some((a, b))
    }

    async fn underlying_int128(&self, pool: Address, sold: i128, bought: i128) -> Option<(Address, Address)> {
        let a = self
            .try_call(pool, ICurvePoolInt128::underlying_coinsCall { i: sold })
            .await
            .found()?;
        let b = self
            .try_call(pool, ICurvePoolInt128::underlying_coinsCall { i: bought })
            .await
            .found()?;
        Some((a, b))
    }

    async fn underlying_uint256(&self, pool: Address, sold: U256, bought: U256) -> Option<(Address, Address)> {
        let a = self
            .try_call(pool, ICurvePoolUint256::underlying_coinsCall { i: sold })
            .await
            .found()?;
        let b = self
            .try_call(pool, ICurvePoolUint256::underlying_coinsCall { i: bought })
            .await
            .found()?;
        Some((a, b))
    }
}
