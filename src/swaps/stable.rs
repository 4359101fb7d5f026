//! Curve `TokenExchange` / `TokenExchangeUnderlying`
//!
//! Data: `sold_id, tokens_sold, bought_id, tokens_bought`. Coin indices are
//! resolved against the pool by the metadata resolver.

use super::words::uint;
use alloy::primitives::U256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StableTrade {
    pub sold_id: U256,
    pub tokens_sold: U256,
    pub bought_id: U256,
    pub tokens_bought: U256,
}

pub fn decode(data: &[u8]) -> Option<StableTrade> {
    Some(StableTrade {
        sold_id: uint(data, 0)?,
        tokens_sold: uint(data, 1)?,
        bought_id: uint(data, 2)?,
        tokens_bought: uint(data, 3)?,
    })
}
