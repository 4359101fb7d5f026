//! Balancer V1 `LOG_SWAP` / Balancer V2 `Swap`
//!
//! Both carry `tokenIn, tokenOut` as indexed topics 2 and 3 and
//! `amountIn, amountOut` as the first two data words.

use super::words::{topic_address, uint};
use alloy::primitives::{Address, B256, U256};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightedTrade {
    pub in_asset: Address,
    pub out_asset: Address,
    pub in_amount: U256,
    pub out_amount: U256,
}

pub fn decode(topics: &[B256], data: &[u8]) -> Option<WeightedTrade> {
    Some(WeightedTrade {
        in_asset: topic_address(topics, 2)?,
        out_asset: topic_address(topics, 3)?,
        in_amount: uint(data, 0)?,
        out_amount: uint(data, 1)?,
    })
}
