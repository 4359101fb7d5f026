//! Core data structures for the arbitrage scanner
//!
//! Canonical records that flow through the pipeline:
//! Event → Swap → Arbitrage → Finding.
//!
//! Created: 2026-10-02

use alloy::primitives::{address, Address, Bytes, B256, I256, U256};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Native-asset sentinel used by stable-swap pools and flash-loan platforms
pub const NATIVE_ASSET: Address = address!("EeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE");

/// Decimals of the native asset (by definition, no lookup)
pub const NATIVE_DECIMALS: u8 = 18;

/// Display name used when the native sentinel is replaced by its wrapped form
pub const WRAPPED_NATIVE_NAME: &str = "Wrapped Ether";

/// Networks the scanner knows how to query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Ethereum,
    Optimism,
    Arbitrum,
    Zksync,
}

impl Network {
    /// Wrapped native asset (WETH) on this network
    pub fn wrapped_native(&self) -> Address {
        match self {
            Network::Ethereum => address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"),
            Network::Optimism => address!("4200000000000000000000000000000000000006"),
            Network::Arbitrum => address!("82aF49447D8a07e3bd95BD0d56f35241523fBab1"),
            Network::Zksync => address!("5AEa5775959fBC2557Cc8789bC1bf90A239D9a91"),
        }
    }

    /// Native/wrapped equivalence class used by cycle detection
    pub fn native_assets(&self) -> NativeAssets {
        NativeAssets {
            native: NATIVE_ASSET,
            wrapped: self.wrapped_native(),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Network::Ethereum => write!(f, "ethereum"),
            Network::Optimism => write!(f, "optimism"),
            Network::Arbitrum => write!(f, "arbitrum"),
            Network::Zksync => write!(f, "zksync"),
        }
    }
}

impl std::str::FromStr for Network {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ethereum" | "mainnet" => Ok(Network::Ethereum),
            "optimism" => Ok(Network::Optimism),
            "arbitrum" => Ok(Network::Arbitrum),
            "zksync" => Ok(Network::Zksync),
            other => anyhow::bail!(
                "Unsupported network: '{}'. Supported: ethereum, optimism, arbitrum, zksync",
                other
            ),
        }
    }
}

/// The native sentinel and its wrapped counterpart.
/// Either address counts as "the native asset" when closing a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeAssets {
    pub native: Address,
    pub wrapped: Address,
}

impl NativeAssets {
    pub fn contains(&self, asset: Address) -> bool {
        asset == self.native || asset == self.wrapped
    }

    /// Direct equality, or both sides in the native/wrapped class
    pub fn equivalent(&self, a: Address, b: Address) -> bool {
        a == b || (self.contains(a) && self.contains(b))
    }
}

/// Canonical log record (hex decoded, integer indices)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
    pub block_number: u64,
    pub transaction_hash: B256,
    pub transaction_index: u64,
    pub log_index: u64,
}

impl Event {
    /// Event signature (topic 0)
    pub fn signature(&self) -> Option<B256> {
        self.topics.first().copied()
    }
}

/// Exchange protocols with a swap decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    UniswapV2,
    Velodrome,
    UniswapV3,
    BalancerV1,
    BalancerV2,
    Curve,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Protocol::UniswapV2 => write!(f, "Uniswap V2"),
            Protocol::Velodrome => write!(f, "Velodrome"),
            Protocol::UniswapV3 => write!(f, "Uniswap V3"),
            Protocol::BalancerV1 => write!(f, "Balancer V1"),
            Protocol::BalancerV2 => write!(f, "Balancer V2"),
            Protocol::Curve => write!(f, "Curve"),
        }
    }
}

/// One exchange of asset A for asset B inside a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Swap {
    pub log_index: u64,
    pub in_asset: Address,
    pub in_asset_name: String,
    pub out_asset: Address,
    pub out_asset_name: String,
    #[serde(serialize_with = "as_display")]
    pub in_amount: U256,
    #[serde(serialize_with = "as_display")]
    pub out_amount: U256,
    pub pool_address: Address,
    #[serde(serialize_with = "as_display")]
    pub protocol: Protocol,
}

/// Flash loan observed in the same transaction as an arbitrage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlashLoan {
    pub asset: Address,
    pub asset_name: String,
    pub asset_decimals: u8,
    #[serde(serialize_with = "as_display")]
    pub amount: U256,
    #[serde(serialize_with = "as_display")]
    pub fee: U256,
    pub platform_name: String,
    pub platform_address: Address,
    /// Filled in once priced against the reference currency
    pub price_eth: Option<Decimal>,
    pub amount_eth: Option<Decimal>,
    pub fee_eth: Option<Decimal>,
}

/// Signed per-asset balance with the metadata needed to value it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenBalance {
    pub name: String,
    #[serde(serialize_with = "as_display")]
    pub amount: I256,
    pub decimals: Option<u8>,
    pub price_eth: Option<Decimal>,
    /// The raw flow left the signed 256-bit range; `amount` is meaningless
    /// and the balance cannot be valued
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub overflow: bool,
}

/// One detected closed cycle with its accounting.
/// `None` in any value field means "unknown", never zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Arbitrage {
    pub swaps: Vec<Swap>,
    pub token_balance: BTreeMap<Address, TokenBalance>,
    pub cost_eth: Option<Decimal>,
    pub cost_usd: Option<Decimal>,
    pub gain_eth: Option<Decimal>,
    pub gain_usd: Option<Decimal>,
    pub profit_eth: Option<Decimal>,
    pub profit_usd: Option<Decimal>,
}

/// Block context needed for accounting and persistence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockInfo {
    pub number: u64,
    pub timestamp: u64,
    pub miner: Address,
}

/// Transaction summary (transaction + receipt)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionInfo {
    pub hash: B256,
    pub transaction_index: u64,
    pub from: Address,
    pub to: Option<Address>,
    #[serde(serialize_with = "as_display")]
    pub value: U256,
    pub gas_used: u64,
    #[serde(serialize_with = "as_display")]
    pub effective_gas_price: u128,
}

impl TransactionInfo {
    /// Gas expenditure in wei
    pub fn gas_cost_wei(&self) -> U256 {
        U256::from(self.gas_used) * U256::from(self.effective_gas_price)
    }
}

/// Persisted record: one per transaction with at least one arbitrage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub id: String,
    pub block_number: u64,
    pub block_timestamp: u64,
    pub miner: Address,
    pub transaction: TransactionInfo,
    pub arbitrages: Vec<Arbitrage>,
    pub token_balance: BTreeMap<Address, TokenBalance>,
    pub eth_usd_price: Option<Decimal>,
    pub total_cost_eth: Option<Decimal>,
    pub total_cost_usd: Option<Decimal>,
    pub total_gain_eth: Option<Decimal>,
    pub total_gain_usd: Option<Decimal>,
    pub total_profit_eth: Option<Decimal>,
    pub total_profit_usd: Option<Decimal>,
    pub transaction_cost_eth: Option<Decimal>,
    pub transaction_cost_usd: Option<Decimal>,
    pub flash_loans: Vec<FlashLoan>,
}

impl Finding {
    /// Distinct protocol names across all arbitrage legs (sorted)
    pub fn protocols(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .arbitrages
            .iter()
            .flat_map(|a| a.swaps.iter().map(|s| s.protocol.to_string()))
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Distinct flash-loan platform names (sorted)
    pub fn flash_loan_platforms(&self) -> Vec<String> {
        let mut names: Vec<String> = self.flash_loans.iter().map(|l| l.platform_name.clone()).collect();
        names.sort();
        names.dedup();
        names
    }
}

/// Amounts are stored as decimal strings (U256/I256 overflow JSON numbers)
fn as_display<T: fmt::Display, S: serde::Serializer>(value: &T, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_equivalence() {
        let native = Network::Optimism.native_assets();
        let usdc = address!("7F5c764cBc14f9669B88837ca1490cCa17c31607");

        assert!(native.equivalent(NATIVE_ASSET, Network::Optimism.wrapped_native()));
        assert!(native.equivalent(usdc, usdc));
        assert!(!native.equivalent(usdc, NATIVE_ASSET));
    }

    #[test]
    fn test_network_parse() {
        assert_eq!("Optimism".parse::<Network>().unwrap(), Network::Optimism);
        assert_eq!("mainnet".parse::<Network>().unwrap(), Network::Ethereum);
        assert!("solana".parse::<Network>().is_err());
    }

    #[test]
    fn test_swap_amounts_serialize_as_strings() {
        let swap = Swap {
            log_index: 3,
            in_asset: Address::ZERO,
            in_asset_name: "A".to_string(),
            out_asset: Address::ZERO,
            out_asset_name: "B".to_string(),
            in_amount: U256::from(10).pow(U256::from(30)),
            out_amount: U256::from(7),
            pool_address: Address::ZERO,
            protocol: Protocol::UniswapV3,
        };

        let json = serde_json::to_value(&swap).unwrap();
        assert_eq!(json["in_amount"], "1000000000000000000000000000000");
        assert_eq!(json["out_amount"], "7");
        assert_eq!(json["protocol"], "Uniswap V3");
    }
}
