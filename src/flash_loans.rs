//! Flash-Loan Correlator
//!
//! Flash-loan events are only fetched for blocks that contain at least one
//! arbitrage, once per block. Loans are bucketed by transaction index and
//! asset so the accountant can attach them to the financed transaction.
//!
//! Layouts:
//!   - Aave V2: asset in topic 3, `amount, premium` in words 0/1
//!   - Aave V3: asset in topic 2, `amount` in word 1, `premium` in word 3
//!   - Balancer (3 topics): token in topic 2, `amount, fee` in words 0/1
//!   - Balancer (1 topic): token in word 1, `amount, fee` in words 2/3
//!
//! Created: 2026-10-02

use crate::chain::ChainClient;
use crate::events::topics::{AAVE_V2_FLASH_LOAN, AAVE_V3_FLASH_LOAN, BALANCER_FLASH_LOAN, FLASH_LOAN_TOPICS};
use crate::events::{fetch_logs, FetchError, RetryPolicy};
use crate::metadata::{DecimalsFallback, MetadataResolver};
use crate::swaps::words::{address, topic_address, uint};
use crate::types::{Event, FlashLoan, NATIVE_ASSET, NATIVE_DECIMALS};
use alloy::primitives::{Address, U256};
use std::collections::BTreeMap;
use tracing::debug;

/// Name booked for loans of the native sentinel
const NATIVE_NAME: &str = "Ether";

/// Raw loan fields before metadata resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanTerms {
    pub asset: Address,
    pub amount: U256,
    pub fee: U256,
    pub platform: &'static str,
}

pub fn decode(event: &Event) -> Option<LoanTerms> {
    let signature = event.signature()?;
    let data = &event.data;
    let topics = &event.topics;

    if signature == AAVE_V2_FLASH_LOAN {
        Some(LoanTerms {
            asset: topic_address(topics, 3)?,
            amount: uint(data, 0)?,
            fee: uint(data, 1)?,
            platform: "Aave V2",
        })
    } else if signature == AAVE_V3_FLASH_LOAN {
        Some(LoanTerms {
            asset: topic_address(topics, 2)?,
            amount: uint(data, 1)?,
            fee: uint(data, 3)?,
            platform: "Aave V3",
        })
    } else if signature == BALANCER_FLASH_LOAN {
        match topics.len() {
            3 => Some(LoanTerms {
                asset: topic_address(topics, 2)?,
                amount: uint(data, 0)?,
                fee: uint(data, 1)?,
                platform: "Balancer",
            }),
            1 => Some(LoanTerms {
                asset: address(data, 1)?,
                amount: uint(data, 2)?,
                fee: uint(data, 3)?,
                platform: "Balancer",
            }),
            _ => None,
        }
    } else {
        None
    }
}

/// Loans of one block: transaction index → asset → loans
#[derive(Debug, Default)]
pub struct FlashLoanBook {
    loans: BTreeMap<u64, BTreeMap<Address, Vec<FlashLoan>>>,
}

impl FlashLoanBook {
    pub fn insert(&mut self, transaction_index: u64, loan: FlashLoan) {
        self.loans
            .entry(transaction_index)
            .or_default()
            .entry(loan.asset)
            .or_default()
            .push(loan);
    }

    /// All loans taken in a transaction, grouped by asset
    pub fn for_transaction(&self, transaction_index: u64) -> Vec<FlashLoan> {
        self.loans
            .get(&transaction_index)
            .map(|by_asset| by_asset.values().flatten().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.loans.values().flat_map(|m| m.values()).map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Fetch and decode the flash loans of a single block
pub async fn correlate(
    chain: &dyn ChainClient,
    retry: &RetryPolicy,
    resolver: &MetadataResolver,
    block_number: u64,
) -> Result<FlashLoanBook, FetchError> {
    let events = fetch_logs(chain, retry, block_number, block_number, &FLASH_LOAN_TOPICS).await?;

    let mut book = FlashLoanBook::default();
    for event in &events {
        let Some(terms) = decode(event) else {
            debug!(
                "Skipping flash-loan event at {}:{} with {} topics",
                event.block_number,
                event.log_index,
                event.topics.len()
            );
            continue;
        };

        let (asset_name, asset_decimals) = if terms.asset == NATIVE_ASSET {
            (NATIVE_NAME.to_string(), NATIVE_DECIMALS)
        } else {
            let name = resolver.token_name(terms.asset).await;
            let decimals = resolver
                .token_decimals(terms.asset, DecimalsFallback::Zero)
                .await
                .unwrap_or(0);
            (name, decimals)
        };

        book.insert(
            event.transaction_index,
            FlashLoan {
                asset: terms.asset,
                asset_name,
                asset_decimals,
                amount: terms.amount,
                fee: terms.fee,
                platform_name: terms.platform.to_string(),
                platform_address: event.address,
                price_eth: None,
                amount_eth: None,
                fee_eth: None,
            },
        );
    }
    Ok(book)
}
