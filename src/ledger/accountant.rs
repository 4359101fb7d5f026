//! Profit accounting
//!
//! Values each detected cycle and then the whole transaction. Unknown is
//! never zero: an asset whose decimals or price cannot be resolved makes the
//! side of the ledger its balance contributes to unknown, and profit with it.
//!
//! Created: 2026-10-02

use super::balance::{merge, net_flows, scaled, value_eth};
use super::prices::PriceTable;
use crate::metadata::{DecimalsFallback, MetadataResolver};
use crate::types::{Arbitrage, FlashLoan, Swap, TokenBalance, TransactionInfo, NATIVE_ASSET, NATIVE_DECIMALS};
use alloy::primitives::{Address, I256};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Transaction-level totals
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    pub token_balance: BTreeMap<Address, TokenBalance>,
    pub transaction_cost_eth: Option<Decimal>,
    pub transaction_cost_usd: Option<Decimal>,
    pub total_cost_eth: Option<Decimal>,
    pub total_cost_usd: Option<Decimal>,
    pub total_gain_eth: Option<Decimal>,
    pub total_gain_usd: Option<Decimal>,
    pub total_profit_eth: Option<Decimal>,
    pub total_profit_usd: Option<Decimal>,
}

/// Running sum that turns unknown for good once an unknown term is added
#[derive(Debug, Clone, Copy)]
struct Tally(Option<Decimal>);

impl Tally {
    fn zero() -> Self {
        Tally(Some(Decimal::ZERO))
    }

    fn add(&mut self, term: Option<Decimal>) {
        self.0 = match (self.0, term) {
            (Some(sum), Some(term)) => sum.checked_add(term),
            _ => None,
        };
    }
}

fn fiat(value: Option<Decimal>, eth_usd: Option<Decimal>) -> Option<Decimal> {
    value?.checked_mul(eth_usd?)
}

fn profit(gain: Option<Decimal>, cost: Option<Decimal>) -> Option<Decimal> {
    gain?.checked_sub(cost?)
}

/// Cost and gain over a balance map. Zero balances contribute nothing; an
/// overflowed balance has no known sign and makes both sides unknown.
pub fn cost_and_gain(balances: &BTreeMap<Address, TokenBalance>) -> (Option<Decimal>, Option<Decimal>) {
    let mut cost = Tally::zero();
    let mut gain = Tally::zero();
    for balance in balances.values() {
        if balance.overflow {
            cost.add(None);
            gain.add(None);
            continue;
        }
        if balance.amount.is_zero() {
            continue;
        }
        let value = value_eth(balance);
        if balance.amount.is_negative() {
            cost.add(value.map(|v| v.abs()));
        } else {
            gain.add(value);
        }
    }
    (cost.0, gain.0)
}

pub struct Accountant<'a> {
    resolver: &'a MetadataResolver,
    prices: &'a PriceTable,
}

impl<'a> Accountant<'a> {
    pub fn new(resolver: &'a MetadataResolver, prices: &'a PriceTable) -> Self {
        Self { resolver, prices }
    }

    /// Signed balances of a swap chain, with decimals and price at `timestamp`
    pub async fn balances(&self, swaps: &[Swap], timestamp: u64) -> BTreeMap<Address, TokenBalance> {
        let mut balances = BTreeMap::new();
        for (asset, (name, amount)) in net_flows(swaps) {
            let (decimals, price_eth) = if asset == NATIVE_ASSET {
                (Some(NATIVE_DECIMALS), Some(Decimal::ONE))
            } else {
                (
                    self.resolver.token_decimals(asset, DecimalsFallback::Unknown).await,
                    self.prices.price_eth(asset, timestamp),
                )
            };
            balances.insert(
                asset,
                TokenBalance {
                    name,
                    amount: amount.unwrap_or(I256::ZERO),
                    decimals,
                    price_eth,
                    overflow: amount.is_none(),
                },
            );
        }
        balances
    }

    /// Value one detected cycle
    pub async fn value_cycle(&self, swaps: Vec<Swap>, timestamp: u64, eth_usd: Option<Decimal>) -> Arbitrage {
        let token_balance = self.balances(&swaps, timestamp).await;
        let (cost_eth, gain_eth) = cost_and_gain(&token_balance);
        let profit_eth = profit(gain_eth, cost_eth);

        Arbitrage {
            swaps,
            token_balance,
            cost_eth,
            cost_usd: fiat(cost_eth, eth_usd),
            gain_eth,
            gain_usd: fiat(gain_eth, eth_usd),
            profit_eth,
            profit_usd: fiat(profit_eth, eth_usd),
        }
    }

    /// Fill in reference-currency values of flash loans
    pub fn price_flash_loans(&self, loans: &mut [FlashLoan], timestamp: u64) {
        for loan in loans {
            let price = self.prices.price_eth(loan.asset, timestamp);
            let decimals = if loan.asset == NATIVE_ASSET {
                NATIVE_DECIMALS
            } else {
                loan.asset_decimals
            };
            loan.price_eth = price;
            loan.amount_eth = price.and_then(|p| scaled(loan.amount, decimals)?.checked_mul(p));
            loan.fee_eth = price.and_then(|p| scaled(loan.fee, decimals)?.checked_mul(p));
        }
    }
}

/// Combine a transaction's cycles with its gas and flash-loan fees
pub fn settle(
    arbitrages: &[Arbitrage],
    transaction: &TransactionInfo,
    flash_loans: &[FlashLoan],
    eth_usd: Option<Decimal>,
) -> Settlement {
    let mut token_balance = BTreeMap::new();
    for arbitrage in arbitrages {
        merge(&mut token_balance, &arbitrage.token_balance);
    }

    let transaction_cost_eth = scaled(transaction.gas_cost_wei(), NATIVE_DECIMALS);

    let mut cost = Tally(transaction_cost_eth);
    for loan in flash_loans {
        if loan.fee.is_zero() {
            continue;
        }
        cost.add(loan.fee_eth);
    }

    let (ledger_cost, ledger_gain) = cost_and_gain(&token_balance);
    cost.add(ledger_cost);
    let total_cost_eth = cost.0;
    let total_gain_eth = ledger_gain;
    let total_profit_eth = profit(total_gain_eth, total_cost_eth);

    Settlement {
        token_balance,
        transaction_cost_eth,
        transaction_cost_usd: fiat(transaction_cost_eth, eth_usd),
        total_cost_eth,
        total_cost_usd: fiat(total_cost_eth, eth_usd),
        total_gain_eth,
        total_gain_usd: fiat(total_gain_eth, eth_usd),
        total_profit_eth,
        total_profit_usd: fiat(total_profit_eth, eth_usd),
    }
}
