//! Per-asset signed balances and their reference-currency value

use crate::types::{Swap, TokenBalance};
use alloy::primitives::{Address, I256, U256};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Largest mantissa a `Decimal` can hold (2^96 - 1)
const MAX_MANTISSA: u128 = (1u128 << 96) - 1;
const MAX_SCALE: u32 = 28;

/// Net raw flow per asset over a swap chain, with the asset's display name.
/// `None` once an amount or the running sum leaves the signed 256-bit range.
pub fn net_flows(swaps: &[Swap]) -> BTreeMap<Address, (String, Option<I256>)> {
    let mut flows: BTreeMap<Address, (String, Option<I256>)> = BTreeMap::new();
    for swap in swaps {
        let entry = flows
            .entry(swap.in_asset)
            .or_insert_with(|| (swap.in_asset_name.clone(), Some(I256::ZERO)));
        entry.1 = entry.1.and_then(|sum| sum.checked_sub(signed(swap.in_amount)?));

        let entry = flows
            .entry(swap.out_asset)
            .or_insert_with(|| (swap.out_asset_name.clone(), Some(I256::ZERO)));
        entry.1 = entry.1.and_then(|sum| sum.checked_add(signed(swap.out_amount)?));
    }
    flows
}

fn signed(amount: U256) -> Option<I256> {
    I256::try_from(amount).ok()
}

/// `amount / 10^decimals` as a `Decimal`, shedding low digits that do not
/// fit. `None` if the integer part itself overflows.
pub fn scaled(amount: U256, decimals: u8) -> Option<Decimal> {
    let mut mantissa = amount;
    let mut scale = u32::from(decimals);
    let ten = U256::from(10);

    while mantissa > U256::from(MAX_MANTISSA) || scale > MAX_SCALE {
        if scale == 0 {
            return None;
        }
        mantissa /= ten;
        scale -= 1;
    }

    let mantissa = i128::try_from(u128::try_from(mantissa).ok()?).ok()?;
    Some(Decimal::from_i128_with_scale(mantissa, scale))
}

/// Signed reference-currency value of a balance; `None` when decimals or
/// price are unknown or the product overflows
pub fn value_eth(balance: &TokenBalance) -> Option<Decimal> {
    if balance.overflow {
        return None;
    }
    let decimals = balance.decimals?;
    let price = balance.price_eth?;
    let magnitude = scaled(balance.amount.unsigned_abs(), decimals)?.checked_mul(price)?;
    Some(if balance.amount.is_negative() { -magnitude } else { magnitude })
}

/// Sum `from` into `into`, keeping the first-seen metadata per asset.
/// An overflowing sum marks the merged balance as overflowed.
pub fn merge(into: &mut BTreeMap<Address, TokenBalance>, from: &BTreeMap<Address, TokenBalance>) {
    for (asset, balance) in from {
        into.entry(*asset)
            .and_modify(|existing| {
                match existing.amount.checked_add(balance.amount) {
                    Some(sum) if !existing.overflow && !balance.overflow => existing.amount = sum,
                    _ => {
                        existing.amount = I256::ZERO;
                        existing.overflow = true;
                    }
                }
            })
            .or_insert_with(|| balance.clone());
    }
}
