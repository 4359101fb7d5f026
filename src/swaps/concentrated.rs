//! Uniswap V3 `Swap`
//!
//! Data starts with signed `amount0, amount1` from the pool's perspective:
//! the negative side left the pool.

use super::words::int;
use super::PairTrade;

pub fn decode(data: &[u8]) -> Option<PairTrade> {
    let amount0 = int(data, 0)?;
    let amount1 = int(data, 1)?;

    if amount0.is_negative() {
        Some(PairTrade {
            sold_token0: false,
            in_amount: amount1.unsigned_abs(),
            out_amount: amount0.unsigned_abs(),
        })
    } else {
        Some(PairTrade {
            sold_token0: true,
            in_amount: amount0.unsigned_abs(),
            out_amount: amount1.unsigned_abs(),
        })
    }
}
