//! Uniswap V2 / Velodrome `Swap`
//!
//! Data: `amount0In, amount1In, amount0Out, amount1Out`. Only one-directional
//! swaps are attributable; anything else (e.g. both sides in) is dropped.

use super::words::uint;
use super::PairTrade;

pub fn decode(data: &[u8]) -> Option<PairTrade> {
    let in0 = uint(data, 0)?;
    let in1 = uint(data, 1)?;
    let out0 = uint(data, 2)?;
    let out1 = uint(data, 3)?;

    if in0.is_zero() && out1.is_zero() {
        Some(PairTrade {
            sold_token0: false,
            in_amount: in1,
            out_amount: out0,
        })
    } else if in1.is_zero() && out0.is_zero() {
        Some(PairTrade {
            sold_token0: true,
            in_amount: in0,
            out_amount: out1,
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::U256;

    fn payload(words: [u64; 4]) -> Vec<u8> {
        words
            .iter()
            .flat_map(|w| U256::from(*w).to_be_bytes::<32>())
            .collect()
    }

    #[test]
    fn test_sold_token1() {
        let trade = decode(&payload([0, 500, 1_000, 0])).unwrap();
        assert!(!trade.sold_token0);
        assert_eq!(trade.in_amount, U256::from(500));
        assert_eq!(trade.out_amount, U256::from(1_000));
    }

    #[test]
    fn test_sold_token0() {
        let trade = decode(&payload([700, 0, 0, 300])).unwrap();
        assert!(trade.sold_token0);
        assert_eq!(trade.in_amount, U256::from(700));
        assert_eq!(trade.out_amount, U256::from(300));
    }

    #[test]
    fn test_unattributable_and_short() {
        assert!(decode(&payload([1, 1, 0, 5])).is_none());
        assert!(decode(&payload([0, 5, 7, 0])[..96]).is_none());
    }
}
