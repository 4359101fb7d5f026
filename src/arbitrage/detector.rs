//! Cycle Detector
//!
//! Walks a transaction's swaps in log-index order and cuts them into closed
//! cycles back to the origin asset (the first swap's input). A broken link
//! (output of one leg is not the input of the next) or two consecutive legs
//! on the same pool ends the search for the rest of the transaction.
//!
//! Created: 2026-10-02

use crate::types::{NativeAssets, Swap};

/// Closed cycles in one transaction's log-index-ordered swaps
pub fn detect_cycles(swaps: &[Swap], native: NativeAssets) -> Vec<Vec<Swap>> {
    let mut cycles = Vec::new();

    let (Some(first), Some(last)) = (swaps.first(), swaps.last()) else {
        return cycles;
    };
    if swaps.len() < 2 || !native.equivalent(first.in_asset, last.out_asset) {
        return cycles;
    }

    let origin = first.in_asset;
    let mut chain = vec![first.clone()];

    for pair in swaps.windows(2) {
        let (previous, current) = (&pair[0], &pair[1]);
        chain.push(current.clone());

        // invalidation is permanent for the rest of the transaction
        if previous.out_asset != current.in_asset || previous.pool_address == current.pool_address {
            break;
        }

        if native.equivalent(origin, current.out_asset) {
            cycles.push(std::mem::take(&mut chain));
        }
    }

    cycles
}
