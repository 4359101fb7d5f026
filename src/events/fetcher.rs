//! Window log fetch
//!
//! One log query per topic (topics are never combined), each under the
//! retry policy. The first exhausted topic aborts the whole window.

use super::retry::{FetchError, RetryPolicy};
use super::topics::SWAP_TOPICS;
use crate::chain::ChainClient;
use crate::types::Event;
use alloy::primitives::B256;
use std::collections::BTreeMap;
use tracing::debug;

/// Fetch `topics` one at a time over `[from_block, to_block]`, concatenated
/// in topic order
pub async fn fetch_logs<C>(
    chain: &C,
    retry: &RetryPolicy,
    from_block: u64,
    to_block: u64,
    topics: &[B256],
) -> Result<Vec<Event>, FetchError>
where
    C: ChainClient + ?Sized,
{
    let mut events = Vec::new();
    for &topic in topics {
        let what = format!("logs {}-{} topic {}", from_block, to_block, topic);
        let batch = retry
            .run(&what, move || chain.logs(from_block, to_block, topic))
            .await?;
        debug!("{}: {} events", what, batch.len());
        events.extend(batch);
    }
    Ok(events)
}

/// All swap events of a window, bucketed by block. Every block of the
/// window has an entry, possibly empty.
pub async fn fetch_window<C>(
    chain: &C,
    retry: &RetryPolicy,
    from_block: u64,
    to_block: u64,
) -> Result<BTreeMap<u64, Vec<Event>>, FetchError>
where
    C: ChainClient + ?Sized,
{
    let events = fetch_logs(chain, retry, from_block, to_block, &SWAP_TOPICS).await?;

    let mut blocks: BTreeMap<u64, Vec<Event>> = (from_block..=to_block).map(|b| (b, Vec::new())).collect();
    for event in events {
        match blocks.get_mut(&event.block_number) {
            Some(bucket) => bucket.push(event),
            None => debug!("Ignoring event outside window at block {}", event.block_number),
        }
    }
    Ok(blocks)
}
