//! Swap Normalizer
//!
//! Decodes each protocol's swap payload into a canonical `Swap`, resolving
//! pool constituents and names through the metadata resolver. Per block the
//! swaps are grouped by transaction index and kept sorted by log index.
//!
//! Created: 2026-10-02

pub mod concentrated;
pub mod constant_product;
pub mod stable;
pub mod weighted;
pub mod words;

use crate::events::topics;
use crate::metadata::MetadataResolver;
use crate::types::{Event, Network, Protocol, Swap, NATIVE_ASSET, WRAPPED_NATIVE_NAME};
use alloy::primitives::{Address, B256, U256};
use std::collections::BTreeMap;
use tracing::debug;

/// Two-asset pool trade, before token0/token1 are known
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairTrade {
    pub sold_token0: bool,
    pub in_amount: U256,
    pub out_amount: U256,
}

const PROTOCOLS: [(B256, Protocol); 7] = [
    (topics::UNISWAP_V2_SWAP, Protocol::UniswapV2),
    (topics::VELODROME_SWAP, Protocol::Velodrome),
    (topics::UNISWAP_V3_SWAP, Protocol::UniswapV3),
    (topics::BALANCER_V1_SWAP, Protocol::BalancerV1),
    (topics::BALANCER_V2_SWAP, Protocol::BalancerV2),
    (topics::CURVE_EXCHANGE, Protocol::Curve),
    (topics::CURVE_EXCHANGE_UNDERLYING, Protocol::Curve),
];

/// Swap-emitting protocol for an event signature
pub fn protocol_for(signature: B256) -> Option<Protocol> {
    PROTOCOLS
        .iter()
        .find(|(topic, _)| *topic == signature)
        .map(|(_, protocol)| *protocol)
}

/// Swaps of one block, per transaction
#[derive(Debug, Default)]
pub struct BlockSwaps {
    swaps: BTreeMap<u64, Vec<Swap>>,
    hashes: BTreeMap<u64, B256>,
}

impl BlockSwaps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember the hash of a transaction that emitted a swap event
    pub fn record_transaction(&mut self, transaction_index: u64, hash: B256) {
        self.hashes.entry(transaction_index).or_insert(hash);
    }

    /// Insert keeping log-index order; equal indices stay in insertion order
    pub fn insert(&mut self, transaction_index: u64, swap: Swap) {
        let list = self.swaps.entry(transaction_index).or_default();
        let at = list.partition_point(|s| s.log_index <= swap.log_index);
        list.insert(at, swap);
    }

    pub fn is_empty(&self) -> bool {
        self.swaps.values().all(Vec::is_empty)
    }

    pub fn swap_count(&self) -> usize {
        self.swaps.values().map(Vec::len).sum()
    }

    pub fn transaction_hash(&self, transaction_index: u64) -> Option<B256> {
        self.hashes.get(&transaction_index).copied()
    }

    /// `(transaction_index, swaps)` in ascending transaction order
    pub fn transactions(&self) -> impl Iterator<Item = (u64, &[Swap])> {
        self.swaps.iter().map(|(i, s)| (*i, s.as_slice()))
    }
}

pub struct SwapNormalizer {
    resolver: MetadataResolver,
    network: Network,
}

impl SwapNormalizer {
    pub fn new(resolver: MetadataResolver, network: Network) -> Self {
        Self { resolver, network }
    }

    pub fn resolver(&self) -> &MetadataResolver {
        &self.resolver
    }

    /// Decode every swap event of a block
    pub async fn normalize_block(&self, events: &[Event]) -> BlockSwaps {
        let mut block = BlockSwaps::new();
        for event in events {
            if event.signature().and_then(protocol_for).is_none() {
                continue;
            }
            block.record_transaction(event.transaction_index, event.transaction_hash);
            if let Some(swap) = self.normalize(event).await {
                block.insert(event.transaction_index, swap);
            }
        }
        block
    }

    /// One event to one swap; `None` if the payload or metadata does not allow it
    pub async fn normalize(&self, event: &Event) -> Option<Swap> {
        let protocol = protocol_for(event.signature()?)?;
        let swap = match protocol {
            Protocol::UniswapV2 | Protocol::Velodrome => {
                let trade = constant_product::decode(&event.data);
                self.pair_swap(event, protocol, trade).await
            }
            Protocol::UniswapV3 => {
                let trade = concentrated::decode(&event.data);
                self.pair_swap(event, protocol, trade).await
            }
            Protocol::BalancerV1 | Protocol::BalancerV2 => self.weighted_swap(event, protocol).await,
            Protocol::Curve => self.stable_swap(event).await,
        };

        if swap.is_none() {
            debug!(
                "Discarded {} event at {}:{} from {}",
                protocol, event.block_number, event.log_index, event.address
            );
        }
        swap
    }

    async fn pair_swap(&self, event: &Event, protocol: Protocol, trade: Option<PairTrade>) -> Option<Swap> {
        let trade = trade?;
        let (token0, token1) = self.resolver.pool_tokens(event.address).await?;
        let (in_asset, out_asset) = if trade.sold_token0 {
            (token0, token1)
        } else {
            (token1, token0)
        };
        Some(
            self.build(event, protocol, in_asset, out_asset, trade.in_amount, trade.out_amount)
                .await,
        )
    }

    async fn weighted_swap(&self, event: &Event, protocol: Protocol) -> Option<Swap> {
        let trade = weighted::decode(&event.topics, &event.data)?;
        Some(
            self.build(
                event,
                protocol,
                trade.in_asset,
                trade.out_asset,
                trade.in_amount,
                trade.out_amount,
            )
            .await,
        )
    }

    async fn stable_swap(&self, event: &Event) -> Option<Swap> {
        let trade = stable::decode(&event.data)?;
        let (in_asset, out_asset) = self
            .resolver
            .stable_pool_coins(event.address, trade.sold_id, trade.bought_id)
            .await?;

        let mut swap = self
            .build(
                event,
                Protocol::Curve,
                in_asset,
                out_asset,
                trade.tokens_sold,
                trade.tokens_bought,
            )
            .await;

        // stable pools report the native sentinel; book it as the wrapped asset
        let wrapped = self.network.wrapped_native();
        if swap.in_asset == NATIVE_ASSET {
            swap.in_asset = wrapped;
            swap.in_asset_name = WRAPPED_NATIVE_NAME.to_string();
        }
        if swap.out_asset == NATIVE_ASSET {
            swap.out_asset = wrapped;
            swap.out_asset_name = WRAPPED_NATIVE_NAME.to_string();
        }
        Some(swap)
    }

    async fn build(
        &self,
        event: &Event,
        protocol: Protocol,
        in_asset: Address,
        out_asset: Address,
        in_amount: U256,
        out_amount: U256,
    ) -> Swap {
        Swap {
            log_index: event.log_index,
            in_asset,
            in_asset_name: self.resolver.token_name(in_asset).await,
            out_asset,
            out_asset_name: self.resolver.token_name(out_asset).await,
            in_amount,
            out_amount,
            pool_address: event.address,
            protocol,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::mock::MockChain;
    use crate::contracts::{ICurvePoolInt128, IERC20Metadata, IUniswapPool};
    use crate::metadata::MetadataCache;
    use alloy::primitives::{address, Bytes, I256};
    use alloy::sol_types::SolCall;
    use std::sync::Arc;

    const POOL: Address = address!("1111111111111111111111111111111111111111");
    const TOKEN_A: Address = address!("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
    const TOKEN_B: Address = address!("bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb");

    fn script<C: SolCall>(chain: &MockChain, to: Address, call: C, ret: &C::Return) {
        chain.add_call(to, call.abi_encode(), C::abi_encode_returns(ret));
    }

    fn normalizer(chain: &Arc<MockChain>) -> SwapNormalizer {
        let resolver = MetadataResolver::new(chain.clone(), MetadataCache::new());
        SwapNormalizer::new(resolver, Network::Optimism)
    }

    fn event(signature: B256, topics: Vec<B256>, data: Vec<u8>, tx: u64, log_index: u64) -> Event {
        let mut all = vec![signature];
        all.extend(topics);
        Event {
            address: POOL,
            topics: all,
            data: Bytes::from(data),
            block_number: 100,
            transaction_hash: B256::repeat_byte(tx as u8),
            transaction_index: tx,
            log_index,
        }
    }

    fn words(values: &[U256]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_be_bytes::<32>()).collect()
    }

    #[tokio::test]
    async fn test_v3_negative_amount0() {
        let chain = Arc::new(MockChain::new());
        script(&chain, POOL, IUniswapPool::token0Call {}, &TOKEN_A);
        script(&chain, POOL, IUniswapPool::token1Call {}, &TOKEN_B);
        script(&chain, TOKEN_A, IERC20Metadata::nameCall {}, &"Token A".to_string());

        let mut data = words(&[
            I256::try_from(-900i64).unwrap().into_raw(),
            U256::from(1_000),
        ]);
        data.extend_from_slice(&[0u8; 96]);
        let swap = normalizer(&chain)
            .normalize(&event(topics::UNISWAP_V3_SWAP, vec![], data, 1, 4))
            .await
            .unwrap();

        assert_eq!(swap.in_asset, TOKEN_B);
        assert_eq!(swap.out_asset, TOKEN_A);
        assert_eq!(swap.in_amount, U256::from(1_000));
        assert_eq!(swap.out_amount, U256::from(900));
        assert_eq!(swap.out_asset_name, "Token A");
        assert_eq!(swap.in_asset_name, TOKEN_B.to_checksum(None));
        assert_eq!(swap.protocol, Protocol::UniswapV3);
    }

    #[tokio::test]
    async fn test_pair_swap_dropped_without_pool_tokens() {
        let chain = Arc::new(MockChain::new());
        let data = words(&[U256::ZERO, U256::from(5), U256::from(7), U256::ZERO]);

        let swap = normalizer(&chain)
            .normalize(&event(topics::VELODROME_SWAP, vec![], data, 1, 0))
            .await;
        assert!(swap.is_none());
    }

    #[tokio::test]
    async fn test_curve_native_sentinel_becomes_wrapped() {
        let chain = Arc::new(MockChain::new());
        script(&chain, POOL, ICurvePoolInt128::coinsCall { i: 0 }, &NATIVE_ASSET);
        script(&chain, POOL, ICurvePoolInt128::coinsCall { i: 1 }, &TOKEN_A);

        let data = words(&[U256::ZERO, U256::from(10), U256::from(1), U256::from(11)]);
        let swap = normalizer(&chain)
            .normalize(&event(topics::CURVE_EXCHANGE, vec![B256::ZERO], data, 2, 3))
            .await
            .unwrap();

        assert_eq!(swap.in_asset, Network::Optimism.wrapped_native());
        assert_eq!(swap.in_asset_name, WRAPPED_NATIVE_NAME);
        assert_eq!(swap.out_asset, TOKEN_A);
        assert_eq!(swap.in_amount, U256::from(10));
        assert_eq!(swap.protocol, Protocol::Curve);
    }

    #[tokio::test]
    async fn test_block_swaps_sorted_by_log_index() {
        let chain = Arc::new(MockChain::new());
        let balancer = |tx, log_index| {
            event(
                topics::BALANCER_V2_SWAP,
                vec![
                    B256::ZERO,
                    B256::left_padding_from(TOKEN_A.as_slice()),
                    B256::left_padding_from(TOKEN_B.as_slice()),
                ],
                words(&[U256::from(log_index), U256::from(1)]),
                tx,
                log_index,
            )
        };
        let events = vec![
            balancer(3, 9),
            balancer(3, 2),
            balancer(1, 5),
            // unknown signature: ignored entirely
            event(B256::repeat_byte(0xee), vec![], vec![], 7, 0),
        ];

        let block = normalizer(&chain).normalize_block(&events).await;

        let txs: Vec<(u64, Vec<u64>)> = block
            .transactions()
            .map(|(i, s)| (i, s.iter().map(|s| s.log_index).collect()))
            .collect();
        assert_eq!(txs, vec![(1, vec![5]), (3, vec![2, 9])]);
        assert_eq!(block.transaction_hash(3), Some(B256::repeat_byte(3)));
        assert_eq!(block.transaction_hash(7), None);
    }

    #[test]
    fn test_insert_ties_keep_insertion_order() {
        let swap = |log_index, amount| Swap {
            log_index,
            in_asset: TOKEN_A,
            in_asset_name: String::new(),
            out_asset: TOKEN_B,
            out_asset_name: String::new(),
            in_amount: U256::from(amount),
            out_amount: U256::ZERO,
            pool_address: POOL,
            protocol: Protocol::UniswapV2,
        };
        let mut block = BlockSwaps::new();
        block.insert(0, swap(4, 1));
        block.insert(0, swap(1, 2));
        block.insert(0, swap(4, 3));

        let (_, swaps) = block.transactions().next().unwrap();
        let amounts: Vec<U256> = swaps.iter().map(|s| s.in_amount).collect();
        assert_eq!(amounts, vec![U256::from(2), U256::from(1), U256::from(3)]);
        assert_eq!(block.swap_count(), 3);
    }
}
