//! Scripted in-memory chain for tests

use super::{ChainClient, ChainError};
use crate::types::{BlockInfo, Event, TransactionInfo};
use alloy::primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Default)]
pub struct MockChain {
    logs: Mutex<HashMap<B256, Vec<Event>>>,
    calls: Mutex<HashMap<(Address, Bytes), Bytes>>,
    blocks: Mutex<HashMap<u64, BlockInfo>>,
    transactions: Mutex<HashMap<B256, TransactionInfo>>,
    /// Number of upcoming log queries that fail with a transport error
    failures: AtomicUsize,
    log_queries: AtomicUsize,
    eth_calls: AtomicUsize,
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_log(&self, event: Event) {
        let topic = event.signature().unwrap_or_default();
        self.logs.lock().entry(topic).or_default().push(event);
    }

    /// Respond to `call(to, calldata)` with `output`; unscripted calls revert
    pub fn add_call(&self, to: Address, calldata: Vec<u8>, output: Vec<u8>) {
        self.calls.lock().insert((to, calldata.into()), output.into());
    }

    pub fn add_block(&self, block: BlockInfo) {
        self.blocks.lock().insert(block.number, block);
    }

    pub fn add_transaction(&self, tx: TransactionInfo) {
        self.transactions.lock().insert(tx.hash, tx);
    }

    pub fn fail_next(&self, n: usize) {
        self.failures.store(n, Ordering::SeqCst);
    }

    pub fn log_queries(&self) -> usize {
        self.log_queries.load(Ordering::SeqCst)
    }

    pub fn eth_calls(&self) -> usize {
        self.eth_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn logs(&self, from_block: u64, to_block: u64, topic: B256) -> Result<Vec<Event>, ChainError> {
        self.log_queries.fetch_add(1, Ordering::SeqCst);
        let pending = self.failures.load(Ordering::SeqCst);
        if pending > 0 {
            self.failures.store(pending - 1, Ordering::SeqCst);
            return Err(ChainError::Transport("connection reset".to_string()));
        }

        Ok(self
            .logs
            .lock()
            .get(&topic)
            .map(|events| {
                events
                    .iter()
                    .filter(|e| e.block_number >= from_block && e.block_number <= to_block)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn block(&self, number: u64) -> Result<BlockInfo, ChainError> {
        self.blocks
            .lock()
            .get(&number)
            .cloned()
            .ok_or_else(|| ChainError::NotFound(format!("block {}", number)))
    }

    async fn transaction(&self, hash: B256) -> Result<TransactionInfo, ChainError> {
        self.transactions
            .lock()
            .get(&hash)
            .cloned()
            .ok_or_else(|| ChainError::NotFound(format!("transaction {}", hash)))
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError> {
        self.eth_calls.fetch_add(1, Ordering::SeqCst);
        self.calls
            .lock()
            .get(&(to, data))
            .cloned()
            .ok_or_else(|| ChainError::Call("execution reverted".to_string()))
    }
}
