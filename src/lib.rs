//! DEX Arbitrage Scanner Library
//!
//! Historical scan of decentralized-exchange swap logs for atomic cyclic
//! arbitrage: normalize swaps, detect closed cycles per transaction,
//! attribute flash loans, value the result and persist one finding per
//! transaction.
//!
//! Created: 2026-10-02

pub mod arbitrage;
pub mod chain;
pub mod config;
pub mod contracts;
pub mod events;
pub mod flash_loans;
pub mod ledger;
pub mod metadata;
pub mod scanner;
pub mod sink;
pub mod swaps;
pub mod types;

// Re-export commonly used types
pub use chain::{ChainClient, ChainError, RpcChain};
pub use config::{Environment, ScannerConfig};
pub use scanner::{run_pool, ScanContext, WorkerReport};
pub use types::{Arbitrage, Event, Finding, FlashLoan, Network, Swap};
