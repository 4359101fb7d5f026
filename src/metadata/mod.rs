//! Metadata Resolver & Cache
//!
//! Pool constituents, token names/decimals and stable-swap coin indices,
//! resolved over `eth_call` and memoized for the life of the process.

pub mod cache;
pub mod resolver;

pub use cache::{MetadataCache, PoolSide};
pub use resolver::{DecimalsFallback, MetadataResolver};
