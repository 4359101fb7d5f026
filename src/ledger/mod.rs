//! Ledger & Profit Accountant
//!
//! Signed per-asset balances, the reference price table, and cost/gain/profit
//! derivation with unknown-value propagation.

pub mod accountant;
pub mod balance;
pub mod prices;

pub use accountant::{settle, Accountant, Settlement};
pub use prices::PriceTable;
