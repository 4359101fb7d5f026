//! Arbitrage Module
//!
//! Closed-cycle detection over a transaction's swaps.
//!
//! Created: 2026-10-02

pub mod detector;

pub use detector::detect_cycles;
