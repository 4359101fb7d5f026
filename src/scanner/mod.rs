//! Range Partitioner & Worker Pool

pub mod partition;
pub mod pool;
pub mod worker;

pub use partition::{partition, windows};
pub use pool::{run_pool, ExecutionStats};
pub use worker::{ScanContext, Worker, WorkerOutcome, WorkerReport};
