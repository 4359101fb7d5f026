//! Result Sink & Checkpoint

pub mod checkpoint;
pub mod store;

pub use checkpoint::{resume_start, CheckpointLog};
pub use store::{finding_id, ResultStore};
