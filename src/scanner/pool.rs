//! Worker pool
//!
//! One tokio task per sub-range. Workers never talk to each other; each
//! sends its `WorkerReport` back over a channel when it finishes.

use super::worker::{ScanContext, Worker, WorkerOutcome, WorkerReport};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Execution-time summary over finished workers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecutionStats {
    pub max: Duration,
    pub mean: Duration,
    pub median: Duration,
    pub min: Duration,
}

impl ExecutionStats {
    /// `None` for an empty sample. An even count takes the mean of the two
    /// middle values.
    pub fn from_durations(durations: &[Duration]) -> Option<Self> {
        if durations.is_empty() {
            return None;
        }
        let mut sorted = durations.to_vec();
        sorted.sort();

        let n = sorted.len();
        let total: Duration = sorted.iter().sum();
        let median = if n % 2 == 1 {
            sorted[n / 2]
        } else {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2
        };

        Some(Self {
            max: sorted[n - 1],
            mean: total / n as u32,
            median,
            min: sorted[0],
        })
    }
}

/// Scan every range concurrently and wait for all workers
pub async fn run_pool(ctx: Arc<ScanContext>, ranges: Vec<(u64, u64)>) -> Vec<WorkerReport> {
    let started = Instant::now();
    let expected = ranges.len();
    let (tx, mut rx) = mpsc::channel::<WorkerReport>(expected.max(1));

    info!("Starting {} workers", expected);
    for (id, range) in ranges.into_iter().enumerate() {
        let tx = tx.clone();
        let worker = Worker::new(id, ctx.clone(), range);
        tokio::spawn(async move {
            let report = worker.run().await;
            if tx.send(report).await.is_err() {
                warn!("Worker {}: coordinator gone, report dropped", id);
            }
        });
    }
    drop(tx);

    let mut reports = Vec::with_capacity(expected);
    while let Some(report) = rx.recv().await {
        match &report.outcome {
            WorkerOutcome::Completed => info!(
                "Worker {} finished blocks {}-{}: {} windows, {} findings in {:.1}s",
                report.worker,
                report.range.0,
                report.range.1,
                report.windows,
                report.findings,
                report.elapsed.as_secs_f64()
            ),
            WorkerOutcome::Abandoned {
                from_block,
                to_block,
                error,
            } => warn!(
                "Worker {} stopped at blocks {}-{} after {} windows: {}",
                report.worker, from_block, to_block, report.windows, error
            ),
        }
        reports.push(report);
    }

    if reports.len() < expected {
        warn!("{} of {} workers exited without a report", expected - reports.len(), expected);
    }

    info!("Total execution time: {:.1}s", started.elapsed().as_secs_f64());
    let durations: Vec<Duration> = reports.iter().map(|r| r.elapsed).collect();
    if let Some(stats) = ExecutionStats::from_durations(&durations) {
        info!(
            "Execution time - max: {:.1}s | mean: {:.1}s | median: {:.1}s | min: {:.1}s",
            stats.max.as_secs_f64(),
            stats.mean.as_secs_f64(),
            stats.median.as_secs_f64(),
            stats.min.as_secs_f64()
        );
    }

    reports.sort_by_key(|r| r.worker);
    reports
}
