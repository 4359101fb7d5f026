//! Range worker
//!
//! Runs the full pipeline over one block range, window by window:
//! fetch swap logs → normalize → detect cycles → (on a hit) correlate flash
//! loans, fetch the transaction, settle → persist. A checkpoint line is
//! appended after every completed window. When a remote call exhausts its
//! retries the window is abandoned and the worker stops; the next run
//! resumes from the checkpoint.
//!
//! Created: 2026-10-02

use super::partition::windows;
use crate::arbitrage::detect_cycles;
use crate::chain::ChainClient;
use crate::events::{fetch_window, RetryPolicy};
use crate::flash_loans::{correlate, FlashLoanBook};
use crate::ledger::balance::scaled;
use crate::ledger::{settle, Accountant, PriceTable};
use crate::sink::{finding_id, resume_start, CheckpointLog, ResultStore};
use crate::swaps::SwapNormalizer;
use crate::types::{Arbitrage, BlockInfo, Event, Finding, Network};
use alloy::primitives::Address;
use anyhow::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Everything a worker shares with the other workers
pub struct ScanContext {
    pub chain: Arc<dyn ChainClient>,
    pub normalizer: SwapNormalizer,
    pub prices: PriceTable,
    pub store: ResultStore,
    pub network: Network,
    pub retry: RetryPolicy,
    pub window_size: u64,
    pub checkpoint_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerOutcome {
    Completed,
    /// Stopped at this window; nothing of it was checkpointed
    Abandoned {
        from_block: u64,
        to_block: u64,
        error: String,
    },
}

#[derive(Debug, Clone)]
pub struct WorkerReport {
    pub worker: usize,
    pub range: (u64, u64),
    pub windows: u64,
    pub findings: u64,
    pub elapsed: Duration,
    pub outcome: WorkerOutcome,
}

pub struct Worker {
    id: usize,
    ctx: Arc<ScanContext>,
    range: (u64, u64),
}

impl Worker {
    pub fn new(id: usize, ctx: Arc<ScanContext>, range: (u64, u64)) -> Self {
        Self { id, ctx, range }
    }

    pub async fn run(self) -> WorkerReport {
        let started = Instant::now();
        let (start, end) = self.range;
        let mut report = WorkerReport {
            worker: self.id,
            range: self.range,
            windows: 0,
            findings: 0,
            elapsed: Duration::ZERO,
            outcome: WorkerOutcome::Completed,
        };

        let checkpoint = CheckpointLog::for_range(&self.ctx.checkpoint_dir, start, end);
        let from = match self.resume_point(&checkpoint) {
            Ok(from) => from,
            Err(e) => {
                warn!("Worker {}: cannot determine resume point: {:#}", self.id, e);
                report.outcome = WorkerOutcome::Abandoned {
                    from_block: start,
                    to_block: end,
                    error: format!("{:#}", e),
                };
                report.elapsed = started.elapsed();
                return report;
            }
        };
        if from > start {
            info!("Worker {}: resuming at block {} (range {}-{})", self.id, from, start, end);
        } else {
            info!("Worker {}: scanning blocks {}-{}", self.id, start, end);
        }

        for (window_from, window_to) in windows(from, end, self.ctx.window_size) {
            let window_started = Instant::now();
            let result = match self.scan_window(window_from, window_to).await {
                Ok(found) => checkpoint.append(window_from, window_to).map(|_| found),
                Err(e) => Err(e),
            };

            match result {
                Ok(found) => {
                    report.windows += 1;
                    report.findings += found;
                    info!(
                        "Worker {}: blocks {}-{} done, {} findings ({:.1}s)",
                        self.id,
                        window_from,
                        window_to,
                        found,
                        window_started.elapsed().as_secs_f64()
                    );
                }
                Err(e) => {
                    warn!(
                        "Worker {}: abandoning blocks {}-{}: {:#}",
                        self.id, window_from, window_to, e
                    );
                    report.outcome = WorkerOutcome::Abandoned {
                        from_block: window_from,
                        to_block: window_to,
                        error: format!("{:#}", e),
                    };
                    break;
                }
            }
        }

        report.elapsed = started.elapsed();
        report
    }

    fn resume_point(&self, checkpoint: &CheckpointLog) -> Result<u64> {
        let (start, end) = self.range;
        let stored = self.ctx.store.max_block_number(start, end)?;
        let last = checkpoint.last_end()?;
        Ok(resume_start(start, stored, last))
    }

    /// Findings persisted for one window
    pub async fn scan_window(&self, from_block: u64, to_block: u64) -> Result<u64> {
        let blocks = fetch_window(self.ctx.chain.as_ref(), &self.ctx.retry, from_block, to_block).await?;

        let mut found = 0;
        for (block_number, events) in &blocks {
            if events.is_empty() {
                continue;
            }
            found += self.scan_block(*block_number, events).await?;
        }
        Ok(found)
    }

    async fn scan_block(&self, block_number: u64, events: &[Event]) -> Result<u64> {
        let ctx = &self.ctx;
        let swaps = ctx.normalizer.normalize_block(events).await;
        if swaps.is_empty() {
            return Ok(0);
        }

        let chain = ctx.chain.as_ref();
        let block = ctx
            .retry
            .run(&format!("block {}", block_number), move || chain.block(block_number))
            .await?;
        let eth_usd = ctx.prices.eth_usd(block.timestamp);
        let accountant = Accountant::new(ctx.normalizer.resolver(), &ctx.prices);
        let native = ctx.network.native_assets();

        let mut flash_loans: Option<FlashLoanBook> = None;
        let mut found = 0;

        for (tx_index, tx_swaps) in swaps.transactions() {
            if tx_swaps.len() < 2 {
                continue;
            }
            let cycles = detect_cycles(tx_swaps, native);
            if cycles.is_empty() {
                continue;
            }
            let Some(hash) = swaps.transaction_hash(tx_index) else {
                warn!("No hash recorded for transaction {} in block {}", tx_index, block_number);
                continue;
            };

            let mut arbitrages = Vec::with_capacity(cycles.len());
            for cycle in cycles {
                arbitrages.push(accountant.value_cycle(cycle, block.timestamp, eth_usd).await);
            }

            if flash_loans.is_none() {
                flash_loans =
                    Some(correlate(chain, &ctx.retry, ctx.normalizer.resolver(), block_number).await?);
            }
            let mut loans = flash_loans
                .as_ref()
                .map(|book| book.for_transaction(tx_index))
                .unwrap_or_default();
            accountant.price_flash_loans(&mut loans, block.timestamp);

            let transaction = ctx
                .retry
                .run(&format!("transaction {}", hash), move || chain.transaction(hash))
                .await?;
            let settlement = settle(&arbitrages, &transaction, &loans, eth_usd);

            let finding = Finding {
                id: finding_id(block.number, tx_index),
                block_number: block.number,
                block_timestamp: block.timestamp,
                miner: block.miner,
                transaction,
                arbitrages,
                token_balance: settlement.token_balance,
                eth_usd_price: eth_usd,
                total_cost_eth: settlement.total_cost_eth,
                total_cost_usd: settlement.total_cost_usd,
                total_gain_eth: settlement.total_gain_eth,
                total_gain_usd: settlement.total_gain_usd,
                total_profit_eth: settlement.total_profit_eth,
                total_profit_usd: settlement.total_profit_usd,
                transaction_cost_eth: settlement.transaction_cost_eth,
                transaction_cost_usd: settlement.transaction_cost_usd,
                flash_loans: loans,
            };

            log_finding(&block, &finding);
            if ctx.store.insert(&finding)? {
                found += 1;
            }
        }
        Ok(found)
    }
}

fn show(value: Option<Decimal>) -> String {
    value.map_or_else(|| "unknown".to_string(), |v| v.normalize().to_string())
}

fn log_arbitrage(arbitrage: &Arbitrage) {
    for swap in &arbitrage.swaps {
        let decimals = |asset: Address| {
            arbitrage
                .token_balance
                .get(&asset)
                .and_then(|b| b.decimals)
                .unwrap_or(0)
        };
        info!(
            "  Swap {} {} for {} {} on {}",
            show(scaled(swap.in_amount, decimals(swap.in_asset))),
            swap.in_asset_name,
            show(scaled(swap.out_amount, decimals(swap.out_asset))),
            swap.out_asset_name,
            swap.protocol
        );
    }
    info!(
        "  Cost: {} ETH | Gain: {} ETH | Profit: {} ETH ({} USD)",
        show(arbitrage.cost_eth),
        show(arbitrage.gain_eth),
        show(arbitrage.profit_eth),
        show(arbitrage.profit_usd)
    );
}

fn log_finding(block: &BlockInfo, finding: &Finding) {
    let time = i64::try_from(block.timestamp)
        .ok()
        .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
        .map_or_else(|| block.timestamp.to_string(), |t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string());
    info!(
        "Arbitrage detected: {} (block {}, {})",
        finding.transaction.hash, block.number, time
    );
    for arbitrage in &finding.arbitrages {
        log_arbitrage(arbitrage);
    }
    for loan in &finding.flash_loans {
        info!(
            "  Flash loan: {} {} from {} (fee {})",
            show(scaled(loan.amount, loan.asset_decimals)),
            loan.asset_name,
            loan.platform_name,
            show(scaled(loan.fee, loan.asset_decimals))
        );
    }
    info!(
        "  Transaction cost: {} ETH | Total cost: {} ETH | Total gain: {} ETH | Total profit: {} ETH ({} USD)",
        show(finding.transaction_cost_eth),
        show(finding.total_cost_eth),
        show(finding.total_gain_eth),
        show(finding.total_profit_eth),
        show(finding.total_profit_usd)
    );
}
