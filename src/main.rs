//! Historical DEX Arbitrage Scanner
//!
//! Scans one configured block range (or all of them) for atomic cyclic
//! arbitrage and writes findings to SQLite.
//!
//! Created: 2026-10-02
//!
//! Usage:
//!     cargo run --release -- --config scan.toml --range-index 0
//!     cargo run --release -- --config scan.toml --workers 16

use anyhow::Result;
use clap::Parser;
use dexarb_scanner::chain::ChainClient;
use dexarb_scanner::config::{Environment, RangeConfig, ScannerConfig};
use dexarb_scanner::ledger::PriceTable;
use dexarb_scanner::metadata::{MetadataCache, MetadataResolver};
use dexarb_scanner::scanner::{partition, run_pool, ScanContext, WorkerOutcome};
use dexarb_scanner::sink::ResultStore;
use dexarb_scanner::swaps::SwapNormalizer;
use dexarb_scanner::RpcChain;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "dexarb-scanner", about = "Scan historical blocks for atomic DEX arbitrage")]
struct Args {
    /// TOML scan file
    #[arg(short, long, default_value = "scan.toml")]
    config: PathBuf,

    /// Index into the configured [[range]] list (default: every range)
    #[arg(short, long)]
    range_index: Option<usize>,

    /// Worker count override
    #[arg(short, long, env = "WORKERS")]
    workers: Option<usize>,
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = ScannerConfig::load(&args.config)?;
    init_tracing(config.general.json_logs());

    let env = Environment::load()?;
    let general = &config.general;
    let network = env.network.unwrap_or(general.network);
    let workers = args.workers.unwrap_or(general.workers).max(1);

    let ranges: Vec<RangeConfig> = match args.range_index {
        Some(index) => vec![config.range(index)?],
        None => config.ranges.clone(),
    };
    if ranges.is_empty() {
        anyhow::bail!("No block ranges configured in {}", args.config.display());
    }

    info!("===========================================");
    info!("   DEX Arbitrage Scanner");
    info!("===========================================");
    info!("Network: {}", network);
    info!("RPC: {}...", env.rpc_url_prefix());
    info!("Workers: {} | window: {} blocks", workers, general.window_size);

    let chain: Arc<dyn ChainClient> =
        Arc::new(RpcChain::connect(&env.rpc_url, network, general.request_timeout()).await?);
    let resolver = MetadataResolver::new(chain.clone(), MetadataCache::new());
    let prices = PriceTable::load(&general.prices_file, network.wrapped_native())?;
    let store = ResultStore::open(&general.results_db)?;

    let ctx = Arc::new(ScanContext {
        chain,
        normalizer: SwapNormalizer::new(resolver, network),
        prices,
        store: store.clone(),
        network,
        retry: general.retry_policy(),
        window_size: general.window_size,
        checkpoint_dir: general.checkpoint_dir.clone(),
    });

    let mut abandoned = 0;
    for range in ranges {
        info!("Scanning blocks {} to {}", range.start, range.end);
        let reports = run_pool(ctx.clone(), partition(range.start, range.end, workers)).await;
        abandoned += reports
            .iter()
            .filter(|r| matches!(r.outcome, WorkerOutcome::Abandoned { .. }))
            .count();
    }

    info!("Findings in store: {}", store.count()?);
    if abandoned > 0 {
        warn!("{} workers stopped early; rerun to resume from their checkpoints", abandoned);
    }
    Ok(())
}
