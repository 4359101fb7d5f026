//! SQLite result store
//!
//! One row per finding, keyed by the content-addressed finding id.
//! Re-inserting an id is a no-op. The full record is kept as JSON next to
//! a handful of queryable columns; secondary indexes are created on the
//! first insert into a store that does not have them yet.
//!
//! Created: 2026-10-02

use crate::types::Finding;
use anyhow::{Context, Result};
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

const SCHEMA_SQL: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;

CREATE TABLE IF NOT EXISTS findings (
    id TEXT PRIMARY KEY,
    block_number INTEGER NOT NULL,
    block_timestamp INTEGER NOT NULL,
    miner TEXT NOT NULL,
    tx_hash TEXT NOT NULL,
    protocols TEXT NOT NULL,
    flash_loan_platforms TEXT NOT NULL,
    total_cost_eth REAL,
    total_gain_eth REAL,
    total_profit_eth REAL,
    total_profit_usd REAL,
    record_json TEXT NOT NULL
) WITHOUT ROWID;
"#;

const INDEX_SQL: &str = r#"
CREATE INDEX IF NOT EXISTS idx_findings_block_number ON findings(block_number);
CREATE INDEX IF NOT EXISTS idx_findings_block_timestamp ON findings(block_timestamp);
CREATE INDEX IF NOT EXISTS idx_findings_miner ON findings(miner);
CREATE INDEX IF NOT EXISTS idx_findings_protocols ON findings(protocols);
CREATE INDEX IF NOT EXISTS idx_findings_value ON findings(total_cost_eth, total_gain_eth, total_profit_eth);
CREATE INDEX IF NOT EXISTS idx_findings_flash_loans ON findings(flash_loan_platforms);
"#;

/// Marker index whose presence means the secondary indexes exist
const MARKER_INDEX: &str = "idx_findings_block_number";

/// Shared handle; clones use the same connection
#[derive(Clone)]
pub struct ResultStore {
    conn: Arc<Mutex<Connection>>,
    indexed: Arc<AtomicBool>,
}

impl ResultStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create result store dir {}", parent.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open result store at {}", path.display()))?;
        let store = Self::init(conn)?;
        info!("Result store at {} ({} findings)", path.display(), store.count()?);
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory().context("Failed to open in-memory store")?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA_SQL)
            .context("Failed to initialize result store schema")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            indexed: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Persist a finding. Returns `false` when the id was already present.
    pub fn insert(&self, finding: &Finding) -> Result<bool> {
        let record = serde_json::to_string(finding).context("Failed to serialize finding")?;
        let conn = self.conn.lock();

        if !self.indexed.load(Ordering::Relaxed) {
            Self::ensure_indexes(&conn)?;
            self.indexed.store(true, Ordering::Relaxed);
        }

        let inserted = conn
            .execute(
                "INSERT OR IGNORE INTO findings (
                    id, block_number, block_timestamp, miner, tx_hash, protocols,
                    flash_loan_platforms, total_cost_eth, total_gain_eth,
                    total_profit_eth, total_profit_usd, record_json
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    finding.id,
                    finding.block_number as i64,
                    finding.block_timestamp as i64,
                    finding.miner.to_checksum(None),
                    finding.transaction.hash.to_string(),
                    finding.protocols().join(","),
                    finding.flash_loan_platforms().join(","),
                    real(finding.total_cost_eth),
                    real(finding.total_gain_eth),
                    real(finding.total_profit_eth),
                    real(finding.total_profit_usd),
                    record,
                ],
            )
            .with_context(|| format!("Failed to insert finding {}", finding.id))?;

        if inserted == 0 {
            debug!("Finding {} already stored", finding.id);
        }
        Ok(inserted > 0)
    }

    fn ensure_indexes(conn: &Connection) -> Result<()> {
        let present: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = ?1",
                [MARKER_INDEX],
                |row| row.get(0),
            )
            .context("Failed to inspect result store indexes")?;
        if present == 0 {
            conn.execute_batch(INDEX_SQL)
                .context("Failed to create result store indexes")?;
            info!("Created result store indexes");
        }
        Ok(())
    }

    /// Highest stored block within `[start, end]`
    pub fn max_block_number(&self, start: u64, end: u64) -> Result<Option<u64>> {
        let conn = self.conn.lock();
        let max: Option<i64> = conn
            .query_row(
                "SELECT MAX(block_number) FROM findings WHERE block_number BETWEEN ?1 AND ?2",
                params![start as i64, end as i64],
                |row| row.get(0),
            )
            .context("Failed to query max block number")?;
        Ok(max.map(|b| b as u64))
    }

    pub fn count(&self) -> Result<u64> {
        let conn = self.conn.lock();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM findings", [], |row| row.get(0))
            .context("Failed to count findings")?;
        Ok(count as u64)
    }

    /// Stored JSON record for an id
    pub fn record(&self, id: &str) -> Result<Option<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT record_json FROM findings WHERE id = ?1")?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }
}

/// Content address of a finding: SHA-256 hex of `"<block>:<tx_index>"`
pub fn finding_id(block_number: u64, transaction_index: u64) -> String {
    let digest = Sha256::digest(format!("{}:{}", block_number, transaction_index).as_bytes());
    hex::encode(digest)
}

fn real(value: Option<Decimal>) -> Option<f64> {
    value.and_then(|v| v.to_f64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransactionInfo;
    use alloy::primitives::{Address, B256, U256};
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;

    fn finding(id: &str, block_number: u64) -> Finding {
        Finding {
            id: id.to_string(),
            block_number,
            block_timestamp: 1_700_000_000,
            miner: Address::ZERO,
            transaction: TransactionInfo {
                hash: B256::repeat_byte(1),
                transaction_index: 0,
                from: Address::ZERO,
                to: None,
                value: U256::ZERO,
                gas_used: 21_000,
                effective_gas_price: 1,
            },
            arbitrages: vec![],
            token_balance: BTreeMap::new(),
            eth_usd_price: Some(dec!(2000)),
            total_cost_eth: Some(dec!(0.001)),
            total_cost_usd: Some(dec!(2)),
            total_gain_eth: None,
            total_gain_usd: None,
            total_profit_eth: None,
            total_profit_usd: None,
            transaction_cost_eth: Some(dec!(0.001)),
            transaction_cost_usd: Some(dec!(2)),
            flash_loans: vec![],
        }
    }

    #[test]
    fn test_finding_id_is_deterministic() {
        assert_eq!(finding_id(105_000_000, 3), finding_id(105_000_000, 3));
        assert_ne!(finding_id(105_000_000, 3), finding_id(105_000_000, 4));
        // sha256("1:0")
        assert_eq!(
            finding_id(1, 0),
            "a6685f3b62d57bfc4935263140bae87fcd48088975c238c1c8455fa2c716659d"
        );
    }

    #[test]
    fn test_insert_is_idempotent() {
        let store = ResultStore::open_in_memory().unwrap();

        assert!(store.insert(&finding("a", 10)).unwrap());
        assert!(!store.insert(&finding("a", 10)).unwrap());
        assert_eq!(store.count().unwrap(), 1);

        let record: serde_json::Value = serde_json::from_str(&store.record("a").unwrap().unwrap()).unwrap();
        assert_eq!(record["block_number"], 10);
        assert!(record["total_gain_eth"].is_null());
    }

    #[test]
    fn test_indexes_created_on_first_insert() {
        let store = ResultStore::open_in_memory().unwrap();
        let indexes = |store: &ResultStore| -> i64 {
            store
                .conn
                .lock()
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name LIKE 'idx_findings_%'",
                    [],
                    |row| row.get(0),
                )
                .unwrap()
        };

        assert_eq!(indexes(&store), 0);
        store.insert(&finding("a", 1)).unwrap();
        assert_eq!(indexes(&store), 6);
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("nested").join("results.db");

        let store = ResultStore::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_max_block_number_within_range() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::open(dir.path().join("results.db")).unwrap();
        assert_eq!(store.max_block_number(0, 100).unwrap(), None);

        store.insert(&finding("a", 50)).unwrap();
        store.insert(&finding("b", 80)).unwrap();
        store.insert(&finding("c", 500)).unwrap();

        assert_eq!(store.max_block_number(0, 100).unwrap(), Some(80));
        assert_eq!(store.max_block_number(100, 1000).unwrap(), Some(500));
        assert_eq!(store.max_block_number(81, 499).unwrap(), None);
    }
}
