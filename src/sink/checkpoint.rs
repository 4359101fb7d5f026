//! Append-only per-worker progress log
//!
//! One line per completed window: `from_block <N> to_block <M>`. Resumption
//! only looks at the trailing number of the last line.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

pub struct CheckpointLog {
    path: PathBuf,
}

impl CheckpointLog {
    /// Log for the worker covering `[start, end]` inside `dir`
    pub fn for_range<P: AsRef<Path>>(dir: P, start: u64, end: u64) -> Self {
        Self {
            path: dir.as_ref().join(format!("checkpoint_{}_{}.log", start, end)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, from_block: u64, to_block: u64) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create checkpoint dir {}", parent.display()))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open checkpoint log {}", self.path.display()))?;
        writeln!(file, "from_block {} to_block {}", from_block, to_block)
            .with_context(|| format!("Failed to append to {}", self.path.display()))?;
        Ok(())
    }

    /// `to_block` of the last line; `None` for a missing or empty log
    pub fn last_end(&self) -> Result<Option<u64>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read checkpoint log {}", self.path.display()))?;

        let Some(line) = content.lines().rev().find(|l| !l.trim().is_empty()) else {
            return Ok(None);
        };
        let last = line.split_whitespace().last().unwrap_or_default();
        let end = last
            .parse()
            .with_context(|| format!("Malformed checkpoint line '{}' in {}", line, self.path.display()))?;
        Ok(Some(end))
    }
}

/// First block to scan: the furthest of the configured start, the highest
/// stored finding, and the block after the last checkpoint
pub fn resume_start(default_start: u64, stored_max: Option<u64>, checkpoint_end: Option<u64>) -> u64 {
    let mut start = default_start;
    if let Some(block) = stored_max {
        start = start.max(block);
    }
    if let Some(end) = checkpoint_end {
        start = start.max(end + 1);
    }
    start
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_read_last_line() {
        let dir = tempfile::tempdir().unwrap();
        let log = CheckpointLog::for_range(dir.path(), 100, 10_000);
        assert_eq!(log.last_end().unwrap(), None);

        log.append(100, 2_099).unwrap();
        log.append(2_100, 4_099).unwrap();

        assert_eq!(log.last_end().unwrap(), Some(4_099));
        let content = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(content, "from_block 100 to_block 2099\nfrom_block 2100 to_block 4099\n");
        assert!(log.path().ends_with("checkpoint_100_10000.log"));
    }

    #[test]
    fn test_empty_and_malformed_logs() {
        let dir = tempfile::tempdir().unwrap();
        let log = CheckpointLog::for_range(dir.path(), 0, 1);

        std::fs::write(log.path(), "\n\n").unwrap();
        assert_eq!(log.last_end().unwrap(), None);

        std::fs::write(log.path(), "from_block 0 to_block abc\n").unwrap();
        assert!(log.last_end().is_err());
    }

    #[test]
    fn test_resume_precedence() {
        assert_eq!(resume_start(100, None, None), 100);
        assert_eq!(resume_start(100, Some(50), None), 100);
        assert_eq!(resume_start(100, Some(500), None), 500);
        // checkpoint past the last stored finding wins
        assert_eq!(resume_start(100, Some(500), Some(2_099)), 2_100);
        assert_eq!(resume_start(100, Some(3_000), Some(2_099)), 3_000);
    }
}
