//! Bounded retry with a fixed delay
//!
//! Every remote call a worker makes inside a window goes through
//! `RetryPolicy::run`. After `max_retries` retries (so `max_retries + 1`
//! attempts) the last error is returned as `FetchError::Exhausted` and the
//! caller abandons the window.
//!
//! Created: 2026-10-02

use crate::chain::ChainError;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::warn;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{what} failed after {attempts} attempts: {last}")]
    Exhausted {
        what: String,
        attempts: u32,
        #[source]
        last: ChainError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// Run `op` until it succeeds or the retry budget is spent
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ChainError>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt > self.max_retries => {
                    return Err(FetchError::Exhausted {
                        what: what.to_string(),
                        attempts: attempt,
                        last: e,
                    });
                }
                Err(e) => {
                    warn!(
                        "Retry {}/{} for {}: {}",
                        attempt, self.max_retries, what, e
                    );
                    sleep(self.delay).await;
                }
            }
        }
    }
}
