//! Alloy-backed chain client
//!
//! Objects and `eth_call` go through an alloy HTTP provider. Log queries go
//! either through the provider's filter API or through a hand-built
//! `eth_getLogs` request over reqwest, depending on what the endpoint
//! handles reliably (`LogQueryStrategy`).
//!
//! Created: 2026-10-02

use super::{ChainClient, ChainError};
use crate::events::RawLog;
use crate::types::{BlockInfo, Event, Network, TransactionInfo};
use alloy::consensus::Transaction as _;
use alloy::primitives::{Address, Bytes, B256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::{Filter, TransactionRequest};
use alloy::transports::TransportError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::future::Future;
use std::time::Duration;
use tracing::{error, info, warn};

/// How `eth_getLogs` is issued against the endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogQueryStrategy {
    /// Provider filter API (`Provider::get_logs`)
    NodeFilter,
    /// Raw JSON-RPC request, normalized from hex strings
    RawRpc,
}

impl LogQueryStrategy {
    /// Arbitrum always uses the filter API; geth clients do too, except on
    /// Optimism. Everything else falls back to raw requests.
    pub fn select(network: Network, client_version: &str) -> Self {
        let geth = client_version.to_lowercase().contains("geth");
        match network {
            Network::Arbitrum => LogQueryStrategy::NodeFilter,
            Network::Optimism => LogQueryStrategy::RawRpc,
            Network::Ethereum | Network::Zksync if geth => LogQueryStrategy::NodeFilter,
            Network::Ethereum | Network::Zksync => LogQueryStrategy::RawRpc,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<serde_json::Value>,
}

/// Chain client over one HTTP endpoint
pub struct RpcChain {
    provider: DynProvider,
    http: reqwest::Client,
    rpc_url: String,
    strategy: LogQueryStrategy,
    timeout: Duration,
}

impl RpcChain {
    /// Connect and pick the log query strategy from the client version.
    /// An unreachable endpoint is logged and the client continues with an
    /// empty version string.
    pub async fn connect(rpc_url: &str, network: Network, timeout: Duration) -> Result<Self> {
        let url = rpc_url
            .parse()
            .with_context(|| format!("Invalid RPC URL: {}", rpc_url))?;
        let provider = ProviderBuilder::new().connect_http(url).erased();

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        let client_version = match tokio::time::timeout(timeout, provider.get_client_version()).await {
            Ok(Ok(version)) => version,
            Ok(Err(e)) => {
                error!("Cannot reach {} endpoint: {}", network, e);
                String::new()
            }
            Err(_) => {
                error!("Cannot reach {} endpoint: timed out after {:?}", network, timeout);
                String::new()
            }
        };

        let strategy = LogQueryStrategy::select(network, &client_version);
        info!(
            "Connected to {} (client: '{}', log queries: {:?})",
            network, client_version, strategy
        );

        Ok(Self {
            provider,
            http,
            rpc_url: rpc_url.to_string(),
            strategy,
            timeout,
        })
    }

    pub fn strategy(&self) -> LogQueryStrategy {
        self.strategy
    }

    async fn timed<T, F>(&self, fut: F) -> Result<T, ChainError>
    where
        F: Future<Output = Result<T, ChainError>>,
    {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| ChainError::Timeout(self.timeout))?
    }

    async fn filter_logs(&self, from_block: u64, to_block: u64, topic: B256) -> Result<Vec<Event>, ChainError> {
        let filter = Filter::new()
            .from_block(from_block)
            .to_block(to_block)
            .event_signature(topic);

        let logs = self.provider.get_logs(&filter).await.map_err(classify)?;

        let mut events = Vec::with_capacity(logs.len());
        for log in logs {
            let (Some(block_number), Some(transaction_hash), Some(transaction_index), Some(log_index)) = (
                log.block_number,
                log.transaction_hash,
                log.transaction_index,
                log.log_index,
            ) else {
                warn!("Dropping pending log from {}", log.address());
                continue;
            };

            events.push(Event {
                address: log.address(),
                topics: log.topics().to_vec(),
                data: log.inner.data.data.clone(),
                block_number,
                transaction_hash,
                transaction_index,
                log_index,
            });
        }
        Ok(events)
    }

    async fn raw_logs(&self, from_block: u64, to_block: u64, topic: B256) -> Result<Vec<Event>, ChainError> {
        let body = json!({
            "jsonrpc": "2.0",
            "method": "eth_getLogs",
            "params": [{
                "fromBlock": format!("{:#x}", from_block),
                "toBlock": format!("{:#x}", to_block),
                "topics": [topic],
            }],
            "id": 1,
        });

        let response: RpcResponse<Vec<RawLog>> = self
            .http
            .post(&self.rpc_url)
            .json(&body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ChainError::Transport(e.to_string()))?
            .json()
            .await
            .map_err(|e| ChainError::Transport(e.to_string()))?;

        if let Some(err) = response.error {
            return Err(ChainError::Provider(err.to_string()));
        }
        // an empty window is `[]`; no result at all is a failed query
        let raw = response
            .result
            .ok_or_else(|| ChainError::Provider("eth_getLogs response has no result".to_string()))?;
        let mut events = Vec::with_capacity(raw.len());
        for log in raw {
            match log.normalize() {
                Ok(event) => events.push(event),
                Err(e) => warn!("Dropping log: {}", e),
            }
        }
        Ok(events)
    }
}

/// Node-side error responses are provider errors; everything else is transport
fn classify(err: TransportError) -> ChainError {
    if err.is_error_resp() {
        ChainError::Provider(err.to_string())
    } else {
        ChainError::Transport(err.to_string())
    }
}

#[async_trait]
impl ChainClient for RpcChain {
    async fn logs(&self, from_block: u64, to_block: u64, topic: B256) -> Result<Vec<Event>, ChainError> {
        match self.strategy {
            LogQueryStrategy::NodeFilter => self.timed(self.filter_logs(from_block, to_block, topic)).await,
            LogQueryStrategy::RawRpc => self.timed(self.raw_logs(from_block, to_block, topic)).await,
        }
    }

    async fn block(&self, number: u64) -> Result<BlockInfo, ChainError> {
        let block = self
            .timed(async {
                self.provider
                    .get_block_by_number(number.into())
                    .await
                    .map_err(classify)
            })
            .await?
            .ok_or_else(|| ChainError::NotFound(format!("block {}", number)))?;

        Ok(BlockInfo {
            number: block.header.number,
            timestamp: block.header.timestamp,
            miner: block.header.beneficiary,
        })
    }

    async fn transaction(&self, hash: B256) -> Result<TransactionInfo, ChainError> {
        let (tx, receipt) = self
            .timed(async {
                let (tx, receipt) = tokio::join!(
                    self.provider.get_transaction_by_hash(hash),
                    self.provider.get_transaction_receipt(hash),
                );
                Ok((tx.map_err(classify)?, receipt.map_err(classify)?))
            })
            .await?;

        let tx = tx.ok_or_else(|| ChainError::NotFound(format!("transaction {}", hash)))?;
        let receipt = receipt.ok_or_else(|| ChainError::NotFound(format!("receipt {}", hash)))?;

        Ok(TransactionInfo {
            hash,
            transaction_index: receipt.transaction_index.unwrap_or_default(),
            from: receipt.from,
            to: receipt.to,
            value: tx.value(),
            gas_used: receipt.gas_used,
            effective_gas_price: receipt.effective_gas_price,
        })
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError> {
        let request = TransactionRequest::default().to(to).input(data.into());
        self.timed(async {
            self.provider.call(request).await.map_err(|e| {
                if e.is_error_resp() {
                    ChainError::Call(e.to_string())
                } else {
                    ChainError::Transport(e.to_string())
                }
            })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{fetch_logs, FetchError, RetryPolicy};
    use serde_json::Value;
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    type Reply = Arc<dyn Fn(&Value) -> (u16, String) + Send + Sync>;

    /// Local HTTP endpoint answering each JSON-RPC request with `reply`
    async fn serve(reply: impl Fn(&Value) -> (u16, String) + Send + Sync + 'static) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let reply: Reply = Arc::new(reply);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let reply = reply.clone();
                tokio::spawn(async move {
                    let _ = respond(stream, reply).await;
                });
            }
        });
        url
    }

    async fn respond(mut stream: TcpStream, reply: Reply) -> std::io::Result<()> {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        let header_end = loop {
            let n = stream.read(&mut chunk).await?;
            if n == 0 {
                return Ok(());
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(i) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break i + 4;
            }
        };
        let headers = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
        let length = headers
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        while buf.len() < header_end + length {
            let n = stream.read(&mut chunk).await?;
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }

        let end = buf.len().min(header_end + length);
        let request: Value = serde_json::from_slice(&buf[header_end..end]).unwrap_or(Value::Null);
        let (status, body) = reply(&request);
        let response = format!(
            "HTTP/1.1 {} Reply\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        stream.write_all(response.as_bytes()).await?;
        stream.shutdown().await
    }

    fn result(request: &Value, result: Value) -> (u16, String) {
        let body = serde_json::json!({"jsonrpc": "2.0", "id": request["id"], "result": result});
        (200, body.to_string())
    }

    fn rpc_error(request: &Value, code: i64, message: &str) -> (u16, String) {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": request["id"],
            "error": {"code": code, "message": message}
        });
        (200, body.to_string())
    }

    /// Client version for the handshake, `logs` for everything else
    fn node(client: &'static str, logs: impl Fn(&Value) -> (u16, String) + Send + Sync + 'static)
        -> impl Fn(&Value) -> (u16, String) + Send + Sync + 'static
    {
        move |request: &Value| {
            if request["method"] == "web3_clientVersion" {
                result(request, Value::String(client.to_string()))
            } else {
                logs(request)
            }
        }
    }

    async fn optimism(url: &str) -> RpcChain {
        RpcChain::connect(url, Network::Optimism, Duration::from_secs(5)).await.unwrap()
    }

    #[test]
    fn test_strategy_selection() {
        use LogQueryStrategy::*;

        assert_eq!(LogQueryStrategy::select(Network::Arbitrum, ""), NodeFilter);
        assert_eq!(LogQueryStrategy::select(Network::Arbitrum, "Nethermind/v1.25"), NodeFilter);
        assert_eq!(LogQueryStrategy::select(Network::Ethereum, "Geth/v1.13.14-stable"), NodeFilter);
        assert_eq!(LogQueryStrategy::select(Network::Zksync, "geth"), NodeFilter);
        assert_eq!(LogQueryStrategy::select(Network::Optimism, "Geth/v1.101315.1"), RawRpc);
        assert_eq!(LogQueryStrategy::select(Network::Ethereum, "erigon/2.59.0"), RawRpc);
        assert_eq!(LogQueryStrategy::select(Network::Zksync, ""), RawRpc);
    }

    #[tokio::test]
    async fn test_raw_logs_http_error_status_is_transport() {
        let url = serve(|_: &Value| (503, r#"{"message":"rate limited"}"#.to_string())).await;
        let chain = optimism(&url).await;
        assert_eq!(chain.strategy(), LogQueryStrategy::RawRpc);

        let err = chain.logs(1, 2, B256::ZERO).await.unwrap_err();
        assert!(matches!(err, ChainError::Transport(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_rate_limited_window_is_retried_not_empty() {
        let url = serve(|_: &Value| (429, r#"{"message":"rate limited"}"#.to_string())).await;
        let chain = optimism(&url).await;

        let err = fetch_logs(&chain, &RetryPolicy::new(1, Duration::ZERO), 1, 2, &[B256::ZERO])
            .await
            .unwrap_err();
        let FetchError::Exhausted { attempts, last, .. } = err;
        assert_eq!(attempts, 2);
        assert!(matches!(last, ChainError::Transport(_)));
    }

    #[tokio::test]
    async fn test_raw_logs_missing_result_is_provider_error() {
        let url = serve(node("Geth/v1.101315.1", |request: &Value| {
            (200, serde_json::json!({"jsonrpc": "2.0", "id": request["id"]}).to_string())
        }))
        .await;
        let err = optimism(&url).await.logs(1, 2, B256::ZERO).await.unwrap_err();
        assert!(matches!(err, ChainError::Provider(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_raw_logs_error_object_is_provider_error() {
        let url = serve(node("Geth/v1.101315.1", |request: &Value| {
            rpc_error(request, -32005, "query returned more than 10000 results")
        }))
        .await;
        let err = optimism(&url).await.logs(1, 2, B256::ZERO).await.unwrap_err();
        match err {
            ChainError::Provider(message) => assert!(message.contains("10000")),
            other => panic!("expected provider error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_raw_logs_normalizes_and_drops_pending() {
        let url = serve(node("Geth/v1.101315.1", |request: &Value| {
            let mined = serde_json::json!({
                "address": "0x7f5c764cbc14f9669b88837ca1490cca17c31607",
                "topics": ["0xd78ad95fa46c994b6551d0da85fc275fe613ce37657fb8d5e3d130840159d822"],
                "data": "0x",
                "blockNumber": "0x2",
                "transactionHash": "0x1111111111111111111111111111111111111111111111111111111111111111",
                "transactionIndex": "0x0",
                "logIndex": "0x3"
            });
            let mut pending = mined.clone();
            pending["blockNumber"] = Value::Null;
            result(request, Value::Array(vec![mined, pending]))
        }))
        .await;

        let events = optimism(&url).await.logs(1, 2, B256::ZERO).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].block_number, 2);
        assert_eq!(events[0].log_index, 3);
    }

    #[tokio::test]
    async fn test_empty_result_is_an_empty_window() {
        let url = serve(node("Geth/v1.101315.1", |request: &Value| result(request, Value::Array(vec![])))).await;
        let events = optimism(&url).await.logs(1, 2, B256::ZERO).await.unwrap();
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_reverted_call_is_call_error() {
        let url = serve(node("Geth/v1.101315.1", |request: &Value| {
            rpc_error(request, 3, "execution reverted")
        }))
        .await;
        let err = optimism(&url)
            .await
            .call(Address::repeat_byte(0x11), Bytes::from(vec![0x06, 0xfd, 0xde, 0x03]))
            .await
            .unwrap_err();
        assert!(matches!(err, ChainError::Call(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_filter_logs_error_response_is_provider_error() {
        let url = serve(node("Nitro/v3.0.0", |request: &Value| {
            rpc_error(request, -32000, "block range too large")
        }))
        .await;
        let chain = RpcChain::connect(&url, Network::Arbitrum, Duration::from_secs(5)).await.unwrap();
        assert_eq!(chain.strategy(), LogQueryStrategy::NodeFilter);

        let err = chain.logs(1, 2, B256::ZERO).await.unwrap_err();
        assert!(matches!(err, ChainError::Provider(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_degrades_then_fails_as_transport() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let chain = optimism(&url).await;
        let err = chain.logs(1, 2, B256::ZERO).await.unwrap_err();
        assert!(matches!(err, ChainError::Transport(_)), "{err:?}");
        let err = chain.call(Address::ZERO, Bytes::new()).await.unwrap_err();
        assert!(matches!(err, ChainError::Transport(_)), "{err:?}");
    }
}
