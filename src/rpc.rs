use crate::models::{MonitoredReceipt, MonitoredTransaction};
use alloy::consensus::Transaction as _;
use alloy::network::{ReceiptResponse, TransactionResponse};
use alloy::providers::{DynProvider, Provider, ProviderBuilder, WsConnect};
use alloy::rpc::types::{BlockNumberOrTag, Transaction, TransactionInput, TransactionRequest};
use alloy_primitives::{Address, B256, Bytes};
use anyhow::Result;
use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::BoxStream;
use regex::Regex;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::timeout;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, info, warn};

pub type BlockStream = BoxStream<'static, u64>;

/// Read-only access to the chain needed by the monitor.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Numbers of newly produced blocks, in arrival order.
    async fn subscribe_blocks(&self) -> Result<BlockStream>;

    async fn get_block_transaction_hashes(&self, block_number: u64) -> Result<Option<Vec<B256>>>;

    async fn get_transaction(&self, hash: B256) -> Result<Option<MonitoredTransaction>>;

    async fn get_transaction_receipt(&self, hash: B256) -> Result<Option<MonitoredReceipt>>;

    /// Executes a read-only `eth_call` against the latest state.
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes>;

    async fn pending_transactions(&self) -> Result<Vec<MonitoredTransaction>>;
}

impl From<&Transaction> for MonitoredTransaction {
    fn from(tx: &Transaction) -> Self {
        MonitoredTransaction {
            hash: tx.tx_hash(),
            from: tx.from(),
            to: tx.to(),
            value: tx.value(),
        }
    }
}

/// Backoff used for request retries, resubscription and the initial connection.
pub fn retry_strategy(max_retries: usize) -> impl Iterator<Item = Duration> {
    ExponentialBackoff::from_millis(100)
        .factor(2)
        .max_delay(Duration::from_secs(10))
        .map(jitter)
        .take(max_retries)
}

pub fn is_rate_limited(error_str: &str) -> bool {
    Regex::new(r"(?i)\b429\b|rate[ -]?limit|too many requests")
        .map(|re| re.is_match(error_str))
        .unwrap_or(false)
}

#[derive(Clone)]
pub struct RpcClient {
    providers: Arc<Vec<DynProvider>>,
    urls: Vec<String>,
    current_provider: Arc<AtomicUsize>,
    max_retries: usize,
    request_timeout: Duration,
}

impl RpcClient {
    /// Opens a WebSocket connection to every endpoint, retrying each with bounded backoff.
    pub async fn connect(
        rpc_urls: &[String],
        request_timeout: Duration,
        max_retries: usize,
    ) -> Result<Self> {
        if rpc_urls.is_empty() {
            return Err(anyhow::anyhow!("At least one RPC URL must be provided"));
        }

        let mut providers = Vec::new();
        for url in rpc_urls {
            let provider = Retry::spawn(retry_strategy(max_retries), || async {
                ProviderBuilder::new()
                    .connect_ws(WsConnect::new(url.clone()))
                    .await
                    .map_err(|e| {
                        warn!("Failed to connect to {}: {}", url, e);
                        anyhow::anyhow!("Failed to connect to {}: {}", url, e)
                    })
            })
            .await?;
            info!("Connected to {}", url);
            providers.push(provider.erased());
        }

        Ok(RpcClient {
            providers: Arc::new(providers),
            urls: rpc_urls.to_vec(),
            current_provider: Arc::new(AtomicUsize::new(0)),
            max_retries,
            request_timeout,
        })
    }

    fn get_provider(&self) -> &DynProvider {
        let index = self.current_provider.load(Ordering::Relaxed) % self.providers.len();
        &self.providers[index]
    }

    pub fn get_current_url(&self) -> &str {
        let index = self.current_provider.load(Ordering::Relaxed) % self.urls.len();
        &self.urls[index]
    }

    pub fn rotate_provider(&self) {
        let current = self.current_provider.load(Ordering::Relaxed);
        let next = (current + 1) % self.providers.len();
        self.current_provider.store(next, Ordering::Relaxed);

        if self.providers.len() > 1 {
            debug!("Rotating to RPC provider #{}", next);
        }
    }

    fn handle_error(&self, error_str: &str) {
        let current_url = self.get_current_url();
        if is_rate_limited(error_str) {
            warn!("Rate limited by {}, rotating provider", current_url);
        } else {
            warn!(
                "RPC error on {}: {}, rotating provider",
                current_url, error_str
            );
        }
        self.rotate_provider();
    }

    fn handle_timeout(&self) -> anyhow::Error {
        let current_url = self.get_current_url();
        warn!(
            "Request timeout after {} seconds on {}, rotating provider",
            self.request_timeout.as_secs(),
            current_url
        );
        self.rotate_provider();
        anyhow::anyhow!(
            "Request timeout after {} seconds",
            self.request_timeout.as_secs()
        )
    }

    /// Runs `op` against the current provider with a timeout, rotating and retrying on failure.
    async fn request<T, E, F, Fut>(&self, op: F) -> Result<T>
    where
        F: Fn(DynProvider) -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: Display,
    {
        Retry::spawn(retry_strategy(self.max_retries), || {
            let fut = op(self.get_provider().clone());
            async move {
                match timeout(self.request_timeout, fut).await {
                    Ok(Ok(result)) => Ok(result),
                    Ok(Err(e)) => {
                        let error_str = e.to_string();
                        self.handle_error(&error_str);
                        Err(anyhow::anyhow!("{}", error_str))
                    }
                    Err(_) => Err(self.handle_timeout()),
                }
            }
        })
        .await
    }
}

#[async_trait]
impl ChainClient for RpcClient {
    async fn subscribe_blocks(&self) -> Result<BlockStream> {
        let subscription = self
            .request(|provider| async move { provider.subscribe_blocks().await })
            .await?;
        Ok(subscription
            .into_stream()
            .map(|header| header.number)
            .boxed())
    }

    async fn get_block_transaction_hashes(&self, block_number: u64) -> Result<Option<Vec<B256>>> {
        let block = self
            .request(|provider| async move {
                provider
                    .get_block_by_number(BlockNumberOrTag::Number(block_number))
                    .await
            })
            .await?;
        Ok(block.map(|block| block.transactions.hashes().collect()))
    }

    async fn get_transaction(&self, hash: B256) -> Result<Option<MonitoredTransaction>> {
        let tx = self
            .request(|provider| async move { provider.get_transaction_by_hash(hash).await })
            .await?;
        Ok(tx.as_ref().map(MonitoredTransaction::from))
    }

    async fn get_transaction_receipt(&self, hash: B256) -> Result<Option<MonitoredReceipt>> {
        let receipt = self
            .request(|provider| async move { provider.get_transaction_receipt(hash).await })
            .await?;
        Ok(receipt.map(|receipt| MonitoredReceipt {
            success: receipt.status(),
            logs: receipt
                .inner
                .logs()
                .iter()
                .map(|log| log.inner.clone())
                .collect(),
        }))
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        self.request(|provider| {
            let request = TransactionRequest::default()
                .to(to)
                .input(TransactionInput::new(data.clone()));
            async move { provider.call(request).await }
        })
        .await
    }

    async fn pending_transactions(&self) -> Result<Vec<MonitoredTransaction>> {
        let block = self
            .request(|provider| async move {
                provider
                    .get_block_by_number(BlockNumberOrTag::Pending)
                    .full()
                    .await
            })
            .await?;
        Ok(block
            .map(|block| {
                block
                    .transactions
                    .txns()
                    .map(MonitoredTransaction::from)
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_strategy_is_bounded_and_capped() {
        let delays: Vec<Duration> = retry_strategy(5).collect();
        assert_eq!(delays.len(), 5);
        assert!(delays.iter().all(|d| *d <= Duration::from_secs(10)));
        assert_eq!(retry_strategy(0).count(), 0);
    }

    #[test]
    fn rate_limit_errors_are_recognized() {
        assert!(is_rate_limited("HTTP error 429 with body"));
        assert!(is_rate_limited("Rate limit exceeded"));
        assert!(is_rate_limited("Too Many Requests"));
        assert!(!is_rate_limited("execution reverted"));
    }
}
