use crate::chain::{ChainError, ChainReader, LogQuery, RawBlock, RawLog, RawTransaction};
use alloy::consensus::Transaction as ConsensusTransaction;
use alloy::network::TransactionResponse;
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::{BlockNumberOrTag, Filter, Log, Transaction};
use alloy_primitives::B256;
use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::timeout;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, info, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120); // 2 minutes timeout per request

/// Alloy-backed [`ChainReader`] with provider rotation and retry.
///
/// Transient failures are retried here with exponential backoff. Rate-limit
/// and max-results errors are returned straight away so the caller can
/// apply its own cooldown or split the range.
#[derive(Clone)]
pub struct RpcClient {
    providers: Vec<DynProvider>,
    urls: Vec<String>,
    current_provider: Arc<AtomicUsize>,
    max_retries: usize,
}

impl RpcClient {
    pub fn new(rpc_urls: &[String]) -> Result<Self> {
        if rpc_urls.is_empty() {
            return Err(anyhow::anyhow!("At least one RPC URL must be provided"));
        }

        let mut providers = Vec::new();
        for url in rpc_urls {
            let parsed_url = url
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid RPC URL: {}", url))?;
            let provider = ProviderBuilder::new().connect_http(parsed_url).erased();
            providers.push(provider);
        }

        Ok(RpcClient {
            providers,
            urls: rpc_urls.to_vec(),
            current_provider: Arc::new(AtomicUsize::new(0)),
            max_retries: 5,
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

    fn retry_strategy(max_retries: usize) -> impl Iterator<Item = Duration> {
        ExponentialBackoff::from_millis(100)
            .factor(2)
            .max_delay(Duration::from_secs(10))
            .map(jitter)
            .take(max_retries)
    }

    /// Only plain transport failures and timeouts are worth retrying in place.
    fn is_retryable(error: &ChainError) -> bool {
        matches!(error, ChainError::Rpc(_) | ChainError::Timeout(_))
    }

    /// Run `request` against the current provider with timeout, rotation and retry.
    async fn call<T, F, Fut>(&self, request: F) -> Result<T, ChainError>
    where
        F: Fn(DynProvider) -> Fut,
        Fut: Future<Output = Result<T, String>>,
    {
        RetryIf::spawn(
            Self::retry_strategy(self.max_retries),
            || {
                let provider = self.get_provider().clone();
                let future = request(provider);
                async move {
                    match timeout(REQUEST_TIMEOUT, future).await {
                        Ok(Ok(value)) => Ok(value),
                        Ok(Err(message)) => {
                            let error = ChainError::from_message(message);
                            if Self::is_retryable(&error) {
                                warn!(
                                    "RPC error on {}: {}, rotating provider",
                                    self.get_current_url(),
                                    error
                                );
                                self.rotate_provider();
                            }
                            Err(error)
                        }
                        Err(_) => {
                            warn!(
                                "Request timeout after {} seconds on {}, rotating provider",
                                REQUEST_TIMEOUT.as_secs(),
                                self.get_current_url()
                            );
                            self.rotate_provider();
                            Err(ChainError::Timeout(REQUEST_TIMEOUT.as_secs()))
                        }
                    }
                }
            },
            Self::is_retryable,
        )
        .await
    }

    async fn get_logs_internal(
        &self,
        query: LogQuery,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<Log>, ChainError> {
        let mut filter = Filter::new()
            .address(query.address)
            .event_signature(query.event_signature)
            .from_block(from_block)
            .to_block(to_block);
        if let Some(topic2) = query.topic2 {
            filter = filter.topic2(topic2);
        }

        self.call(move |provider| {
            let filter = filter.clone();
            async move { provider.get_logs(&filter).await.map_err(|e| e.to_string()) }
        })
        .await
    }

    fn parse_max_results_error(error_str: &str) -> Option<(u64, u64)> {
        let re = Regex::new(r"retry with the range (\d+)-(\d+)").ok()?;
        let captures = re.captures(error_str)?;

        let from = captures.get(1)?.as_str().parse().ok()?;
        let to = captures.get(2)?.as_str().parse().ok()?;

        Some((from, to))
    }

    /// End of the narrower window to retry after a max-results error.
    ///
    /// The window always restarts at `from`, even when the node suggests a later
    /// start, so no block is skipped. `None` when the suggestion would not shrink
    /// the window.
    fn split_end(from: u64, to: u64, suggested: (u64, u64)) -> Option<u64> {
        let end = suggested.1.min(to);
        (end >= from && end < to).then_some(end)
    }

    fn to_raw_log(log: Log) -> Option<RawLog> {
        Some(RawLog {
            address: log.address(),
            tx_hash: log.transaction_hash?,
            block_number: log.block_number?,
            log_index: log.log_index?,
            topics: log.topics().to_vec(),
            data: log.data().data.clone(),
        })
    }

    fn to_raw_transaction(tx: &Transaction) -> RawTransaction {
        RawTransaction {
            hash: TransactionResponse::tx_hash(tx),
            from: TransactionResponse::from(tx),
            to: ConsensusTransaction::to(tx),
            value: ConsensusTransaction::value(tx),
            gas: ConsensusTransaction::gas_limit(tx),
        }
    }
}

#[async_trait]
impl ChainReader for RpcClient {
    async fn current_height(&self) -> Result<u64, ChainError> {
        self.call(|provider| async move {
            provider.get_block_number().await.map_err(|e| e.to_string())
        })
        .await
    }

    /// Fetch logs, splitting the range when the node reports too many results.
    async fn logs_in_range(&self, query: LogQuery) -> Result<Vec<RawLog>, ChainError> {
        let mut all_logs = Vec::new();
        let mut current_from = query.from_block;
        let mut current_to = query.to_block;

        while current_from <= query.to_block {
            match self
                .get_logs_internal(query, current_from, current_to)
                .await
            {
                Ok(logs) => {
                    all_logs.extend(logs);
                    current_from = current_to + 1;
                    current_to = query.to_block;
                }
                Err(ChainError::TooManyResults(message)) => {
                    let Some(split_to) = Self::parse_max_results_error(&message)
                        .and_then(|suggested| Self::split_end(current_from, current_to, suggested))
                    else {
                        return Err(ChainError::TooManyResults(message));
                    };

                    info!(
                        "Hit max results limit for blocks {}-{}, splitting at block {}",
                        current_from, current_to, split_to
                    );
                    current_to = split_to;
                }
                Err(e) => return Err(e),
            }
        }

        let total = all_logs.len();
        let raw: Vec<RawLog> = all_logs.into_iter().filter_map(Self::to_raw_log).collect();
        if raw.len() < total {
            warn!("Dropped {} pending logs without block metadata", total - raw.len());
        }
        Ok(raw)
    }

    async fn transaction(&self, hash: B256) -> Result<Option<RawTransaction>, ChainError> {
        let tx = self
            .call(move |provider| async move {
                provider
                    .get_transaction_by_hash(hash)
                    .await
                    .map_err(|e| e.to_string())
            })
            .await?;
        Ok(tx.as_ref().map(Self::to_raw_transaction))
    }

    async fn block(&self, number: u64) -> Result<Option<RawBlock>, ChainError> {
        let block = self
            .call(move |provider| async move {
                provider
                    .get_block_by_number(BlockNumberOrTag::Number(number))
                    .full()
                    .await
                    .map_err(|e| e.to_string())
            })
            .await?;

        Ok(block.map(|block| RawBlock {
            number: block.header.number,
            timestamp: block.header.timestamp,
            transactions: block
                .transactions
                .txns()
                .map(Self::to_raw_transaction)
                .collect(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_suggested_range_from_max_results_error() {
        let message = "query returned more than 10000 results, exceeds max results. \
                       Try with this block range, retry with the range 1200-1450";
        assert_eq!(
            RpcClient::parse_max_results_error(message),
            Some((1200, 1450))
        );
        assert_eq!(RpcClient::parse_max_results_error("exceeds max results"), None);
    }

    #[test]
    fn split_window_never_skips_blocks_before_the_suggestion() {
        // The retried window is 1000-1450 either way.
        assert_eq!(RpcClient::split_end(1000, 2000, (1200, 1450)), Some(1450));
        assert_eq!(RpcClient::split_end(1000, 2000, (1000, 1450)), Some(1450));
        assert_eq!(RpcClient::split_end(1000, 2000, (1000, 1000)), Some(1000));
        // A suggestion that does not narrow the window cannot make progress.
        assert_eq!(RpcClient::split_end(1000, 2000, (1000, 2000)), None);
        assert_eq!(RpcClient::split_end(1000, 2000, (1000, 2500)), None);
        // Ends before the window starts.
        assert_eq!(RpcClient::split_end(1000, 2000, (500, 900)), None);
    }

    #[test]
    fn only_transport_failures_are_retried_in_place() {
        assert!(RpcClient::is_retryable(&ChainError::Rpc("reset".into())));
        assert!(RpcClient::is_retryable(&ChainError::Timeout(120)));
        assert!(!RpcClient::is_retryable(&ChainError::RateLimited("429".into())));
        assert!(!RpcClient::is_retryable(&ChainError::TooManyResults("x".into())));
    }

    #[test]
    fn rejects_empty_url_list() {
        assert!(RpcClient::new(&[]).is_err());
    }

    #[test]
    fn rotates_between_providers() {
        let client = RpcClient::new(&[
            "http://localhost:8545".to_string(),
            "http://localhost:8546".to_string(),
        ])
        .unwrap();
        assert_eq!(client.get_current_url(), "http://localhost:8545");
        client.rotate_provider();
        assert_eq!(client.get_current_url(), "http://localhost:8546");
        client.rotate_provider();
        assert_eq!(client.get_current_url(), "http://localhost:8545");
    }
}
