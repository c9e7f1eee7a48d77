//! Chain Reader contract consumed by the scan engine.
//!
//! The engine never talks to a node directly; it is handed something that
//! implements [`ChainReader`]. [`crate::rpc::RpcClient`] is the production
//! implementation.

use alloy_primitives::{Address, B256, Bytes, U256};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    /// The node refused the request because of request-rate limits.
    #[error("rate limited: {0}")]
    RateLimited(String),
    /// The log query matched more results than the node will return.
    #[error("too many results: {0}")]
    TooManyResults(String),
    #[error("request timeout after {0} seconds")]
    Timeout(u64),
    #[error("rpc error: {0}")]
    Rpc(String),
}

impl ChainError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ChainError::RateLimited(_))
    }

    /// Classify a provider error message.
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let lowered = message.to_lowercase();
        if lowered.contains("429")
            || lowered.contains("rate limit")
            || lowered.contains("limit exceeded")
            || lowered.contains("too many requests")
        {
            ChainError::RateLimited(message)
        } else if lowered.contains("exceeds max results") {
            ChainError::TooManyResults(message)
        } else {
            ChainError::Rpc(message)
        }
    }
}

/// A raw event log as returned by the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLog {
    pub address: Address,
    pub tx_hash: B256,
    pub block_number: u64,
    pub log_index: u64,
    pub topics: Vec<B256>,
    pub data: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTransaction {
    pub hash: B256,
    pub from: Address,
    pub to: Option<Address>,
    pub value: U256,
    pub gas: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBlock {
    pub number: u64,
    pub timestamp: u64,
    pub transactions: Vec<RawTransaction>,
}

/// Log filter for [`ChainReader::logs_in_range`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogQuery {
    pub address: Address,
    pub event_signature: B256,
    /// Optional match on the second indexed argument (topic 2).
    pub topic2: Option<B256>,
    pub from_block: u64,
    pub to_block: u64,
}

#[async_trait]
pub trait ChainReader: Send + Sync {
    async fn current_height(&self) -> Result<u64, ChainError>;

    async fn logs_in_range(&self, query: LogQuery) -> Result<Vec<RawLog>, ChainError>;

    async fn transaction(&self, hash: B256) -> Result<Option<RawTransaction>, ChainError>;

    /// Block with its full transaction list.
    async fn block(&self, number: u64) -> Result<Option<RawBlock>, ChainError>;
}

#[async_trait]
impl<T: ChainReader + ?Sized> ChainReader for Arc<T> {
    async fn current_height(&self) -> Result<u64, ChainError> {
        (**self).current_height().await
    }

    async fn logs_in_range(&self, query: LogQuery) -> Result<Vec<RawLog>, ChainError> {
        (**self).logs_in_range(query).await
    }

    async fn transaction(&self, hash: B256) -> Result<Option<RawTransaction>, ChainError> {
        (**self).transaction(hash).await
    }

    async fn block(&self, number: u64) -> Result<Option<RawBlock>, ChainError> {
        (**self).block(number).await
    }
}
