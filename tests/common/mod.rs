#![allow(dead_code)]

use airdrop_indexer::chain::{
    ChainError, ChainReader, LogQuery, RawBlock, RawLog, RawTransaction,
};
use airdrop_indexer::entity::WatchedEntity;
use airdrop_indexer::events::Transfer;
use airdrop_indexer::notifier::{Notification, NotificationSink};
use airdrop_indexer::scanner::ScanSettings;
use alloy::sol_types::SolEvent;
use alloy_primitives::{Address, B256, U256, address};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

pub const CLAIM_CONTRACT: Address = address!("6a9c6b5507e322aa00eb9c45e80c07ab63acabb6");
pub const TOKEN: Address = address!("1cd0690ff9a693f5ef2dd976660a8dafc81a109c");
pub const ADMIN: Address = address!("ccd7af961ceda6bd383fea1ecc2ffaa410d991e9");
pub const DISTRIBUTION_WALLET: Address = address!("b03e8e11730228c2d03270bcd1ab57818d7b6d8c");
pub const RELAY: Address = address!("00000000000000000000000000000000000000e1");

pub fn tokens(whole: u64) -> U256 {
    U256::from(whole) * U256::from(10u64).pow(U256::from(18u64))
}

pub fn claim_entity() -> WatchedEntity {
    WatchedEntity::claim_contract(CLAIM_CONTRACT, TOKEN, ADMIN)
}

pub fn distribution_entity() -> WatchedEntity {
    WatchedEntity::distribution_wallet(DISTRIBUTION_WALLET)
}

pub fn settings(claim_batch: u64, distribution_batch: u64) -> ScanSettings {
    ScanSettings {
        genesis_block: 1,
        claim_batch_size: claim_batch,
        distribution_batch_size: distribution_batch,
        batch_delay: Duration::ZERO,
        rate_limit_cooldown: Duration::from_millis(1),
        max_rate_limit_retries: 3,
    }
}

#[derive(Default)]
struct MockState {
    height: u64,
    logs: Vec<RawLog>,
    transactions: HashMap<B256, RawTransaction>,
    blocks: BTreeMap<u64, RawBlock>,
    log_requests: Vec<(u64, u64)>,
    block_requests: Vec<u64>,
    /// Remaining rate-limit failures for a log range.
    rate_limits: HashMap<(u64, u64), u32>,
    /// Log ranges that always fail with a plain RPC error.
    failing_ranges: Vec<(u64, u64)>,
    next_log_index: u64,
}

/// In-memory chain. Blocks that were never populated come back empty with
/// timestamp `1_700_000_000 + number`.
#[derive(Clone, Default)]
pub struct MockChain {
    state: Arc<Mutex<MockState>>,
    gate: Option<Arc<Notify>>,
}

impl MockChain {
    pub fn new(height: u64) -> Self {
        let chain = Self::default();
        chain.state.lock().unwrap().height = height;
        chain
    }

    /// Block every `current_height` call until the returned handle is notified.
    pub fn gated(height: u64) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let mut chain = Self::new(height);
        chain.gate = Some(gate.clone());
        (chain, gate)
    }

    pub fn set_height(&self, height: u64) {
        self.state.lock().unwrap().height = height;
    }

    /// Add a token transfer into the claim contract, sent by `claimant` in
    /// a transaction whose log-level sender is `log_sender`.
    pub fn add_claim(
        &self,
        block: u64,
        tx_byte: u8,
        claimant: Address,
        log_sender: Address,
        amount: U256,
    ) -> B256 {
        let tx_hash = B256::repeat_byte(tx_byte);
        let event = Transfer {
            from: log_sender,
            to: CLAIM_CONTRACT,
            value: amount,
        };
        let data = event.encode_log_data();

        let mut state = self.state.lock().unwrap();
        let log_index = state.next_log_index;
        state.next_log_index += 1;
        state.logs.push(RawLog {
            address: TOKEN,
            tx_hash,
            block_number: block,
            log_index,
            topics: data.topics().to_vec(),
            data: data.data.clone(),
        });
        state.transactions.insert(
            tx_hash,
            RawTransaction {
                hash: tx_hash,
                from: claimant,
                to: Some(CLAIM_CONTRACT),
                value: U256::ZERO,
                gas: 80_000,
            },
        );
        tx_hash
    }

    /// Push a log exactly as given. Its `log_index` is replaced with the next
    /// free index so it never collides with logs added by [`Self::add_claim`].
    pub fn add_raw_log(&self, mut log: RawLog) {
        let mut state = self.state.lock().unwrap();
        log.log_index = state.next_log_index;
        state.next_log_index += 1;
        state.logs.push(log);
    }

    /// Add a transaction to `block`.
    pub fn add_transaction(
        &self,
        block: u64,
        tx_byte: u8,
        from: Address,
        to: Option<Address>,
        value: U256,
    ) -> B256 {
        let hash = B256::repeat_byte(tx_byte);
        let tx = RawTransaction {
            hash,
            from,
            to,
            value,
            gas: 21_000,
        };
        let mut state = self.state.lock().unwrap();
        state
            .blocks
            .entry(block)
            .or_insert_with(|| empty_block(block))
            .transactions
            .push(tx.clone());
        state.transactions.insert(hash, tx);
        hash
    }

    pub fn add_distribution(&self, block: u64, tx_byte: u8, to: Address, value: U256) -> B256 {
        self.add_transaction(block, tx_byte, DISTRIBUTION_WALLET, Some(to), value)
    }

    pub fn rate_limit(&self, from: u64, to: u64, times: u32) {
        self.state.lock().unwrap().rate_limits.insert((from, to), times);
    }

    pub fn fail_range(&self, from: u64, to: u64) {
        self.state.lock().unwrap().failing_ranges.push((from, to));
    }

    pub fn log_requests(&self) -> Vec<(u64, u64)> {
        self.state.lock().unwrap().log_requests.clone()
    }

    pub fn block_requests(&self) -> Vec<u64> {
        self.state.lock().unwrap().block_requests.clone()
    }
}

fn empty_block(number: u64) -> RawBlock {
    RawBlock {
        number,
        timestamp: 1_700_000_000 + number,
        transactions: Vec::new(),
    }
}

#[async_trait]
impl ChainReader for MockChain {
    async fn current_height(&self) -> Result<u64, ChainError> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        Ok(self.state.lock().unwrap().height)
    }

    async fn logs_in_range(&self, query: LogQuery) -> Result<Vec<RawLog>, ChainError> {
        let mut state = self.state.lock().unwrap();
        let range = (query.from_block, query.to_block);
        state.log_requests.push(range);

        if let Some(remaining) = state.rate_limits.get_mut(&range) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(ChainError::RateLimited("HTTP 429 Too Many Requests".to_string()));
            }
        }
        if state.failing_ranges.contains(&range) {
            return Err(ChainError::Rpc("internal error".to_string()));
        }

        let logs = state
            .logs
            .iter()
            .filter(|log| log.address == query.address)
            .filter(|log| log.topics.first() == Some(&query.event_signature))
            .filter(|log| match query.topic2 {
                Some(topic) => log.topics.get(2) == Some(&topic),
                None => true,
            })
            .filter(|log| (query.from_block..=query.to_block).contains(&log.block_number))
            .cloned()
            .collect();
        Ok(logs)
    }

    async fn transaction(&self, hash: B256) -> Result<Option<RawTransaction>, ChainError> {
        Ok(self.state.lock().unwrap().transactions.get(&hash).cloned())
    }

    async fn block(&self, number: u64) -> Result<Option<RawBlock>, ChainError> {
        let mut state = self.state.lock().unwrap();
        state.block_requests.push(number);
        if number > state.height {
            return Ok(None);
        }
        Ok(Some(
            state
                .blocks
                .get(&number)
                .cloned()
                .unwrap_or_else(|| empty_block(number)),
        ))
    }
}

/// Sink that keeps every notification for later inspection.
#[derive(Clone, Default)]
pub struct RecordingSink {
    notifications: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingSink {
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }

    pub fn progress_blocks(&self) -> Vec<u64> {
        self.notifications()
            .into_iter()
            .filter_map(|n| match n {
                Notification::ScanProgress(progress) => Some(progress.current),
                _ => None,
            })
            .collect()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.notifications().iter().map(|n| n.name()).collect()
    }
}

impl NotificationSink for RecordingSink {
    fn publish(&self, notification: Notification) {
        self.notifications.lock().unwrap().push(notification);
    }
}
