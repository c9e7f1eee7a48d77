use crate::amount::format_amount;
use crate::analytics::DistributionReport;
use crate::chain::{ChainError, ChainReader, LogQuery, RawBlock};
use crate::entity::{EntityKind, Phase, WatchedEntity};
use crate::events::{Transfer, address_topic, decode_transfer_event};
use crate::notifier::{EventNotice, NoopSink, Notification, NotificationSink, ScanProgress};
use crate::repository::{Database, TransactionRecord, TxStatus, WalletRepository};
use alloy::sol_types::SolEvent;
use alloy_primitives::{Address, B256, U256};
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

const TOP_WALLETS_FOR_REPORT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSettings {
    /// Lowest block ever scanned, whatever the checkpoint says.
    pub genesis_block: u64,
    pub claim_batch_size: u64,
    pub distribution_batch_size: u64,
    pub batch_delay: Duration,
    pub rate_limit_cooldown: Duration,
    /// Consecutive rate-limit failures tolerated on one batch before the run aborts.
    pub max_rate_limit_retries: u32,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            genesis_block: 7_207_951,
            claim_batch_size: 10_000,
            distribution_batch_size: 100,
            batch_delay: Duration::from_millis(100),
            rate_limit_cooldown: Duration::from_secs(5),
            max_rate_limit_retries: 10,
        }
    }
}

impl ScanSettings {
    fn batch_size(&self, kind: EntityKind) -> u64 {
        match kind {
            EntityKind::ClaimContract => self.claim_batch_size,
            EntityKind::DistributionWallet => self.distribution_batch_size,
        }
        .max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityScanReport {
    pub entity: Address,
    pub kind: EntityKind,
    pub start_block: u64,
    /// Checkpoint after the run.
    pub last_block: u64,
    pub batches: u64,
    pub skipped_batches: u64,
    pub events: u64,
}

/// Outcome of one [`ScanEngine::run_full_scan`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSummary {
    pub success: bool,
    pub events_found: u64,
    /// Sum of newly recorded amounts over both phases, smallest unit.
    pub total_value: U256,
    /// Lowest checkpoint reached across all watched entities.
    pub last_block_reached: u64,
    pub entities: Vec<EntityScanReport>,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ScanSummary {
    fn rejected() -> Self {
        let now = Utc::now();
        Self {
            success: false,
            events_found: 0,
            total_value: U256::ZERO,
            last_block_reached: 0,
            entities: Vec::new(),
            error: Some("scan already in progress".to_string()),
            started_at: now,
            finished_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntityStatus {
    pub entity: Address,
    pub kind: EntityKind,
    pub last_scanned_block: u64,
    pub transactions_recorded: u64,
    pub progress_percent: f64,
}

/// Advisory snapshot returned by [`ScanEngine::get_status`].
#[derive(Debug, Clone, PartialEq)]
pub struct ScanStatus {
    pub is_scanning: bool,
    pub current_chain_height: u64,
    pub last_scanned_block: u64,
    pub transactions_recorded: u64,
    pub progress_percent: f64,
    pub entities: Vec<EntityStatus>,
}

/// Clears the in-process scanning flag when dropped.
struct ScanGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> ScanGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for ScanGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[derive(Debug, Default)]
struct RunTotals {
    events_found: u64,
    total_value: U256,
}

/// Resumable scanner for the watched entities.
///
/// At most one full scan runs at a time per engine. Within a run, entities
/// are scanned one after another and batches strictly in ascending block
/// order; the checkpoint for a batch is advanced only after all of its
/// records are stored, so an interrupted batch is replayed on the next run.
pub struct ScanEngine<R: ChainReader> {
    reader: R,
    db: Database,
    entities: Vec<WatchedEntity>,
    settings: ScanSettings,
    sink: Arc<dyn NotificationSink>,
    is_scanning: AtomicBool,
    last_run: Mutex<Option<ScanSummary>>,
}

impl<R: ChainReader> ScanEngine<R> {
    pub fn new(
        reader: R,
        db: Database,
        entities: Vec<WatchedEntity>,
        settings: ScanSettings,
    ) -> Result<Self> {
        db.seed_checkpoints(&entities)?;
        Ok(ScanEngine {
            reader,
            db,
            entities,
            settings,
            sink: Arc::new(NoopSink),
            is_scanning: AtomicBool::new(false),
            last_run: Mutex::new(None),
        })
    }

    pub fn with_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn is_scanning(&self) -> bool {
        self.is_scanning.load(Ordering::Acquire)
    }

    /// Summary of the most recent completed or aborted run.
    pub fn last_run(&self) -> Option<ScanSummary> {
        self.last_run.lock().ok().and_then(|guard| guard.clone())
    }

    /// Scan every watched entity up to the current chain height.
    ///
    /// Returns `success = false` without touching any state when another
    /// scan is already running on this engine.
    pub async fn run_full_scan(&self, start_block: Option<u64>) -> ScanSummary {
        let Some(_guard) = ScanGuard::acquire(&self.is_scanning) else {
            warn!("Scan already in progress, rejecting request");
            return ScanSummary::rejected();
        };

        let started_at = Utc::now();
        let mut reports = Vec::with_capacity(self.entities.len());
        let mut totals = RunTotals::default();

        let outcome = self.scan_all(start_block, &mut reports, &mut totals).await;

        let error = match outcome {
            Ok(()) => None,
            Err(e) => {
                error!("Scan aborted: {:#}", e);
                Some(format!("{e:#}"))
            }
        };

        let summary = ScanSummary {
            success: error.is_none(),
            events_found: totals.events_found,
            total_value: totals.total_value,
            last_block_reached: reports.iter().map(|r| r.last_block).min().unwrap_or(0),
            entities: reports,
            error,
            started_at,
            finished_at: Utc::now(),
        };

        info!(
            "Scan finished: success={}, {} new events, {} total value, last block {}",
            summary.success,
            summary.events_found,
            format_amount(summary.total_value),
            summary.last_block_reached
        );

        if summary.success {
            self.publish_stats();
        }

        if let Ok(mut last_run) = self.last_run.lock() {
            *last_run = Some(summary.clone());
        }
        summary
    }

    /// Run a scan, sleep for `poll_interval`, repeat. Never returns on its own.
    pub async fn watch(&self, poll_interval: Duration) {
        loop {
            let summary = self.run_full_scan(None).await;
            if summary.events_found == 0 {
                debug!(
                    "No new events, polling again in {} seconds",
                    poll_interval.as_secs()
                );
            }
            sleep(poll_interval).await;
        }
    }

    /// Read checkpoints and chain height independently. Advisory only.
    pub async fn get_status(&self) -> Result<ScanStatus> {
        let current_chain_height = self.reader.current_height().await?;

        let mut entities = Vec::with_capacity(self.entities.len());
        for entity in &self.entities {
            let checkpoint = self.db.checkpoint(&entity.address())?;
            let (last_scanned_block, transactions_recorded) = checkpoint
                .map(|c| (c.last_block_scanned, c.total_transactions))
                .unwrap_or((0, 0));
            entities.push(EntityStatus {
                entity: entity.address(),
                kind: entity.kind(),
                last_scanned_block,
                transactions_recorded,
                progress_percent: progress_percent(last_scanned_block, current_chain_height),
            });
        }

        let last_scanned_block = entities
            .iter()
            .map(|e| e.last_scanned_block)
            .min()
            .unwrap_or(0);

        Ok(ScanStatus {
            is_scanning: self.is_scanning(),
            current_chain_height,
            last_scanned_block,
            transactions_recorded: entities.iter().map(|e| e.transactions_recorded).sum(),
            progress_percent: progress_percent(last_scanned_block, current_chain_height),
            entities,
        })
    }

    async fn scan_all(
        &self,
        start_block: Option<u64>,
        reports: &mut Vec<EntityScanReport>,
        totals: &mut RunTotals,
    ) -> Result<()> {
        let height = self.reader.current_height().await?;
        info!("Current chain height: {}", height);

        for entity in &self.entities {
            let address = entity.address();
            self.db.set_scanning(&address, true)?;
            let result = self
                .scan_entity(entity, start_block, height, reports, totals)
                .await;
            let cleared = self.db.set_scanning(&address, false);
            result?;
            cleared?;
        }

        self.log_distribution_report();
        Ok(())
    }

    async fn scan_entity(
        &self,
        entity: &WatchedEntity,
        start_block: Option<u64>,
        height: u64,
        reports: &mut Vec<EntityScanReport>,
        totals: &mut RunTotals,
    ) -> Result<()> {
        let address = entity.address();
        let checkpoint = self
            .db
            .checkpoint(&address)?
            .map(|c| c.last_block_scanned)
            .unwrap_or(0);

        let start = start_block
            .unwrap_or(0)
            .max(checkpoint.saturating_add(1))
            .max(self.settings.genesis_block);

        reports.push(EntityScanReport {
            entity: address,
            kind: entity.kind(),
            start_block: start,
            last_block: checkpoint,
            batches: 0,
            skipped_batches: 0,
            events: 0,
        });
        let Some(report) = reports.last_mut() else {
            return Ok(());
        };

        if start > height {
            info!(
                "{} {:?} is up to date at block {}",
                entity.kind().label(),
                address,
                checkpoint
            );
            return Ok(());
        }

        let batch_size = self.settings.batch_size(entity.kind());
        info!(
            "Scanning {} {:?} from block {} to {} in batches of {}",
            entity.kind().label(),
            address,
            start,
            height,
            batch_size
        );

        let mut from = start;
        while from <= height {
            let to = from.saturating_add(batch_size - 1).min(height);

            let records = match self.fetch_with_cooldown(entity, from, to).await? {
                Some(records) => records,
                None => {
                    report.skipped_batches += 1;
                    Vec::new()
                }
            };

            let (new_records, value) = self.store_records(&records)?;
            self.db.advance_checkpoint(&address, to, new_records)?;

            report.batches += 1;
            report.events += new_records;
            report.last_block = report.last_block.max(to);
            totals.events_found += new_records;
            totals.total_value = totals.total_value.saturating_add(value);

            info!(
                "Blocks {}-{}: {} events, {} new",
                from,
                to,
                records.len(),
                new_records
            );

            self.sink.publish(Notification::ScanProgress(ScanProgress {
                entity: format!("{address:?}"),
                current: to,
                total: height,
                percentage: format!("{:.2}", progress_percent(to, height)),
            }));

            from = to.saturating_add(1);
            if from <= height && !self.settings.batch_delay.is_zero() {
                sleep(self.settings.batch_delay).await;
            }
        }

        Ok(())
    }

    /// Fetch one batch, waiting out rate limits.
    ///
    /// `Ok(None)` means the batch failed with a non rate-limit error and is
    /// skipped. An error means rate-limit retries were exhausted.
    async fn fetch_with_cooldown(
        &self,
        entity: &WatchedEntity,
        from: u64,
        to: u64,
    ) -> Result<Option<Vec<TransactionRecord>>> {
        let mut attempts = 0u32;
        loop {
            match self.fetch_batch(entity, from, to).await {
                Ok(records) => return Ok(Some(records)),
                Err(e) if e.is_rate_limited() => {
                    attempts += 1;
                    if attempts > self.settings.max_rate_limit_retries {
                        anyhow::bail!(
                            "Rate limited on blocks {}-{} after {} retries: {}",
                            from,
                            to,
                            self.settings.max_rate_limit_retries,
                            e
                        );
                    }
                    warn!(
                        "Rate limited on blocks {}-{}, waiting {:?} before retry {}/{}",
                        from,
                        to,
                        self.settings.rate_limit_cooldown,
                        attempts,
                        self.settings.max_rate_limit_retries
                    );
                    sleep(self.settings.rate_limit_cooldown).await;
                }
                Err(e) => {
                    warn!("Skipping blocks {}-{} after error: {}", from, to, e);
                    return Ok(None);
                }
            }
        }
    }

    /// Decode every qualifying event in `[from, to]` without writing anything.
    async fn fetch_batch(
        &self,
        entity: &WatchedEntity,
        from: u64,
        to: u64,
    ) -> Result<Vec<TransactionRecord>, ChainError> {
        match entity {
            WatchedEntity::ClaimContract {
                address,
                token,
                accepted_senders,
            } => {
                self.fetch_claims(*address, *token, accepted_senders, from, to)
                    .await
            }
            WatchedEntity::DistributionWallet { address } => {
                self.fetch_distributions(*address, from, to).await
            }
        }
    }

    async fn fetch_claims(
        &self,
        contract: Address,
        token: Address,
        accepted_senders: &[Address],
        from: u64,
        to: u64,
    ) -> Result<Vec<TransactionRecord>, ChainError> {
        let logs = self
            .reader
            .logs_in_range(LogQuery {
                address: token,
                event_signature: Transfer::SIGNATURE_HASH,
                topic2: Some(address_topic(contract)),
                from_block: from,
                to_block: to,
            })
            .await?;

        let mut timestamps: HashMap<u64, u64> = HashMap::new();
        let mut records = Vec::new();

        for log in logs {
            let event = match decode_transfer_event(&log) {
                Ok(event) => event,
                Err(e) => {
                    warn!("Failed to decode transfer event in {:?}: {}", log.tx_hash, e);
                    continue;
                }
            };

            if event.value.is_zero() {
                continue;
            }
            if !accepted_senders.contains(&event.from) {
                debug!(
                    "Ignoring transfer from unrecognised sender {:?} in {:?}",
                    event.from, log.tx_hash
                );
                continue;
            }

            let Some(tx) = self.reader.transaction(log.tx_hash).await? else {
                warn!("Transaction {:?} not found, skipping claim", log.tx_hash);
                continue;
            };

            let timestamp = match timestamps.get(&log.block_number) {
                Some(ts) => *ts,
                None => match self.reader.block(log.block_number).await? {
                    Some(block) => {
                        timestamps.insert(log.block_number, block.timestamp);
                        block.timestamp
                    }
                    None => {
                        warn!("Block {} not found, skipping claim", log.block_number);
                        continue;
                    }
                },
            };

            // The claimant is whoever sent the transaction, not the log sender.
            records.push(TransactionRecord {
                tx_hash: log.tx_hash,
                log_index: log.log_index,
                block_number: log.block_number,
                from_address: tx.from,
                to_address: contract,
                recipient: tx.from,
                value: U256::ZERO,
                token_amount: event.value,
                token_kind: Phase::Claim.token_kind(),
                phase: Phase::Claim,
                status: TxStatus::Success,
                timestamp,
                gas_used: Some(tx.gas),
            });
        }

        Ok(records)
    }

    async fn fetch_distributions(
        &self,
        wallet: Address,
        from: u64,
        to: u64,
    ) -> Result<Vec<TransactionRecord>, ChainError> {
        let mut records = Vec::new();

        for number in from..=to {
            let Some(block) = self.reader.block(number).await? else {
                warn!("Block {} not found, skipping", number);
                continue;
            };
            records.extend(distribution_records(wallet, &block));
        }

        Ok(records)
    }

    /// Store each record and apply it to its wallet. Returns the count and
    /// value of records that were new.
    fn store_records(&self, records: &[TransactionRecord]) -> Result<(u64, U256)> {
        let mut new_records = 0u64;
        let mut value = U256::ZERO;

        for record in records {
            if !self.db.record_event(record)? {
                debug!("Transaction {:?} already recorded", record.tx_hash);
                continue;
            }
            new_records += 1;
            value = value.saturating_add(record.token_amount);
            self.sink.publish(event_notification(record));
        }

        Ok((new_records, value))
    }

    fn publish_stats(&self) {
        match self.db.aggregate_stats() {
            Ok(stats) => self.sink.publish(Notification::StatsUpdate((&stats).into())),
            Err(e) => warn!("Failed to read aggregate stats: {:#}", e),
        }
    }

    fn log_distribution_report(&self) {
        let report = self.db.with_conn(|conn| {
            let repo = WalletRepository::new(conn);
            let stats = repo.aggregate_stats()?;
            let top = repo.top(TOP_WALLETS_FOR_REPORT)?;
            Ok(DistributionReport::compute(&stats, &top))
        });

        let report = match report {
            Ok(report) => report,
            Err(e) => {
                warn!("Failed to build distribution report: {:#}", e);
                return;
            }
        };

        info!(
            "Distribution: {} wallets ({} phase 1, {} phase 2, {} both)",
            report.total_wallets,
            report.phase1_wallets,
            report.phase2_wallets,
            report.overlapping_wallets
        );
        if let Some(average) = report.average_phase1_display() {
            info!("Average phase 1 claim: {} W0G", average);
        }
        if let Some(percent) = report.concentration_percent() {
            if report.is_concentrated() {
                warn!(
                    "Top {} wallets hold {}% of phase 1 tokens",
                    TOP_WALLETS_FOR_REPORT, percent
                );
            } else {
                info!(
                    "Top {} wallets hold {}% of phase 1 tokens",
                    TOP_WALLETS_FOR_REPORT, percent
                );
            }
        }
    }
}

/// Outgoing value transfers sent by `wallet` in `block`.
fn distribution_records(wallet: Address, block: &RawBlock) -> Vec<TransactionRecord> {
    block
        .transactions
        .iter()
        .filter(|tx| tx.from == wallet && !tx.value.is_zero())
        .filter_map(|tx| {
            let to = tx.to?;
            Some(TransactionRecord {
                tx_hash: tx.hash,
                log_index: 0,
                block_number: block.number,
                from_address: wallet,
                to_address: to,
                recipient: to,
                value: tx.value,
                token_amount: tx.value,
                token_kind: Phase::Distribution.token_kind(),
                phase: Phase::Distribution,
                status: TxStatus::Success,
                timestamp: block.timestamp,
                gas_used: Some(tx.gas),
            })
        })
        .collect()
}

fn event_notification(record: &TransactionRecord) -> Notification {
    let notice = EventNotice {
        token: record.token_kind,
        tx_hash: hash_string(&record.tx_hash),
        recipient: format!("{:?}", record.recipient),
        amount: format_amount(record.token_amount),
        block: record.block_number,
        timestamp: rfc3339(record.timestamp),
    };
    match record.phase {
        Phase::Claim => Notification::NewClaim(notice),
        Phase::Distribution => Notification::NewTransfer(notice),
    }
}

fn hash_string(hash: &B256) -> String {
    format!("{hash:?}")
}

fn rfc3339(timestamp: u64) -> String {
    i64::try_from(timestamp)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_default()
}

fn progress_percent(block: u64, height: u64) -> f64 {
    if height == 0 {
        return 0.0;
    }
    (block as f64 / height as f64 * 100.0).min(100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{RawLog, RawTransaction};
    use crate::repository::TransactionRepository;
    use alloy_primitives::address;
    use async_trait::async_trait;

    const WALLET: Address = address!("b03e8e11730228c2d03270bcd1ab57818d7b6d8c");
    const ALICE: Address = address!("00000000000000000000000000000000000000a1");
    const BOB: Address = address!("00000000000000000000000000000000000000b2");

    /// Blocks 1..=height, each with one transfer from the distribution wallet.
    struct FixedChain {
        height: u64,
    }

    impl FixedChain {
        fn block_at(&self, number: u64) -> RawBlock {
            let to = if number % 2 == 0 { ALICE } else { BOB };
            RawBlock {
                number,
                timestamp: 1_700_000_000 + number,
                transactions: vec![RawTransaction {
                    hash: B256::with_last_byte(number as u8),
                    from: WALLET,
                    to: Some(to),
                    value: U256::from(number * 1_000),
                    gas: 21_000,
                }],
            }
        }
    }

    #[async_trait]
    impl ChainReader for FixedChain {
        async fn current_height(&self) -> Result<u64, ChainError> {
            Ok(self.height)
        }

        async fn logs_in_range(&self, _query: LogQuery) -> Result<Vec<RawLog>, ChainError> {
            Ok(Vec::new())
        }

        async fn transaction(&self, _hash: B256) -> Result<Option<RawTransaction>, ChainError> {
            Ok(None)
        }

        async fn block(&self, number: u64) -> Result<Option<RawBlock>, ChainError> {
            Ok((1..=self.height)
                .contains(&number)
                .then(|| self.block_at(number)))
        }
    }

    fn settings() -> ScanSettings {
        ScanSettings {
            genesis_block: 1,
            claim_batch_size: 10,
            distribution_batch_size: 4,
            batch_delay: Duration::ZERO,
            rate_limit_cooldown: Duration::ZERO,
            max_rate_limit_retries: 2,
        }
    }

    fn engine() -> ScanEngine<FixedChain> {
        ScanEngine::new(
            FixedChain { height: 10 },
            Database::in_memory().unwrap(),
            vec![WatchedEntity::distribution_wallet(WALLET)],
            settings(),
        )
        .unwrap()
    }

    fn ledger_state(db: &Database) -> Vec<(u64, U256, U256)> {
        db.with_conn(|conn| {
            let wallets = WalletRepository::new(conn);
            let txs = TransactionRepository::new(conn);
            let mut state = Vec::new();
            for address in [ALICE, BOB] {
                let wallet = wallets.get(&address)?.unwrap();
                assert_eq!(wallet.transaction_count, txs.count_for_recipient(&address)?);
                state.push((
                    wallet.transaction_count,
                    wallet.phase2_amount,
                    wallet.total_native_received,
                ));
            }
            Ok(state)
        })
        .unwrap()
    }

    #[tokio::test]
    async fn batch_written_but_not_checkpointed_is_replayed_cleanly() {
        let uninterrupted = engine();
        assert!(uninterrupted.run_full_scan(None).await.success);

        let crashed = engine();
        let entity = crashed.entities[0].clone();

        // Batch [1,4] completes, batch [5,8] is written but the process dies
        // before the checkpoint moves.
        let first = crashed.fetch_batch(&entity, 1, 4).await.unwrap();
        let (new_first, _) = crashed.store_records(&first).unwrap();
        crashed.db.advance_checkpoint(&WALLET, 4, new_first).unwrap();
        let second = crashed.fetch_batch(&entity, 5, 8).await.unwrap();
        crashed.store_records(&second).unwrap();
        assert_eq!(crashed.db.checkpoint(&WALLET).unwrap().unwrap().last_block_scanned, 4);

        let resumed = crashed.run_full_scan(None).await;
        assert!(resumed.success);
        assert_eq!(resumed.entities[0].start_block, 5);
        // Only blocks 9 and 10 are new; 5-8 are replayed without effect.
        assert_eq!(resumed.events_found, 2);

        assert_eq!(ledger_state(&crashed.db), ledger_state(&uninterrupted.db));
        assert_eq!(
            crashed.db.checkpoint(&WALLET).unwrap().unwrap().last_block_scanned,
            uninterrupted.db.checkpoint(&WALLET).unwrap().unwrap().last_block_scanned,
        );
    }

    #[test]
    fn distribution_filter_drops_zero_value_and_contract_creation() {
        let block = RawBlock {
            number: 9,
            timestamp: 1,
            transactions: vec![
                RawTransaction {
                    hash: B256::repeat_byte(1),
                    from: WALLET,
                    to: Some(ALICE),
                    value: U256::from(5u64),
                    gas: 21_000,
                },
                RawTransaction {
                    hash: B256::repeat_byte(2),
                    from: WALLET,
                    to: Some(ALICE),
                    value: U256::ZERO,
                    gas: 21_000,
                },
                RawTransaction {
                    hash: B256::repeat_byte(3),
                    from: WALLET,
                    to: None,
                    value: U256::from(5u64),
                    gas: 21_000,
                },
                RawTransaction {
                    hash: B256::repeat_byte(4),
                    from: BOB,
                    to: Some(ALICE),
                    value: U256::from(5u64),
                    gas: 21_000,
                },
            ],
        };

        let records = distribution_records(WALLET, &block);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].tx_hash, B256::repeat_byte(1));
        assert_eq!(records[0].recipient, ALICE);
        assert_eq!(records[0].phase, Phase::Distribution);
    }

    #[test]
    fn progress_is_capped_and_safe_at_zero_height() {
        assert_eq!(progress_percent(0, 0), 0.0);
        assert_eq!(progress_percent(50, 200), 25.0);
        assert_eq!(progress_percent(300, 200), 100.0);
    }

    #[test]
    fn notice_timestamps_are_rfc3339() {
        assert_eq!(rfc3339(0), "1970-01-01T00:00:00+00:00");
    }
}
