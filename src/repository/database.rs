use crate::entity::WatchedEntity;
use crate::repository::{
    AggregateStats, CheckpointRepository, ScanCheckpoint, TransactionRecord,
    TransactionRepository, WalletRepository,
};
use alloy_primitives::Address;
use anyhow::{Context, Result};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

/// Shared handle to the ledger database.
///
/// Cloning is cheap; all clones use the same connection. Every write goes
/// through a single locked call, so readers never see a half-applied row.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn new(db_path: &str) -> Result<Self> {
        let db_path = db_path.strip_prefix("sqlite:").unwrap_or(db_path);
        let conn = Connection::open(db_path).context("Failed to open database")?;

        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        })
        .context("Failed to set journal mode")?;

        create_tables(&conn)?;
        Ok(Database {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn in_memory() -> Result<Self> {
        Self::new(":memory:")
    }

    /// Run `f` with exclusive access to the connection.
    pub fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| anyhow::anyhow!("Database connection mutex poisoned"))?;
        f(&conn)
    }

    /// Ensure one checkpoint row exists per watched entity.
    pub fn seed_checkpoints(&self, entities: &[WatchedEntity]) -> Result<()> {
        self.with_conn(|conn| {
            let repo = CheckpointRepository::new(conn);
            for entity in entities {
                repo.seed(&entity.address())?;
            }
            Ok(())
        })
    }

    /// Insert the record and, only if it was new, apply it to the recipient's
    /// wallet. Both happen in one SQLite transaction.
    pub fn record_event(&self, record: &TransactionRecord) -> Result<bool> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            let inserted = TransactionRepository::new(&tx).upsert(record)?;
            if inserted {
                WalletRepository::new(&tx).apply_event(
                    &record.recipient,
                    record.token_amount,
                    record.token_kind,
                    record.timestamp,
                )?;
            }
            tx.commit()?;
            Ok(inserted)
        })
    }

    pub fn checkpoint(&self, entity: &Address) -> Result<Option<ScanCheckpoint>> {
        self.with_conn(|conn| CheckpointRepository::new(conn).get(entity))
    }

    pub fn advance_checkpoint(
        &self,
        entity: &Address,
        block_number: u64,
        new_transactions: u64,
    ) -> Result<()> {
        self.with_conn(|conn| {
            CheckpointRepository::new(conn).advance(entity, block_number, new_transactions)
        })
    }

    pub fn reset_checkpoint(&self, entity: &Address, block_number: u64) -> Result<()> {
        self.with_conn(|conn| CheckpointRepository::new(conn).reset(entity, block_number))
    }

    pub fn set_scanning(&self, entity: &Address, scanning: bool) -> Result<()> {
        self.with_conn(|conn| CheckpointRepository::new(conn).set_scanning(entity, scanning))
    }

    pub fn aggregate_stats(&self) -> Result<AggregateStats> {
        self.with_conn(|conn| WalletRepository::new(conn).aggregate_stats())
    }
}

fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS wallets (
            address TEXT PRIMARY KEY,
            total_native_received TEXT NOT NULL,
            total_token_received TEXT NOT NULL,
            phase1_amount TEXT NOT NULL,
            phase2_amount TEXT NOT NULL,
            total_received TEXT NOT NULL,
            transaction_count INTEGER NOT NULL DEFAULT 0,
            first_transaction INTEGER,
            last_transaction INTEGER,
            is_suspicious INTEGER NOT NULL DEFAULT 0,
            suspicious_reason TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS transactions (
            tx_hash TEXT NOT NULL,
            phase INTEGER NOT NULL CHECK (phase IN (1, 2)),
            log_index INTEGER NOT NULL,
            block_number INTEGER NOT NULL,
            from_address TEXT NOT NULL,
            to_address TEXT NOT NULL,
            recipient TEXT NOT NULL,
            value TEXT NOT NULL,
            token_amount TEXT NOT NULL,
            token_type TEXT NOT NULL CHECK (token_type IN ('W0G', '0G')),
            status TEXT NOT NULL DEFAULT 'success',
            timestamp INTEGER NOT NULL,
            gas_used INTEGER,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (tx_hash, phase, log_index)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS scan_progress (
            contract_address TEXT PRIMARY KEY,
            last_block_scanned INTEGER NOT NULL DEFAULT 0,
            total_transactions INTEGER NOT NULL DEFAULT 0,
            is_scanning INTEGER NOT NULL DEFAULT 0,
            last_update TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_wallets_total ON wallets(total_received)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_wallets_suspicious ON wallets(is_suspicious)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_transactions_block ON transactions(block_number)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_transactions_recipient ON transactions(recipient)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_transactions_from ON transactions(from_address)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_transactions_to ON transactions(to_address)",
        [],
    )?;

    Ok(())
}
