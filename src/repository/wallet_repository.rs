use super::models::{AggregateStats, Wallet};
use super::{amount_column, parse_column};
use crate::amount::pad_amount;
use crate::entity::TokenKind;
use alloy_primitives::{Address, U256};
use anyhow::Result;
use rusqlite::{OptionalExtension, Row, params};

/// Listing options for [`WalletRepository::list`].
#[derive(Debug, Clone)]
pub struct WalletFilter {
    /// Case-insensitive substring match on the address.
    pub search: Option<String>,
    pub limit: usize,
    pub offset: usize,
}

impl Default for WalletFilter {
    fn default() -> Self {
        Self {
            search: None,
            limit: 100,
            offset: 0,
        }
    }
}

pub struct WalletRepository<'a> {
    conn: &'a rusqlite::Connection,
}

impl<'a> WalletRepository<'a> {
    const SELECT_WALLET: &'static str = "SELECT address, total_native_received,
            total_token_received, phase1_amount, phase2_amount, transaction_count,
            first_transaction, last_transaction, is_suspicious, suspicious_reason,
            created_at, updated_at
        FROM wallets";

    const INSERT_WALLET: &'static str = "INSERT INTO wallets (
            address, total_native_received, total_token_received, phase1_amount,
            phase2_amount, total_received, transaction_count, first_transaction,
            last_transaction
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?7)";

    const UPDATE_WALLET: &'static str = "UPDATE wallets SET
            total_native_received = ?1,
            total_token_received = ?2,
            phase1_amount = ?3,
            phase2_amount = ?4,
            total_received = ?5,
            transaction_count = transaction_count + 1,
            first_transaction = ?6,
            last_transaction = ?7,
            updated_at = CURRENT_TIMESTAMP
        WHERE address = ?8";

    const ORDER_BY_TOTAL: &'static str = " ORDER BY total_received DESC, transaction_count DESC";

    pub fn new(conn: &'a rusqlite::Connection) -> Self {
        Self { conn }
    }

    /// Apply one new event to the wallet, creating the row on first sight.
    ///
    /// Sums only ever grow and `transaction_count` grows by exactly one.
    /// Callers run this inside the same transaction as the record insert.
    pub fn apply_event(
        &self,
        address: &Address,
        amount: U256,
        token_kind: TokenKind,
        timestamp: u64,
    ) -> Result<()> {
        let address_str = format!("{address:?}");

        let Some(wallet) = self.get(address)? else {
            let (native, token, phase1, phase2) = match token_kind {
                TokenKind::W0g => (U256::ZERO, amount, amount, U256::ZERO),
                TokenKind::Native => (amount, U256::ZERO, U256::ZERO, amount),
            };
            self.conn.execute(
                Self::INSERT_WALLET,
                params![
                    address_str,
                    pad_amount(&native),
                    pad_amount(&token),
                    pad_amount(&phase1),
                    pad_amount(&phase2),
                    pad_amount(&amount),
                    timestamp,
                ],
            )?;
            return Ok(());
        };

        let mut native = wallet.total_native_received;
        let mut token = wallet.total_token_received;
        let mut phase1 = wallet.phase1_amount;
        let mut phase2 = wallet.phase2_amount;

        match token_kind {
            TokenKind::W0g => {
                token = checked_add(token, amount)?;
                phase1 = checked_add(phase1, amount)?;
            }
            TokenKind::Native => {
                native = checked_add(native, amount)?;
                phase2 = checked_add(phase2, amount)?;
            }
        }
        let total = checked_add(phase1, phase2)?;

        let first = wallet
            .first_transaction
            .map_or(timestamp, |first| first.min(timestamp));
        let last = wallet
            .last_transaction
            .map_or(timestamp, |last| last.max(timestamp));

        self.conn.execute(
            Self::UPDATE_WALLET,
            params![
                pad_amount(&native),
                pad_amount(&token),
                pad_amount(&phase1),
                pad_amount(&phase2),
                pad_amount(&total),
                first,
                last,
                address_str,
            ],
        )?;

        Ok(())
    }

    pub fn get(&self, address: &Address) -> Result<Option<Wallet>> {
        let query = format!("{} WHERE address = ?1", Self::SELECT_WALLET);
        let wallet = self
            .conn
            .query_row(&query, params![format!("{address:?}")], Self::row_to_wallet)
            .optional()?;
        Ok(wallet)
    }

    pub fn list(&self, filter: &WalletFilter) -> Result<Vec<Wallet>> {
        let mut query = Self::SELECT_WALLET.to_string();
        if filter.search.is_some() {
            query.push_str(" WHERE address LIKE ?1");
        }
        query.push_str(Self::ORDER_BY_TOTAL);
        query.push_str(&format!(" LIMIT {} OFFSET {}", filter.limit, filter.offset));

        let mut stmt = self.conn.prepare(&query)?;
        let wallets = match &filter.search {
            Some(search) => stmt
                .query_map(params![Self::like_pattern(search)], Self::row_to_wallet)?
                .collect::<Result<Vec<_>, _>>()?,
            None => stmt
                .query_map([], Self::row_to_wallet)?
                .collect::<Result<Vec<_>, _>>()?,
        };
        Ok(wallets)
    }

    pub fn search(&self, needle: &str, limit: usize) -> Result<Vec<Wallet>> {
        self.list(&WalletFilter {
            search: Some(needle.to_string()),
            limit,
            offset: 0,
        })
    }

    pub fn top(&self, limit: usize) -> Result<Vec<Wallet>> {
        self.list(&WalletFilter {
            search: None,
            limit,
            offset: 0,
        })
    }

    /// Mark a wallet as suspicious. Set by external analysis, never by the scanner.
    pub fn flag_suspicious(&self, address: &Address, reason: &str) -> Result<bool> {
        let updated = self.conn.execute(
            "UPDATE wallets SET is_suspicious = 1, suspicious_reason = ?1,
                updated_at = CURRENT_TIMESTAMP
             WHERE address = ?2",
            params![reason, format!("{address:?}")],
        )?;
        Ok(updated == 1)
    }

    pub fn aggregate_stats(&self) -> Result<AggregateStats> {
        let zero = pad_amount(&U256::ZERO);

        let (
            total_wallets,
            phase1_wallets,
            phase2_wallets,
            overlapping_wallets,
            suspicious_wallets,
        ) = self.conn.query_row(
            "SELECT
                COUNT(*),
                COUNT(CASE WHEN phase1_amount != ?1 THEN 1 END),
                COUNT(CASE WHEN phase2_amount != ?1 THEN 1 END),
                COUNT(CASE WHEN phase1_amount != ?1 AND phase2_amount != ?1 THEN 1 END),
                COUNT(CASE WHEN is_suspicious = 1 THEN 1 END)
             FROM wallets",
            params![zero],
            |row| {
                Ok((
                    row.get::<_, u64>(0)?,
                    row.get::<_, u64>(1)?,
                    row.get::<_, u64>(2)?,
                    row.get::<_, u64>(3)?,
                    row.get::<_, u64>(4)?,
                ))
            },
        )?;

        // Amounts exceed SQLite's integer range, so sum in U256.
        let mut stmt = self
            .conn
            .prepare("SELECT phase1_amount, phase2_amount FROM wallets")?;
        let rows = stmt.query_map([], |row| Ok((amount_column(row, 0)?, amount_column(row, 1)?)))?;

        let mut total_phase1 = U256::ZERO;
        let mut total_phase2 = U256::ZERO;
        for row in rows {
            let (phase1, phase2) = row?;
            total_phase1 = checked_add(total_phase1, phase1)?;
            total_phase2 = checked_add(total_phase2, phase2)?;
        }

        let total_transactions: u64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;

        let (last_block_scanned, last_update): (Option<u64>, Option<String>) = self.conn.query_row(
            "SELECT MAX(last_block_scanned), MAX(last_update) FROM scan_progress",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(AggregateStats {
            total_wallets,
            phase1_wallets,
            phase2_wallets,
            overlapping_wallets,
            suspicious_wallets,
            total_phase1_distributed: total_phase1,
            total_phase2_distributed: total_phase2,
            total_transactions,
            last_block_scanned: last_block_scanned.unwrap_or(0),
            last_update,
        })
    }

    fn like_pattern(search: &str) -> String {
        format!("%{}%", search.trim().to_lowercase())
    }

    fn row_to_wallet(row: &Row) -> rusqlite::Result<Wallet> {
        Ok(Wallet {
            address: parse_column(row, 0)?,
            total_native_received: amount_column(row, 1)?,
            total_token_received: amount_column(row, 2)?,
            phase1_amount: amount_column(row, 3)?,
            phase2_amount: amount_column(row, 4)?,
            transaction_count: row.get(5)?,
            first_transaction: row.get(6)?,
            last_transaction: row.get(7)?,
            is_suspicious: row.get(8)?,
            suspicious_reason: row.get(9)?,
            created_at: row.get(10)?,
            updated_at: row.get(11)?,
        })
    }
}

fn checked_add(a: U256, b: U256) -> Result<U256> {
    a.checked_add(b)
        .ok_or_else(|| anyhow::anyhow!("Overflow in wallet aggregate"))
}
