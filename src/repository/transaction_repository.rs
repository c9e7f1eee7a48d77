use super::models::{TransactionRecord, TxStatus};
use super::{amount_column, parse_column};
use crate::amount::pad_amount;
use crate::entity::{Phase, TokenKind};
use alloy_primitives::Address;
use anyhow::Result;
use rusqlite::{Row, params};

pub struct TransactionRepository<'a> {
    conn: &'a rusqlite::Connection,
}

impl<'a> TransactionRepository<'a> {
    const INSERT_TRANSACTION: &'static str = "INSERT OR IGNORE INTO transactions (
            tx_hash, phase, log_index, block_number, from_address, to_address,
            recipient, value, token_amount, token_type, status, timestamp, gas_used
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)";

    const SELECT_TRANSACTION: &'static str = "SELECT tx_hash, log_index, block_number,
            from_address, to_address, recipient, value, token_amount, token_type,
            phase, status, timestamp, gas_used
        FROM transactions";

    pub fn new(conn: &'a rusqlite::Connection) -> Self {
        Self { conn }
    }

    /// Insert-or-ignore keyed on `(tx_hash, phase, log_index)`.
    /// Returns `true` when the record was new.
    pub fn upsert(&self, record: &TransactionRecord) -> Result<bool> {
        let inserted = self.conn.execute(
            Self::INSERT_TRANSACTION,
            params![
                format!("{:?}", record.tx_hash),
                record.phase.as_i64(),
                record.log_index,
                record.block_number,
                format!("{:?}", record.from_address),
                format!("{:?}", record.to_address),
                format!("{:?}", record.recipient),
                pad_amount(&record.value),
                pad_amount(&record.token_amount),
                record.token_kind.symbol(),
                record.status.as_str(),
                record.timestamp,
                record.gas_used,
            ],
        )?;
        Ok(inserted == 1)
    }

    /// Transactions crediting or sent by `address`, newest first.
    pub fn list_for_wallet(
        &self,
        address: &Address,
        limit: usize,
    ) -> Result<Vec<TransactionRecord>> {
        let address_str = format!("{address:?}");
        let query = format!(
            "{} WHERE recipient = ?1 OR from_address = ?1 OR to_address = ?1
             ORDER BY block_number DESC, log_index DESC LIMIT ?2",
            Self::SELECT_TRANSACTION
        );

        let mut stmt = self.conn.prepare(&query)?;
        let records = stmt
            .query_map(params![address_str, limit], Self::row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    pub fn list_recent(&self, limit: usize) -> Result<Vec<TransactionRecord>> {
        let query = format!(
            "{} ORDER BY block_number DESC, timestamp DESC, log_index DESC LIMIT ?1",
            Self::SELECT_TRANSACTION
        );

        let mut stmt = self.conn.prepare(&query)?;
        let records = stmt
            .query_map(params![limit], Self::row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    pub fn count(&self) -> Result<u64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn count_for_recipient(&self, address: &Address) -> Result<u64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM transactions WHERE recipient = ?1",
            params![format!("{address:?}")],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn row_to_record(row: &Row) -> rusqlite::Result<TransactionRecord> {
        let token_type: String = row.get(8)?;
        let token_kind = TokenKind::from_symbol(&token_type).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                8,
                rusqlite::types::Type::Text,
                format!("Unknown token type: {token_type}").into(),
            )
        })?;

        let phase_value: i64 = row.get(9)?;
        let phase = Phase::from_i64(phase_value)
            .ok_or(rusqlite::Error::IntegralValueOutOfRange(9, phase_value))?;

        let status: String = row.get(10)?;
        let status = TxStatus::parse(&status).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                10,
                rusqlite::types::Type::Text,
                format!("Unknown status: {status}").into(),
            )
        })?;

        Ok(TransactionRecord {
            tx_hash: parse_column(row, 0)?,
            log_index: row.get(1)?,
            block_number: row.get(2)?,
            from_address: parse_column(row, 3)?,
            to_address: parse_column(row, 4)?,
            recipient: parse_column(row, 5)?,
            value: amount_column(row, 6)?,
            token_amount: amount_column(row, 7)?,
            token_kind,
            phase,
            status,
            timestamp: row.get(11)?,
            gas_used: row.get(12)?,
        })
    }
}
