use super::models::ScanCheckpoint;
use super::parse_column;
use alloy_primitives::Address;
use anyhow::Result;
use rusqlite::{OptionalExtension, Row, params};

pub struct CheckpointRepository<'a> {
    conn: &'a rusqlite::Connection,
}

impl<'a> CheckpointRepository<'a> {
    const SEED_CHECKPOINT: &'static str =
        "INSERT OR IGNORE INTO scan_progress (contract_address, last_block_scanned) VALUES (?1, 0)";

    // MAX() keeps the checkpoint monotonic even if a caller passes an older block.
    const ADVANCE_CHECKPOINT: &'static str = "UPDATE scan_progress SET
            last_block_scanned = MAX(last_block_scanned, ?1),
            total_transactions = total_transactions + ?2,
            last_update = CURRENT_TIMESTAMP
        WHERE contract_address = ?3";

    const RESET_CHECKPOINT: &'static str = "UPDATE scan_progress SET
            last_block_scanned = ?1,
            last_update = CURRENT_TIMESTAMP
        WHERE contract_address = ?2";

    const SET_SCANNING: &'static str =
        "UPDATE scan_progress SET is_scanning = ?1 WHERE contract_address = ?2";

    const SELECT_CHECKPOINT: &'static str = "SELECT contract_address, last_block_scanned,
            total_transactions, is_scanning, last_update
        FROM scan_progress";

    pub fn new(conn: &'a rusqlite::Connection) -> Self {
        Self { conn }
    }

    pub fn seed(&self, entity: &Address) -> Result<()> {
        self.conn
            .execute(Self::SEED_CHECKPOINT, params![format!("{entity:?}")])?;
        Ok(())
    }

    pub fn get(&self, entity: &Address) -> Result<Option<ScanCheckpoint>> {
        let query = format!("{} WHERE contract_address = ?1", Self::SELECT_CHECKPOINT);
        let checkpoint = self
            .conn
            .query_row(&query, params![format!("{entity:?}")], Self::row_to_checkpoint)
            .optional()?;
        Ok(checkpoint)
    }

    pub fn all(&self) -> Result<Vec<ScanCheckpoint>> {
        let query = format!("{} ORDER BY contract_address", Self::SELECT_CHECKPOINT);
        let mut stmt = self.conn.prepare(&query)?;
        let checkpoints = stmt
            .query_map([], Self::row_to_checkpoint)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(checkpoints)
    }

    /// Move the checkpoint forward to `block_number` and add `new_transactions`
    /// to the running counter. Never moves the checkpoint backwards.
    pub fn advance(
        &self,
        entity: &Address,
        block_number: u64,
        new_transactions: u64,
    ) -> Result<()> {
        let updated = self.conn.execute(
            Self::ADVANCE_CHECKPOINT,
            params![block_number, new_transactions, format!("{entity:?}")],
        )?;
        if updated == 0 {
            anyhow::bail!("No checkpoint row for entity {:?}", entity);
        }
        Ok(())
    }

    /// Administrative reset. The only way a checkpoint can decrease.
    pub fn reset(&self, entity: &Address, block_number: u64) -> Result<()> {
        let updated = self.conn.execute(
            Self::RESET_CHECKPOINT,
            params![block_number, format!("{entity:?}")],
        )?;
        if updated == 0 {
            anyhow::bail!("No checkpoint row for entity {:?}", entity);
        }
        Ok(())
    }

    pub fn set_scanning(&self, entity: &Address, scanning: bool) -> Result<()> {
        self.conn
            .execute(Self::SET_SCANNING, params![scanning, format!("{entity:?}")])?;
        Ok(())
    }

    fn row_to_checkpoint(row: &Row) -> rusqlite::Result<ScanCheckpoint> {
        Ok(ScanCheckpoint {
            entity_address: parse_column(row, 0)?,
            last_block_scanned: row.get(1)?,
            total_transactions: row.get(2)?,
            is_scanning: row.get(3)?,
            last_update: row.get(4)?,
        })
    }
}
