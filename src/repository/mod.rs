pub mod checkpoint_repository;
pub mod database;
pub mod models;
pub mod transaction_repository;
pub mod wallet_repository;

pub use checkpoint_repository::CheckpointRepository;
pub use database::Database;
pub use models::{AggregateStats, ScanCheckpoint, TransactionRecord, TxStatus, Wallet};
pub use transaction_repository::TransactionRepository;
pub use wallet_repository::{WalletFilter, WalletRepository};

use std::str::FromStr;

/// Parse a text column, mapping failures to a rusqlite conversion error.
pub(crate) fn parse_column<T>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    T::from_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Parse a zero-padded amount column.
pub(crate) fn amount_column(
    row: &rusqlite::Row,
    idx: usize,
) -> rusqlite::Result<alloy_primitives::U256> {
    let raw: String = row.get(idx)?;
    crate::amount::unpad_amount(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, e.into())
    })
}
