use crate::query::formatters::{
    OutputFormat, format_checkpoints, format_methodology, format_stats, format_transactions,
    format_wallet_detail, format_wallet_export, format_wallets,
};
use crate::repository::{
    CheckpointRepository, Database, TransactionRepository, WalletFilter, WalletRepository,
};
use alloy_primitives::Address;
use anyhow::{Context, Result};
use std::path::Path;
use std::str::FromStr;

fn parse_address(address: &str) -> Result<Address> {
    Address::from_str(address.trim())
        .map_err(|_| anyhow::anyhow!("Invalid address format: {}", address))
}

pub fn cmd_stats(db: &Database, format: &OutputFormat) -> Result<String> {
    let stats = db.aggregate_stats()?;
    Ok(format_stats(&stats, format))
}

pub fn cmd_wallets(db: &Database, filter: &WalletFilter, format: &OutputFormat) -> Result<String> {
    let wallets = db.with_conn(|conn| WalletRepository::new(conn).list(filter))?;
    Ok(format_wallets(&wallets, format))
}

pub fn cmd_wallet(
    db: &Database,
    address: &str,
    limit: usize,
    format: &OutputFormat,
) -> Result<String> {
    let address = parse_address(address)?;
    let (wallet, transactions) = db.with_conn(|conn| {
        Ok((
            WalletRepository::new(conn).get(&address)?,
            TransactionRepository::new(conn).list_for_wallet(&address, limit)?,
        ))
    })?;

    match wallet {
        Some(wallet) => Ok(format_wallet_detail(&wallet, &transactions, format)),
        None => Err(anyhow::anyhow!("Wallet not found: {:?}", address)),
    }
}

pub fn cmd_transactions(db: &Database, limit: usize, format: &OutputFormat) -> Result<String> {
    let records = db.with_conn(|conn| TransactionRepository::new(conn).list_recent(limit))?;
    Ok(format_transactions(&records, format))
}

pub fn cmd_top_wallets(db: &Database, count: usize, format: &OutputFormat) -> Result<String> {
    let wallets = db.with_conn(|conn| WalletRepository::new(conn).top(count))?;
    Ok(format_wallets(&wallets, format))
}

pub fn cmd_search(
    db: &Database,
    needle: &str,
    limit: usize,
    format: &OutputFormat,
) -> Result<String> {
    if needle.trim().is_empty() {
        return Err(anyhow::anyhow!("Search query must not be empty"));
    }
    let wallets = db.with_conn(|conn| WalletRepository::new(conn).search(needle, limit))?;
    Ok(format_wallets(&wallets, format))
}

/// Export every wallet as CSV. Writes to `output` when given, otherwise
/// returns the document for printing.
pub fn cmd_export(db: &Database, output: Option<&Path>) -> Result<String> {
    let wallets = db.with_conn(|conn| {
        WalletRepository::new(conn).list(&WalletFilter {
            search: None,
            limit: usize::MAX >> 1,
            offset: 0,
        })
    })?;
    let document = format_wallet_export(&wallets);

    match output {
        Some(path) => {
            std::fs::write(path, &document)
                .with_context(|| format!("Failed to write export to {}", path.display()))?;
            Ok(format!(
                "Exported {} wallets to {}",
                wallets.len(),
                path.display()
            ))
        }
        None => Ok(document),
    }
}

pub fn cmd_checkpoints(db: &Database, format: &OutputFormat) -> Result<String> {
    let checkpoints = db.with_conn(|conn| CheckpointRepository::new(conn).all())?;
    Ok(format_checkpoints(&checkpoints, format))
}

pub fn cmd_methodology() -> String {
    format_methodology()
}
