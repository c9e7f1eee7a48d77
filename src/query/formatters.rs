use crate::amount::{
    TOTAL_SUPPLY_TOKENS, format_amount, format_grouped, group_digits, percent_of_supply,
};
use crate::repository::{AggregateStats, ScanCheckpoint, TransactionRecord, Wallet};
use alloy_primitives::U256;
use comfy_table::{Cell, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};
use csv::Writer;
use serde_json::{Value, json};

const UTF8_BOM: &str = "\u{feff}";

#[derive(Debug, Clone)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "csv" => OutputFormat::Csv,
            _ => OutputFormat::Table,
        }
    }
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(header);
    table
}

fn finish_csv(wtr: Writer<Vec<u8>>) -> String {
    String::from_utf8(wtr.into_inner().unwrap_or_default()).unwrap_or_default()
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string())
}

fn optional_block(block: Option<u64>) -> String {
    block.map_or("N/A".to_string(), |b| b.to_string())
}

pub fn format_stats(stats: &AggregateStats, format: &OutputFormat) -> String {
    let rows: Vec<(&str, String)> = vec![
        ("Total Wallets", stats.total_wallets.to_string()),
        ("Phase 1 Wallets", stats.phase1_wallets.to_string()),
        ("Phase 2 Wallets", stats.phase2_wallets.to_string()),
        ("Both Phases", stats.overlapping_wallets.to_string()),
        ("Suspicious Wallets", stats.suspicious_wallets.to_string()),
        ("W0G Distributed", format_amount(stats.total_phase1_distributed)),
        ("0G Distributed", format_amount(stats.total_phase2_distributed)),
        ("Total Transactions", stats.total_transactions.to_string()),
        ("Last Block Scanned", stats.last_block_scanned.to_string()),
        (
            "Last Update",
            stats.last_update.clone().unwrap_or_else(|| "N/A".to_string()),
        ),
    ];

    match format {
        OutputFormat::Table => {
            let mut table = new_table(vec!["Metric", "Value"]);
            for (metric, value) in rows {
                table.add_row(vec![Cell::new(metric), Cell::new(value)]);
            }
            table.to_string()
        }
        OutputFormat::Json => pretty(&json!({
            "total_wallets": stats.total_wallets,
            "phase1_wallets": stats.phase1_wallets,
            "phase2_wallets": stats.phase2_wallets,
            "overlapping_wallets": stats.overlapping_wallets,
            "suspicious_wallets": stats.suspicious_wallets,
            "total_w0g_distributed": format_amount(stats.total_phase1_distributed),
            "total_w0g_distributed_wei": stats.total_phase1_distributed.to_string(),
            "total_0g_distributed": format_amount(stats.total_phase2_distributed),
            "total_0g_distributed_wei": stats.total_phase2_distributed.to_string(),
            "total_transactions": stats.total_transactions,
            "last_block_scanned": stats.last_block_scanned,
            "last_update": stats.last_update,
        })),
        OutputFormat::Csv => {
            let mut wtr = Writer::from_writer(vec![]);
            let _ = wtr.write_record(["metric", "value"]);
            for (metric, value) in rows {
                let key = metric.to_lowercase().replace(' ', "_");
                let _ = wtr.write_record([key.as_str(), value.as_str()]);
            }
            finish_csv(wtr)
        }
    }
}

fn wallet_json(wallet: &Wallet) -> Value {
    json!({
        "address": format!("{:?}", wallet.address),
        // Phase 1 is shown as the raw smallest-unit integer, phase 2 human-scaled.
        "phase1_amount": wallet.phase1_amount.to_string(),
        "phase1_amount_formatted": format_amount(wallet.phase1_amount),
        "phase2_amount": format_amount(wallet.phase2_amount),
        "phase2_amount_wei": wallet.phase2_amount.to_string(),
        "total_amount": format_amount(wallet.total_amount()),
        "transaction_count": wallet.transaction_count,
        "first_transaction": wallet.first_transaction,
        "last_transaction": wallet.last_transaction,
        "is_suspicious": wallet.is_suspicious,
        "suspicious_reason": wallet.suspicious_reason,
        "created_at": wallet.created_at,
        "updated_at": wallet.updated_at,
    })
}

pub fn format_wallets(wallets: &[Wallet], format: &OutputFormat) -> String {
    match format {
        OutputFormat::Table => {
            if wallets.is_empty() {
                return "No wallets found.".to_string();
            }
            let mut table = new_table(vec![
                "Rank",
                "Address",
                "W0G (Phase 1)",
                "0G (Phase 2)",
                "Total",
                "Txs",
                "Flag",
            ]);
            for (i, wallet) in wallets.iter().enumerate() {
                table.add_row(vec![
                    Cell::new(i + 1),
                    Cell::new(format!("{:?}", wallet.address)),
                    Cell::new(format_amount(wallet.phase1_amount)),
                    Cell::new(format_amount(wallet.phase2_amount)),
                    Cell::new(format_amount(wallet.total_amount())),
                    Cell::new(wallet.transaction_count),
                    Cell::new(if wallet.is_suspicious { "!" } else { "" }),
                ]);
            }
            table.to_string()
        }
        OutputFormat::Json => pretty(&Value::Array(wallets.iter().map(wallet_json).collect())),
        OutputFormat::Csv => {
            let mut wtr = Writer::from_writer(vec![]);
            let _ = wtr.write_record([
                "address",
                "phase1_amount_wei",
                "phase2_amount_wei",
                "total_amount",
                "transaction_count",
                "is_suspicious",
            ]);
            for wallet in wallets {
                let _ = wtr.write_record([
                    &format!("{:?}", wallet.address),
                    &wallet.phase1_amount.to_string(),
                    &wallet.phase2_amount.to_string(),
                    &format_amount(wallet.total_amount()),
                    &wallet.transaction_count.to_string(),
                    &wallet.is_suspicious.to_string(),
                ]);
            }
            finish_csv(wtr)
        }
    }
}

pub fn format_wallet_detail(
    wallet: &Wallet,
    transactions: &[TransactionRecord],
    format: &OutputFormat,
) -> String {
    match format {
        OutputFormat::Table => {
            let mut table = new_table(vec!["Field", "Value"]);
            table.add_row(vec![Cell::new("Address"), Cell::new(format!("{:?}", wallet.address))]);
            table.add_row(vec![
                Cell::new("Phase 1 (raw W0G)"),
                Cell::new(wallet.phase1_amount.to_string()),
            ]);
            table.add_row(vec![
                Cell::new("Phase 2 (0G)"),
                Cell::new(format_amount(wallet.phase2_amount)),
            ]);
            table.add_row(vec![
                Cell::new("Total"),
                Cell::new(format_amount(wallet.total_amount())),
            ]);
            table.add_row(vec![
                Cell::new("Transactions"),
                Cell::new(wallet.transaction_count),
            ]);
            table.add_row(vec![
                Cell::new("First Transaction"),
                Cell::new(optional_block(wallet.first_transaction)),
            ]);
            table.add_row(vec![
                Cell::new("Last Transaction"),
                Cell::new(optional_block(wallet.last_transaction)),
            ]);
            if wallet.is_suspicious {
                table.add_row(vec![
                    Cell::new("Suspicious"),
                    Cell::new(wallet.suspicious_reason.as_deref().unwrap_or("yes")),
                ]);
            }
            format!(
                "{table}\n{}",
                format_transactions(transactions, &OutputFormat::Table)
            )
        }
        OutputFormat::Json => {
            let mut value = wallet_json(wallet);
            value["transactions"] =
                Value::Array(transactions.iter().map(transaction_json).collect());
            pretty(&value)
        }
        OutputFormat::Csv => format_transactions(transactions, format),
    }
}

fn transaction_json(record: &TransactionRecord) -> Value {
    json!({
        "tx_hash": format!("{:?}", record.tx_hash),
        "log_index": record.log_index,
        "block_number": record.block_number,
        "from": format!("{:?}", record.from_address),
        "to": format!("{:?}", record.to_address),
        "recipient": format!("{:?}", record.recipient),
        "amount": format_amount(record.token_amount),
        "amount_wei": record.token_amount.to_string(),
        "token_type": record.token_kind.symbol(),
        "phase": record.phase.as_i64(),
        "status": record.status.as_str(),
        "timestamp": record.timestamp,
        "gas_used": record.gas_used,
    })
}

pub fn format_transactions(records: &[TransactionRecord], format: &OutputFormat) -> String {
    match format {
        OutputFormat::Table => {
            if records.is_empty() {
                return "No transactions found.".to_string();
            }
            let mut table = new_table(vec![
                "Block",
                "Phase",
                "Recipient",
                "Amount",
                "Token",
                "Tx Hash",
            ]);
            for record in records {
                table.add_row(vec![
                    Cell::new(record.block_number),
                    Cell::new(record.phase.as_i64()),
                    Cell::new(format!("{:?}", record.recipient)),
                    Cell::new(format_amount(record.token_amount)),
                    Cell::new(record.token_kind.symbol()),
                    Cell::new(format_tx_hash(&format!("{:?}", record.tx_hash))),
                ]);
            }
            table.to_string()
        }
        OutputFormat::Json => pretty(&Value::Array(records.iter().map(transaction_json).collect())),
        OutputFormat::Csv => {
            let mut wtr = Writer::from_writer(vec![]);
            let _ = wtr.write_record([
                "block_number",
                "tx_hash",
                "log_index",
                "phase",
                "from",
                "recipient",
                "amount",
                "amount_wei",
                "token_type",
                "timestamp",
            ]);
            for record in records {
                let _ = wtr.write_record([
                    &record.block_number.to_string(),
                    &format!("{:?}", record.tx_hash),
                    &record.log_index.to_string(),
                    &record.phase.as_i64().to_string(),
                    &format!("{:?}", record.from_address),
                    &format!("{:?}", record.recipient),
                    &format_amount(record.token_amount),
                    &record.token_amount.to_string(),
                    &record.token_kind.symbol().to_string(),
                    &record.timestamp.to_string(),
                ]);
            }
            finish_csv(wtr)
        }
    }
}

pub fn format_checkpoints(checkpoints: &[ScanCheckpoint], format: &OutputFormat) -> String {
    match format {
        OutputFormat::Table => {
            if checkpoints.is_empty() {
                return "No checkpoints found. Run migrate first.".to_string();
            }
            let mut table = new_table(vec![
                "Entity",
                "Last Block",
                "Transactions",
                "Scanning",
                "Last Update",
            ]);
            for checkpoint in checkpoints {
                table.add_row(vec![
                    Cell::new(format!("{:?}", checkpoint.entity_address)),
                    Cell::new(checkpoint.last_block_scanned),
                    Cell::new(checkpoint.total_transactions),
                    Cell::new(checkpoint.is_scanning),
                    Cell::new(&checkpoint.last_update),
                ]);
            }
            table.to_string()
        }
        OutputFormat::Json => pretty(&Value::Array(
            checkpoints
                .iter()
                .map(|c| {
                    json!({
                        "entity": format!("{:?}", c.entity_address),
                        "last_block_scanned": c.last_block_scanned,
                        "total_transactions": c.total_transactions,
                        "is_scanning": c.is_scanning,
                        "last_update": c.last_update,
                    })
                })
                .collect(),
        )),
        OutputFormat::Csv => {
            let mut wtr = Writer::from_writer(vec![]);
            let _ = wtr.write_record([
                "entity",
                "last_block_scanned",
                "total_transactions",
                "is_scanning",
                "last_update",
            ]);
            for c in checkpoints {
                let _ = wtr.write_record([
                    &format!("{:?}", c.entity_address),
                    &c.last_block_scanned.to_string(),
                    &c.total_transactions.to_string(),
                    &c.is_scanning.to_string(),
                    &c.last_update,
                ]);
            }
            finish_csv(wtr)
        }
    }
}

/// Spreadsheet export of every wallet, with a UTF-8 BOM and a TOTAL row.
pub fn format_wallet_export(wallets: &[Wallet]) -> String {
    let supply_header = format!("% of {} Supply", group_digits(&TOTAL_SUPPLY_TOKENS.to_string()));
    let mut wtr = Writer::from_writer(vec![]);
    let _ = wtr.write_record([
        "Wallet Address",
        "Phase 1 (W0G)",
        "Phase 2 (0G)",
        "Total Tokens",
        supply_header.as_str(),
        "Transaction Count",
    ]);

    let mut total_phase1 = U256::ZERO;
    let mut total_phase2 = U256::ZERO;
    let mut total_transactions = 0u64;

    for wallet in wallets {
        total_phase1 = total_phase1.saturating_add(wallet.phase1_amount);
        total_phase2 = total_phase2.saturating_add(wallet.phase2_amount);
        total_transactions += wallet.transaction_count;

        let _ = wtr.write_record([
            &format!("{:?}", wallet.address),
            &format_grouped(wallet.phase1_amount),
            &format_grouped(wallet.phase2_amount),
            &format_grouped(wallet.total_amount()),
            &format!("{}%", percent_of_supply(wallet.total_amount())),
            &wallet.transaction_count.to_string(),
        ]);
    }

    let total = total_phase1.saturating_add(total_phase2);
    let _ = wtr.write_record(["", "", "", "", "", ""]);
    let _ = wtr.write_record([
        "TOTAL",
        &format_grouped(total_phase1),
        &format_grouped(total_phase2),
        &format_grouped(total),
        &format!("{}%", percent_of_supply(total)),
        &total_transactions.to_string(),
    ]);

    format!("{UTF8_BOM}{}", finish_csv(wtr))
}

pub fn format_methodology() -> String {
    let mut table = new_table(vec!["Phase", "Source", "Rule"]);
    table.add_row(vec![
        Cell::new("1 (W0G)"),
        Cell::new("Transfer logs on the token contract into the claim contract"),
        Cell::new(
            "Counted only when the log sender is the claim contract or the admin wallet; \
             credited to the transaction sender",
        ),
    ]);
    table.add_row(vec![
        Cell::new("2 (0G)"),
        Cell::new("Transactions sent by the distribution wallet"),
        Cell::new("Zero-value transactions and contract creations are ignored"),
    ]);
    table.add_row(vec![
        Cell::new("Both"),
        Cell::new("Scan checkpoints"),
        Cell::new(
            "Each batch is stored before its checkpoint moves; re-scans never double count",
        ),
    ]);
    table.to_string()
}

fn format_tx_hash(hash: &str) -> String {
    if hash.len() <= 10 {
        return hash.to_string();
    }
    format!("{}...{}", &hash[..6], &hash[hash.len() - 4..])
}
