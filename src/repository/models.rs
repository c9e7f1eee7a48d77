use crate::entity::{Phase, TokenKind};
use alloy_primitives::{Address, B256, U256};

/// Value of the `status` column.
///
/// The scanner only records confirmed transfers, so it always writes
/// `Success`. `Failed` and `Pending` are read back from rows that other
/// tools write into the same `transactions` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStatus {
    Success,
    Failed,
    Pending,
}

impl TxStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TxStatus::Success => "success",
            TxStatus::Failed => "failed",
            TxStatus::Pending => "pending",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "success" => Some(TxStatus::Success),
            "failed" => Some(TxStatus::Failed),
            "pending" => Some(TxStatus::Pending),
            _ => None,
        }
    }
}

/// One consumed on-chain event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    pub tx_hash: B256,
    /// Log index for claim events, 0 for native transfers.
    pub log_index: u64,
    pub block_number: u64,
    pub from_address: Address,
    pub to_address: Address,
    /// Wallet credited by this record.
    pub recipient: Address,
    /// Native value carried by the transaction.
    pub value: U256,
    /// Amount credited to the recipient, in the token's smallest unit.
    pub token_amount: U256,
    pub token_kind: TokenKind,
    pub phase: Phase,
    pub status: TxStatus,
    pub timestamp: u64,
    pub gas_used: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wallet {
    pub address: Address,
    pub total_native_received: U256,
    pub total_token_received: U256,
    pub phase1_amount: U256,
    pub phase2_amount: U256,
    pub transaction_count: u64,
    pub first_transaction: Option<u64>,
    pub last_transaction: Option<u64>,
    pub is_suspicious: bool,
    pub suspicious_reason: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Wallet {
    pub fn total_amount(&self) -> U256 {
        self.phase1_amount.saturating_add(self.phase2_amount)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanCheckpoint {
    pub entity_address: Address,
    pub last_block_scanned: u64,
    pub total_transactions: u64,
    pub is_scanning: bool,
    pub last_update: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateStats {
    pub total_wallets: u64,
    pub phase1_wallets: u64,
    pub phase2_wallets: u64,
    pub overlapping_wallets: u64,
    pub suspicious_wallets: u64,
    pub total_phase1_distributed: U256,
    pub total_phase2_distributed: U256,
    pub total_transactions: u64,
    pub last_block_scanned: u64,
    pub last_update: Option<String>,
}
