//! Post-scan distribution report.

use crate::amount::format_amount;
use crate::repository::{AggregateStats, Wallet};
use alloy_primitives::U256;

/// Share of phase-1 tokens held by the top wallets above which the
/// distribution is reported as concentrated.
pub const CONCENTRATION_WARNING_PERCENT: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionReport {
    pub total_wallets: u64,
    pub phase1_wallets: u64,
    pub phase2_wallets: u64,
    pub overlapping_wallets: u64,
    pub average_phase1_amount: Option<U256>,
    /// Phase-1 share of the top wallets, in basis points.
    pub top_concentration_bps: Option<u64>,
}

impl DistributionReport {
    /// Build the report from aggregate stats and the top wallets by total.
    pub fn compute(stats: &AggregateStats, top_wallets: &[Wallet]) -> Self {
        let average_phase1_amount = (stats.phase1_wallets > 0)
            .then(|| stats.total_phase1_distributed / U256::from(stats.phase1_wallets));

        let top_phase1 = top_wallets
            .iter()
            .fold(U256::ZERO, |sum, w| sum.saturating_add(w.phase1_amount));

        let top_concentration_bps = (!stats.total_phase1_distributed.is_zero()).then(|| {
            let bps = top_phase1.saturating_mul(U256::from(10_000u64))
                / stats.total_phase1_distributed;
            bps.try_into().unwrap_or(u64::MAX)
        });

        Self {
            total_wallets: stats.total_wallets,
            phase1_wallets: stats.phase1_wallets,
            phase2_wallets: stats.phase2_wallets,
            overlapping_wallets: stats.overlapping_wallets,
            average_phase1_amount,
            top_concentration_bps,
        }
    }

    pub fn is_concentrated(&self) -> bool {
        self.top_concentration_bps
            .is_some_and(|bps| bps > CONCENTRATION_WARNING_PERCENT * 100)
    }

    pub fn concentration_percent(&self) -> Option<String> {
        self.top_concentration_bps
            .map(|bps| format!("{}.{:02}", bps / 100, bps % 100))
    }

    pub fn average_phase1_display(&self) -> Option<String> {
        self.average_phase1_amount.map(format_amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Address;

    fn stats(phase1_wallets: u64, total_phase1: u64) -> AggregateStats {
        AggregateStats {
            total_wallets: phase1_wallets,
            phase1_wallets,
            phase2_wallets: 0,
            overlapping_wallets: 0,
            suspicious_wallets: 0,
            total_phase1_distributed: U256::from(total_phase1),
            total_phase2_distributed: U256::ZERO,
            total_transactions: phase1_wallets,
            last_block_scanned: 0,
            last_update: None,
        }
    }

    fn wallet(phase1: u64) -> Wallet {
        Wallet {
            address: Address::ZERO,
            total_native_received: U256::ZERO,
            total_token_received: U256::from(phase1),
            phase1_amount: U256::from(phase1),
            phase2_amount: U256::ZERO,
            transaction_count: 1,
            first_transaction: None,
            last_transaction: None,
            is_suspicious: false,
            suspicious_reason: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn flags_concentrated_distribution() {
        let report = DistributionReport::compute(&stats(4, 1_000), &[wallet(400)]);
        assert_eq!(report.top_concentration_bps, Some(4_000));
        assert_eq!(report.concentration_percent().as_deref(), Some("40.00"));
        assert!(report.is_concentrated());
        assert_eq!(report.average_phase1_amount, Some(U256::from(250u64)));
    }

    #[test]
    fn even_distribution_is_not_flagged() {
        let report = DistributionReport::compute(&stats(10, 1_000), &[wallet(100), wallet(100)]);
        assert_eq!(report.concentration_percent().as_deref(), Some("20.00"));
        assert!(!report.is_concentrated());
    }

    #[test]
    fn empty_ledger_has_no_ratios() {
        let report = DistributionReport::compute(&stats(0, 0), &[]);
        assert_eq!(report.average_phase1_amount, None);
        assert_eq!(report.top_concentration_bps, None);
        assert!(!report.is_concentrated());
    }
}
