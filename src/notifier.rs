//! Push notifications for live dashboards.
//!
//! Publishing is fire-and-forget. Nothing in the scanner depends on a
//! subscriber being present, and subscribers must treat these messages as
//! hints and re-read the ledger for the source of truth.

use crate::amount::format_amount;
use crate::entity::TokenKind;
use crate::repository::AggregateStats;
use serde::Serialize;
use serde_json::json;
use tokio::sync::broadcast;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventNotice {
    #[serde(rename = "type")]
    pub token: TokenKind,
    pub tx_hash: String,
    pub recipient: String,
    /// Human-scaled amount, e.g. `"12.5"`.
    pub amount: String,
    pub block: u64,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub total_wallets: u64,
    pub phase1_wallets: u64,
    pub phase2_wallets: u64,
    pub overlapping_wallets: u64,
    pub total_w0g_distributed: String,
    pub total_0g_distributed: String,
    pub total_transactions: u64,
    pub last_block_scanned: u64,
    pub last_update: Option<String>,
}

impl From<&AggregateStats> for StatsSnapshot {
    fn from(stats: &AggregateStats) -> Self {
        Self {
            total_wallets: stats.total_wallets,
            phase1_wallets: stats.phase1_wallets,
            phase2_wallets: stats.phase2_wallets,
            overlapping_wallets: stats.overlapping_wallets,
            total_w0g_distributed: format_amount(stats.total_phase1_distributed),
            total_0g_distributed: format_amount(stats.total_phase2_distributed),
            total_transactions: stats.total_transactions,
            last_block_scanned: stats.last_block_scanned,
            last_update: stats.last_update.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanProgress {
    pub entity: String,
    pub current: u64,
    pub total: u64,
    pub percentage: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    NewClaim(EventNotice),
    NewTransfer(EventNotice),
    StatsUpdate(StatsSnapshot),
    ScanProgress(ScanProgress),
}

impl Notification {
    pub fn name(&self) -> &'static str {
        match self {
            Notification::NewClaim(_) => "new-claim",
            Notification::NewTransfer(_) => "new-transfer",
            Notification::StatsUpdate(_) => "stats-update",
            Notification::ScanProgress(_) => "scan-progress",
        }
    }

    pub fn payload(&self) -> serde_json::Value {
        let payload = match self {
            Notification::NewClaim(notice) | Notification::NewTransfer(notice) => {
                serde_json::to_value(notice)
            }
            Notification::StatsUpdate(stats) => serde_json::to_value(stats),
            Notification::ScanProgress(progress) => serde_json::to_value(progress),
        };
        payload.unwrap_or(serde_json::Value::Null)
    }

    /// `{"event": name, "payload": {...}}` on a single line.
    pub fn to_json_line(&self) -> String {
        json!({ "event": self.name(), "payload": self.payload() }).to_string()
    }
}

pub trait NotificationSink: Send + Sync {
    fn publish(&self, notification: Notification);
}

/// Default sink. Drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl NotificationSink for NoopSink {
    fn publish(&self, _notification: Notification) {}
}

/// Fan-out sink backed by a tokio broadcast channel.
///
/// Slow subscribers lag and lose messages instead of blocking the scanner.
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    sender: broadcast::Sender<Notification>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }
}

impl NotificationSink for BroadcastSink {
    fn publish(&self, notification: Notification) {
        // An error only means nobody is listening.
        let _ = self.sender.send(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notice() -> EventNotice {
        EventNotice {
            token: TokenKind::Native,
            tx_hash: "0xabc".to_string(),
            recipient: "0xdef".to_string(),
            amount: "12.5".to_string(),
            block: 7,
            timestamp: "2025-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn event_payload_uses_dashboard_field_names() {
        let line = Notification::NewTransfer(notice()).to_json_line();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["event"], "new-transfer");
        assert_eq!(value["payload"]["type"], "0G");
        assert_eq!(value["payload"]["txHash"], "0xabc");
        assert_eq!(value["payload"]["amount"], "12.5");
        assert_eq!(value["payload"]["block"], 7);
    }

    #[test]
    fn publishing_without_subscribers_is_harmless() {
        let sink = BroadcastSink::new(4);
        sink.publish(Notification::NewClaim(notice()));
        NoopSink.publish(Notification::NewClaim(notice()));
    }

    #[tokio::test]
    async fn broadcast_reaches_every_subscriber() {
        let sink = BroadcastSink::new(4);
        let mut first = sink.subscribe();
        let mut second = sink.subscribe();

        sink.publish(Notification::NewClaim(notice()));

        assert_eq!(first.recv().await.unwrap().name(), "new-claim");
        assert_eq!(second.recv().await.unwrap().name(), "new-claim");
    }
}
