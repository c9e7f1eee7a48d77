use airdrop_indexer::amount::format_amount;
use airdrop_indexer::config::Config;
use airdrop_indexer::entity::EntityKind;
use airdrop_indexer::notifier::{BroadcastSink, NotificationSink};
use airdrop_indexer::repository::{Database, WalletRepository};
use airdrop_indexer::rpc::RpcClient;
use airdrop_indexer::scanner::{ScanEngine, ScanStatus, ScanSummary};
use alloy_primitives::Address;
use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use comfy_table::{Cell, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};
use serde_json::json;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Index airdrop claims and distributions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum EntityArg {
    Claim,
    Distribution,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one full scan up to the current chain height.
    Scan {
        #[arg(long)]
        from_block: Option<u64>,

        /// Print every notification as a JSON line on stdout.
        #[arg(long, default_value = "false")]
        emit_events: bool,
    },
    /// Scan, sleep, repeat until interrupted.
    Watch {
        #[arg(long)]
        interval_secs: Option<u64>,

        #[arg(long, default_value = "false")]
        emit_events: bool,
    },
    Status,
    /// Move a checkpoint to an arbitrary block, e.g. to re-scan a gap.
    Reset {
        #[arg(long, value_enum)]
        entity: EntityArg,

        #[arg(long)]
        block: u64,
    },
    Flag {
        address: String,
        reason: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so --emit-events output stays machine readable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = Config::from_env()?;
    info!("Configuration loaded");

    let db = Database::new(&config.database_url)?;
    db.seed_checkpoints(&config.watched_entities())?;
    info!("Database initialized");

    match cli.command {
        Commands::Scan {
            from_block,
            emit_events,
        } => {
            let (engine, forwarder) = build_engine(&config, db, emit_events)?;
            let summary = engine.run_full_scan(from_block).await;
            drop(engine);
            finish_forwarder(forwarder).await;

            println!("{}", summary_json(&summary));
            if !summary.success {
                return Err(anyhow::anyhow!(
                    "Scan failed: {}",
                    summary.error.unwrap_or_default()
                ));
            }
        }
        Commands::Watch {
            interval_secs,
            emit_events,
        } => {
            let interval = interval_secs
                .map(Duration::from_secs)
                .unwrap_or(config.poll_interval);
            let (engine, forwarder) = build_engine(&config, db, emit_events)?;
            info!("Watching for new events every {} seconds", interval.as_secs());

            tokio::select! {
                _ = engine.watch(interval) => {}
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal, stopping");
                }
            }

            drop(engine);
            finish_forwarder(forwarder).await;
        }
        Commands::Status => {
            let (engine, _) = build_engine(&config, db, false)?;
            let status = engine.get_status().await?;
            println!("{}", status_table(&status));
        }
        Commands::Reset { entity, block } => {
            let address = match entity {
                EntityArg::Claim => config.claim_contract_address,
                EntityArg::Distribution => config.distribution_wallet_address,
            };
            db.reset_checkpoint(&address, block)?;
            warn!("Checkpoint for {:?} reset to block {}", address, block);
        }
        Commands::Flag { address, reason } => {
            let address = Address::from_str(address.trim())
                .map_err(|_| anyhow::anyhow!("Invalid address format: {}", address))?;
            let flagged = db.with_conn(|conn| {
                WalletRepository::new(conn).flag_suspicious(&address, &reason)
            })?;
            if !flagged {
                return Err(anyhow::anyhow!("Wallet not found: {:?}", address));
            }
            info!("Flagged {:?} as suspicious: {}", address, reason);
        }
    }

    Ok(())
}

fn build_engine(
    config: &Config,
    db: Database,
    emit_events: bool,
) -> Result<(ScanEngine<RpcClient>, Option<JoinHandle<()>>)> {
    let client = RpcClient::new(&config.json_rpc_urls)?;
    info!(
        "RPC client ready with {} endpoint(s)",
        config.json_rpc_urls.len()
    );

    let engine = ScanEngine::new(client, db, config.watched_entities(), config.scan_settings()?)?;
    if !emit_events {
        return Ok((engine, None));
    }

    let sink = BroadcastSink::new(1024);
    let mut receiver = sink.subscribe();
    let forwarder = tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(notification) => println!("{}", notification.to_json_line()),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Event output lagged, {} notifications dropped", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let sink: Arc<dyn NotificationSink> = Arc::new(sink);
    Ok((engine.with_sink(sink), Some(forwarder)))
}

async fn finish_forwarder(forwarder: Option<JoinHandle<()>>) {
    if let Some(handle) = forwarder {
        if let Err(e) = handle.await {
            error!("Event forwarder failed: {}", e);
        }
    }
}

fn summary_json(summary: &ScanSummary) -> String {
    let entities: Vec<_> = summary
        .entities
        .iter()
        .map(|report| {
            json!({
                "entity": format!("{:?}", report.entity),
                "kind": report.kind.label(),
                "start_block": report.start_block,
                "last_block": report.last_block,
                "batches": report.batches,
                "skipped_batches": report.skipped_batches,
                "events": report.events,
            })
        })
        .collect();

    let value = json!({
        "success": summary.success,
        "events_found": summary.events_found,
        "total_value": format_amount(summary.total_value),
        "last_block_reached": summary.last_block_reached,
        "entities": entities,
        "error": summary.error,
        "started_at": summary.started_at.to_rfc3339(),
        "finished_at": summary.finished_at.to_rfc3339(),
    });
    serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string())
}

fn status_table(status: &ScanStatus) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            "Entity",
            "Address",
            "Last Block",
            "Transactions",
            "Progress",
        ]);

    for entity in &status.entities {
        let label = match entity.kind {
            EntityKind::ClaimContract => "Claim contract",
            EntityKind::DistributionWallet => "Distribution wallet",
        };
        table.add_row(vec![
            Cell::new(label),
            Cell::new(format!("{:?}", entity.entity)),
            Cell::new(entity.last_scanned_block),
            Cell::new(entity.transactions_recorded),
            Cell::new(format!("{:.2}%", entity.progress_percent)),
        ]);
    }

    format!(
        "{table}\nChain height: {} | Scanning: {} | Overall: {:.2}%",
        status.current_chain_height, status.is_scanning, status.progress_percent
    )
}
