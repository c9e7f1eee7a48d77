use airdrop_indexer::config::Config;
use airdrop_indexer::query::commands::{
    cmd_checkpoints, cmd_export, cmd_methodology, cmd_search, cmd_stats, cmd_top_wallets,
    cmd_transactions, cmd_wallet, cmd_wallets,
};
use airdrop_indexer::query::formatters::OutputFormat;
use airdrop_indexer::repository::{Database, WalletFilter};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "query")]
#[command(about = "Query indexed airdrop data", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "table")]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Stats,
    Wallets {
        #[arg(long)]
        search: Option<String>,

        #[arg(long, default_value = "100")]
        limit: usize,

        #[arg(long, default_value = "0")]
        offset: usize,
    },
    Wallet {
        address: String,

        #[arg(long, default_value = "100")]
        limit: usize,
    },
    Transactions {
        #[arg(long, default_value = "50")]
        limit: usize,
    },
    TopWallets {
        #[arg(default_value = "10")]
        count: usize,
    },
    Search {
        query: String,

        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Export every wallet as CSV with percentage of total supply.
    Export {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    Checkpoints,
    Methodology,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let format = OutputFormat::from(cli.format.as_str());

    if let Commands::Methodology = cli.command {
        println!("{}", cmd_methodology());
        return Ok(());
    }

    let config = Config::from_env()?;
    let db = Database::new(&config.database_url)?;

    let output = match cli.command {
        Commands::Stats => cmd_stats(&db, &format)?,
        Commands::Wallets {
            search,
            limit,
            offset,
        } => {
            let filter = WalletFilter {
                search,
                limit,
                offset,
            };
            cmd_wallets(&db, &filter, &format)?
        }
        Commands::Wallet { address, limit } => cmd_wallet(&db, &address, limit, &format)?,
        Commands::Transactions { limit } => cmd_transactions(&db, limit, &format)?,
        Commands::TopWallets { count } => cmd_top_wallets(&db, count, &format)?,
        Commands::Search { query, limit } => cmd_search(&db, &query, limit, &format)?,
        Commands::Export { output } => cmd_export(&db, output.as_deref())?,
        Commands::Checkpoints => cmd_checkpoints(&db, &format)?,
        Commands::Methodology => cmd_methodology(),
    };
    println!("{output}");

    Ok(())
}
