use crate::entity::WatchedEntity;
use crate::scanner::ScanSettings;
use alloy_primitives::Address;
use anyhow::{Context, Result};
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_RPC_URL: &str = "https://evmrpc.0g.ai";
const DEFAULT_CLAIM_CONTRACT: &str = "0x6A9c6b5507E322Aa00eb9c45e80c07AB63acabB6";
const DEFAULT_TOKEN_CONTRACT: &str = "0x1cd0690ff9a693f5ef2dd976660a8dafc81a109c";
const DEFAULT_ADMIN_WALLET: &str = "0xCcd7aF961cEDA6Bd383FeA1EcC2fFAa410d991E9";
const DEFAULT_DISTRIBUTION_WALLET: &str = "0xB03e8e11730228c2d03270bCD1Ab57818D7B6D8c";

/// First block worth scanning when no checkpoint exists.
const DEFAULT_GENESIS_BLOCK: u64 = 7_207_951;

#[derive(Debug, Clone)]
pub struct Config {
    pub json_rpc_urls: Vec<String>,
    pub database_url: String,
    pub claim_contract_address: Address,
    pub token_contract_address: Address,
    pub admin_wallet_address: Address,
    pub distribution_wallet_address: Address,
    pub genesis_block: u64,
    pub claim_batch_size: u64,
    pub distribution_batch_size: u64,
    pub batch_delay: Duration,
    pub rate_limit_cooldown: Duration,
    pub max_rate_limit_retries: u32,
    pub poll_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let json_rpc_urls = std::env::var("JSON_RPC_URLS")
            .or_else(|_| std::env::var("JSON_RPC_URL"))
            .unwrap_or_else(|_| DEFAULT_RPC_URL.to_string());
        let json_rpc_urls = parse_url_list(&json_rpc_urls);
        if json_rpc_urls.is_empty() {
            anyhow::bail!("JSON_RPC_URLS must contain at least one URL");
        }

        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:./airdrop.db".to_string());

        Ok(Config {
            json_rpc_urls,
            database_url,
            claim_contract_address: env_address("CLAIM_CONTRACT_ADDRESS", DEFAULT_CLAIM_CONTRACT)?,
            token_contract_address: env_address("TOKEN_CONTRACT_ADDRESS", DEFAULT_TOKEN_CONTRACT)?,
            admin_wallet_address: env_address("ADMIN_WALLET_ADDRESS", DEFAULT_ADMIN_WALLET)?,
            distribution_wallet_address: env_address(
                "DISTRIBUTION_WALLET_ADDRESS",
                DEFAULT_DISTRIBUTION_WALLET,
            )?,
            genesis_block: env_u64("SCAN_GENESIS_BLOCK", DEFAULT_GENESIS_BLOCK)?,
            claim_batch_size: env_u64("CLAIM_BATCH_SIZE", 10_000)?,
            distribution_batch_size: env_u64("DISTRIBUTION_BATCH_SIZE", 100)?,
            batch_delay: Duration::from_millis(env_u64("BATCH_DELAY_MS", 100)?),
            rate_limit_cooldown: Duration::from_secs(env_u64("RATE_LIMIT_COOLDOWN_SECS", 5)?),
            max_rate_limit_retries: env_u64("MAX_RATE_LIMIT_RETRIES", 10)?
                .try_into()
                .context("MAX_RATE_LIMIT_RETRIES is too large")?,
            poll_interval: Duration::from_secs(env_u64("POLL_INTERVAL_SECS", 12)?),
        })
    }

    /// Watched entities in scan order: claim contract, then distribution wallet.
    pub fn watched_entities(&self) -> Vec<WatchedEntity> {
        vec![
            WatchedEntity::claim_contract(
                self.claim_contract_address,
                self.token_contract_address,
                self.admin_wallet_address,
            ),
            WatchedEntity::distribution_wallet(self.distribution_wallet_address),
        ]
    }

    pub fn scan_settings(&self) -> Result<ScanSettings> {
        if self.claim_batch_size == 0 || self.distribution_batch_size == 0 {
            anyhow::bail!("Batch sizes must be greater than zero");
        }

        Ok(ScanSettings {
            genesis_block: self.genesis_block,
            claim_batch_size: self.claim_batch_size,
            distribution_batch_size: self.distribution_batch_size,
            batch_delay: self.batch_delay,
            rate_limit_cooldown: self.rate_limit_cooldown,
            max_rate_limit_retries: self.max_rate_limit_retries,
        })
    }
}

fn parse_url_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .collect()
}

fn env_address(name: &str, default: &str) -> Result<Address> {
    let raw = std::env::var(name).unwrap_or_else(|_| default.to_string());
    Address::from_str(raw.trim()).with_context(|| format!("Invalid {name} format"))
}

fn env_u64(name: &str, default: u64) -> Result<u64> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {name} (expected unsigned integer)")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_comma_separated_urls() {
        assert_eq!(
            parse_url_list(" https://a.example , ,https://b.example"),
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
        assert!(parse_url_list(" , ").is_empty());
    }

    #[test]
    fn default_addresses_parse() {
        for raw in [
            DEFAULT_CLAIM_CONTRACT,
            DEFAULT_TOKEN_CONTRACT,
            DEFAULT_ADMIN_WALLET,
            DEFAULT_DISTRIBUTION_WALLET,
        ] {
            assert!(Address::from_str(raw).is_ok(), "{raw}");
        }
    }
}
