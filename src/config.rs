use crate::watchlist::Watchlist;
use alloy_primitives::{Address, address};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_WATCHLIST: [Address; 8] = [
    address!("b0ba33566bd35bcb80738810b2868dc1ddd1f0e9"),
    address!("3b40af8e80b09f4a54b1eb763031d4880f765bdc"),
    address!("ab7b44ae25af88d306dc0a5c6c39bbeb8916eabb"),
    address!("49c543e8873aeda1b60c176f55a78fc62f9c9fbb"),
    address!("3ccce09b4ad94968f269375c0999134a6617f795"),
    address!("acbcb2724cfafb839c752d71997a8a7a16989b2e"),
    address!("16d59f67bd39ac0d952e48648548217b62183403"),
    // jaredfromsubway.eth
    address!("ae2fc483527b8ef99eb5d9b44875f005ba1fae13"),
];

// Uniswap V2 Router02
pub const DEFAULT_ROUTER: Address = address!("7a250d5630b4cf539739df2c5dacb4c659f2488d");

#[derive(Debug, Clone)]
pub struct Config {
    pub ws_rpc_urls: Vec<String>,
    pub watched_addresses: Vec<Address>,
    pub router_address: Address,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub max_retries: usize,
    pub seen_tx_ttl: Duration,
    pub explorer_tx_url: String,
}

#[derive(Debug, Deserialize)]
struct WatchlistFile {
    addresses: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let ws_rpc_urls: Vec<String> = lookup("WS_RPC_URLS")
            .context("WS_RPC_URLS must be set in .env")?
            .split(',')
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(String::from)
            .collect();
        if ws_rpc_urls.is_empty() {
            anyhow::bail!("WS_RPC_URLS must contain at least one endpoint");
        }

        let mut watched_addresses = match lookup("WATCHED_ADDRESSES") {
            Some(list) => parse_address_list(list.split(','))
                .context("Invalid WATCHED_ADDRESSES format")?,
            None => DEFAULT_WATCHLIST.to_vec(),
        };

        if let Some(path) = lookup("WATCHLIST_PATH") {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read watchlist file {path}"))?;
            let file: WatchlistFile = serde_json::from_str(&contents)
                .with_context(|| format!("Invalid watchlist file {path}"))?;
            let extra = parse_address_list(file.addresses.iter().map(String::as_str))
                .with_context(|| format!("Invalid address in watchlist file {path}"))?;
            watched_addresses.extend(extra);
        }
        watched_addresses.sort();
        watched_addresses.dedup();

        let router_address = match lookup("ROUTER_ADDRESS") {
            Some(value) => {
                Address::from_str(value.trim()).context("Invalid ROUTER_ADDRESS format")?
            }
            None => DEFAULT_ROUTER,
        };

        let poll_interval =
            Duration::from_millis(parse_or(&lookup, "PENDING_POLL_INTERVAL_MS", 1000)?);
        if poll_interval.is_zero() {
            anyhow::bail!("PENDING_POLL_INTERVAL_MS must be greater than zero");
        }
        let request_timeout = Duration::from_secs(parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 30)?);
        let max_retries = parse_or(&lookup, "MAX_RETRIES", 5)?;
        let seen_tx_ttl = Duration::from_secs(parse_or(&lookup, "SEEN_TX_TTL_SECS", 600)?);

        let explorer_tx_url =
            lookup("EXPLORER_TX_URL").unwrap_or_else(|| "https://etherscan.io/tx/".to_string());

        Ok(Config {
            ws_rpc_urls,
            watched_addresses,
            router_address,
            poll_interval,
            request_timeout,
            max_retries,
            seen_tx_ttl,
            explorer_tx_url,
        })
    }

    pub fn watchlist(&self) -> Watchlist {
        Watchlist::new(self.watched_addresses.iter().copied(), self.router_address)
    }
}

fn parse_address_list<'a>(values: impl Iterator<Item = &'a str>) -> Result<Vec<Address>> {
    values
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| {
            Address::from_str(value).with_context(|| format!("Invalid address: {value}"))
        })
        .collect()
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .with_context(|| format!("Invalid {key} value: {value}")),
        None => Ok(default),
    }
}
