use alloy_primitives::utils::{format_ether, format_units};
use alloy_primitives::{Address, B256, Log, U256};
use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitoredTransaction {
    pub hash: B256,
    pub from: Address,
    pub to: Option<Address>,
    pub value: U256,
}

#[derive(Debug, Clone)]
pub struct MonitoredReceipt {
    /// `false` when the transaction reverted.
    pub success: bool,
    pub logs: Vec<Log>,
}

pub const UNKNOWN: &str = "Unknown";
pub const DEFAULT_DECIMALS: u8 = 18;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMetadata {
    pub address: Address,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: U256,
    /// Decimals the contract itself reported, used to scale the supply.
    pub supply_decimals: u8,
}

impl TokenMetadata {
    pub fn unknown(address: Address) -> Self {
        Self {
            address,
            name: UNKNOWN.to_string(),
            symbol: UNKNOWN.to_string(),
            decimals: DEFAULT_DECIMALS,
            total_supply: U256::ZERO,
            supply_decimals: DEFAULT_DECIMALS,
        }
    }

    pub fn supply(&self) -> TokenAmount {
        TokenAmount::new(self.total_supply, self.supply_decimals)
    }
}

/// An integer token quantity together with the precision used to display it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenAmount {
    pub raw: U256,
    pub decimals: u8,
}

impl TokenAmount {
    pub fn new(raw: U256, decimals: u8) -> Self {
        Self { raw, decimals }
    }

    pub fn is_zero(&self) -> bool {
        self.raw.is_zero()
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // format_units only supports up to 77 decimals
        let formatted =
            format_units(self.raw, self.decimals).unwrap_or_else(|_| self.raw.to_string());
        f.write_str(&trim_fraction(&formatted))
    }
}

fn trim_fraction(value: &str) -> String {
    match value.split_once('.') {
        Some((integer, fraction)) => {
            let fraction = fraction.trim_end_matches('0');
            if fraction.is_empty() {
                format!("{integer}.0")
            } else {
                format!("{integer}.{fraction}")
            }
        }
        None => format!("{value}.0"),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapAmounts {
    pub amount_in: TokenAmount,
    pub amount_out: TokenAmount,
}

impl SwapAmounts {
    /// Either side resolved to zero, which happens when both candidate slots were empty.
    pub fn is_degenerate(&self) -> bool {
        self.amount_in.is_zero() || self.amount_out.is_zero()
    }
}

#[derive(Debug, Clone)]
pub struct SwapReport {
    pub tx_hash: B256,
    pub from: Address,
    pub value: U256,
    pub token_a: TokenMetadata,
    pub token_b: TokenMetadata,
    pub amounts: SwapAmounts,
    pub explorer_url: String,
}

const SEPARATOR: &str = "---------------------------------";

fn unresolved_marker(amount: &TokenAmount) -> &'static str {
    if amount.is_zero() {
        " (unresolved)"
    } else {
        ""
    }
}

impl fmt::Display for SwapReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{SEPARATOR}")?;
        writeln!(f, "\tSwap detected from {}", self.from)?;
        writeln!(f, "\tTx: {}{:?}", self.explorer_url, self.tx_hash)?;
        writeln!(
            f,
            "\tSwap: {} {}{} -> {} {}{}",
            self.amounts.amount_in,
            self.token_a.symbol.to_uppercase(),
            unresolved_marker(&self.amounts.amount_in),
            self.amounts.amount_out,
            self.token_b.symbol.to_uppercase(),
            unresolved_marker(&self.amounts.amount_out)
        )?;
        for token in [&self.token_a, &self.token_b] {
            writeln!(
                f,
                "\t  |_{}:\tSupply: {}\t({})",
                token.name,
                token.supply(),
                token.decimals
            )?;
        }
        writeln!(f, "\tValue: {} ETH", format_ether(self.value))?;
        write!(f, "{SEPARATOR}")
    }
}

#[derive(Debug, Clone)]
pub enum Observation {
    WatchMatch {
        tx: MonitoredTransaction,
        observed_at: DateTime<Utc>,
    },
    Swap(Box<SwapReport>),
}

impl Observation {
    /// A watch match stamped with the current time.
    pub fn watch_match(tx: MonitoredTransaction) -> Self {
        Observation::WatchMatch {
            tx,
            observed_at: Utc::now(),
        }
    }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Observation::WatchMatch { tx, observed_at } => write!(
                f,
                "\tFrom: {} | {}\n\t\tTx Hash: {:?}",
                tx.from,
                observed_at.to_rfc3339_opts(SecondsFormat::Millis, true),
                tx.hash
            ),
            Observation::Swap(report) => write!(f, "{report}"),
        }
    }
}
