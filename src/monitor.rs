use crate::correlator::{Correlation, correlate};
use crate::models::{MonitoredTransaction, Observation, SwapReport, TokenMetadata};
use crate::normalizer::normalize;
use crate::rpc::ChainClient;
use crate::seen::SeenTransactions;
use crate::token::fetch_token_metadata;
use crate::watchlist::Watchlist;
use alloy_primitives::Address;
use anyhow::Result;
use tracing::{debug, info, warn};

#[derive(Debug)]
pub enum Classification {
    /// No receipt yet; the transaction has not been mined.
    Pending,
    NotASwap,
    Swap(Box<SwapReport>),
}

pub struct Monitor<C> {
    client: C,
    watchlist: Watchlist,
    explorer_url: String,
}

impl<C: ChainClient> Monitor<C> {
    pub fn new(client: C, watchlist: Watchlist, explorer_url: impl Into<String>) -> Self {
        Monitor {
            client,
            watchlist,
            explorer_url: explorer_url.into(),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Inspects every transaction of a block in block order.
    pub async fn process_block(&self, block_number: u64) -> Result<Vec<Observation>> {
        let Some(hashes) = self
            .client
            .get_block_transaction_hashes(block_number)
            .await?
        else {
            warn!("Block {} not found", block_number);
            return Ok(Vec::new());
        };

        if hashes.is_empty() {
            return Ok(Vec::new());
        }
        info!("New block: {} | {} txns", block_number, hashes.len());

        let mut observations = Vec::new();
        for hash in hashes {
            let Some(tx) = self.client.get_transaction(hash).await? else {
                debug!("Transaction {:?} disappeared before lookup", hash);
                continue;
            };

            if !self.watchlist.is_monitored_sender(&tx.from) {
                continue;
            }
            info!("Watched address {} sent {:?}", tx.from, tx.hash);
            observations.push(Observation::watch_match(tx.clone()));

            if !self.watchlist.is_router_recipient(tx.to.as_ref()) {
                continue;
            }

            match self.classify(&tx).await? {
                Classification::Swap(report) => observations.push(Observation::Swap(report)),
                Classification::NotASwap => {
                    debug!("Router call {:?} is not a recognized swap", tx.hash)
                }
                Classification::Pending => {
                    warn!("No receipt for mined transaction {:?}", tx.hash)
                }
            }
        }

        Ok(observations)
    }

    /// One pass over the pending pool. Hashes recorded in `seen` are never reported twice.
    pub async fn poll_pending(&self, seen: &mut SeenTransactions) -> Result<Vec<Observation>> {
        let pending = self.client.pending_transactions().await?;

        let mut observations = Vec::new();
        for tx in pending {
            if seen.contains(&tx.hash) || !self.watchlist.is_monitored_sender(&tx.from) {
                continue;
            }

            match self.classify(&tx).await? {
                Classification::Pending => {
                    debug!("Pending transaction {:?} has no receipt yet", tx.hash);
                }
                Classification::NotASwap => {
                    seen.insert(tx.hash);
                }
                Classification::Swap(report) => {
                    seen.insert(tx.hash);
                    observations.push(Observation::Swap(report));
                }
            }
        }

        Ok(observations)
    }

    pub async fn classify(&self, tx: &MonitoredTransaction) -> Result<Classification> {
        let Some(receipt) = self.client.get_transaction_receipt(tx.hash).await? else {
            return Ok(Classification::Pending);
        };
        if !receipt.success {
            debug!("Transaction {:?} reverted", tx.hash);
            return Ok(Classification::NotASwap);
        }

        let correlated = match correlate(&receipt.logs) {
            Correlation::Swap(correlated) => correlated,
            Correlation::NotASwap => return Ok(Classification::NotASwap),
        };

        let (address_a, address_b) = correlated.token_pair();
        let (token_a, token_b) = tokio::join!(
            self.resolve_token(address_a),
            self.resolve_token(address_b)
        );

        let amounts = match normalize(&correlated.swaps, &token_a, &token_b) {
            Ok(amounts) => amounts,
            Err(e) => {
                debug!("Skipping {:?}: {}", tx.hash, e);
                return Ok(Classification::NotASwap);
            }
        };
        if amounts.is_degenerate() {
            warn!(
                "Swap {:?} has a side with no non-zero amount, reporting it as unresolved",
                tx.hash
            );
        }

        Ok(Classification::Swap(Box::new(SwapReport {
            tx_hash: tx.hash,
            from: tx.from,
            value: tx.value,
            token_a,
            token_b,
            amounts,
            explorer_url: self.explorer_url.clone(),
        })))
    }

    /// Unreadable fields fall back to their defaults one by one.
    async fn resolve_token(&self, address: Address) -> TokenMetadata {
        let (token, errors) = fetch_token_metadata(&self.client, address).await;
        for e in errors {
            warn!("Using default metadata for token {:?}: {}", address, e);
        }
        token
    }
}
