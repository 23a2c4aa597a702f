//! Picks the transfer and swap logs out of a receipt.
//!
//! The traded pair is taken from the first and last transfer logs. For direct
//! single-pool swaps those are the input and output tokens; multi-hop routes
//! through the router may report an intermediate token instead.

use crate::events::{SWAP_TOPIC, TRANSFER_TOPIC, topic0};
use alloy_primitives::{Address, Log};

#[derive(Debug)]
pub struct CorrelatedLogs<'a> {
    pub transfers: Vec<&'a Log>,
    pub swaps: Vec<&'a Log>,
}

impl CorrelatedLogs<'_> {
    /// Token contracts emitting the first and the last transfer.
    pub fn token_pair(&self) -> (Address, Address) {
        // Both lists are non-empty by construction.
        let first = self.transfers[0].address;
        let last = self.transfers[self.transfers.len() - 1].address;
        (first, last)
    }
}

#[derive(Debug)]
pub enum Correlation<'a> {
    Swap(CorrelatedLogs<'a>),
    NotASwap,
}

pub fn correlate(logs: &[Log]) -> Correlation<'_> {
    let mut transfers = Vec::new();
    let mut swaps = Vec::new();

    for log in logs {
        match topic0(log) {
            Some(topic) if topic == TRANSFER_TOPIC => transfers.push(log),
            Some(topic) if topic == SWAP_TOPIC => swaps.push(log),
            _ => {}
        }
    }

    if transfers.is_empty() || swaps.is_empty() {
        return Correlation::NotASwap;
    }

    Correlation::Swap(CorrelatedLogs { transfers, swaps })
}
