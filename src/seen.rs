//! Time-windowed record of pending transactions that were already classified.
//!
//! Entries live for roughly the time a transaction can sit in the mempool; once
//! that window passes they are pruned so the set cannot grow without bound.

use alloy_primitives::B256;
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct SeenTransactions {
    ttl: Duration,
    expiries: HashMap<B256, Instant>,
    order: VecDeque<(B256, Instant)>,
}

impl SeenTransactions {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            expiries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn contains(&self, hash: &B256) -> bool {
        self.expiries.contains_key(hash)
    }

    /// Returns false if the hash was already present.
    pub fn insert(&mut self, hash: B256) -> bool {
        self.insert_at(hash, Instant::now())
    }

    pub fn insert_at(&mut self, hash: B256, now: Instant) -> bool {
        if self.expiries.contains_key(&hash) {
            return false;
        }
        let expiry = now + self.ttl;
        self.expiries.insert(hash, expiry);
        self.order.push_back((hash, expiry));
        true
    }

    /// Drops every entry whose window ended at or before `now`.
    pub fn prune(&mut self, now: Instant) -> usize {
        let mut removed = 0;
        while let Some(&(hash, expiry)) = self.order.front() {
            if expiry > now {
                break;
            }
            self.order.pop_front();
            self.expiries.remove(&hash);
            removed += 1;
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.expiries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expiries.is_empty()
    }
}
