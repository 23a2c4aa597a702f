use alloy_primitives::Address;
use std::collections::HashSet;

/// The monitored wallets and the router whose swaps get decoded.
///
/// Addresses are compared as parsed 20-byte values, so the hex casing used in
/// configuration or returned by the node never matters.
#[derive(Debug, Clone)]
pub struct Watchlist {
    addresses: HashSet<Address>,
    router: Address,
}

impl Watchlist {
    pub fn new(addresses: impl IntoIterator<Item = Address>, router: Address) -> Self {
        Self {
            addresses: addresses.into_iter().collect(),
            router,
        }
    }

    pub fn is_monitored_sender(&self, address: &Address) -> bool {
        self.addresses.contains(address)
    }

    pub fn is_router_recipient(&self, address: Option<&Address>) -> bool {
        address == Some(&self.router)
    }

    pub fn router(&self) -> Address {
        self.router
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}
