//! The offer/fill availability table.
//!
//! Keyed by content hash; stores only the remaining unconsumed amount.
//! Full terms are never re-stored — callers re-supply them and the hash
//! proves they are unchanged. Zero availability is equivalent to
//! non-existence: a fully consumed entry is removed, and any later
//! attempt to re-initialize it dies on the order's burned nonce.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use clearport_types::{ClearportError, OrderHash, Result};

/// Remaining available amount per order hash.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AvailabilityTable {
    available: HashMap<OrderHash, u128>,
}

impl AvailabilityTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether this hash has been sighted and still has availability.
    #[must_use]
    pub fn is_seen(&self, hash: OrderHash) -> bool {
        self.available.contains_key(&hash)
    }

    /// Remaining availability; zero for unknown hashes.
    #[must_use]
    pub fn get(&self, hash: OrderHash) -> u128 {
        self.available.get(&hash).copied().unwrap_or(0)
    }

    /// Record a first sighting. The caller has already debited the
    /// maker and consumed the order's nonce.
    pub fn initialize(&mut self, hash: OrderHash, amount: u128) {
        self.available.insert(hash, amount);
    }

    /// Consume part of an order's availability, returning the
    /// remainder. Fully consumed entries are removed.
    pub fn consume(&mut self, hash: OrderHash, amount: u128) -> Result<u128> {
        let available = self.get(hash);
        if amount > available {
            return Err(ClearportError::Overdraw {
                needed: amount,
                available,
            });
        }
        let remaining = available - amount;
        if remaining == 0 {
            self.available.remove(&hash);
        } else {
            self.available.insert(hash, remaining);
        }
        Ok(remaining)
    }

    /// Remove an entry entirely (cancellation), returning what was left.
    pub fn remove(&mut self, hash: OrderHash) -> u128 {
        self.available.remove(&hash).unwrap_or(0)
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.available.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.available.is_empty()
    }
}
