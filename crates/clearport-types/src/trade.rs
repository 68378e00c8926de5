//! Batched trade instructions and their settlement summary records.
//!
//! A [`TradeBatch`] is what an off-ledger coordinator submits: the signed
//! orders it wants settled and a list of [`Match`] instructions pairing
//! them. The engine validates and settles; it never decides who matches.

use serde::{Deserialize, Serialize};

use crate::{AccountId, OrderHash, SignedOrder};

/// One settlement instruction: consume `take_amount` of the referenced
/// offer's give-asset against the referenced fill.
///
/// Several matches may reference the same offer or fill; partial
/// consumption accumulates against its availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub offer_index: usize,
    pub fill_index: usize,
    pub take_amount: u128,
}

/// A batch of offers, fills, and matches, settled atomically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeBatch {
    pub offers: Vec<SignedOrder>,
    pub fills: Vec<SignedOrder>,
    pub matches: Vec<Match>,
    /// The fee-collecting operator for this batch. Must be whitelisted.
    pub operator: AccountId,
}

/// A match routed to an external liquidity venue instead of a fill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkMatch {
    pub offer_index: usize,
    pub take_amount: u128,
    /// Caller-selected venue identifier.
    pub venue: String,
    /// Opaque venue-specific routing data, passed through untouched.
    pub routing: Vec<u8>,
}

/// A batch of offers settled against external venues.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkBatch {
    pub offers: Vec<SignedOrder>,
    pub matches: Vec<NetworkMatch>,
    pub operator: AccountId,
}

/// Summary of one settled match, emitted for the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeSettled {
    pub offer_hash: OrderHash,
    pub fill_hash: OrderHash,
    pub take_amount: u128,
    /// Want-asset amount owed to the offer's maker for this take.
    pub owed_amount: u128,
}

/// Summary of one settled network match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkTradeSettled {
    pub offer_hash: OrderHash,
    pub venue: String,
    pub take_amount: u128,
    pub owed_amount: u128,
    /// Price improvement beyond the offer's want amount, credited to
    /// the operator.
    pub surplus: u128,
}
