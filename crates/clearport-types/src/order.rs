//! Order types: the signed exchange intents settled by the matching engine.
//!
//! An [`Order`] is an off-ledger message — the maker signs it and hands it
//! to a coordinator; the engine only ever sees it when a batch references
//! it. Its identity is the SHA-256 content hash of its fields under a
//! kind-specific domain tag, which is also exactly the payload the maker
//! signs. Offers and fills are structurally identical; the kind tag keeps
//! the two message types from ever aliasing each other.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{constants, AccountId, Asset, ClearportError, OrderHash, Result};

/// Whether an order is a maker's offer or a taker's counter-intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderKind {
    Offer,
    Fill,
}

impl OrderKind {
    /// The versioned domain separator for this message type.
    #[must_use]
    pub fn domain_tag(self) -> &'static [u8] {
        match self {
            Self::Offer => constants::OFFER_DOMAIN,
            Self::Fill => constants::FILL_DOMAIN,
        }
    }
}

impl std::fmt::Display for OrderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Offer => write!(f, "OFFER"),
            Self::Fill => write!(f, "FILL"),
        }
    }
}

/// A signed intent to exchange `offer_amount` of `offer_asset` for
/// `want_amount` of `want_asset`, paying `fee_amount` of `fee_asset`
/// to the settling operator.
///
/// The ledger never stores the full order. After the first sighting it
/// keeps only the remaining available amount under the order's hash;
/// callers re-supply the terms on every subsequent reference and the
/// hash proves they are unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub kind: OrderKind,
    pub maker: AccountId,
    pub offer_asset: Asset,
    pub offer_amount: u128,
    pub want_asset: Asset,
    pub want_amount: u128,
    pub fee_asset: Asset,
    pub fee_amount: u128,
    /// Single-use nonce; consuming it is the sole replay defense.
    pub nonce: u64,
}

impl Order {
    /// Canonical signing payload: domain tag, maker key, then each field
    /// in declaration order. Strings are length-prefixed so no two field
    /// sequences can encode to the same bytes.
    #[must_use]
    pub fn signing_payload(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(160);
        payload.extend_from_slice(self.kind.domain_tag());
        payload.extend_from_slice(&self.maker.0);
        push_str(&mut payload, &self.offer_asset);
        payload.extend_from_slice(&self.offer_amount.to_le_bytes());
        push_str(&mut payload, &self.want_asset);
        payload.extend_from_slice(&self.want_amount.to_le_bytes());
        push_str(&mut payload, &self.fee_asset);
        payload.extend_from_slice(&self.fee_amount.to_le_bytes());
        payload.extend_from_slice(&self.nonce.to_le_bytes());
        payload
    }

    /// Content hash identifying this order.
    #[must_use]
    pub fn hash(&self) -> OrderHash {
        let digest = Sha256::digest(self.signing_payload());
        OrderHash(digest.into())
    }

    /// Structural validation, checked before any signature work.
    pub fn validate(&self) -> Result<()> {
        if self.offer_amount == 0 || self.want_amount == 0 {
            return Err(ClearportError::ZeroAmount);
        }
        if self.offer_asset == self.want_asset {
            return Err(ClearportError::SameAssetPair {
                asset: self.offer_asset.clone(),
            });
        }
        // A same-asset fee is deducted from the receive leg; it can never
        // exceed what a full fill would receive.
        if self.fee_asset == self.want_asset && self.fee_amount > self.want_amount {
            return Err(ClearportError::FeeExceedsAmount {
                fee: self.fee_amount,
                amount: self.want_amount,
            });
        }
        Ok(())
    }
}

fn push_str(buf: &mut Vec<u8>, s: &str) {
    let len = u32::try_from(s.len()).unwrap_or(u32::MAX);
    buf.extend_from_slice(&len.to_le_bytes());
    buf.extend_from_slice(s.as_bytes());
}

/// An order together with its maker's ed25519 signature over the
/// canonical signing payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedOrder {
    pub order: Order,
    /// 64-byte ed25519 signature.
    pub signature: Vec<u8>,
}

/// A maker-signed instruction to cancel an offer immediately, refunding
/// its remaining availability.
///
/// `expected_available` pins the refund the maker believes is owed, so a
/// cancel raced against an in-flight match fails loudly instead of
/// silently refunding less.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelRequest {
    pub offer_hash: OrderHash,
    pub expected_available: u128,
    pub nonce: u64,
}

impl CancelRequest {
    #[must_use]
    pub fn signing_payload(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(80);
        payload.extend_from_slice(constants::CANCEL_DOMAIN);
        payload.extend_from_slice(&self.offer_hash.0);
        payload.extend_from_slice(&self.expected_available.to_le_bytes());
        payload.extend_from_slice(&self.nonce.to_le_bytes());
        payload
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Order {
    pub fn dummy(
        kind: OrderKind,
        maker: AccountId,
        give: (&str, u128),
        want: (&str, u128),
        nonce: u64,
    ) -> Self {
        Self {
            kind,
            maker,
            offer_asset: give.0.to_string(),
            offer_amount: give.1,
            want_asset: want.0.to_string(),
            want_amount: want.1,
            fee_asset: want.0.to_string(),
            fee_amount: 0,
            nonce,
        }
    }

    #[must_use]
    pub fn with_fee(mut self, asset: &str, amount: u128) -> Self {
        self.fee_asset = asset.to_string();
        self.fee_amount = amount;
        self
    }
}
