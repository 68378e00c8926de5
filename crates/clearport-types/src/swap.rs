//! Atomic swap types: hash-locked, time-locked conditional transfers.
//!
//! A [`Swap`] lets a maker and taker exchange without trusting the
//! coordinator: the maker's funds sit in escrow under the swap's content
//! hash, releasable to the taker by revealing the secret preimage before
//! expiry, or reclaimable by the maker after expiry. Neither party can
//! both withhold the secret and reclaim early.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{constants, AccountId, Asset, ClearportError, Result, SwapHash};

/// Lifecycle state of a swap, stored under its content hash.
///
/// An absent table entry means the swap does not exist. The only
/// transition is `Active → Settled`, taken exactly once, by either
/// execution or cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SwapState {
    /// Funds are escrowed; execute and cancel are both possible.
    Active,
    /// The swap was executed or cancelled. Terminal.
    Settled,
}

impl std::fmt::Display for SwapState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "ACTIVE"),
            Self::Settled => write!(f, "SETTLED"),
        }
    }
}

/// A maker-signed swap descriptor. Content-addressed like an order; the
/// full terms are re-supplied on execute/cancel and re-validated against
/// the stored hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Swap {
    pub maker: AccountId,
    pub taker: AccountId,
    pub asset: Asset,
    pub amount: u128,
    /// SHA-256 of the secret the taker must reveal.
    pub hashed_secret: [u8; 32],
    pub expires_at: DateTime<Utc>,
    pub fee_asset: Asset,
    pub fee_amount: u128,
    pub nonce: u64,
}

impl Swap {
    /// Canonical signing payload under the swap domain tag.
    #[must_use]
    pub fn signing_payload(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(192);
        payload.extend_from_slice(constants::SWAP_DOMAIN);
        payload.extend_from_slice(&self.maker.0);
        payload.extend_from_slice(&self.taker.0);
        push_str(&mut payload, &self.asset);
        payload.extend_from_slice(&self.amount.to_le_bytes());
        payload.extend_from_slice(&self.hashed_secret);
        payload.extend_from_slice(&self.expires_at.timestamp_millis().to_le_bytes());
        push_str(&mut payload, &self.fee_asset);
        payload.extend_from_slice(&self.fee_amount.to_le_bytes());
        payload.extend_from_slice(&self.nonce.to_le_bytes());
        payload
    }

    /// Content hash identifying this swap.
    #[must_use]
    pub fn hash(&self) -> SwapHash {
        let digest = Sha256::digest(self.signing_payload());
        SwapHash(digest.into())
    }

    /// Validation at creation time.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<()> {
        if self.amount == 0 {
            return Err(ClearportError::ZeroAmount);
        }
        if self.expires_at <= now {
            return Err(ClearportError::InvalidExpiry {
                expires_at: self.expires_at,
                now,
            });
        }
        // A same-asset fee is carved out of the escrowed amount.
        if self.fee_asset == self.asset && self.fee_amount > self.amount {
            return Err(ClearportError::FeeExceedsAmount {
                fee: self.fee_amount,
                amount: self.amount,
            });
        }
        Ok(())
    }

    /// Whether `preimage` opens this swap's hash lock.
    #[must_use]
    pub fn secret_matches(&self, preimage: &[u8]) -> bool {
        let digest: [u8; 32] = Sha256::digest(preimage).into();
        digest == self.hashed_secret
    }
}

/// Hash a secret preimage the way the swap lock does.
#[must_use]
pub fn hash_secret(preimage: &[u8]) -> [u8; 32] {
    Sha256::digest(preimage).into()
}

fn push_str(buf: &mut Vec<u8>, s: &str) {
    let len = u32::try_from(s.len()).unwrap_or(u32::MAX);
    buf.extend_from_slice(&len.to_le_bytes());
    buf.extend_from_slice(s.as_bytes());
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Swap {
    pub fn dummy(
        maker: AccountId,
        taker: AccountId,
        asset: &str,
        amount: u128,
        secret: &[u8],
        expires_at: DateTime<Utc>,
        nonce: u64,
    ) -> Self {
        Self {
            maker,
            taker,
            asset: asset.to_string(),
            amount,
            hashed_secret: hash_secret(secret),
            expires_at,
            fee_asset: asset.to_string(),
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
