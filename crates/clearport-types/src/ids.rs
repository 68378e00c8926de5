//! Identifiers used throughout Clearport.
//!
//! Accounts are identified by their raw ed25519 verifying key; offers,
//! fills, and swaps are content-addressed by a SHA-256 hash of their
//! defining fields, so no surrogate ID allocator exists anywhere.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Type alias for asset identifiers (e.g., "BTC", "USDT", "ETH").
pub type Asset = String;

// ---------------------------------------------------------------------------
// AccountId
// ---------------------------------------------------------------------------

/// A settlement account. This is the raw ed25519 verifying key (32 bytes):
/// the account *is* the key that authorizes its instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct AccountId(pub [u8; 32]);

impl AccountId {
    /// The reserved escrow account that holds swap funds while a swap
    /// is active. It has no signing key; nothing can ever be authorized
    /// *by* it, only moved in and out of it by the swap engine.
    pub const ESCROW: Self = Self([0xEE; 32]);

    #[must_use]
    pub fn from_pubkey(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "acct:{}", hex::encode(&self.0[..8]))
    }
}

// ---------------------------------------------------------------------------
// OrderHash
// ---------------------------------------------------------------------------

/// Content hash identifying an offer or fill: SHA-256 over the order's
/// kind-specific domain tag and canonical field encoding.
///
/// The hash doubles as the signing payload digest, so the identity of an
/// order and the message its maker signed can never diverge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct OrderHash(pub [u8; 32]);

impl OrderHash {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for OrderHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "order:{}", hex::encode(&self.0[..8]))
    }
}

// ---------------------------------------------------------------------------
// SwapHash
// ---------------------------------------------------------------------------

/// Content hash identifying an atomic swap, same scheme as [`OrderHash`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct SwapHash(pub [u8; 32]);

impl SwapHash {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for SwapHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "swap:{}", hex::encode(&self.0[..8]))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
