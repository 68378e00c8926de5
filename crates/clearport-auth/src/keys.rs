//! Ed25519 key handling for settlement accounts.

use ed25519_dalek::{Signer, SigningKey};
use rand::rngs::OsRng;

use clearport_types::AccountId;

/// An ed25519 key pair. The verifying key doubles as the [`AccountId`].
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a new key pair from OS entropy.
    #[must_use]
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Deterministic key pair from a 32-byte seed.
    #[must_use]
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// The account this key controls.
    #[must_use]
    pub fn account(&self) -> AccountId {
        AccountId(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign an arbitrary payload, returning the 64 signature bytes.
    #[must_use]
    pub fn sign(&self, payload: &[u8]) -> Vec<u8> {
        self.signing_key.sign(payload).to_bytes().to_vec()
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material.
        write!(f, "Keypair({})", self.account())
    }
}
