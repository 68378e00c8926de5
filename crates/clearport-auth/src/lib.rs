//! # clearport-auth
//!
//! The authorization plane: every privileged instruction reaching the
//! settlement core is a structured, domain-tagged message signed by its
//! principal and protected by a single-use nonce.
//!
//! - [`Keypair`] — ed25519 signing identity; the account *is* the key.
//! - [`NonceRegistry`] — word-indexed bitmap; `try_consume` is the sole
//!   atomic check-and-set replay defense.
//! - [`verify_signature`] / [`authorize`] — recover-and-compare
//!   verification, with nonce consumption fused into the same call so
//!   no verify/mark race can exist.

pub mod keys;
pub mod nonce;
pub mod verifier;

pub use keys::Keypair;
pub use nonce::NonceRegistry;
pub use verifier::{authorize, verify_signature};
