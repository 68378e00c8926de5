//! Signature verification and the fused verify-and-consume primitive.

use ed25519_dalek::{Signature, Verifier, VerifyingKey};

use clearport_types::{AccountId, ClearportError, Result};

use crate::nonce::NonceRegistry;

/// Verify that `signature` was produced by `account`'s key over `payload`.
pub fn verify_signature(account: &AccountId, payload: &[u8], signature: &[u8]) -> Result<()> {
    let sig_bytes: [u8; 64] = signature
        .try_into()
        .map_err(|_| ClearportError::MalformedSignature {
            len: signature.len(),
        })?;
    let key = VerifyingKey::from_bytes(&account.0)
        .map_err(|_| ClearportError::BadSignature(*account))?;
    key.verify(payload, &Signature::from_bytes(&sig_bytes))
        .map_err(|_| ClearportError::BadSignature(*account))
}

/// Verify a signed instruction and consume its nonce in one step.
///
/// The nonce is only touched after the signature verifies, and the two
/// checks happen inside the same serialized call, so there is no window
/// in which a verified-but-unconsumed instruction exists.
pub fn authorize(
    nonces: &mut NonceRegistry,
    account: &AccountId,
    payload: &[u8],
    signature: &[u8],
    nonce: u64,
) -> Result<()> {
    verify_signature(account, payload, signature)?;
    if !nonces.try_consume(nonce) {
        return Err(ClearportError::NonceReused { nonce });
    }
    Ok(())
}
