//! Signed boundary messages: withdrawals and spender approvals.
//!
//! Both cross the ledger boundary on the authority of the account's key
//! alone, so both carry a nonce and are hashed under their own domain tag.

use serde::{Deserialize, Serialize};

use crate::{constants, AccountId, Asset};

/// A signed instruction to move funds out of the ledger.
///
/// The fee is paid to the operator: deducted from the withdrawn amount
/// when the fee asset equals the withdrawn asset, debited from the
/// account's general balance otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawal {
    pub account: AccountId,
    pub asset: Asset,
    pub amount: u128,
    pub fee_asset: Asset,
    pub fee_amount: u128,
    pub nonce: u64,
}

impl Withdrawal {
    #[must_use]
    pub fn signing_payload(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(128);
        payload.extend_from_slice(constants::WITHDRAW_DOMAIN);
        payload.extend_from_slice(&self.account.0);
        push_str(&mut payload, &self.asset);
        payload.extend_from_slice(&self.amount.to_le_bytes());
        push_str(&mut payload, &self.fee_asset);
        payload.extend_from_slice(&self.fee_amount.to_le_bytes());
        payload.extend_from_slice(&self.nonce.to_le_bytes());
        payload
    }
}

/// A signed instruction granting `spender` the capability to move the
/// signing account's balances via `spend_from`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpenderApproval {
    pub account: AccountId,
    pub spender: AccountId,
    pub nonce: u64,
}

impl SpenderApproval {
    #[must_use]
    pub fn signing_payload(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(96);
        payload.extend_from_slice(constants::SPENDER_DOMAIN);
        payload.extend_from_slice(&self.account.0);
        payload.extend_from_slice(&self.spender.0);
        payload.extend_from_slice(&self.nonce.to_le_bytes());
        payload
    }
}

fn push_str(buf: &mut Vec<u8>, s: &str) {
    let len = u32::try_from(s.len()).unwrap_or(u32::MAX);
    buf.extend_from_slice(&len.to_le_bytes());
    buf.extend_from_slice(s.as_bytes());
}
