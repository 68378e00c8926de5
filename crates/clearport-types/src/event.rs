//! Audit records emitted by the settlement core.
//!
//! Every balance mutation appends a [`BalanceEvent`]; every settled
//! trade or swap appends a [`SummaryRecord`]. Together they are the only
//! externally consumable audit trail, and they are bit-faithful to the
//! amounts actually moved: an external auditor can reconstruct the
//! entire ledger from the event stream alone.

use serde::{Deserialize, Serialize};

use crate::{AccountId, Asset, OrderHash, SwapHash};

/// Direction of a balance mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Increase,
    Decrease,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Increase => write!(f, "INCREASE"),
            Self::Decrease => write!(f, "DECREASE"),
        }
    }
}

/// Why a balance changed. Codes are stable across releases; auditors key
/// on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Reason {
    Deposit,
    Withdraw,
    WithdrawFeeGive,
    WithdrawFeeReceive,
    /// Maker funding moved into an offer/fill's availability at first sighting.
    OfferReserve,
    TradeReceive,
    TradeFeeGive,
    TradeFeeReceive,
    CancelRefund,
    /// Maker credited from venue proceeds.
    NetworkReceive,
    /// Price improvement credited to the operator.
    NetworkSurplus,
    SwapLockGive,
    SwapLockReceive,
    SwapRelease,
    SwapReceive,
    SwapFeeReceive,
    SwapRefund,
    SpendGive,
    SpendReceive,
    EmergencyWithdraw,
}

impl Reason {
    /// Stable numeric code for external consumers.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Deposit => 1,
            Self::Withdraw => 2,
            Self::WithdrawFeeGive => 3,
            Self::WithdrawFeeReceive => 4,
            Self::OfferReserve => 5,
            Self::TradeReceive => 6,
            Self::TradeFeeGive => 7,
            Self::TradeFeeReceive => 8,
            Self::CancelRefund => 9,
            // 10 is reserved: venue outflows are summary records, not
            // balance events (no account balance changes).
            Self::NetworkReceive => 11,
            Self::NetworkSurplus => 12,
            Self::SwapLockGive => 13,
            Self::SwapLockReceive => 14,
            Self::SwapRelease => 15,
            Self::SwapReceive => 16,
            Self::SwapFeeReceive => 17,
            Self::SwapRefund => 18,
            Self::SpendGive => 19,
            Self::SpendReceive => 20,
            Self::EmergencyWithdraw => 21,
        }
    }
}

impl std::fmt::Display for Reason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}({})", self.code())
    }
}

/// One balance mutation, exactly as applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceEvent {
    pub account: AccountId,
    pub asset: Asset,
    pub amount: u128,
    pub direction: Direction,
    pub reason: Reason,
    /// The nonce of the authorizing instruction, when one exists.
    pub nonce: Option<u64>,
}

/// Completed-operation summary with identifying hashes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SummaryRecord {
    Trade {
        offer_hash: OrderHash,
        fill_hash: OrderHash,
        take_amount: u128,
    },
    NetworkTrade {
        offer_hash: OrderHash,
        venue: String,
        take_amount: u128,
        surplus: u128,
    },
    SwapCreated {
        swap_hash: SwapHash,
    },
    SwapExecuted {
        swap_hash: SwapHash,
    },
    SwapCancelled {
        swap_hash: SwapHash,
    },
    OfferCancelled {
        offer_hash: OrderHash,
        refunded: u128,
    },
    Withdrawal {
        account: AccountId,
        asset: Asset,
        amount: u128,
    },
}
