//! Error types for the Clearport settlement engine.
//!
//! All errors use the `CP_ERR_` prefix convention for easy grepping in
//! logs. Error codes are grouped by subsystem:
//! - 1xx: Authorization errors (signatures, nonces, spenders)
//! - 2xx: Validation errors (batch shape, amounts, assets)
//! - 3xx: Balance errors (insufficient funds, overdraw)
//! - 4xx: State errors (swap lifecycle, cancel windows, freeze)
//! - 5xx: External venue errors
//! - 9xx: General / internal errors
//!
//! Every failure is fail-fast and all-or-nothing: a violated
//! precondition aborts the whole external call with no state change.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{AccountId, Asset, OrderHash, SwapHash};

/// Central error enum for all Clearport operations.
#[derive(Debug, Error)]
pub enum ClearportError {
    // =================================================================
    // Authorization Errors (1xx)
    // =================================================================
    /// The signature did not verify against the claimed principal.
    #[error("CP_ERR_100: signature verification failed for {0}")]
    BadSignature(AccountId),

    /// The nonce bit was already set (replay prevention).
    #[error("CP_ERR_101: nonce {nonce} already consumed")]
    NonceReused { nonce: u64 },

    /// The signature bytes are not a well-formed ed25519 signature.
    #[error("CP_ERR_102: malformed signature: expected 64 bytes, got {len}")]
    MalformedSignature { len: usize },

    /// A third-party balance move was attempted without prior approval.
    #[error("CP_ERR_103: spender {spender} not authorized for {account}")]
    SpenderNotAuthorized {
        spender: AccountId,
        account: AccountId,
    },

    // =================================================================
    // Validation Errors (2xx)
    // =================================================================
    /// A batch arrived with an empty required section.
    #[error("CP_ERR_200: batch has no {what}")]
    EmptyBatch { what: String },

    /// Order nonces within a batch list must be strictly ascending.
    #[error("CP_ERR_201: nonces not strictly ascending: {prev} then {next}")]
    NoncesNotAscending { prev: u64, next: u64 },

    /// A match referenced an offer or fill index outside the batch.
    #[error("CP_ERR_202: match index {index} out of range (len {len})")]
    MatchIndexOutOfRange { index: usize, len: usize },

    /// An amount that must be positive was zero.
    #[error("CP_ERR_203: amount must be non-zero")]
    ZeroAmount,

    /// An order offered an asset against itself.
    #[error("CP_ERR_204: order gives and wants the same asset {asset}")]
    SameAssetPair { asset: Asset },

    /// A matched offer/fill pair does not trade corresponding assets.
    #[error("CP_ERR_205: asset mismatch: expected {expected}, got {actual}")]
    AssetMismatch { expected: Asset, actual: Asset },

    /// The batch named an operator outside the whitelist.
    #[error("CP_ERR_206: operator {0} not whitelisted")]
    OperatorNotWhitelisted(AccountId),

    /// Proportional arithmetic exceeded the amount domain.
    #[error("CP_ERR_207: amount arithmetic overflow")]
    AmountOverflow,

    /// A same-asset fee larger than the leg it is deducted from.
    #[error("CP_ERR_208: fee {fee} exceeds amount {amount}")]
    FeeExceedsAmount { fee: u128, amount: u128 },

    /// A swap was created with an expiry that is not in the future.
    #[error("CP_ERR_209: expiry {expires_at} is not after {now}")]
    InvalidExpiry {
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    },

    /// The batch exceeded the configured match limit.
    #[error("CP_ERR_210: batch has {count} matches (limit {limit})")]
    TooManyMatches { count: usize, limit: usize },

    /// An order appeared in the wrong batch section for its kind.
    #[error("CP_ERR_211: expected {expected} order, got {actual}")]
    WrongOrderKind {
        expected: crate::OrderKind,
        actual: crate::OrderKind,
    },

    // =================================================================
    // Balance Errors (3xx)
    // =================================================================
    /// Not enough balance to perform the operation.
    #[error("CP_ERR_300: insufficient {asset} balance: need {needed}, have {available}")]
    InsufficientBalance {
        asset: Asset,
        needed: u128,
        available: u128,
    },

    /// A match tried to consume more than an order's remaining availability.
    #[error("CP_ERR_301: overdraw: take {needed} exceeds available {available}")]
    Overdraw { needed: u128, available: u128 },

    // =================================================================
    // State Errors (4xx)
    // =================================================================
    /// The swap is not active (unknown, already executed, or cancelled).
    #[error("CP_ERR_400: swap {0} is not active")]
    SwapNotActive(SwapHash),

    /// A swap with this hash is already active.
    #[error("CP_ERR_401: swap {0} already active")]
    SwapAlreadyActive(SwapHash),

    /// The swap cannot be cancelled before its expiry.
    #[error("CP_ERR_402: swap not expired: expires {expires_at}, now {now}")]
    SwapNotExpired {
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    },

    /// The revealed preimage does not hash to the swap's secret hash.
    #[error("CP_ERR_403: preimage does not match hashed secret")]
    SecretMismatch,

    /// Cancel was called with a stale view of the offer's availability.
    #[error("CP_ERR_404: availability mismatch: expected {expected}, actual {actual}")]
    AvailabilityMismatch { expected: u128, actual: u128 },

    /// Slow cancel requires a prior announcement.
    #[error("CP_ERR_405: cancellation of {0} was never announced")]
    CancelNotAnnounced(OrderHash),

    /// The announce-cancel delay has not yet elapsed.
    #[error("CP_ERR_406: cancel available at {available_at}, now {now}")]
    AnnounceDelayNotElapsed {
        available_at: DateTime<Utc>,
        now: DateTime<Utc>,
    },

    /// The offer has no remaining availability under this hash.
    #[error("CP_ERR_407: offer {0} not found or fully consumed")]
    OfferNotFound(OrderHash),

    /// Trading is frozen; settlement operations are rejected.
    #[error("CP_ERR_408: trading is frozen")]
    TradingFrozen,

    /// The operation is only permitted while trading is frozen.
    #[error("CP_ERR_409: trading is not frozen")]
    TradingNotFrozen,

    /// The caller lacks the admin capability for this operation.
    #[error("CP_ERR_410: caller {0} is not the broker operator")]
    NotOperator(AccountId),

    /// A maker-only operation was attempted by someone else.
    #[error("CP_ERR_411: caller {caller} is not the maker of this offer")]
    NotMaker { caller: AccountId },

    // =================================================================
    // External Venue Errors (5xx)
    // =================================================================
    /// The venue returned less than the offer's want amount.
    #[error("CP_ERR_500: venue shortfall: required {required}, received {received}")]
    VenueShortfall { required: u128, received: u128 },

    /// The routed venue identifier is not registered.
    #[error("CP_ERR_501: unknown venue: {0}")]
    UnknownVenue(String),

    /// The venue call itself failed.
    #[error("CP_ERR_502: venue execution failed: {reason}")]
    VenueFailure { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("CP_ERR_900: internal error: {0}")]
    Internal(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, ClearportError>;
