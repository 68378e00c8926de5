//! Offer cancellation: instant (signed), announced, and slow.
//!
//! An instant cancel carries the maker's signature over a nonced cancel
//! message and is submitted through the coordinator. The announced path
//! needs no coordinator cooperation: the maker announces directly, and
//! anyone can execute once the configured delay has elapsed — the delay
//! gives in-flight matches against the offer time to settle first.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use clearport_auth::{authorize, NonceRegistry};
use clearport_ledger::Ledger;
use clearport_types::{
    AccountId, CancelRequest, ClearportError, Order, OrderHash, Reason, Result,
};

use crate::availability::AvailabilityTable;

/// Pending cancel announcements, keyed by offer hash.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CancelState {
    announced_at: HashMap<OrderHash, DateTime<Utc>>,
}

impl CancelState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn announcement(&self, hash: OrderHash) -> Option<DateTime<Utc>> {
        self.announced_at.get(&hash).copied()
    }
}

/// Instantly cancel an offer with the maker's signature, refunding its
/// remaining availability. Returns the refunded amount.
///
/// `expected_available` pins the maker's view: a cancel raced against an
/// in-flight match fails with `AvailabilityMismatch` instead of quietly
/// refunding less than the maker expects.
pub fn cancel(
    ledger: &mut Ledger,
    nonces: &mut NonceRegistry,
    availability: &mut AvailabilityTable,
    cancels: &mut CancelState,
    order: &Order,
    expected_available: u128,
    cancel_nonce: u64,
    signature: &[u8],
) -> Result<u128> {
    let hash = order.hash();
    let request = CancelRequest {
        offer_hash: hash,
        expected_available,
        nonce: cancel_nonce,
    };
    authorize(
        nonces,
        &order.maker,
        &request.signing_payload(),
        signature,
        cancel_nonce,
    )?;
    refund(ledger, availability, cancels, order, hash, Some(expected_available))
}

/// Record the maker's intent to cancel. Overwriting an earlier
/// announcement restarts the delay.
pub fn announce_cancel(
    availability: &AvailabilityTable,
    cancels: &mut CancelState,
    caller: AccountId,
    order: &Order,
    now: DateTime<Utc>,
) -> Result<()> {
    if caller != order.maker {
        return Err(ClearportError::NotMaker { caller });
    }
    let hash = order.hash();
    if !availability.is_seen(hash) {
        return Err(ClearportError::OfferNotFound(hash));
    }
    cancels.announced_at.insert(hash, now);
    tracing::debug!(%hash, "cancel announced");
    Ok(())
}

/// Execute a previously announced cancel after the delay has elapsed.
/// Callable by anyone. Returns the refunded amount.
pub fn slow_cancel(
    ledger: &mut Ledger,
    availability: &mut AvailabilityTable,
    cancels: &mut CancelState,
    order: &Order,
    announce_delay_secs: i64,
    now: DateTime<Utc>,
) -> Result<u128> {
    let hash = order.hash();
    let announced = cancels
        .announced_at
        .get(&hash)
        .copied()
        .ok_or(ClearportError::CancelNotAnnounced(hash))?;
    let available_at = announced + Duration::seconds(announce_delay_secs);
    if now < available_at {
        return Err(ClearportError::AnnounceDelayNotElapsed { available_at, now });
    }
    refund(ledger, availability, cancels, order, hash, None)
}

fn refund(
    ledger: &mut Ledger,
    availability: &mut AvailabilityTable,
    cancels: &mut CancelState,
    order: &Order,
    hash: OrderHash,
    expected: Option<u128>,
) -> Result<u128> {
    let actual = availability.get(hash);
    if actual == 0 {
        return Err(ClearportError::OfferNotFound(hash));
    }
    if let Some(expected) = expected {
        if expected != actual {
            return Err(ClearportError::AvailabilityMismatch { expected, actual });
        }
    }
    availability.remove(hash);
    cancels.announced_at.remove(&hash);
    ledger.increase(
        order.maker,
        &order.offer_asset,
        actual,
        Reason::CancelRefund,
        Some(order.nonce),
    )?;
    Ok(actual)
}
