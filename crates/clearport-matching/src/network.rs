//! Network trades: settling offers against external liquidity venues.
//!
//! When an offer's counter-liquidity does not come from another signed
//! order, it is sourced from a pluggable [`LiquidityVenue`]. The engine
//! reserves the offer's give-amount, hands it to the venue, and
//! reconciles whatever comes back: the maker still receives exactly
//! their declared want-amount (net of fee), any surplus goes to the
//! operator bearing the routing risk, and a shortfall is fatal — the
//! maker is never silently under-paid.
//!
//! Venue calls are synchronous sub-calls inside the enclosing atomic
//! operation. The broker snapshots all core state before entering, so
//! a failure here rolls everything back; a venue's own internal state
//! is outside that boundary, as any real external call would be.

use std::collections::HashMap;

use clearport_auth::NonceRegistry;
use clearport_ledger::Ledger;
use clearport_types::{
    ClearportError, NetworkBatch, NetworkTradeSettled, Reason, Result,
};

use crate::availability::AvailabilityTable;
use crate::engine::{credit_filled, mul_div_floor, resolve_order};
use crate::validate;

/// An external liquidity source. Implementations are swappable values
/// registered in a [`VenueRegistry`], never inherited subclasses.
pub trait LiquidityVenue {
    /// Indicative output for a hypothetical execution.
    fn quote(&self, asset_in: &str, amount_in: u128, asset_out: &str) -> Result<u128>;

    /// Execute a conversion. Returns the amount of `asset_out` actually
    /// obtained, which must be at least `min_amount_out`; `routing` is
    /// venue-specific data passed through from the caller untouched.
    fn execute(
        &mut self,
        asset_in: &str,
        amount_in: u128,
        asset_out: &str,
        min_amount_out: u128,
        routing: &[u8],
    ) -> Result<u128>;
}

/// Admin-whitelisted venues, selected by the caller per match.
#[derive(Default)]
pub struct VenueRegistry {
    venues: HashMap<String, Box<dyn LiquidityVenue>>,
}

impl VenueRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a venue under an identifier.
    pub fn register(&mut self, id: impl Into<String>, venue: Box<dyn LiquidityVenue>) {
        self.venues.insert(id.into(), venue);
    }

    /// Remove a venue from the whitelist.
    pub fn deregister(&mut self, id: &str) -> bool {
        self.venues.remove(id).is_some()
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.venues.contains_key(id)
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Box<dyn LiquidityVenue>> {
        self.venues
            .get_mut(id)
            .ok_or_else(|| ClearportError::UnknownVenue(id.to_string()))
    }
}

impl std::fmt::Debug for VenueRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<&str> = self.venues.keys().map(String::as_str).collect();
        ids.sort_unstable();
        f.debug_struct("VenueRegistry").field("ids", &ids).finish()
    }
}

/// Settle a batch of offers against external venues.
///
/// Per match: resolve the offer exactly as in signed-order trading,
/// consume `take` from its availability, execute the venue conversion
/// with `min_amount_out` equal to the proportional amount owed to the
/// maker, then credit the maker (net of pro-rated fee) and sweep the
/// surplus to the operator.
pub fn settle_network_batch(
    ledger: &mut Ledger,
    nonces: &mut NonceRegistry,
    availability: &mut AvailabilityTable,
    venues: &mut VenueRegistry,
    batch: &NetworkBatch,
    max_matches: usize,
) -> Result<Vec<NetworkTradeSettled>> {
    validate::validate_network_batch(batch, max_matches)?;

    let mut settled = Vec::with_capacity(batch.matches.len());
    for m in &batch.matches {
        let offer = &batch.offers[m.offer_index];
        let offer_hash = resolve_order(ledger, nonces, availability, offer)?;

        let owed = mul_div_floor(
            offer.order.want_amount,
            m.take_amount,
            offer.order.offer_amount,
        )?;

        availability.consume(offer_hash, m.take_amount)?;

        let venue = venues.get_mut(&m.venue)?;
        let received = venue.execute(
            &offer.order.offer_asset,
            m.take_amount,
            &offer.order.want_asset,
            owed,
            &m.routing,
        )?;
        if received < owed {
            tracing::warn!(
                venue = %m.venue,
                required = owed,
                received,
                "venue shortfall, aborting network trade"
            );
            return Err(ClearportError::VenueShortfall {
                required: owed,
                received,
            });
        }
        let surplus = received - owed;

        credit_filled(
            ledger,
            &offer.order,
            owed,
            m.take_amount,
            batch.operator,
            Reason::NetworkReceive,
        )?;
        if surplus > 0 {
            ledger.increase(
                batch.operator,
                &offer.order.want_asset,
                surplus,
                Reason::NetworkSurplus,
                None,
            )?;
        }

        settled.push(NetworkTradeSettled {
            offer_hash,
            venue: m.venue.clone(),
            take_amount: m.take_amount,
            owed_amount: owed,
            surplus,
        });
    }

    tracing::debug!(matches = settled.len(), "network batch settled");
    Ok(settled)
}
