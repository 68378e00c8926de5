//! Pre-mutation batch validation.
//!
//! Every check here runs before the engine touches any state, so a
//! rejected batch leaves no trace. Checks that require state (operator
//! whitelist, balances, availability) live with that state; this module
//! is shape only.

use clearport_types::{
    ClearportError, NetworkBatch, Order, OrderKind, Result, SignedOrder, TradeBatch,
};

/// Validate the shape of a trade batch.
pub fn validate_trade_batch(batch: &TradeBatch, max_matches: usize) -> Result<()> {
    ensure_non_empty(&batch.offers, "offers")?;
    ensure_non_empty(&batch.fills, "fills")?;
    if batch.matches.is_empty() {
        return Err(ClearportError::EmptyBatch {
            what: "matches".to_string(),
        });
    }
    if batch.matches.len() > max_matches {
        return Err(ClearportError::TooManyMatches {
            count: batch.matches.len(),
            limit: max_matches,
        });
    }

    validate_order_list(&batch.offers, OrderKind::Offer)?;
    validate_order_list(&batch.fills, OrderKind::Fill)?;

    for m in &batch.matches {
        let offer = order_at(&batch.offers, m.offer_index)?;
        let fill = order_at(&batch.fills, m.fill_index)?;
        if m.take_amount == 0 {
            return Err(ClearportError::ZeroAmount);
        }
        // The fill's give/want legs must mirror the offer's.
        ensure_assets_correspond(offer, fill)?;
    }
    Ok(())
}

/// Validate the shape of a network-trade batch.
pub fn validate_network_batch(batch: &NetworkBatch, max_matches: usize) -> Result<()> {
    ensure_non_empty(&batch.offers, "offers")?;
    if batch.matches.is_empty() {
        return Err(ClearportError::EmptyBatch {
            what: "matches".to_string(),
        });
    }
    if batch.matches.len() > max_matches {
        return Err(ClearportError::TooManyMatches {
            count: batch.matches.len(),
            limit: max_matches,
        });
    }

    validate_order_list(&batch.offers, OrderKind::Offer)?;

    for m in &batch.matches {
        order_at(&batch.offers, m.offer_index)?;
        if m.take_amount == 0 {
            return Err(ClearportError::ZeroAmount);
        }
        if m.venue.is_empty() {
            return Err(ClearportError::UnknownVenue(String::new()));
        }
    }
    Ok(())
}

/// Per-list order validation: correct kind, structurally valid, and
/// strictly ascending nonces (duplicate processing within one call is
/// impossible when nonces ascend).
fn validate_order_list(orders: &[SignedOrder], expected: OrderKind) -> Result<()> {
    let mut prev_nonce: Option<u64> = None;
    for signed in orders {
        let order = &signed.order;
        if order.kind != expected {
            return Err(ClearportError::WrongOrderKind {
                expected,
                actual: order.kind,
            });
        }
        order.validate()?;
        if let Some(prev) = prev_nonce {
            if order.nonce <= prev {
                return Err(ClearportError::NoncesNotAscending {
                    prev,
                    next: order.nonce,
                });
            }
        }
        prev_nonce = Some(order.nonce);
    }
    Ok(())
}

fn ensure_non_empty(orders: &[SignedOrder], what: &str) -> Result<()> {
    if orders.is_empty() {
        return Err(ClearportError::EmptyBatch {
            what: what.to_string(),
        });
    }
    Ok(())
}

fn order_at(orders: &[SignedOrder], index: usize) -> Result<&Order> {
    orders
        .get(index)
        .map(|signed| &signed.order)
        .ok_or(ClearportError::MatchIndexOutOfRange {
            index,
            len: orders.len(),
        })
}

fn ensure_assets_correspond(offer: &Order, fill: &Order) -> Result<()> {
    if fill.offer_asset != offer.want_asset {
        return Err(ClearportError::AssetMismatch {
            expected: offer.want_asset.clone(),
            actual: fill.offer_asset.clone(),
        });
    }
    if fill.want_asset != offer.offer_asset {
        return Err(ClearportError::AssetMismatch {
            expected: offer.offer_asset.clone(),
            actual: fill.want_asset.clone(),
        });
    }
    Ok(())
}
