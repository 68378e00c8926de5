//! The trade matching engine.
//!
//! Settlement of one match moves value along four legs:
//!
//! ```text
//!   offer availability ──take──────────▶ fill maker   (net of fill fee)
//!   fill availability ──owed───────────▶ offer maker  (net of offer fee)
//!   fees ──────────────────────────────▶ operator
//! ```
//!
//! `owed` is proportional with truncation: the maker is never paid more
//! than proportionally entitled, and the residual dust stays
//! unallocated rather than rounding in any party's favor.

use clearport_auth::{authorize, NonceRegistry};
use clearport_ledger::Ledger;
use clearport_types::{
    AccountId, ClearportError, Order, OrderHash, Reason, Result, SignedOrder, TradeBatch,
    TradeSettled,
};

use crate::availability::AvailabilityTable;
use crate::validate;

/// Settle a batch of matches atomically.
///
/// The caller provides the transaction boundary: on error, every
/// mutation made here must be discarded (the broker snapshots state
/// before calling in).
pub fn settle_trade_batch(
    ledger: &mut Ledger,
    nonces: &mut NonceRegistry,
    availability: &mut AvailabilityTable,
    batch: &TradeBatch,
    max_matches: usize,
) -> Result<Vec<TradeSettled>> {
    validate::validate_trade_batch(batch, max_matches)?;

    let mut settled = Vec::with_capacity(batch.matches.len());
    for m in &batch.matches {
        let offer = &batch.offers[m.offer_index];
        let fill = &batch.fills[m.fill_index];

        let offer_hash = resolve_order(ledger, nonces, availability, offer)?;
        let fill_hash = resolve_order(ledger, nonces, availability, fill)?;

        let owed = mul_div_floor(
            offer.order.want_amount,
            m.take_amount,
            offer.order.offer_amount,
        )?;

        availability.consume(offer_hash, m.take_amount)?;
        availability.consume(fill_hash, owed)?;

        // Offer maker receives `owed`; their consumed portion is `take`.
        credit_filled(
            ledger,
            &offer.order,
            owed,
            m.take_amount,
            batch.operator,
            Reason::TradeReceive,
        )?;
        // Fill maker receives `take`; their consumed portion is `owed`.
        credit_filled(
            ledger,
            &fill.order,
            m.take_amount,
            owed,
            batch.operator,
            Reason::TradeReceive,
        )?;

        settled.push(TradeSettled {
            offer_hash,
            fill_hash,
            take_amount: m.take_amount,
            owed_amount: owed,
        });
    }

    tracing::debug!(matches = settled.len(), "trade batch settled");
    Ok(settled)
}

/// Resolve an order reference against the availability table.
///
/// First sighting: verify the maker's signature, consume the nonce,
/// debit the maker's give-asset balance in full, and initialize
/// availability. Later sightings reuse stored availability untouched —
/// the maker is never re-debited.
pub(crate) fn resolve_order(
    ledger: &mut Ledger,
    nonces: &mut NonceRegistry,
    availability: &mut AvailabilityTable,
    signed: &SignedOrder,
) -> Result<OrderHash> {
    let order = &signed.order;
    let hash = order.hash();
    if availability.is_seen(hash) {
        return Ok(hash);
    }

    authorize(
        nonces,
        &order.maker,
        &order.signing_payload(),
        &signed.signature,
        order.nonce,
    )?;
    ledger.decrease(
        order.maker,
        &order.offer_asset,
        order.offer_amount,
        Reason::OfferReserve,
        Some(order.nonce),
    )?;
    availability.initialize(hash, order.offer_amount);
    Ok(hash)
}

/// Pay an order's maker their receive leg, net of the fee for the
/// consumed portion, and route the fee to the operator.
///
/// When the fee asset equals the received asset the fee comes off the
/// receive leg before credit; otherwise it is debited separately from
/// the maker's general balance. Receive-leg deduction keeps the number
/// of balance touches minimal and matches "you receive X net of fee".
pub(crate) fn credit_filled(
    ledger: &mut Ledger,
    order: &Order,
    receive_amount: u128,
    consumed_amount: u128,
    operator: AccountId,
    receive_reason: Reason,
) -> Result<()> {
    let fee_due = mul_div_floor(order.fee_amount, consumed_amount, order.offer_amount)?;

    if order.fee_asset == order.want_asset {
        let net = receive_amount
            .checked_sub(fee_due)
            .ok_or(ClearportError::FeeExceedsAmount {
                fee: fee_due,
                amount: receive_amount,
            })?;
        ledger.increase(order.maker, &order.want_asset, net, receive_reason, None)?;
        if fee_due > 0 {
            ledger.increase(
                operator,
                &order.fee_asset,
                fee_due,
                Reason::TradeFeeReceive,
                None,
            )?;
        }
    } else {
        ledger.increase(
            order.maker,
            &order.want_asset,
            receive_amount,
            receive_reason,
            None,
        )?;
        if fee_due > 0 {
            ledger.decrease(
                order.maker,
                &order.fee_asset,
                fee_due,
                Reason::TradeFeeGive,
                None,
            )?;
            ledger.increase(
                operator,
                &order.fee_asset,
                fee_due,
                Reason::TradeFeeReceive,
                None,
            )?;
        }
    }
    Ok(())
}

/// `floor(a * b / divisor)` with overflow detection. The divisor is an
/// order's offer amount, validated non-zero before any call.
pub(crate) fn mul_div_floor(a: u128, b: u128, divisor: u128) -> Result<u128> {
    let product = a
        .checked_mul(b)
        .ok_or(ClearportError::AmountOverflow)?;
    Ok(product / divisor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clearport_auth::Keypair;
    use clearport_types::{Match, OrderKind};

    fn sign(order: Order, kp: &Keypair) -> SignedOrder {
        let signature = kp.sign(&order.signing_payload());
        SignedOrder { order, signature }
    }

    struct Rig {
        ledger: Ledger,
        nonces: NonceRegistry,
        availability: AvailabilityTable,
        maker: Keypair,
        filler: Keypair,
        operator: AccountId,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                ledger: Ledger::new(),
                nonces: NonceRegistry::new(),
                availability: AvailabilityTable::new(),
                maker: Keypair::from_seed(&[1u8; 32]),
                filler: Keypair::from_seed(&[2u8; 32]),
                operator: AccountId([9u8; 32]),
            }
        }

        fn deposit(&mut self, account: AccountId, asset: &str, amount: u128) {
            self.ledger
                .increase(account, asset, amount, Reason::Deposit, None)
                .unwrap();
        }

        fn settle(&mut self, batch: &TradeBatch) -> Result<Vec<TradeSettled>> {
            settle_trade_batch(
                &mut self.ledger,
                &mut self.nonces,
                &mut self.availability,
                batch,
                64,
            )
        }
    }

    /// Worked scenario: maker offers 100 A for 50 B (no fee); filler
    /// gives 20 B for 40 A with a 3 A fee; take = 40.
    #[test]
    fn partial_fill_with_receive_leg_fee() {
        let mut rig = Rig::new();
        let maker = rig.maker.account();
        let filler = rig.filler.account();
        rig.deposit(maker, "A", 1_000);
        rig.deposit(filler, "B", 300);

        let offer = Order::dummy(OrderKind::Offer, maker, ("A", 100), ("B", 50), 1);
        let fill =
            Order::dummy(OrderKind::Fill, filler, ("B", 20), ("A", 40), 2).with_fee("A", 3);
        let offer_hash = offer.hash();

        let batch = TradeBatch {
            offers: vec![sign(offer, &rig.maker)],
            fills: vec![sign(fill, &rig.filler)],
            matches: vec![Match {
                offer_index: 0,
                fill_index: 0,
                take_amount: 40,
            }],
            operator: rig.operator,
        };
        let settled = rig.settle(&batch).unwrap();

        assert_eq!(settled.len(), 1);
        assert_eq!(settled[0].owed_amount, 20);

        // Maker: 100 A reserved, received 20 B.
        assert_eq!(rig.ledger.balance(maker, "A"), 900);
        assert_eq!(rig.ledger.balance(maker, "B"), 20);
        // Filler: 20 B reserved (fully consumed), received 40 - 3 A.
        assert_eq!(rig.ledger.balance(filler, "B"), 280);
        assert_eq!(rig.ledger.balance(filler, "A"), 37);
        // Operator: the fill's fee.
        assert_eq!(rig.ledger.balance(rig.operator, "A"), 3);
        // Offer has 60 A left; the fill is exhausted.
        assert_eq!(rig.availability.get(offer_hash), 60);
        assert_eq!(rig.availability.len(), 1);
    }

    #[test]
    fn proportional_owed_truncates() {
        // offer 10 → 20; take 3 ⇒ owed = floor(3 * 20 / 10) = 6.
        assert_eq!(mul_div_floor(20, 3, 10).unwrap(), 6);
        // offer 3 → 10; take 2 ⇒ owed = floor(2 * 10 / 3) = 6, never 7.
        assert_eq!(mul_div_floor(10, 2, 3).unwrap(), 6);
    }

    #[test]
    fn mul_div_overflow_detected() {
        let err = mul_div_floor(u128::MAX, 2, 1).unwrap_err();
        assert!(matches!(err, ClearportError::AmountOverflow));
    }

    #[test]
    fn second_sighting_does_not_redebit() {
        let mut rig = Rig::new();
        let maker = rig.maker.account();
        let filler = rig.filler.account();
        rig.deposit(maker, "A", 100);
        rig.deposit(filler, "B", 50);

        let offer = Order::dummy(OrderKind::Offer, maker, ("A", 100), ("B", 50), 1);
        let offer_hash = offer.hash();

        // Two fills against the same offer, in two separate batches.
        for (fill_nonce, take) in [(2u64, 40u128), (3, 20)] {
            let fill = Order::dummy(
                OrderKind::Fill,
                filler,
                ("B", mul_div_floor(50, take, 100).unwrap()),
                ("A", take),
                fill_nonce,
            );
            let batch = TradeBatch {
                offers: vec![sign(offer.clone(), &rig.maker)],
                fills: vec![sign(fill, &rig.filler)],
                matches: vec![Match {
                    offer_index: 0,
                    fill_index: 0,
                    take_amount: take,
                }],
                operator: rig.operator,
            };
            rig.settle(&batch).unwrap();
        }

        // Debited exactly once for the full 100 A.
        assert_eq!(rig.ledger.balance(maker, "A"), 0);
        assert_eq!(rig.availability.get(offer_hash), 40);
        // Maker received 20 + 10 B.
        assert_eq!(rig.ledger.balance(maker, "B"), 30);
    }

    #[test]
    fn overdraw_of_availability_rejected() {
        let mut rig = Rig::new();
        let maker = rig.maker.account();
        let filler = rig.filler.account();
        rig.deposit(maker, "A", 100);
        rig.deposit(filler, "B", 500);

        let offer = Order::dummy(OrderKind::Offer, maker, ("A", 100), ("B", 50), 1);
        let fill = Order::dummy(OrderKind::Fill, filler, ("B", 500), ("A", 1_000), 2);
        let batch = TradeBatch {
            offers: vec![sign(offer, &rig.maker)],
            fills: vec![sign(fill, &rig.filler)],
            matches: vec![Match {
                offer_index: 0,
                fill_index: 0,
                take_amount: 101,
            }],
            operator: rig.operator,
        };
        let err = rig.settle(&batch).unwrap_err();
        assert!(matches!(err, ClearportError::Overdraw { needed: 101, .. }));
    }

    #[test]
    fn tampered_signature_rejected() {
        let mut rig = Rig::new();
        let maker = rig.maker.account();
        let filler = rig.filler.account();
        rig.deposit(maker, "A", 100);
        rig.deposit(filler, "B", 50);

        let offer = Order::dummy(OrderKind::Offer, maker, ("A", 100), ("B", 50), 1);
        let fill = Order::dummy(OrderKind::Fill, filler, ("B", 50), ("A", 100), 2);
        let mut signed_offer = sign(offer, &rig.maker);
        signed_offer.signature[0] ^= 0xFF;

        let batch = TradeBatch {
            offers: vec![signed_offer],
            fills: vec![sign(fill, &rig.filler)],
            matches: vec![Match {
                offer_index: 0,
                fill_index: 0,
                take_amount: 100,
            }],
            operator: rig.operator,
        };
        let err = rig.settle(&batch).unwrap_err();
        assert!(matches!(err, ClearportError::BadSignature(_)));
        assert_eq!(rig.ledger.balance(maker, "A"), 100, "no partial effect");
    }

    #[test]
    fn burned_nonce_blocks_reinitialization() {
        let mut rig = Rig::new();
        let maker = rig.maker.account();
        let filler = rig.filler.account();
        rig.deposit(maker, "A", 200);
        rig.deposit(filler, "B", 100);

        let offer = Order::dummy(OrderKind::Offer, maker, ("A", 100), ("B", 50), 1);
        let fill = Order::dummy(OrderKind::Fill, filler, ("B", 50), ("A", 100), 2);
        let batch = TradeBatch {
            offers: vec![sign(offer.clone(), &rig.maker)],
            fills: vec![sign(fill, &rig.filler)],
            matches: vec![Match {
                offer_index: 0,
                fill_index: 0,
                take_amount: 100,
            }],
            operator: rig.operator,
        };
        rig.settle(&batch).unwrap();
        assert!(!rig.availability.is_seen(offer.hash()));

        // The offer is fully consumed; a fresh fill against the same
        // (exhausted) offer hash must die on the burned nonce.
        let fill2 = Order::dummy(OrderKind::Fill, filler, ("B", 25), ("A", 50), 3);
        let batch2 = TradeBatch {
            offers: vec![sign(offer, &rig.maker)],
            fills: vec![sign(fill2, &rig.filler)],
            matches: vec![Match {
                offer_index: 0,
                fill_index: 0,
                take_amount: 50,
            }],
            operator: rig.operator,
        };
        let err = rig.settle(&batch2).unwrap_err();
        assert!(matches!(err, ClearportError::NonceReused { nonce: 1 }));
    }

    #[test]
    fn separate_asset_fee_comes_from_general_balance() {
        let mut rig = Rig::new();
        let maker = rig.maker.account();
        let filler = rig.filler.account();
        rig.deposit(maker, "A", 100);
        rig.deposit(maker, "FEE", 10);
        rig.deposit(filler, "B", 50);

        let offer =
            Order::dummy(OrderKind::Offer, maker, ("A", 100), ("B", 50), 1).with_fee("FEE", 10);
        let fill = Order::dummy(OrderKind::Fill, filler, ("B", 50), ("A", 100), 2);
        let batch = TradeBatch {
            offers: vec![sign(offer, &rig.maker)],
            fills: vec![sign(fill, &rig.filler)],
            matches: vec![Match {
                offer_index: 0,
                fill_index: 0,
                take_amount: 100,
            }],
            operator: rig.operator,
        };
        rig.settle(&batch).unwrap();

        // Full consumption ⇒ full fee, in FEE, not carved from B.
        assert_eq!(rig.ledger.balance(maker, "B"), 50);
        assert_eq!(rig.ledger.balance(maker, "FEE"), 0);
        assert_eq!(rig.ledger.balance(rig.operator, "FEE"), 10);
    }

    #[test]
    fn fee_is_prorated_by_consumed_portion() {
        let mut rig = Rig::new();
        let maker = rig.maker.account();
        let filler = rig.filler.account();
        rig.deposit(maker, "A", 100);
        rig.deposit(filler, "B", 50);

        // Offer fee: 8 B on the receive leg; half the offer consumed
        // ⇒ fee due = floor(8 * 50 / 100) = 4.
        let offer =
            Order::dummy(OrderKind::Offer, maker, ("A", 100), ("B", 50), 1).with_fee("B", 8);
        let fill = Order::dummy(OrderKind::Fill, filler, ("B", 25), ("A", 50), 2);
        let batch = TradeBatch {
            offers: vec![sign(offer, &rig.maker)],
            fills: vec![sign(fill, &rig.filler)],
            matches: vec![Match {
                offer_index: 0,
                fill_index: 0,
                take_amount: 50,
            }],
            operator: rig.operator,
        };
        rig.settle(&batch).unwrap();

        // owed = 25; maker nets 25 - 4.
        assert_eq!(rig.ledger.balance(maker, "B"), 21);
        assert_eq!(rig.ledger.balance(rig.operator, "B"), 4);
    }

    #[test]
    fn conservation_across_a_batch() {
        let mut rig = Rig::new();
        let maker = rig.maker.account();
        let filler = rig.filler.account();
        rig.deposit(maker, "A", 1_000);
        rig.deposit(filler, "B", 300);

        let offer =
            Order::dummy(OrderKind::Offer, maker, ("A", 100), ("B", 50), 1).with_fee("B", 5);
        let fill =
            Order::dummy(OrderKind::Fill, filler, ("B", 20), ("A", 40), 2).with_fee("A", 3);
        let offer_hash = offer.hash();
        let batch = TradeBatch {
            offers: vec![sign(offer, &rig.maker)],
            fills: vec![sign(fill, &rig.filler)],
            matches: vec![Match {
                offer_index: 0,
                fill_index: 0,
                take_amount: 40,
            }],
            operator: rig.operator,
        };
        rig.settle(&batch).unwrap();

        // Balances plus open availability must equal total deposits.
        let open_a = rig.availability.get(offer_hash); // offer remainder, in A
        assert_eq!(rig.ledger.total_supply("A") + open_a, 1_000);
        assert_eq!(rig.ledger.total_supply("B"), 300);
    }
}
