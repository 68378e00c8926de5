//! The per-swap state machine.
//!
//! States are {NonExistent, Active, Settled}, with NonExistent encoded
//! as table absence. Create moves the maker's funds into the reserved
//! escrow account and records Active; execute and cancel are the only
//! exits, each taken at most once, each fully paying out the escrow.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use clearport_auth::{authorize, NonceRegistry};
use clearport_ledger::Ledger;
use clearport_types::{
    AccountId, ClearportError, Reason, Result, Swap, SwapHash, SwapState,
};

/// Active/settled flags for every swap ever created, keyed by content hash.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SwapTable {
    swaps: HashMap<SwapHash, SwapState>,
}

impl SwapTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self, hash: SwapHash) -> Option<SwapState> {
        self.swaps.get(&hash).copied()
    }

    #[must_use]
    pub fn is_active(&self, hash: SwapHash) -> bool {
        self.state(hash) == Some(SwapState::Active)
    }

    fn ensure_active(&self, hash: SwapHash) -> Result<()> {
        // Covers unknown swaps, double execution, and execute-after-cancel.
        if self.is_active(hash) {
            Ok(())
        } else {
            Err(ClearportError::SwapNotActive(hash))
        }
    }
}

/// Create a swap from the maker's signed descriptor.
///
/// Verifies the signature and nonce, validates the terms, and moves
/// `amount` — plus the fee when it is denominated in a different asset —
/// from the maker into escrow.
pub fn create_swap(
    ledger: &mut Ledger,
    nonces: &mut NonceRegistry,
    table: &mut SwapTable,
    swap: &Swap,
    signature: &[u8],
    now: DateTime<Utc>,
) -> Result<SwapHash> {
    swap.validate(now)?;
    let hash = swap.hash();
    if table.is_active(hash) {
        return Err(ClearportError::SwapAlreadyActive(hash));
    }

    authorize(
        nonces,
        &swap.maker,
        &swap.signing_payload(),
        signature,
        swap.nonce,
    )?;

    ledger.transfer(
        swap.maker,
        AccountId::ESCROW,
        &swap.asset,
        swap.amount,
        Reason::SwapLockGive,
        Reason::SwapLockReceive,
        Some(swap.nonce),
    )?;
    if swap.fee_asset != swap.asset && swap.fee_amount > 0 {
        ledger.transfer(
            swap.maker,
            AccountId::ESCROW,
            &swap.fee_asset,
            swap.fee_amount,
            Reason::SwapLockGive,
            Reason::SwapLockReceive,
            Some(swap.nonce),
        )?;
    }

    table.swaps.insert(hash, SwapState::Active);
    tracing::debug!(%hash, amount = swap.amount, "swap created");
    Ok(hash)
}

/// Execute an active swap by revealing the secret preimage. Any caller
/// may execute — possession of the preimage is the capability.
pub fn execute_swap(
    ledger: &mut Ledger,
    table: &mut SwapTable,
    swap: &Swap,
    preimage: &[u8],
    operator: AccountId,
) -> Result<SwapHash> {
    if !swap.secret_matches(preimage) {
        return Err(ClearportError::SecretMismatch);
    }
    let hash = swap.hash();
    table.ensure_active(hash)?;

    ledger.decrease(
        AccountId::ESCROW,
        &swap.asset,
        swap.amount,
        Reason::SwapRelease,
        Some(swap.nonce),
    )?;
    if swap.fee_asset == swap.asset {
        // fee_amount <= amount was validated at creation.
        ledger.increase(
            swap.taker,
            &swap.asset,
            swap.amount - swap.fee_amount,
            Reason::SwapReceive,
            Some(swap.nonce),
        )?;
        if swap.fee_amount > 0 {
            ledger.increase(
                operator,
                &swap.asset,
                swap.fee_amount,
                Reason::SwapFeeReceive,
                Some(swap.nonce),
            )?;
        }
    } else {
        ledger.increase(
            swap.taker,
            &swap.asset,
            swap.amount,
            Reason::SwapReceive,
            Some(swap.nonce),
        )?;
        if swap.fee_amount > 0 {
            ledger.decrease(
                AccountId::ESCROW,
                &swap.fee_asset,
                swap.fee_amount,
                Reason::SwapRelease,
                Some(swap.nonce),
            )?;
            ledger.increase(
                operator,
                &swap.fee_asset,
                swap.fee_amount,
                Reason::SwapFeeReceive,
                Some(swap.nonce),
            )?;
        }
    }

    table.swaps.insert(hash, SwapState::Settled);
    tracing::debug!(%hash, "swap executed");
    Ok(hash)
}

/// Cancel an active swap after its expiry, refunding the maker net of a
/// cancel fee bounded by the swap's declared fee.
pub fn cancel_swap(
    ledger: &mut Ledger,
    table: &mut SwapTable,
    swap: &Swap,
    cancel_fee: u128,
    operator: AccountId,
    now: DateTime<Utc>,
) -> Result<SwapHash> {
    let hash = swap.hash();
    table.ensure_active(hash)?;
    if now < swap.expires_at {
        return Err(ClearportError::SwapNotExpired {
            expires_at: swap.expires_at,
            now,
        });
    }
    if cancel_fee > swap.fee_amount {
        return Err(ClearportError::FeeExceedsAmount {
            fee: cancel_fee,
            amount: swap.fee_amount,
        });
    }

    ledger.decrease(
        AccountId::ESCROW,
        &swap.asset,
        swap.amount,
        Reason::SwapRelease,
        Some(swap.nonce),
    )?;
    if swap.fee_asset == swap.asset {
        ledger.increase(
            swap.maker,
            &swap.asset,
            swap.amount - cancel_fee,
            Reason::SwapRefund,
            Some(swap.nonce),
        )?;
        if cancel_fee > 0 {
            ledger.increase(
                operator,
                &swap.asset,
                cancel_fee,
                Reason::SwapFeeReceive,
                Some(swap.nonce),
            )?;
        }
    } else {
        ledger.increase(
            swap.maker,
            &swap.asset,
            swap.amount,
            Reason::SwapRefund,
            Some(swap.nonce),
        )?;
        if swap.fee_amount > 0 {
            // The escrowed fee splits between the operator's cancel fee
            // and the maker's refund.
            ledger.decrease(
                AccountId::ESCROW,
                &swap.fee_asset,
                swap.fee_amount,
                Reason::SwapRelease,
                Some(swap.nonce),
            )?;
            if cancel_fee > 0 {
                ledger.increase(
                    operator,
                    &swap.fee_asset,
                    cancel_fee,
                    Reason::SwapFeeReceive,
                    Some(swap.nonce),
                )?;
            }
            ledger.increase(
                swap.maker,
                &swap.fee_asset,
                swap.fee_amount - cancel_fee,
                Reason::SwapRefund,
                Some(swap.nonce),
            )?;
        }
    }

    table.swaps.insert(hash, SwapState::Settled);
    tracing::debug!(%hash, "swap cancelled");
    Ok(hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use clearport_auth::Keypair;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    struct Rig {
        ledger: Ledger,
        nonces: NonceRegistry,
        table: SwapTable,
        maker: Keypair,
        taker: AccountId,
        operator: AccountId,
    }

    impl Rig {
        fn new() -> Self {
            let mut rig = Self {
                ledger: Ledger::new(),
                nonces: NonceRegistry::new(),
                table: SwapTable::new(),
                maker: Keypair::from_seed(&[8u8; 32]),
                taker: AccountId([2u8; 32]),
                operator: AccountId([9u8; 32]),
            };
            rig.ledger
                .increase(rig.maker.account(), "A", 42, Reason::Deposit, None)
                .unwrap();
            rig
        }

        fn swap(&self) -> Swap {
            Swap::dummy(
                self.maker.account(),
                self.taker,
                "A",
                10,
                b"s3cret",
                now() + Duration::seconds(600),
                1,
            )
            .with_fee("A", 2)
        }

        fn create(&mut self, swap: &Swap) -> Result<SwapHash> {
            let signature = self.maker.sign(&swap.signing_payload());
            create_swap(
                &mut self.ledger,
                &mut self.nonces,
                &mut self.table,
                swap,
                &signature,
                now(),
            )
        }
    }

    #[test]
    fn create_escrows_and_activates() {
        let mut rig = Rig::new();
        let swap = rig.swap();
        let hash = rig.create(&swap).unwrap();

        assert!(rig.table.is_active(hash));
        assert_eq!(rig.ledger.balance(rig.maker.account(), "A"), 32);
        assert_eq!(rig.ledger.balance(AccountId::ESCROW, "A"), 10);
    }

    #[test]
    fn execute_pays_taker_and_operator() {
        let mut rig = Rig::new();
        let swap = rig.swap();
        let hash = rig.create(&swap).unwrap();

        execute_swap(&mut rig.ledger, &mut rig.table, &swap, b"s3cret", rig.operator).unwrap();

        assert_eq!(rig.table.state(hash), Some(SwapState::Settled));
        assert_eq!(rig.ledger.balance(rig.taker, "A"), 8);
        assert_eq!(rig.ledger.balance(rig.operator, "A"), 2);
        assert_eq!(rig.ledger.balance(AccountId::ESCROW, "A"), 0);
    }

    #[test]
    fn wrong_preimage_rejected() {
        let mut rig = Rig::new();
        let swap = rig.swap();
        rig.create(&swap).unwrap();

        let err = execute_swap(
            &mut rig.ledger,
            &mut rig.table,
            &swap,
            b"not-it",
            rig.operator,
        )
        .unwrap_err();
        assert!(matches!(err, ClearportError::SecretMismatch));
        assert_eq!(rig.ledger.balance(AccountId::ESCROW, "A"), 10);
    }

    #[test]
    fn double_execute_blocked() {
        let mut rig = Rig::new();
        let swap = rig.swap();
        rig.create(&swap).unwrap();
        execute_swap(&mut rig.ledger, &mut rig.table, &swap, b"s3cret", rig.operator).unwrap();

        let err = execute_swap(
            &mut rig.ledger,
            &mut rig.table,
            &swap,
            b"s3cret",
            rig.operator,
        )
        .unwrap_err();
        assert!(matches!(err, ClearportError::SwapNotActive(_)));
    }

    #[test]
    fn execute_unknown_swap_blocked() {
        let mut rig = Rig::new();
        let swap = rig.swap();
        let err = execute_swap(
            &mut rig.ledger,
            &mut rig.table,
            &swap,
            b"s3cret",
            rig.operator,
        )
        .unwrap_err();
        assert!(matches!(err, ClearportError::SwapNotActive(_)));
    }

    #[test]
    fn cancel_before_expiry_blocked() {
        let mut rig = Rig::new();
        let swap = rig.swap();
        rig.create(&swap).unwrap();

        let err = cancel_swap(
            &mut rig.ledger,
            &mut rig.table,
            &swap,
            0,
            rig.operator,
            now() + Duration::seconds(599),
        )
        .unwrap_err();
        assert!(matches!(err, ClearportError::SwapNotExpired { .. }));
    }

    #[test]
    fn cancel_after_expiry_refunds_net_of_cancel_fee() {
        let mut rig = Rig::new();
        let swap = rig.swap();
        let hash = rig.create(&swap).unwrap();

        cancel_swap(
            &mut rig.ledger,
            &mut rig.table,
            &swap,
            1,
            rig.operator,
            swap.expires_at,
        )
        .unwrap();

        assert_eq!(rig.table.state(hash), Some(SwapState::Settled));
        assert_eq!(rig.ledger.balance(rig.maker.account(), "A"), 41);
        assert_eq!(rig.ledger.balance(rig.operator, "A"), 1);
        assert_eq!(rig.ledger.balance(AccountId::ESCROW, "A"), 0);
    }

    #[test]
    fn cancel_fee_bounded_by_swap_fee() {
        let mut rig = Rig::new();
        let swap = rig.swap();
        rig.create(&swap).unwrap();

        let err = cancel_swap(
            &mut rig.ledger,
            &mut rig.table,
            &swap,
            3,
            rig.operator,
            swap.expires_at,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ClearportError::FeeExceedsAmount { fee: 3, amount: 2 }
        ));
    }

    #[test]
    fn execute_after_cancel_blocked() {
        let mut rig = Rig::new();
        let swap = rig.swap();
        rig.create(&swap).unwrap();
        cancel_swap(
            &mut rig.ledger,
            &mut rig.table,
            &swap,
            0,
            rig.operator,
            swap.expires_at,
        )
        .unwrap();

        let err = execute_swap(
            &mut rig.ledger,
            &mut rig.table,
            &swap,
            b"s3cret",
            rig.operator,
        )
        .unwrap_err();
        assert!(matches!(err, ClearportError::SwapNotActive(_)));
    }

    #[test]
    fn replayed_create_dies_on_nonce() {
        let mut rig = Rig::new();
        let swap = rig.swap();
        rig.create(&swap).unwrap();
        execute_swap(&mut rig.ledger, &mut rig.table, &swap, b"s3cret", rig.operator).unwrap();

        // Same descriptor again: hash no longer active, but the nonce
        // was consumed the first time.
        let err = rig.create(&swap).unwrap_err();
        assert!(matches!(err, ClearportError::NonceReused { nonce: 1 }));
    }

    #[test]
    fn separate_fee_asset_is_escrowed_and_split() {
        let mut rig = Rig::new();
        rig.ledger
            .increase(rig.maker.account(), "FEE", 5, Reason::Deposit, None)
            .unwrap();
        let swap = Swap::dummy(
            rig.maker.account(),
            rig.taker,
            "A",
            10,
            b"s3cret",
            now() + Duration::seconds(600),
            2,
        )
        .with_fee("FEE", 5);
        rig.create(&swap).unwrap();

        assert_eq!(rig.ledger.balance(AccountId::ESCROW, "FEE"), 5);

        cancel_swap(
            &mut rig.ledger,
            &mut rig.table,
            &swap,
            2,
            rig.operator,
            swap.expires_at,
        )
        .unwrap();

        // Maker gets the full amount back plus the unclaimed fee part.
        assert_eq!(rig.ledger.balance(rig.maker.account(), "A"), 42);
        assert_eq!(rig.ledger.balance(rig.maker.account(), "FEE"), 3);
        assert_eq!(rig.ledger.balance(rig.operator, "FEE"), 2);
        assert_eq!(rig.ledger.balance(AccountId::ESCROW, "FEE"), 0);
    }

    #[test]
    fn duplicate_active_swap_rejected_before_nonce_burn() {
        let mut rig = Rig::new();
        rig.ledger
            .increase(rig.maker.account(), "A", 100, Reason::Deposit, None)
            .unwrap();
        let swap = rig.swap();
        rig.create(&swap).unwrap();

        let err = rig.create(&swap).unwrap_err();
        assert!(matches!(err, ClearportError::SwapAlreadyActive(_)));
    }

    #[test]
    fn conservation_through_full_lifecycle() {
        let mut rig = Rig::new();
        let swap = rig.swap();
        rig.create(&swap).unwrap();
        execute_swap(&mut rig.ledger, &mut rig.table, &swap, b"s3cret", rig.operator).unwrap();

        // 42 A deposited; escrow is empty; the sum across all accounts
        // is unchanged.
        assert_eq!(rig.ledger.total_supply("A"), 42);
    }
}
