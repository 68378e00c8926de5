//! The broker: every boundary operation, backed by snapshot-and-restore.
//!
//! State layout mirrors what a deployment persists: the balances table,
//! the nonce bitmap, the offer availability table, the cancel
//! announcements, the swap table, and the spender grants — all keyed by
//! deterministic hashes of their defining fields. Venues sit outside
//! the snapshot: they are external systems whose side effects cannot be
//! rolled back from here.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use clearport_auth::{authorize, NonceRegistry};
use clearport_ledger::{Ledger, SpenderRegistry};
use clearport_matching::{
    cancel as offer_cancel, settle_network_batch, settle_trade_batch, AvailabilityTable,
    CancelState, LiquidityVenue, VenueRegistry,
};
use clearport_swap::{cancel_swap, create_swap, execute_swap, SwapTable};
use clearport_types::{
    AccountId, BalanceEvent, BrokerConfig, ClearportError, NetworkBatch, NetworkTradeSettled,
    Order, Reason, Result, SpenderApproval, SummaryRecord, Swap, SwapHash, SwapState, TradeBatch,
    TradeSettled, Withdrawal,
};

use crate::admin::TradingState;

/// Everything a deployment persists, as one cloneable value. Cloning it
/// is the transaction snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct BrokerState {
    ledger: Ledger,
    nonces: NonceRegistry,
    availability: AvailabilityTable,
    cancels: CancelState,
    swaps: SwapTable,
    spenders: SpenderRegistry,
    operators: HashSet<AccountId>,
    trading: TradingState,
    records: Vec<SummaryRecord>,
}

/// The settlement engine's external boundary.
pub struct Broker {
    config: BrokerConfig,
    /// The admin identity; also the default fee collector for
    /// withdrawals and swaps.
    operator: AccountId,
    state: BrokerState,
    venues: VenueRegistry,
}

impl Broker {
    #[must_use]
    pub fn new(operator: AccountId) -> Self {
        Self::with_config(operator, BrokerConfig::default())
    }

    #[must_use]
    pub fn with_config(operator: AccountId, config: BrokerConfig) -> Self {
        let mut state = BrokerState::default();
        state.operators.insert(operator);
        Self {
            config,
            operator,
            state,
            venues: VenueRegistry::new(),
        }
    }

    // =====================================================================
    // Accessors
    // =====================================================================

    #[must_use]
    pub fn operator(&self) -> AccountId {
        self.operator
    }

    #[must_use]
    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    #[must_use]
    pub fn balance(&self, account: AccountId, asset: &str) -> u128 {
        self.state.ledger.balance(account, asset)
    }

    #[must_use]
    pub fn total_supply(&self, asset: &str) -> u128 {
        self.state.ledger.total_supply(asset)
    }

    /// Remaining availability for an offer/fill hash.
    #[must_use]
    pub fn availability(&self, hash: clearport_types::OrderHash) -> u128 {
        self.state.availability.get(hash)
    }

    #[must_use]
    pub fn swap_state(&self, hash: SwapHash) -> Option<SwapState> {
        self.state.swaps.state(hash)
    }

    #[must_use]
    pub fn trading_state(&self) -> TradingState {
        self.state.trading
    }

    #[must_use]
    pub fn is_operator_whitelisted(&self, account: AccountId) -> bool {
        self.state.operators.contains(&account)
    }

    /// The balance-mutation audit stream, in application order.
    #[must_use]
    pub fn events(&self) -> &[BalanceEvent] {
        self.state.ledger.events()
    }

    /// Hand the accumulated balance events to an auditor.
    pub fn drain_events(&mut self) -> Vec<BalanceEvent> {
        self.state.ledger.drain_events()
    }

    /// Completed-operation summary records.
    #[must_use]
    pub fn records(&self) -> &[SummaryRecord] {
        &self.state.records
    }

    // =====================================================================
    // Ledger boundary
    // =====================================================================

    /// Credit a deposit arriving from an external asset source.
    pub fn deposit(&mut self, account: AccountId, asset: &str, amount: u128) -> Result<()> {
        if amount == 0 {
            return Err(ClearportError::ZeroAmount);
        }
        self.state
            .ledger
            .increase(account, asset, amount, Reason::Deposit, None)
    }

    /// Credit a deposit whose received amount differs from the declared
    /// one (fee-on-transfer assets). Only what actually arrived is
    /// credited.
    pub fn deposit_received(
        &mut self,
        account: AccountId,
        asset: &str,
        declared: u128,
        received: u128,
    ) -> Result<()> {
        if received == 0 {
            return Err(ClearportError::ZeroAmount);
        }
        if received != declared {
            tracing::debug!(%account, asset, declared, received, "deposit reconciled");
        }
        self.state
            .ledger
            .increase(account, asset, received, Reason::Deposit, None)
    }

    /// Execute a signed withdrawal. The fee goes to the broker operator,
    /// carved from the withdrawn amount when denominated in the same
    /// asset.
    pub fn withdraw(&mut self, withdrawal: &Withdrawal, signature: &[u8]) -> Result<()> {
        let w = withdrawal.clone();
        let signature = signature.to_vec();
        self.transactional(move |broker| {
            if w.amount == 0 {
                return Err(ClearportError::ZeroAmount);
            }
            if w.fee_asset == w.asset && w.fee_amount > w.amount {
                return Err(ClearportError::FeeExceedsAmount {
                    fee: w.fee_amount,
                    amount: w.amount,
                });
            }
            authorize(
                &mut broker.state.nonces,
                &w.account,
                &w.signing_payload(),
                &signature,
                w.nonce,
            )?;

            let operator = broker.operator;
            broker.state.ledger.decrease(
                w.account,
                &w.asset,
                w.amount,
                Reason::Withdraw,
                Some(w.nonce),
            )?;
            if w.fee_amount > 0 {
                if w.fee_asset == w.asset {
                    broker.state.ledger.increase(
                        operator,
                        &w.asset,
                        w.fee_amount,
                        Reason::WithdrawFeeReceive,
                        Some(w.nonce),
                    )?;
                } else {
                    broker.state.ledger.decrease(
                        w.account,
                        &w.fee_asset,
                        w.fee_amount,
                        Reason::WithdrawFeeGive,
                        Some(w.nonce),
                    )?;
                    broker.state.ledger.increase(
                        operator,
                        &w.fee_asset,
                        w.fee_amount,
                        Reason::WithdrawFeeReceive,
                        Some(w.nonce),
                    )?;
                }
            }
            broker.state.records.push(SummaryRecord::Withdrawal {
                account: w.account,
                asset: w.asset.clone(),
                amount: w.amount,
            });
            Ok(())
        })
    }

    // =====================================================================
    // Trading
    // =====================================================================

    /// Settle a batch of signed-order matches.
    pub fn trade(&mut self, batch: &TradeBatch) -> Result<Vec<TradeSettled>> {
        self.transactional(|broker| {
            broker.state.trading.ensure_active()?;
            broker.ensure_whitelisted(batch.operator)?;

            let settled = settle_trade_batch(
                &mut broker.state.ledger,
                &mut broker.state.nonces,
                &mut broker.state.availability,
                batch,
                broker.config.max_matches_per_batch,
            )?;
            for trade in &settled {
                broker.state.records.push(SummaryRecord::Trade {
                    offer_hash: trade.offer_hash,
                    fill_hash: trade.fill_hash,
                    take_amount: trade.take_amount,
                });
            }
            tracing::info!(matches = settled.len(), "trade batch settled");
            Ok(settled)
        })
    }

    /// Settle a batch of offers against external liquidity venues.
    pub fn network_trade(&mut self, batch: &NetworkBatch) -> Result<Vec<NetworkTradeSettled>> {
        self.transactional(|broker| {
            broker.state.trading.ensure_active()?;
            broker.ensure_whitelisted(batch.operator)?;

            let settled = settle_network_batch(
                &mut broker.state.ledger,
                &mut broker.state.nonces,
                &mut broker.state.availability,
                &mut broker.venues,
                batch,
                broker.config.max_matches_per_batch,
            )?;
            for trade in &settled {
                broker.state.records.push(SummaryRecord::NetworkTrade {
                    offer_hash: trade.offer_hash,
                    venue: trade.venue.clone(),
                    take_amount: trade.take_amount,
                    surplus: trade.surplus,
                });
            }
            tracing::info!(matches = settled.len(), "network batch settled");
            Ok(settled)
        })
    }

    // =====================================================================
    // Offer cancellation
    // =====================================================================

    /// Instantly cancel an offer with the maker's signed cancel message.
    /// Returns the refunded amount.
    pub fn cancel_offer(
        &mut self,
        order: &Order,
        expected_available: u128,
        cancel_nonce: u64,
        signature: &[u8],
    ) -> Result<u128> {
        let signature = signature.to_vec();
        self.transactional(move |broker| {
            let refunded = offer_cancel::cancel(
                &mut broker.state.ledger,
                &mut broker.state.nonces,
                &mut broker.state.availability,
                &mut broker.state.cancels,
                order,
                expected_available,
                cancel_nonce,
                &signature,
            )?;
            broker.state.records.push(SummaryRecord::OfferCancelled {
                offer_hash: order.hash(),
                refunded,
            });
            Ok(refunded)
        })
    }

    /// Announce intent to cancel an offer; `slow_cancel` becomes
    /// available once the configured delay elapses.
    pub fn announce_cancel(
        &mut self,
        caller: AccountId,
        order: &Order,
        now: DateTime<Utc>,
    ) -> Result<()> {
        offer_cancel::announce_cancel(
            &self.state.availability,
            &mut self.state.cancels,
            caller,
            order,
            now,
        )
    }

    /// Execute a previously announced cancel. Callable by anyone.
    pub fn slow_cancel(&mut self, order: &Order, now: DateTime<Utc>) -> Result<u128> {
        let delay = self.config.announce_delay_secs;
        self.transactional(move |broker| {
            let refunded = offer_cancel::slow_cancel(
                &mut broker.state.ledger,
                &mut broker.state.availability,
                &mut broker.state.cancels,
                order,
                delay,
                now,
            )?;
            broker.state.records.push(SummaryRecord::OfferCancelled {
                offer_hash: order.hash(),
                refunded,
            });
            Ok(refunded)
        })
    }

    // =====================================================================
    // Atomic swaps
    // =====================================================================

    /// Create a swap from the maker's signed descriptor.
    pub fn create_swap(
        &mut self,
        swap: &Swap,
        signature: &[u8],
        now: DateTime<Utc>,
    ) -> Result<SwapHash> {
        let signature = signature.to_vec();
        self.transactional(move |broker| {
            broker.state.trading.ensure_active()?;
            let hash = create_swap(
                &mut broker.state.ledger,
                &mut broker.state.nonces,
                &mut broker.state.swaps,
                swap,
                &signature,
                now,
            )?;
            broker
                .state
                .records
                .push(SummaryRecord::SwapCreated { swap_hash: hash });
            Ok(hash)
        })
    }

    /// Execute an active swap by revealing the preimage.
    pub fn execute_swap(&mut self, swap: &Swap, preimage: &[u8]) -> Result<SwapHash> {
        let preimage = preimage.to_vec();
        self.transactional(move |broker| {
            let operator = broker.operator;
            let hash = execute_swap(
                &mut broker.state.ledger,
                &mut broker.state.swaps,
                swap,
                &preimage,
                operator,
            )?;
            broker
                .state
                .records
                .push(SummaryRecord::SwapExecuted { swap_hash: hash });
            Ok(hash)
        })
    }

    /// Cancel an expired swap, refunding the maker net of `cancel_fee`.
    pub fn cancel_swap(
        &mut self,
        swap: &Swap,
        cancel_fee: u128,
        now: DateTime<Utc>,
    ) -> Result<SwapHash> {
        self.transactional(move |broker| {
            let operator = broker.operator;
            let hash = cancel_swap(
                &mut broker.state.ledger,
                &mut broker.state.swaps,
                swap,
                cancel_fee,
                operator,
                now,
            )?;
            broker
                .state
                .records
                .push(SummaryRecord::SwapCancelled { swap_hash: hash });
            Ok(hash)
        })
    }

    // =====================================================================
    // Spender capabilities
    // =====================================================================

    /// Grant a spender capability from the account's signed approval.
    pub fn authorize_spender(&mut self, approval: &SpenderApproval, signature: &[u8]) -> Result<()> {
        let signature = signature.to_vec();
        self.transactional(move |broker| {
            authorize(
                &mut broker.state.nonces,
                &approval.account,
                &approval.signing_payload(),
                &signature,
                approval.nonce,
            )?;
            broker
                .state
                .spenders
                .authorize(approval.account, approval.spender);
            Ok(())
        })
    }

    /// Revoke a spender capability. Direct call by the granting account.
    pub fn unauthorize_spender(&mut self, caller: AccountId, spender: AccountId) {
        self.state.spenders.unauthorize(caller, spender);
    }

    /// Third-party transfer, gated on a prior spender grant.
    pub fn spend_from(
        &mut self,
        spender: AccountId,
        from: AccountId,
        to: AccountId,
        asset: &str,
        amount: u128,
    ) -> Result<()> {
        self.transactional(move |broker| {
            if amount == 0 {
                return Err(ClearportError::ZeroAmount);
            }
            broker.state.spenders.ensure_authorized(from, spender)?;
            broker.state.ledger.transfer(
                from,
                to,
                asset,
                amount,
                Reason::SpendGive,
                Reason::SpendReceive,
                None,
            )
        })
    }

    // =====================================================================
    // Admin / emergency
    // =====================================================================

    /// Whitelist an additional trade operator.
    pub fn add_operator(&mut self, caller: AccountId, operator: AccountId) -> Result<()> {
        self.ensure_admin(caller)?;
        self.state.operators.insert(operator);
        Ok(())
    }

    /// Remove a trade operator from the whitelist.
    pub fn remove_operator(&mut self, caller: AccountId, operator: AccountId) -> Result<()> {
        self.ensure_admin(caller)?;
        self.state.operators.remove(&operator);
        Ok(())
    }

    /// Whitelist a liquidity venue under a caller-facing identifier.
    pub fn register_venue(
        &mut self,
        caller: AccountId,
        id: impl Into<String>,
        venue: Box<dyn LiquidityVenue>,
    ) -> Result<()> {
        self.ensure_admin(caller)?;
        self.venues.register(id, venue);
        Ok(())
    }

    /// Remove a venue from the whitelist.
    pub fn deregister_venue(&mut self, caller: AccountId, id: &str) -> Result<()> {
        self.ensure_admin(caller)?;
        self.venues.deregister(id);
        Ok(())
    }

    /// Stop accepting trades, network trades, and swap creation.
    pub fn freeze_trading(&mut self, caller: AccountId) -> Result<()> {
        self.ensure_admin(caller)?;
        self.state.trading = TradingState::Frozen;
        tracing::warn!("trading frozen");
        Ok(())
    }

    /// Resume normal operation.
    pub fn resume_trading(&mut self, caller: AccountId) -> Result<()> {
        self.ensure_admin(caller)?;
        self.state.trading = TradingState::Active;
        tracing::warn!("trading resumed");
        Ok(())
    }

    /// Operator-forced withdrawal of a user's funds. Only permitted
    /// while trading is frozen.
    pub fn emergency_withdraw(
        &mut self,
        caller: AccountId,
        account: AccountId,
        asset: &str,
        amount: u128,
    ) -> Result<()> {
        self.ensure_admin(caller)?;
        self.state.trading.ensure_frozen()?;
        self.state
            .ledger
            .decrease(account, asset, amount, Reason::EmergencyWithdraw, None)?;
        tracing::warn!(%account, asset, amount, "emergency withdrawal");
        Ok(())
    }

    // =====================================================================
    // Internals
    // =====================================================================

    /// Run a mutating operation with all-or-nothing semantics: core
    /// state is snapshotted on entry and restored on error.
    fn transactional<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let snapshot = self.state.clone();
        match f(self) {
            Ok(value) => Ok(value),
            Err(err) => {
                self.state = snapshot;
                Err(err)
            }
        }
    }

    fn ensure_whitelisted(&self, operator: AccountId) -> Result<()> {
        if self.state.operators.contains(&operator) {
            Ok(())
        } else {
            Err(ClearportError::OperatorNotWhitelisted(operator))
        }
    }

    fn ensure_admin(&self, caller: AccountId) -> Result<()> {
        if caller == self.operator {
            Ok(())
        } else {
            Err(ClearportError::NotOperator(caller))
        }
    }
}

impl std::fmt::Debug for Broker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broker")
            .field("operator", &self.operator)
            .field("trading", &self.state.trading)
            .field("venues", &self.venues)
            .finish_non_exhaustive()
    }
}
