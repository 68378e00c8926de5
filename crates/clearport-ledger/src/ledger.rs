//! The balance ledger.
//!
//! Maps (account, asset) to a non-negative amount. All mutations are
//! fail-fast: a debit checks sufficiency first and the balance is
//! untouched on error. Every applied mutation appends a [`BalanceEvent`]
//! so an external auditor can reconstruct the ledger from the event
//! stream alone.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use clearport_types::{
    AccountId, Asset, BalanceEvent, ClearportError, Direction, Reason, Result,
};

/// Authoritative mapping of (account, asset) → amount.
///
/// Owned and exclusively mutated by the settlement core; entities are
/// never shared-mutable from outside these primitives.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ledger {
    balances: HashMap<(AccountId, Asset), u128>,
    events: Vec<BalanceEvent>,
}

impl Ledger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current balance for an (account, asset) pair. Absent entries are zero.
    #[must_use]
    pub fn balance(&self, account: AccountId, asset: &str) -> u128 {
        self.balances
            .get(&(account, asset.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Credit an account.
    pub fn increase(
        &mut self,
        account: AccountId,
        asset: &str,
        amount: u128,
        reason: Reason,
        nonce: Option<u64>,
    ) -> Result<()> {
        let entry = self
            .balances
            .entry((account, asset.to_string()))
            .or_insert(0);
        *entry = entry
            .checked_add(amount)
            .ok_or(ClearportError::AmountOverflow)?;
        self.record(account, asset, amount, Direction::Increase, reason, nonce);
        Ok(())
    }

    /// Debit an account. Fails with `InsufficientBalance` and no state
    /// change if `amount` exceeds the current balance.
    pub fn decrease(
        &mut self,
        account: AccountId,
        asset: &str,
        amount: u128,
        reason: Reason,
        nonce: Option<u64>,
    ) -> Result<()> {
        let available = self.balance(account, asset);
        if available < amount {
            return Err(ClearportError::InsufficientBalance {
                asset: asset.to_string(),
                needed: amount,
                available,
            });
        }
        self.balances
            .insert((account, asset.to_string()), available - amount);
        self.record(account, asset, amount, Direction::Decrease, reason, nonce);
        Ok(())
    }

    /// Move funds between two accounts as a paired decrease + increase.
    pub fn transfer(
        &mut self,
        from: AccountId,
        to: AccountId,
        asset: &str,
        amount: u128,
        debit_reason: Reason,
        credit_reason: Reason,
        nonce: Option<u64>,
    ) -> Result<()> {
        self.decrease(from, asset, amount, debit_reason, nonce)?;
        self.increase(to, asset, amount, credit_reason, nonce)
    }

    /// Sum of all account balances for one asset. Used by conservation
    /// audits; excludes offer availability and is therefore *not* the
    /// total value the engine controls on its own.
    #[must_use]
    pub fn total_supply(&self, asset: &str) -> u128 {
        self.balances
            .iter()
            .filter(|((_, a), _)| a == asset)
            .map(|(_, amount)| amount)
            .sum()
    }

    /// The append-only audit stream, in application order.
    #[must_use]
    pub fn events(&self) -> &[BalanceEvent] {
        &self.events
    }

    /// Hand the accumulated events to an auditor, clearing the buffer.
    pub fn drain_events(&mut self) -> Vec<BalanceEvent> {
        std::mem::take(&mut self.events)
    }

    fn record(
        &mut self,
        account: AccountId,
        asset: &str,
        amount: u128,
        direction: Direction,
        reason: Reason,
        nonce: Option<u64>,
    ) {
        self.events.push(BalanceEvent {
            account,
            asset: asset.to_string(),
            amount,
            direction,
            reason,
            nonce,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acct(tag: u8) -> AccountId {
        AccountId([tag; 32])
    }

    #[test]
    fn increase_then_balance() {
        let mut ledger = Ledger::new();
        ledger
            .increase(acct(1), "USDT", 1_000, Reason::Deposit, None)
            .unwrap();
        assert_eq!(ledger.balance(acct(1), "USDT"), 1_000);
        assert_eq!(ledger.balance(acct(1), "BTC"), 0);
    }

    #[test]
    fn decrease_checks_sufficiency_first() {
        let mut ledger = Ledger::new();
        ledger
            .increase(acct(1), "USDT", 100, Reason::Deposit, None)
            .unwrap();
        let err = ledger
            .decrease(acct(1), "USDT", 200, Reason::Withdraw, None)
            .unwrap_err();
        assert!(matches!(
            err,
            ClearportError::InsufficientBalance {
                needed: 200,
                available: 100,
                ..
            }
        ));
        // Balance unchanged, no event recorded for the failed debit.
        assert_eq!(ledger.balance(acct(1), "USDT"), 100);
        assert_eq!(ledger.events().len(), 1);
    }

    #[test]
    fn transfer_moves_between_accounts() {
        let mut ledger = Ledger::new();
        ledger
            .increase(acct(1), "BTC", 5, Reason::Deposit, None)
            .unwrap();
        ledger
            .transfer(
                acct(1),
                acct(2),
                "BTC",
                3,
                Reason::SpendGive,
                Reason::SpendReceive,
                None,
            )
            .unwrap();
        assert_eq!(ledger.balance(acct(1), "BTC"), 2);
        assert_eq!(ledger.balance(acct(2), "BTC"), 3);
    }

    #[test]
    fn failed_transfer_has_no_effect() {
        let mut ledger = Ledger::new();
        let err = ledger
            .transfer(
                acct(1),
                acct(2),
                "BTC",
                1,
                Reason::SpendGive,
                Reason::SpendReceive,
                None,
            )
            .unwrap_err();
        assert!(matches!(err, ClearportError::InsufficientBalance { .. }));
        assert_eq!(ledger.balance(acct(2), "BTC"), 0);
        assert!(ledger.events().is_empty());
    }

    #[test]
    fn increase_overflow_is_rejected() {
        let mut ledger = Ledger::new();
        ledger
            .increase(acct(1), "BTC", u128::MAX, Reason::Deposit, None)
            .unwrap();
        let err = ledger
            .increase(acct(1), "BTC", 1, Reason::Deposit, None)
            .unwrap_err();
        assert!(matches!(err, ClearportError::AmountOverflow));
        assert_eq!(ledger.balance(acct(1), "BTC"), u128::MAX);
    }

    #[test]
    fn total_supply_sums_all_accounts() {
        let mut ledger = Ledger::new();
        ledger
            .increase(acct(1), "USDT", 1_000, Reason::Deposit, None)
            .unwrap();
        ledger
            .increase(acct(2), "USDT", 500, Reason::Deposit, None)
            .unwrap();
        ledger
            .increase(acct(2), "BTC", 7, Reason::Deposit, None)
            .unwrap();
        assert_eq!(ledger.total_supply("USDT"), 1_500);
        assert_eq!(ledger.total_supply("BTC"), 7);
    }

    #[test]
    fn events_reconstruct_the_ledger() {
        let mut ledger = Ledger::new();
        ledger
            .increase(acct(1), "ETH", 10, Reason::Deposit, Some(1))
            .unwrap();
        ledger
            .decrease(acct(1), "ETH", 4, Reason::Withdraw, Some(2))
            .unwrap();

        // Replay the stream into a fresh map.
        let mut replayed: HashMap<(AccountId, Asset), i128> = HashMap::new();
        for ev in ledger.events() {
            let slot = replayed
                .entry((ev.account, ev.asset.clone()))
                .or_insert(0);
            match ev.direction {
                Direction::Increase => *slot += i128::try_from(ev.amount).unwrap(),
                Direction::Decrease => *slot -= i128::try_from(ev.amount).unwrap(),
            }
        }
        assert_eq!(replayed[&(acct(1), "ETH".to_string())], 6);
        assert_eq!(ledger.balance(acct(1), "ETH"), 6);
    }

    #[test]
    fn drain_events_empties_the_buffer() {
        let mut ledger = Ledger::new();
        ledger
            .increase(acct(1), "ETH", 10, Reason::Deposit, None)
            .unwrap();
        let drained = ledger.drain_events();
        assert_eq!(drained.len(), 1);
        assert!(ledger.events().is_empty());
    }

    #[test]
    fn clone_is_a_snapshot() {
        let mut ledger = Ledger::new();
        ledger
            .increase(acct(1), "ETH", 10, Reason::Deposit, None)
            .unwrap();
        let snapshot = ledger.clone();
        ledger
            .decrease(acct(1), "ETH", 10, Reason::Withdraw, None)
            .unwrap();
        assert_eq!(snapshot.balance(acct(1), "ETH"), 10);
        assert_eq!(ledger.balance(acct(1), "ETH"), 0);
    }
}
