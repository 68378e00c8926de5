//! Spender capabilities.
//!
//! A spender is a third party allowed to move an account's funds via
//! `spend_from`. Granting the capability requires a signed, nonced
//! approval (handled at the broker boundary); this registry only stores
//! and checks the resulting grants.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use clearport_types::{AccountId, ClearportError, Result};

/// Account → set of authorized spenders.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpenderRegistry {
    grants: HashMap<AccountId, HashSet<AccountId>>,
}

impl SpenderRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant `spender` the capability over `account`'s balances.
    pub fn authorize(&mut self, account: AccountId, spender: AccountId) {
        self.grants.entry(account).or_default().insert(spender);
    }

    /// Revoke a previously granted capability. Revoking a grant that
    /// never existed is a no-op.
    pub fn unauthorize(&mut self, account: AccountId, spender: AccountId) {
        if let Some(spenders) = self.grants.get_mut(&account) {
            spenders.remove(&spender);
            if spenders.is_empty() {
                self.grants.remove(&account);
            }
        }
    }

    #[must_use]
    pub fn is_authorized(&self, account: AccountId, spender: AccountId) -> bool {
        self.grants
            .get(&account)
            .is_some_and(|spenders| spenders.contains(&spender))
    }

    /// Capability check used by third-party balance moves.
    pub fn ensure_authorized(&self, account: AccountId, spender: AccountId) -> Result<()> {
        if self.is_authorized(account, spender) {
            Ok(())
        } else {
            Err(ClearportError::SpenderNotAuthorized { spender, account })
        }
    }
}
