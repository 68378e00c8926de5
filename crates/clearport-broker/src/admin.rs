//! Emergency trading control.

use serde::{Deserialize, Serialize};

use clearport_types::{ClearportError, Result};

/// Whether settlement operations are currently accepted.
///
/// Freezing rejects trades, network trades, and swap creation.
/// Deposits, withdrawals, and cancellations keep working — users can
/// always get their funds out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TradingState {
    #[default]
    Active,
    Frozen,
}

impl TradingState {
    #[must_use]
    pub fn is_frozen(self) -> bool {
        self == Self::Frozen
    }

    /// Guard for settlement operations.
    pub fn ensure_active(self) -> Result<()> {
        if self.is_frozen() {
            Err(ClearportError::TradingFrozen)
        } else {
            Ok(())
        }
    }

    /// Guard for operations that only make sense mid-emergency.
    pub fn ensure_frozen(self) -> Result<()> {
        if self.is_frozen() {
            Ok(())
        } else {
            Err(ClearportError::TradingNotFrozen)
        }
    }
}

impl std::fmt::Display for TradingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "ACTIVE"),
            Self::Frozen => write!(f, "FROZEN"),
        }
    }
}
