//! Broker configuration.

use serde::{Deserialize, Serialize};

use crate::constants;

/// Tunable settlement parameters. Everything else about broker behavior
/// is fixed by the protocol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Seconds between `announce_cancel` and the earliest `slow_cancel`.
    pub announce_delay_secs: i64,
    /// Upper bound on matches per trade or network-trade batch.
    pub max_matches_per_batch: usize,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            announce_delay_secs: constants::DEFAULT_ANNOUNCE_DELAY_SECS,
            max_matches_per_batch: constants::MAX_MATCHES_PER_BATCH,
        }
    }
}

impl BrokerConfig {
    /// Clamp the announce delay into the supported range.
    #[must_use]
    pub fn with_announce_delay(mut self, secs: i64) -> Self {
        self.announce_delay_secs = secs.clamp(0, constants::MAX_ANNOUNCE_DELAY_SECS);
        self
    }
}
