//! The replay-protecting nonce registry.
//!
//! Nonces are recorded as single bits inside 64-bit words of a sparse
//! bitmap: word index = nonce / 64, bit = nonce % 64. Packing bits into
//! words instead of one entry per nonce trades a small decode step for a
//! much lower amortized storage cost in high-volume settlement.
//!
//! A set bit is never cleared — every signed instruction executes at
//! most once, forever.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use clearport_types::constants::NONCE_WORD_BITS;

/// Sparse word-indexed nonce bitmap shared by every operation type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NonceRegistry {
    words: HashMap<u64, u64>,
}

impl NonceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The single atomic check-and-set primitive: returns `true` and
    /// records the nonce if it was unused, `false` if already consumed.
    pub fn try_consume(&mut self, nonce: u64) -> bool {
        let word = self.words.entry(nonce / NONCE_WORD_BITS).or_insert(0);
        let bit = 1u64 << (nonce % NONCE_WORD_BITS);
        if *word & bit != 0 {
            return false;
        }
        *word |= bit;
        true
    }

    /// Whether a nonce has been consumed, without consuming it.
    #[must_use]
    pub fn is_used(&self, nonce: u64) -> bool {
        self.words
            .get(&(nonce / NONCE_WORD_BITS))
            .is_some_and(|word| word & (1u64 << (nonce % NONCE_WORD_BITS)) != 0)
    }

    /// Total nonces consumed.
    #[must_use]
    pub fn consumed(&self) -> u64 {
        self.words.values().map(|w| u64::from(w.count_ones())).sum()
    }
}
