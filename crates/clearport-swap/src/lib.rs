//! # clearport-swap
//!
//! The atomic swap subsystem: hash-locked, time-locked conditional
//! transfers between two parties, without either having to trust the
//! coordinator.
//!
//! Neither party can both withhold the secret and reclaim the funds:
//! reclaiming requires waiting past expiry, and revealing the secret
//! anywhere — even off-ledger — immediately enables execution by
//! whoever observes it.

pub mod engine;

pub use engine::{cancel_swap, create_swap, execute_swap, SwapTable};
