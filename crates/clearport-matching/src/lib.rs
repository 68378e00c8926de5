//! # clearport-matching
//!
//! The trade matching engine. Consumes signed offers and fills, a list
//! of matches referencing them, and atomically applies the resulting
//! balance deltas and fee payments. Also hosts offer cancellation and
//! the network-trade path that sources counter-liquidity from external
//! venues.
//!
//! The engine never decides *which* orders match — matching
//! instructions come from an off-ledger coordinator; the engine
//! validates and settles.
//!
//! ## Availability
//!
//! The first time a batch references an order hash, the engine verifies
//! the maker's signature, consumes the nonce, debits the maker's
//! give-asset balance in full, and records the amount as the order's
//! *availability*. Every later reference — in the same batch or a later
//! one — consumes availability only; the maker is never re-debited.

pub mod availability;
pub mod cancel;
pub mod engine;
pub mod network;
pub mod validate;

pub use availability::AvailabilityTable;
pub use cancel::CancelState;
pub use engine::settle_trade_batch;
pub use network::{settle_network_batch, LiquidityVenue, VenueRegistry};
