//! # clearport-broker
//!
//! The external boundary of the Clearport settlement engine. The
//! [`Broker`] owns every piece of persisted core state — balances,
//! nonce bitmap, offer availability, swap table, spender grants — and
//! exposes the boundary operations: deposit, withdraw, trade,
//! network-trade, cancel, the swap lifecycle, and the minimal
//! admin/emergency surface.
//!
//! Every mutating entrypoint is all-or-nothing: state is snapshotted on
//! entry and restored on any error, so a failed call leaves zero side
//! effects. The execution environment is expected to serialize calls;
//! the broker itself holds no locks.

pub mod admin;
pub mod broker;

pub use admin::TradingState;
pub use broker::Broker;
