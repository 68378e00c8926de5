//! # clearport-types
//!
//! Shared types, errors, and configuration for the **Clearport**
//! settlement engine.
//!
//! This crate is the leaf dependency of the workspace — every other
//! crate depends on it. It defines:
//!
//! - **Identifiers**: [`AccountId`], [`OrderHash`], [`SwapHash`], [`Asset`]
//! - **Order model**: [`Order`], [`OrderKind`], [`SignedOrder`], [`CancelRequest`]
//! - **Trade model**: [`Match`], [`TradeBatch`], [`NetworkMatch`], [`NetworkBatch`]
//! - **Swap model**: [`Swap`], [`SwapState`]
//! - **Boundary messages**: [`Withdrawal`], [`SpenderApproval`]
//! - **Audit model**: [`BalanceEvent`], [`Reason`], [`SummaryRecord`]
//! - **Configuration**: [`BrokerConfig`]
//! - **Errors**: [`ClearportError`] with `CP_ERR_` prefix codes

pub mod boundary;
pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod ids;
pub mod order;
pub mod swap;
pub mod trade;

// Re-export all primary types at crate root for ergonomic imports:
//   use clearport_types::{Order, Match, Swap, BalanceEvent, ...};

pub use boundary::*;
pub use config::*;
pub use error::*;
pub use event::*;
pub use ids::*;
pub use order::*;
pub use swap::*;
pub use trade::*;

// Constants are accessed via `clearport_types::constants::FOO`
// (not re-exported to avoid name collisions).
