//! # clearport-ledger
//!
//! The authoritative balance store. Every externally-visible state
//! change in the engine flows through [`Ledger::increase`] and
//! [`Ledger::decrease`], each tagged with a [`Reason`](clearport_types::Reason)
//! and mirrored into the audit event stream.
//!
//! The ledger is a plain value: cloning it snapshots it, which is how
//! the broker implements its all-or-nothing operation boundary.

pub mod access;
pub mod ledger;

pub use access::SpenderRegistry;
pub use ledger::Ledger;
