#![deny(missing_docs)]

//! # xca-core — Foundational Types for Cross-Chain Anchoring
//!
//! Every other crate in the workspace depends on this one. It has no internal
//! crate dependencies: only `serde`, `thiserror`, and `alloy-primitives`.
//!
//! ## Design Principles
//!
//! 1. **Validated identifiers.** Networks are named by [`NetworkName`], never by
//!    a loose string. An unvalidated name cannot reach a registry lookup.
//!
//! 2. **256-bit quantities.** Block numbers, gas figures and anchor counts are
//!    [`U256`] end to end, matching the EVM word size. Nothing narrows them to
//!    a machine integer on the way through.
//!
//! 3. **Sentinels instead of nulls.** A chain that does not report a state
//!    root yields [`ZERO_STATE_ROOT`]; the zero [`Address`] is never a valid
//!    ledger owner.

pub mod error;
pub mod header;
pub mod network;
pub mod quantity;
pub mod record;

// Re-export primary types at crate root for ergonomic imports.
pub use alloy_primitives::{hex, keccak256, Address, Bytes, B256, U256};
pub use error::ValidationError;
pub use header::{HeaderSnapshot, ZERO_STATE_ROOT};
pub use network::NetworkName;
pub use quantity::{format_quantity, parse_digest, parse_quantity, parse_u64_quantity};
pub use record::{AnchorLogStats, AnchorRecord};
