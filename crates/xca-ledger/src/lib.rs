//! # xca-ledger — Append-Only Anchor Log
//!
//! A ledger records headers from one counterpart chain. It accepts a header
//! only from its owner and only if the block number is strictly greater than
//! everything recorded so far.
//!
//! ## Architecture
//!
//! - [`AnchorLog`] is the pure state machine. It holds every invariant and
//!   has no I/O.
//! - [`AnchorLedger`] is the async seam the orchestrator writes through.
//! - [`InMemoryLedger`] wraps an [`AnchorLog`] in a mutex for in-process use.
//! - [`EvmLedger`] (feature `evm`, on by default) speaks to the deployed
//!   contract over JSON-RPC, with [`abi`] handling the wire format.

pub mod abi;
pub mod error;
#[cfg(feature = "evm")]
pub mod evm;
pub mod ledger;
pub mod log;
pub mod memory;

pub use error::LedgerError;
#[cfg(feature = "evm")]
pub use evm::{EvmLedger, EvmLedgerConfig};
pub use ledger::{AnchorLedger, AnchorSubmission};
pub use log::{AnchorLog, LedgerEvent};
pub use memory::InMemoryLedger;
