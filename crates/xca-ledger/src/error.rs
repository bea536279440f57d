//! Anchor-log errors.
//!
//! The first six variants are contract violations raised by the log itself
//! and leave it unchanged. The rest describe adapter-level failures talking
//! to a remote ledger.

use thiserror::Error;
use xca_core::{Address, U256};

/// Errors from anchor-log operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The caller is not the ledger owner.
    #[error("caller {caller} is not the ledger owner")]
    Unauthorized {
        /// The rejected writer.
        caller: Address,
    },

    /// The block number does not exceed the last anchored block number.
    #[error("block {block_number} already anchored or older than last anchored block {last_anchored}")]
    NonMonotonicBlock {
        /// The rejected block number.
        block_number: U256,
        /// The log's last anchored block number at the time of the call.
        last_anchored: U256,
    },

    /// No record exists for the requested block number.
    #[error("no anchor recorded for block {0}")]
    NotFound(U256),

    /// The log holds no records.
    #[error("ledger has no anchored blocks")]
    EmptyLog,

    /// A windowed read asked for zero records.
    #[error("count must be greater than zero")]
    InvalidCount,

    /// Ownership transfer to the zero address.
    #[error("new owner must not be the zero address")]
    InvalidOwner,

    /// The ledger endpoint could not be reached.
    #[error("ledger on {ledger} unavailable: {reason}")]
    Unavailable {
        /// Label of the chain hosting the ledger.
        ledger: String,
        /// Underlying transport failure.
        reason: String,
    },

    /// A submitted transaction was not confirmed in time.
    #[error("ledger on {ledger}: transaction {transaction} not confirmed within {waited_secs}s")]
    Timeout {
        /// Label of the chain hosting the ledger.
        ledger: String,
        /// Hash of the unconfirmed transaction.
        transaction: String,
        /// How long the adapter waited.
        waited_secs: u64,
    },

    /// The ledger rejected the call for a reason outside the taxonomy.
    #[error("ledger call reverted: {0}")]
    Reverted(String),

    /// The ledger answered with data that could not be decoded.
    #[error("unexpected ledger response: {0}")]
    InvalidResponse(String),

    /// The adapter is missing configuration required for the call.
    #[error("ledger misconfigured: {0}")]
    Misconfigured(String),
}

impl LedgerError {
    /// Stable snake_case code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::Unauthorized { .. } => "unauthorized",
            LedgerError::NonMonotonicBlock { .. } => "non_monotonic_block",
            LedgerError::NotFound(_) => "not_found",
            LedgerError::EmptyLog => "empty_log",
            LedgerError::InvalidCount => "invalid_count",
            LedgerError::InvalidOwner => "invalid_owner",
            LedgerError::Unavailable { .. } => "ledger_unavailable",
            LedgerError::Timeout { .. } => "timeout",
            LedgerError::Reverted(_) => "reverted",
            LedgerError::InvalidResponse(_) => "invalid_response",
            LedgerError::Misconfigured(_) => "misconfigured",
        }
    }
}
