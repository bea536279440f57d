//! The [`AnchorLedger`] seam between the orchestrator and a concrete log.
//!
//! Every implementation must only return `Ok` from [`AnchorLedger::anchor`]
//! once the record is durably part of the log. Returning `Ok` for a write
//! that may still be dropped would let the orchestrator report an anchor
//! that does not exist.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use xca_core::{Address, AnchorLogStats, AnchorRecord, HeaderSnapshot, B256, U256};

use crate::error::LedgerError;

/// Proof that a header was written to a ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorSubmission {
    /// Hash of the anchoring transaction.
    pub transaction_hash: B256,
    /// Gas consumed by the transaction.
    pub gas_used: U256,
    /// Block on the ledger's chain that included the transaction, if known.
    pub included_in_block: Option<U256>,
    /// The anchored (counterpart) block number.
    pub anchored_block: U256,
}

/// An append-only anchor log hosted on one chain.
#[async_trait]
pub trait AnchorLedger: Send + Sync + std::fmt::Debug {
    /// Label of the chain hosting this ledger.
    fn label(&self) -> &str;

    /// Contract address, when the ledger lives on-chain.
    fn address(&self) -> Option<Address>;

    /// Append `header` as the configured writer.
    async fn anchor(&self, header: &HeaderSnapshot) -> Result<AnchorSubmission, LedgerError>;

    /// The most recently anchored record.
    async fn latest(&self) -> Result<AnchorRecord, LedgerError>;

    /// The record for an exact counterpart block number.
    async fn by_block_number(&self, block_number: U256) -> Result<AnchorRecord, LedgerError>;

    /// The last `count` records, oldest first.
    async fn last_n(&self, count: U256) -> Result<Vec<AnchorRecord>, LedgerError>;

    /// Derived statistics.
    async fn stats(&self) -> Result<AnchorLogStats, LedgerError>;

    /// Current owner.
    async fn owner(&self) -> Result<Address, LedgerError>;

    /// Transfer write permission, acting as the configured writer.
    /// Returns the transaction hash.
    async fn transfer_ownership(&self, new_owner: Address) -> Result<B256, LedgerError>;
}
