//! # Anchor Records
//!
//! Value types returned by anchor-log reads. Records are immutable once
//! written; statistics are derived on demand.

use serde::{Deserialize, Serialize};

use alloy_primitives::{B256, U256};

/// One anchored header as stored in a ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorRecord {
    /// Height of the anchored block on the counterpart chain.
    pub block_number: U256,
    /// Hash of the anchored block.
    pub block_hash: B256,
    /// State root of the anchored block (zero sentinel if unavailable).
    pub state_root: B256,
    /// Time the record was written, in seconds since the Unix epoch.
    pub timestamp: u64,
    /// Label of the counterpart chain the header came from.
    pub chain_name: String,
}

/// Summary of a ledger, derived from its records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorLogStats {
    /// Number of records in the log.
    pub total_anchors: U256,
    /// Highest anchored block number, zero when the log is empty.
    pub last_anchored_block_number: U256,
    /// Label of the chain hosting the ledger.
    pub this_chain: String,
    /// Label of the chain whose headers the ledger records.
    pub counterpart_chain: String,
}
