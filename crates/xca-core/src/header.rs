//! # Header Snapshots
//!
//! A [`HeaderSnapshot`] is the subset of a chain's tip header that gets
//! anchored into the counterpart ledger. Snapshots are fetched fresh on every
//! anchoring cycle and never cached.

use serde::{Deserialize, Serialize};

use alloy_primitives::{B256, U256};

use crate::network::NetworkName;

/// Sentinel used when a chain does not expose a state root.
pub const ZERO_STATE_ROOT: B256 = B256::ZERO;

/// The tip header of one network at the moment it was read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderSnapshot {
    /// Network the header was read from.
    pub source_network: NetworkName,
    /// Block height.
    pub block_number: U256,
    /// Block hash.
    pub block_hash: B256,
    /// State root, or [`ZERO_STATE_ROOT`] when the chain does not report one.
    pub state_root: B256,
    /// Block timestamp in seconds since the Unix epoch.
    pub timestamp: u64,
    /// Hash of the parent block.
    pub parent_hash: B256,
    /// Gas consumed by the block (zero when not reported).
    pub gas_used: U256,
    /// Gas limit of the block (zero when not reported).
    pub gas_limit: U256,
}

impl HeaderSnapshot {
    /// Whether the source chain reported a real state root.
    pub fn has_state_root(&self) -> bool {
        self.state_root != ZERO_STATE_ROOT
    }
}
