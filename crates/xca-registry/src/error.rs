//! Registry and chain-client errors.

use thiserror::Error;
use xca_core::NetworkName;

/// Errors from a [`crate::ChainClient`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// Transport, timeout or HTTP failure.
    #[error("unreachable: {0}")]
    Unreachable(String),

    /// The endpoint answered with something that is not a usable header.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<xca_rpc_client::RpcError> for ChainError {
    fn from(err: xca_rpc_client::RpcError) -> Self {
        if err.is_unavailable() {
            ChainError::Unreachable(err.to_string())
        } else {
            ChainError::Malformed(err.to_string())
        }
    }
}

/// Errors from registry lookups and queries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The name is not configured (or not a valid network name at all).
    #[error("unknown network \"{name}\"")]
    UnknownNetwork {
        /// The name as the caller supplied it.
        name: String,
    },

    /// The network's RPC endpoint failed to answer a query.
    #[error("RPC unavailable for {network}: {reason}")]
    RpcUnavailable {
        /// The queried network.
        network: NetworkName,
        /// Underlying failure.
        reason: String,
    },

    /// No ledger is provisioned on the network.
    #[error("no ledger provisioned on {0}")]
    NoLedger(NetworkName),

    /// The same network was registered twice.
    #[error("network {0} registered twice")]
    DuplicateNetwork(NetworkName),
}
