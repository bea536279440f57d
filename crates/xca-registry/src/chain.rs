//! The [`ChainClient`] seam: the read-only chain queries the registry needs.
//!
//! [`RpcClient`] implements it over JSON-RPC; [`crate::MockChain`] is the
//! deterministic double used in tests and local runs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use xca_core::{B256, U256};
use xca_rpc_client::RpcClient;

use crate::error::ChainError;

/// Tip header as returned by a chain, before it is tagged with a network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainTip {
    pub number: U256,
    pub hash: B256,
    pub parent_hash: B256,
    pub state_root: Option<B256>,
    pub timestamp: u64,
    pub gas_used: U256,
    pub gas_limit: U256,
}

/// Read-only access to one chain.
#[async_trait]
pub trait ChainClient: Send + Sync + std::fmt::Debug {
    /// Human-readable endpoint, safe to log.
    fn endpoint(&self) -> String;

    /// The latest block header.
    async fn latest_block(&self) -> Result<ChainTip, ChainError>;

    /// The chain ID.
    async fn chain_id(&self) -> Result<u64, ChainError>;

    /// The current block height.
    async fn block_number(&self) -> Result<U256, ChainError>;

    /// The current gas price in wei.
    async fn gas_price(&self) -> Result<U256, ChainError>;
}

#[async_trait]
impl ChainClient for RpcClient {
    fn endpoint(&self) -> String {
        xca_rpc_client::redact_url(RpcClient::endpoint(self))
    }

    async fn latest_block(&self) -> Result<ChainTip, ChainError> {
        let block = RpcClient::latest_block(self).await?;
        Ok(ChainTip {
            number: block.number,
            hash: block.hash,
            parent_hash: block.parent_hash,
            state_root: block.state_root,
            timestamp: block.timestamp.saturating_to::<u64>(),
            gas_used: block.gas_used.unwrap_or_default(),
            gas_limit: block.gas_limit.unwrap_or_default(),
        })
    }

    async fn chain_id(&self) -> Result<u64, ChainError> {
        Ok(RpcClient::chain_id(self).await?)
    }

    async fn block_number(&self) -> Result<U256, ChainError> {
        Ok(RpcClient::block_number(self).await?)
    }

    async fn gas_price(&self) -> Result<U256, ChainError> {
        Ok(RpcClient::gas_price(self).await?)
    }
}
