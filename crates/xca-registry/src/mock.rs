//! Deterministic in-process chain for tests and local development.
//!
//! Block hashes are derived from the chain ID and height, so two mock chains
//! with different IDs never produce the same hash for the same height.

use async_trait::async_trait;
use parking_lot::Mutex;
use xca_core::{keccak256, B256, U256};

use crate::chain::{ChainClient, ChainTip};
use crate::error::ChainError;

#[derive(Debug)]
struct MockState {
    tip: U256,
    reachable: bool,
    state_root: bool,
    gas_price: U256,
}

/// A chain whose tip and reachability are set by the test.
#[derive(Debug)]
pub struct MockChain {
    chain_id: u64,
    state: Mutex<MockState>,
}

impl MockChain {
    /// A reachable chain at height `tip` that reports state roots.
    pub fn new(chain_id: u64, tip: u64) -> Self {
        Self::at_height(chain_id, U256::from(tip))
    }

    /// Like [`MockChain::new`], for heights beyond the `u64` range.
    pub fn at_height(chain_id: u64, tip: U256) -> Self {
        Self {
            chain_id,
            state: Mutex::new(MockState {
                tip,
                reachable: true,
                state_root: true,
                gas_price: U256::from(30_000_000_000u64),
            }),
        }
    }

    /// A chain that omits the state root from its headers.
    pub fn without_state_root(self) -> Self {
        self.state.lock().state_root = false;
        self
    }

    /// Move the tip to `height`.
    pub fn set_tip(&self, height: U256) {
        self.state.lock().tip = height;
    }

    /// Advance the tip by `blocks`.
    pub fn advance(&self, blocks: u64) {
        let mut state = self.state.lock();
        state.tip = state.tip.saturating_add(U256::from(blocks));
    }

    /// Make every query fail (or succeed again).
    pub fn set_reachable(&self, reachable: bool) {
        self.state.lock().reachable = reachable;
    }

    /// Deterministic hash of block `height`.
    pub fn block_hash(&self, height: U256) -> B256 {
        let mut preimage = self.chain_id.to_be_bytes().to_vec();
        preimage.extend_from_slice(&height.to_be_bytes::<32>());
        keccak256(preimage)
    }

    fn check(&self) -> Result<U256, ChainError> {
        let state = self.state.lock();
        if state.reachable {
            Ok(state.tip)
        } else {
            Err(ChainError::Unreachable(format!(
                "mock chain {} is offline",
                self.chain_id
            )))
        }
    }
}

#[async_trait]
impl ChainClient for MockChain {
    fn endpoint(&self) -> String {
        format!("mock://{}", self.chain_id)
    }

    async fn latest_block(&self) -> Result<ChainTip, ChainError> {
        let tip = self.check()?;
        let with_root = self.state.lock().state_root;
        Ok(ChainTip {
            number: tip,
            hash: self.block_hash(tip),
            parent_hash: self.block_hash(tip.saturating_sub(U256::from(1u64))),
            state_root: with_root.then(|| keccak256(self.block_hash(tip))),
            timestamp: 1_700_000_000u64.saturating_add(tip.saturating_to::<u64>().saturating_mul(2)),
            gas_used: U256::from(21_000u64),
            gas_limit: U256::from(30_000_000u64),
        })
    }

    async fn chain_id(&self) -> Result<u64, ChainError> {
        self.check()?;
        Ok(self.chain_id)
    }

    async fn block_number(&self) -> Result<U256, ChainError> {
        self.check()
    }

    async fn gas_price(&self) -> Result<U256, ChainError> {
        self.check()?;
        Ok(self.state.lock().gas_price)
    }
}
