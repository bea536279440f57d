//! # Ledger Contract ABI
//!
//! The anchor contract's interface, declared with [`sol!`]. Calldata is
//! encoded and return data decoded by `alloy-sol-types`; this module only
//! converts between the contract's tuples and the workspace types.
//!
//! ## Wire Contract
//!
//! `anchorBlock(uint256,bytes32,bytes32)` is the bit-exact boundary: the
//! block number as a big-endian 32-byte word, followed by the raw 32-byte
//! block hash and state root.

use alloy_sol_types::{sol, Revert, SolCall, SolError};
use xca_core::{Address, AnchorLogStats, AnchorRecord, Bytes, B256, U256};

use crate::error::LedgerError;

sol! {
    /// One anchored block as stored by the contract.
    #[derive(Debug, PartialEq, Eq)]
    struct AnchoredBlock {
        uint256 blockNumber;
        bytes32 blockHash;
        bytes32 stateRoot;
        uint256 timestamp;
        string chainName;
    }

    function anchorBlock(uint256 blockNumber, bytes32 blockHash, bytes32 stateRoot) external;
    #[derive(Debug)]
    function getLastAnchoredBlock() external view returns (AnchoredBlock memory);
    function getAnchoredBlock(uint256 blockNumber) external view returns (AnchoredBlock memory);
    function getLastNBlocks(uint256 count) external view returns (AnchoredBlock[] memory);
    function getStats() external view returns (
        uint256 totalAnchors,
        uint256 lastAnchoredBlock,
        string memory thisChain,
        string memory anchoredChain
    );
    function owner() external view returns (address);
    function transferOwnership(address newOwner) external;
}

impl From<AnchoredBlock> for AnchorRecord {
    fn from(block: AnchoredBlock) -> Self {
        AnchorRecord {
            block_number: block.blockNumber,
            block_hash: block.blockHash,
            state_root: block.stateRoot,
            timestamp: block.timestamp.saturating_to::<u64>(),
            chain_name: block.chainName,
        }
    }
}

impl From<getStatsReturn> for AnchorLogStats {
    fn from(stats: getStatsReturn) -> Self {
        AnchorLogStats {
            total_anchors: stats.totalAnchors,
            last_anchored_block_number: stats.lastAnchoredBlock,
            this_chain: stats.thisChain,
            counterpart_chain: stats.anchoredChain,
        }
    }
}

/// Calldata for `anchorBlock(blockNumber, blockHash, stateRoot)`.
pub fn anchor_block_calldata(block_number: U256, block_hash: B256, state_root: B256) -> Bytes {
    anchorBlockCall {
        blockNumber: block_number,
        blockHash: block_hash,
        stateRoot: state_root,
    }
    .abi_encode()
    .into()
}

/// Calldata for `transferOwnership(newOwner)`.
pub fn transfer_ownership_calldata(new_owner: Address) -> Bytes {
    transferOwnershipCall { newOwner: new_owner }.abi_encode().into()
}

/// Intrinsic gas of a transaction carrying `calldata`
/// (21000 base, 4 per zero byte, 16 per non-zero byte).
pub fn intrinsic_gas(calldata: &[u8]) -> U256 {
    let data_cost: u64 = calldata
        .iter()
        .map(|&byte| if byte == 0 { 4u64 } else { 16u64 })
        .sum();
    U256::from(21_000u64 + data_cost)
}

/// Decode the return data of `C`, rejecting non-canonical encodings.
pub fn decode_returns<C: SolCall>(data: &[u8]) -> Result<C::Return, LedgerError> {
    C::abi_decode_returns(data, true)
        .map_err(|e| LedgerError::InvalidResponse(format!("ABI decode: {e}")))
}

/// Extract the message from an `Error(string)` revert payload.
pub fn decode_revert_reason(data: &[u8]) -> Option<String> {
    Revert::abi_decode(data, true).ok().map(|revert| revert.reason)
}
