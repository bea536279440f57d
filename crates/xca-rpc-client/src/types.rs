//! Wire types for the Ethereum JSON-RPC methods the workspace consumes.
//!
//! Quantities deserialize straight into [`U256`] from `0x` hex. Fields that
//! some EVM-compatible chains omit (`stateRoot`, gas figures, receipt
//! `status`) are optional here and defaulted by the consumer.

use serde::{Deserialize, Serialize};
use xca_core::{Address, Bytes, B256, U256};

/// Block header fields from `eth_getBlockByNumber(_, false)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcBlock {
    pub number: U256,
    pub hash: B256,
    pub parent_hash: B256,
    #[serde(default)]
    pub state_root: Option<B256>,
    pub timestamp: U256,
    #[serde(default)]
    pub gas_used: Option<U256>,
    #[serde(default)]
    pub gas_limit: Option<U256>,
}

/// Transaction receipt fields from `eth_getTransactionReceipt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcReceipt {
    pub transaction_hash: B256,
    #[serde(default)]
    pub block_number: Option<U256>,
    pub gas_used: U256,
    /// `0x1` success, `0x0` reverted. Absent on pre-Byzantium chains.
    #[serde(default)]
    pub status: Option<U256>,
}

impl RpcReceipt {
    /// Whether the transaction executed without reverting.
    pub fn succeeded(&self) -> bool {
        self.status.map_or(true, |status| status != U256::ZERO)
    }
}

/// Call object for `eth_call` and `eth_sendTransaction`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    pub to: Address,
    pub data: Bytes,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn block_without_state_root_parses() {
        let block: RpcBlock = serde_json::from_value(json!({
            "number": "0x9",
            "hash": format!("0x{}", "11".repeat(32)),
            "parentHash": format!("0x{}", "22".repeat(32)),
            "timestamp": "0x6553f100",
            "transactions": []
        }))
        .unwrap();
        assert_eq!(block.number, U256::from(9u64));
        assert!(block.state_root.is_none());
        assert!(block.gas_used.is_none());
    }

    #[test]
    fn receipt_status() {
        let mut receipt: RpcReceipt = serde_json::from_value(json!({
            "transactionHash": format!("0x{}", "33".repeat(32)),
            "blockNumber": "0x10",
            "gasUsed": "0x5208",
            "status": "0x1"
        }))
        .unwrap();
        assert!(receipt.succeeded());
        receipt.status = Some(U256::ZERO);
        assert!(!receipt.succeeded());
        receipt.status = None;
        assert!(receipt.succeeded());
    }

    #[test]
    fn request_omits_missing_sender() {
        let request = TransactionRequest {
            from: None,
            to: Address::repeat_byte(0x11),
            data: Bytes::from(vec![0xde, 0xad]),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("from").is_none());
        assert_eq!(value["data"], "0xdead");
    }
}
