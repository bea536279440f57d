//! # EVM Ledger Adapter
//!
//! [`EvmLedger`] drives the on-chain anchor contract over JSON-RPC.
//!
//! ## How It Works
//!
//! 1. Reads are `eth_call`s against the latest block, decoded by [`crate::abi`].
//! 2. Writes are `eth_sendTransaction` from the configured signer. The
//!    endpoint signs (unlocked account, KMS, or signer proxy); this process
//!    never sees a private key.
//! 3. After submission the adapter polls `eth_getTransactionReceipt` until
//!    the transaction is mined or the confirmation timeout elapses.
//!
//! ## Revert Classification
//!
//! The contract reports violations as `Error(string)` reverts. Known
//! messages map back onto [`LedgerError`] kinds; anything else surfaces as
//! [`LedgerError::Reverted`] with the decoded reason.

use std::time::Duration;

use alloy_sol_types::SolCall;
use async_trait::async_trait;
use xca_core::{hex, Address, AnchorLogStats, AnchorRecord, Bytes, HeaderSnapshot, B256, U256};
use xca_rpc_client::{RpcClient, RpcError, RpcReceipt, TransactionRequest};

use crate::abi;
use crate::error::LedgerError;
use crate::ledger::{AnchorLedger, AnchorSubmission};

/// Configuration for one on-chain ledger.
#[derive(Debug, Clone)]
pub struct EvmLedgerConfig {
    /// Address of the deployed anchor contract.
    pub contract_address: Address,
    /// Signing identity for writes. Reads work without one.
    pub from_address: Option<Address>,
    /// Label of the chain hosting the contract.
    pub chain_label: String,
    /// Upper bound on waiting for a receipt after submission.
    pub confirmation_timeout: Duration,
    /// Interval between receipt polls.
    pub poll_interval: Duration,
}

impl EvmLedgerConfig {
    /// Defaults: 120s confirmation timeout, 2s poll interval.
    pub fn new(
        contract_address: Address,
        from_address: Option<Address>,
        chain_label: impl Into<String>,
    ) -> Self {
        Self {
            contract_address,
            from_address,
            chain_label: chain_label.into(),
            confirmation_timeout: Duration::from_secs(120),
            poll_interval: Duration::from_secs(2),
        }
    }

    /// Override the confirmation wait.
    pub fn with_confirmation(mut self, timeout: Duration, poll_interval: Duration) -> Self {
        self.confirmation_timeout = timeout;
        self.poll_interval = poll_interval;
        self
    }
}

/// Anchor ledger backed by a deployed contract.
#[derive(Debug)]
pub struct EvmLedger {
    rpc: RpcClient,
    config: EvmLedgerConfig,
}

/// Revert messages emitted by the deployed contract, matched case-insensitively.
/// Order matters: the zero-address check mentions the owner too.
const REVERT_PATTERNS: &[(&str, RevertKind)] = &[
    ("no puede ser 0x0", RevertKind::InvalidOwner),
    ("direccion cero", RevertKind::InvalidOwner),
    ("zero address", RevertKind::InvalidOwner),
    ("propietario", RevertKind::Unauthorized),
    ("not the owner", RevertKind::Unauthorized),
    ("ya fue anclado", RevertKind::NonMonotonic),
    ("already anchored", RevertKind::NonMonotonic),
    ("no encontrado", RevertKind::NotFound),
    ("not found", RevertKind::NotFound),
    ("no hay bloques", RevertKind::EmptyLog),
    ("no blocks", RevertKind::EmptyLog),
    ("count debe", RevertKind::InvalidCount),
    ("count must", RevertKind::InvalidCount),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RevertKind {
    InvalidOwner,
    Unauthorized,
    NonMonotonic,
    NotFound,
    EmptyLog,
    InvalidCount,
}

fn classify_revert(reason: &str) -> Option<RevertKind> {
    let lowered = reason.to_lowercase();
    REVERT_PATTERNS
        .iter()
        .find(|(needle, _)| lowered.contains(needle))
        .map(|&(_, kind)| kind)
}

/// Best-effort extraction of a revert reason from a JSON-RPC error.
fn revert_reason(err: &RpcError) -> Option<String> {
    if let Some(data) = err.revert_data() {
        let data = data.trim_matches('"');
        if let Some(reason) = hex::decode(data)
            .ok()
            .and_then(|raw| abi::decode_revert_reason(&raw))
        {
            return Some(reason);
        }
    }
    match err {
        RpcError::Rpc { message, .. } if message.to_lowercase().contains("revert") => Some(
            message
                .strip_prefix("execution reverted: ")
                .unwrap_or(message)
                .to_string(),
        ),
        _ => None,
    }
}

impl EvmLedger {
    /// Create an adapter.
    ///
    /// # Errors
    ///
    /// [`LedgerError::Misconfigured`] if the contract address is zero.
    pub fn new(rpc: RpcClient, config: EvmLedgerConfig) -> Result<Self, LedgerError> {
        if config.contract_address == Address::ZERO {
            return Err(LedgerError::Misconfigured(format!(
                "{}: contract address must not be zero",
                config.chain_label
            )));
        }
        Ok(Self { rpc, config })
    }

    fn unavailable(&self, err: &RpcError) -> LedgerError {
        LedgerError::Unavailable {
            ledger: self.config.chain_label.clone(),
            reason: err.to_string(),
        }
    }

    /// Map a JSON-RPC failure onto the ledger taxonomy. `context` supplies
    /// the block number for kinds that carry one.
    async fn map_rpc_error(&self, err: RpcError, context: Option<U256>) -> LedgerError {
        if err.is_unavailable() {
            return self.unavailable(&err);
        }
        let Some(reason) = revert_reason(&err) else {
            return LedgerError::InvalidResponse(err.to_string());
        };
        match classify_revert(&reason) {
            Some(RevertKind::InvalidOwner) => LedgerError::InvalidOwner,
            Some(RevertKind::Unauthorized) => LedgerError::Unauthorized {
                caller: self.config.from_address.unwrap_or(Address::ZERO),
            },
            Some(RevertKind::NotFound) => LedgerError::NotFound(context.unwrap_or_default()),
            Some(RevertKind::EmptyLog) => LedgerError::EmptyLog,
            Some(RevertKind::InvalidCount) => LedgerError::InvalidCount,
            Some(RevertKind::NonMonotonic) => match (context, self.read_stats().await) {
                (Some(block_number), Ok(stats)) => LedgerError::NonMonotonicBlock {
                    block_number,
                    last_anchored: stats.last_anchored_block_number,
                },
                _ => LedgerError::Reverted(reason),
            },
            None => LedgerError::Reverted(reason),
        }
    }

    /// `eth_call` a view function and decode its return.
    async fn call<C: SolCall + Sync>(
        &self,
        call: &C,
        context: Option<U256>,
    ) -> Result<C::Return, LedgerError> {
        let request = TransactionRequest {
            from: self.config.from_address,
            to: self.config.contract_address,
            data: call.abi_encode().into(),
        };
        match self.rpc.call(&request).await {
            Ok(data) => abi::decode_returns::<C>(&data),
            Err(err) => Err(self.map_rpc_error(err, context).await),
        }
    }

    async fn read_stats(&self) -> Result<AnchorLogStats, LedgerError> {
        let request = TransactionRequest {
            from: None,
            to: self.config.contract_address,
            data: abi::getStatsCall {}.abi_encode().into(),
        };
        let data = self
            .rpc
            .call(&request)
            .await
            .map_err(|e| LedgerError::InvalidResponse(e.to_string()))?;
        abi::decode_returns::<abi::getStatsCall>(&data).map(AnchorLogStats::from)
    }

    /// Submit a write and wait for its receipt.
    async fn transact(
        &self,
        data: Bytes,
        context: Option<U256>,
    ) -> Result<RpcReceipt, LedgerError> {
        let from = self.config.from_address.ok_or_else(|| {
            LedgerError::Misconfigured(format!(
                "{}: no signing identity configured for writes",
                self.config.chain_label
            ))
        })?;
        let request = TransactionRequest {
            from: Some(from),
            to: self.config.contract_address,
            data,
        };

        let tx_hash = match self.rpc.send_transaction(&request).await {
            Ok(hash) => hash,
            Err(err) => return Err(self.map_rpc_error(err, context).await),
        };
        tracing::info!(
            ledger = %self.config.chain_label,
            tx_hash = %tx_hash,
            "ledger transaction submitted"
        );

        let receipt = self.await_receipt(tx_hash).await?;
        if !receipt.succeeded() {
            // Mined but reverted; replay as a call to recover the reason.
            return match self.rpc.call(&request).await {
                Err(err) => Err(self.map_rpc_error(err, context).await),
                Ok(_) => Err(LedgerError::Reverted(format!(
                    "transaction {tx_hash} reverted"
                ))),
            };
        }
        Ok(receipt)
    }

    async fn await_receipt(&self, tx_hash: B256) -> Result<RpcReceipt, LedgerError> {
        let poll = async {
            loop {
                match self.rpc.transaction_receipt(tx_hash).await {
                    Ok(Some(receipt)) => return Ok(receipt),
                    Ok(None) => {}
                    Err(err) if err.is_unavailable() => {
                        tracing::warn!(
                            ledger = %self.config.chain_label,
                            tx_hash = %tx_hash,
                            "receipt poll failed, retrying: {err}"
                        );
                    }
                    Err(err) => return Err(LedgerError::InvalidResponse(err.to_string())),
                }
                tokio::time::sleep(self.config.poll_interval).await;
            }
        };
        tokio::time::timeout(self.config.confirmation_timeout, poll)
            .await
            .map_err(|_| LedgerError::Timeout {
                ledger: self.config.chain_label.clone(),
                transaction: tx_hash.to_string(),
                waited_secs: self.config.confirmation_timeout.as_secs(),
            })?
    }
}

#[async_trait]
impl AnchorLedger for EvmLedger {
    fn label(&self) -> &str {
        &self.config.chain_label
    }

    fn address(&self) -> Option<Address> {
        Some(self.config.contract_address)
    }

    async fn anchor(&self, header: &HeaderSnapshot) -> Result<AnchorSubmission, LedgerError> {
        let data = abi::anchor_block_calldata(
            header.block_number,
            header.block_hash,
            header.state_root,
        );
        let receipt = self.transact(data, Some(header.block_number)).await?;
        Ok(AnchorSubmission {
            transaction_hash: receipt.transaction_hash,
            gas_used: receipt.gas_used,
            included_in_block: receipt.block_number,
            anchored_block: header.block_number,
        })
    }

    async fn latest(&self) -> Result<AnchorRecord, LedgerError> {
        let returned = self.call(&abi::getLastAnchoredBlockCall {}, None).await?;
        Ok(returned._0.into())
    }

    async fn by_block_number(&self, block_number: U256) -> Result<AnchorRecord, LedgerError> {
        let call = abi::getAnchoredBlockCall {
            blockNumber: block_number,
        };
        let returned = self.call(&call, Some(block_number)).await?;
        Ok(returned._0.into())
    }

    async fn last_n(&self, count: U256) -> Result<Vec<AnchorRecord>, LedgerError> {
        let returned = self.call(&abi::getLastNBlocksCall { count }, None).await?;
        Ok(returned._0.into_iter().map(AnchorRecord::from).collect())
    }

    async fn stats(&self) -> Result<AnchorLogStats, LedgerError> {
        let returned = self.call(&abi::getStatsCall {}, None).await?;
        Ok(returned.into())
    }

    async fn owner(&self) -> Result<Address, LedgerError> {
        let returned = self.call(&abi::ownerCall {}, None).await?;
        Ok(returned._0)
    }

    async fn transfer_ownership(&self, new_owner: Address) -> Result<B256, LedgerError> {
        // Checked locally so a doomed transaction is never broadcast.
        if new_owner == Address::ZERO {
            return Err(LedgerError::InvalidOwner);
        }
        let data = abi::transfer_ownership_calldata(new_owner);
        let receipt = self.transact(data, None).await?;
        Ok(receipt.transaction_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_contract_messages() {
        let cases = [
            ("Solo el propietario puede ejecutar esta funcion", RevertKind::Unauthorized),
            ("El bloque ya fue anclado o es anterior", RevertKind::NonMonotonic),
            ("Bloque no encontrado", RevertKind::NotFound),
            ("No hay bloques anclados", RevertKind::EmptyLog),
            ("Count debe ser mayor a 0", RevertKind::InvalidCount),
            ("Nueva direccion no puede ser 0x0", RevertKind::InvalidOwner),
        ];
        for (message, expected) in cases {
            assert_eq!(classify_revert(message), Some(expected), "{message}");
        }
        assert_eq!(classify_revert("out of gas"), None);
    }

    #[test]
    fn undecodable_revert_data_falls_back_to_message() {
        let err = RpcError::Rpc {
            endpoint: "http://node".into(),
            method: "eth_call".into(),
            code: 3,
            message: "execution reverted: Bloque no encontrado".into(),
            data: Some("0xabc".into()),
        };
        assert_eq!(revert_reason(&err).as_deref(), Some("Bloque no encontrado"));
    }

    #[test]
    fn zero_contract_address_rejected() {
        let rpc = RpcClient::new(xca_rpc_client::RpcClientConfig::new(
            "http://127.0.0.1:8545".parse().unwrap(),
            "amoy",
        ))
        .unwrap();
        let err = EvmLedger::new(rpc, EvmLedgerConfig::new(Address::ZERO, None, "amoy"))
            .unwrap_err();
        assert!(matches!(err, LedgerError::Misconfigured(_)));
    }

    #[test]
    fn revert_reason_prefers_encoded_data() {
        let data = serde_json::to_value(Bytes::from(abi::fixtures::encode_revert(
            "Bloque no encontrado",
        )))
        .unwrap();
        let err = RpcError::Rpc {
            endpoint: "http://node".into(),
            method: "eth_call".into(),
            code: 3,
            message: "execution reverted".into(),
            data: data.as_str().map(str::to_string),
        };
        assert_eq!(revert_reason(&err).as_deref(), Some("Bloque no encontrado"));
    }

    #[test]
    fn non_revert_rpc_error_has_no_reason() {
        let err = RpcError::Rpc {
            endpoint: "http://node".into(),
            method: "eth_call".into(),
            code: -32601,
            message: "the method eth_call does not exist/is not available".into(),
            data: None,
        };
        assert_eq!(revert_reason(&err), None);
    }

    #[test]
    fn config_defaults() {
        let config = EvmLedgerConfig::new(Address::repeat_byte(1), None, "amoy");
        assert_eq!(config.confirmation_timeout, Duration::from_secs(120));
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        let tuned = config.with_confirmation(Duration::from_secs(5), Duration::from_millis(10));
        assert_eq!(tuned.confirmation_timeout, Duration::from_secs(5));
    }

    // -- JSON-RPC round trips against a scripted node -------------------------

    use serde_json::{json, Value};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};
    use xca_core::NetworkName;

    /// Matches a JSON-RPC request by method and, optionally, call selector.
    struct RpcMethod {
        method: &'static str,
        selector: Option<[u8; 4]>,
    }

    impl wiremock::Match for RpcMethod {
        fn matches(&self, request: &Request) -> bool {
            let Ok(body) = serde_json::from_slice::<Value>(&request.body) else {
                return false;
            };
            if body["method"] != self.method {
                return false;
            }
            match self.selector {
                None => true,
                Some(sel) => {
                    let prefix = format!(
                        "0x{:02x}{:02x}{:02x}{:02x}",
                        sel[0], sel[1], sel[2], sel[3]
                    );
                    body["params"][0]["data"]
                        .as_str()
                        .is_some_and(|data| data.starts_with(&prefix))
                }
            }
        }
    }

    fn rpc(method: &'static str) -> RpcMethod {
        RpcMethod {
            method,
            selector: None,
        }
    }

    fn eth_call(selector: [u8; 4]) -> RpcMethod {
        RpcMethod {
            method: "eth_call",
            selector: Some(selector),
        }
    }

    fn result(value: Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({"jsonrpc": "2.0", "id": 1, "result": value}))
    }

    fn hex_value(bytes: Vec<u8>) -> Value {
        serde_json::to_value(Bytes::from(bytes)).unwrap()
    }

    fn revert(reason: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {
                "code": 3,
                "message": format!("execution reverted: {reason}"),
                "data": hex_value(abi::fixtures::encode_revert(reason)),
            }
        }))
    }

    fn signer() -> Address {
        Address::repeat_byte(0x0a)
    }

    fn ledger_for(uri: &str, from: Option<Address>) -> EvmLedger {
        let rpc = RpcClient::new(xca_rpc_client::RpcClientConfig::new(
            uri.parse().unwrap(),
            "amoy",
        ))
        .unwrap();
        let config = EvmLedgerConfig::new(Address::repeat_byte(0xcc), from, "amoy")
            .with_confirmation(Duration::from_millis(400), Duration::from_millis(20));
        EvmLedger::new(rpc, config).unwrap()
    }

    fn header(block: u64) -> HeaderSnapshot {
        HeaderSnapshot {
            source_network: NetworkName::new("alastria").unwrap(),
            block_number: U256::from(block),
            block_hash: B256::repeat_byte(0xaa),
            state_root: B256::repeat_byte(0xbb),
            timestamp: 1_700_000_000,
            parent_hash: B256::repeat_byte(0xcc),
            gas_used: U256::ZERO,
            gas_limit: U256::ZERO,
        }
    }

    fn record(block: u64) -> AnchorRecord {
        AnchorRecord {
            block_number: U256::from(block),
            block_hash: B256::repeat_byte(0xaa),
            state_root: B256::repeat_byte(0xbb),
            timestamp: 1_700_000_100,
            chain_name: "alastria".to_string(),
        }
    }

    #[tokio::test]
    async fn anchor_submits_and_waits_for_receipt() {
        let server = MockServer::start().await;
        let tx_hash = B256::repeat_byte(0x77);
        Mock::given(rpc("eth_sendTransaction"))
            .respond_with(result(json!(tx_hash)))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(rpc("eth_getTransactionReceipt"))
            .respond_with(result(json!({
                "transactionHash": tx_hash,
                "blockNumber": "0x10",
                "gasUsed": "0xb2c4",
                "status": "0x1"
            })))
            .mount(&server)
            .await;

        let submission = ledger_for(&server.uri(), Some(signer()))
            .anchor(&header(500))
            .await
            .unwrap();

        assert_eq!(submission.transaction_hash, tx_hash);
        assert_eq!(submission.gas_used, U256::from(0xb2c4u64));
        assert_eq!(submission.included_in_block, Some(U256::from(16u64)));
        assert_eq!(submission.anchored_block, U256::from(500u64));
    }

    #[tokio::test]
    async fn non_monotonic_revert_reports_last_anchored() {
        let server = MockServer::start().await;
        Mock::given(rpc("eth_sendTransaction"))
            .respond_with(revert("El bloque ya fue anclado o es anterior"))
            .mount(&server)
            .await;
        let stats = AnchorLogStats {
            total_anchors: U256::from(3u64),
            last_anchored_block_number: U256::from(500u64),
            this_chain: "amoy".into(),
            counterpart_chain: "alastria".into(),
        };
        Mock::given(eth_call(abi::getStatsCall::SELECTOR))
            .respond_with(result(hex_value(abi::fixtures::encode_stats(&stats))))
            .mount(&server)
            .await;

        let err = ledger_for(&server.uri(), Some(signer()))
            .anchor(&header(400))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::NonMonotonicBlock {
                block_number: U256::from(400u64),
                last_anchored: U256::from(500u64),
            }
        );
    }

    #[tokio::test]
    async fn owner_revert_maps_to_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(rpc("eth_sendTransaction"))
            .respond_with(revert("Solo el propietario puede ejecutar esta funcion"))
            .mount(&server)
            .await;

        let err = ledger_for(&server.uri(), Some(signer()))
            .anchor(&header(1))
            .await
            .unwrap_err();
        assert_eq!(err, LedgerError::Unauthorized { caller: signer() });
    }

    #[tokio::test]
    async fn missing_receipt_times_out() {
        let server = MockServer::start().await;
        Mock::given(rpc("eth_sendTransaction"))
            .respond_with(result(json!(B256::repeat_byte(0x01))))
            .mount(&server)
            .await;
        Mock::given(rpc("eth_getTransactionReceipt"))
            .respond_with(result(Value::Null))
            .mount(&server)
            .await;

        let err = ledger_for(&server.uri(), Some(signer()))
            .anchor(&header(1))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Timeout { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn reverted_receipt_is_reported() {
        let server = MockServer::start().await;
        let tx_hash = B256::repeat_byte(0x02);
        Mock::given(rpc("eth_sendTransaction"))
            .respond_with(result(json!(tx_hash)))
            .mount(&server)
            .await;
        Mock::given(rpc("eth_getTransactionReceipt"))
            .respond_with(result(json!({
                "transactionHash": tx_hash,
                "blockNumber": "0x10",
                "gasUsed": "0x5208",
                "status": "0x0"
            })))
            .mount(&server)
            .await;
        Mock::given(rpc("eth_call"))
            .respond_with(revert("out of gas"))
            .mount(&server)
            .await;

        let err = ledger_for(&server.uri(), Some(signer()))
            .anchor(&header(1))
            .await
            .unwrap_err();
        assert_eq!(err, LedgerError::Reverted("out of gas".to_string()));
    }

    #[tokio::test]
    async fn writes_without_signer_are_misconfigured() {
        let err = ledger_for("http://127.0.0.1:1", None)
            .anchor(&header(1))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Misconfigured(_)));
    }

    #[tokio::test]
    async fn unreachable_node_is_unavailable() {
        let err = ledger_for("http://127.0.0.1:1", Some(signer()))
            .stats()
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Unavailable { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn transfer_to_zero_never_broadcasts() {
        let err = ledger_for("http://127.0.0.1:1", Some(signer()))
            .transfer_ownership(Address::ZERO)
            .await
            .unwrap_err();
        assert_eq!(err, LedgerError::InvalidOwner);
    }

    #[tokio::test]
    async fn reads_decode_contract_returns() {
        let server = MockServer::start().await;
        Mock::given(eth_call(abi::getLastAnchoredBlockCall::SELECTOR))
            .respond_with(result(hex_value(abi::fixtures::encode_record(&record(9)))))
            .mount(&server)
            .await;
        Mock::given(eth_call(abi::getLastNBlocksCall::SELECTOR))
            .respond_with(result(hex_value(abi::fixtures::encode_records(&[
                record(8),
                record(9),
            ]))))
            .mount(&server)
            .await;
        Mock::given(eth_call(abi::ownerCall::SELECTOR))
            .respond_with(result(hex_value(abi::fixtures::encode_owner(signer()))))
            .mount(&server)
            .await;
        Mock::given(eth_call(abi::getAnchoredBlockCall::SELECTOR))
            .respond_with(revert("Bloque no encontrado"))
            .mount(&server)
            .await;

        let ledger = ledger_for(&server.uri(), None);
        assert_eq!(ledger.latest().await.unwrap(), record(9));
        let window = ledger.last_n(U256::from(2u64)).await.unwrap();
        assert_eq!(window, vec![record(8), record(9)]);
        assert_eq!(ledger.owner().await.unwrap(), signer());
        assert_eq!(
            ledger.by_block_number(U256::from(3u64)).await.unwrap_err(),
            LedgerError::NotFound(U256::from(3u64))
        );
        assert_eq!(ledger.address(), Some(Address::repeat_byte(0xcc)));
    }
}
