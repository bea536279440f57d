//! # xca-rpc-client — Typed Ethereum JSON-RPC Client
//!
//! Thin, typed access to the handful of JSON-RPC methods the watchtower
//! needs: tip headers and chain metadata for the network registry, and
//! `eth_call` / `eth_sendTransaction` / `eth_getTransactionReceipt` for the
//! on-chain ledger adapter.
//!
//! ## Retry Semantics
//!
//! Reads go through [`RpcClient::request`], which honours the configured
//! [`RetryPolicy`] on transport failures. Transaction submission uses
//! [`RpcClient::request_once`] and is never retried, since a resend can
//! produce a duplicate transaction.
//!
//! ## Signing
//!
//! The client never holds private keys. `eth_sendTransaction` asks the
//! endpoint to sign with the account named in `from`, so key custody stays
//! with the node or its signer proxy.

pub mod config;
pub mod error;
pub mod retry;
pub mod types;

pub use config::{redact_url, RpcClientConfig};
pub use error::RpcError;
pub use retry::RetryPolicy;
pub use types::{RpcBlock, RpcReceipt, TransactionRequest};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use url::Url;
use xca_core::{parse_u64_quantity, Bytes, B256, U256};

/// JSON-RPC client bound to one endpoint.
#[derive(Debug, Clone)]
pub struct RpcClient {
    http: reqwest::Client,
    endpoint: Url,
    label: String,
    retry: RetryPolicy,
    next_id: Arc<AtomicU64>,
}

impl RpcClient {
    /// Build a client from configuration.
    pub fn new(config: RpcClientConfig) -> Result<Self, RpcError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RpcError::Config(e.to_string()))?;
        Ok(Self {
            http,
            endpoint: config.endpoint,
            label: config.label,
            retry: config.retry,
            next_id: Arc::new(AtomicU64::new(1)),
        })
    }

    /// The endpoint URL.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// The label this client logs under.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Issue an idempotent call, retrying transport failures per policy.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, RpcError> {
        self.dispatch(method, params, self.retry).await
    }

    /// Issue a call exactly once.
    pub async fn request_once<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, RpcError> {
        self.dispatch(method, params, RetryPolicy::NONE).await
    }

    async fn dispatch<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
        policy: RetryPolicy,
    ) -> Result<T, RpcError> {
        let endpoint = redact_url(&self.endpoint);
        let body = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": self.next_id.fetch_add(1, Ordering::Relaxed),
        });
        tracing::debug!(network = %self.label, method, "JSON-RPC request");

        let resp = retry::retry_send(policy, &self.label, || {
            self.http.post(self.endpoint.clone()).json(&body).send()
        })
        .await
        .map_err(|e| {
            if e.is_timeout() {
                RpcError::Timeout {
                    endpoint: endpoint.clone(),
                    method: method.to_string(),
                }
            } else {
                RpcError::Transport {
                    endpoint: endpoint.clone(),
                    method: method.to_string(),
                    source: e,
                }
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RpcError::Http {
                endpoint,
                method: method.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let envelope: Value = resp.json().await.map_err(|e| RpcError::Decode {
            endpoint: endpoint.clone(),
            method: method.to_string(),
            reason: e.to_string(),
        })?;

        if let Some(error) = envelope.get("error").filter(|e| !e.is_null()) {
            return Err(RpcError::Rpc {
                endpoint,
                method: method.to_string(),
                code: error.get("code").and_then(Value::as_i64).unwrap_or_default(),
                message: error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error")
                    .to_string(),
                data: error.get("data").and_then(|d| match d {
                    Value::Null => None,
                    Value::String(s) => Some(s.clone()),
                    other => Some(other.to_string()),
                }),
            });
        }

        let result = envelope
            .get("result")
            .cloned()
            .ok_or_else(|| RpcError::MissingResult {
                endpoint: endpoint.clone(),
                method: method.to_string(),
            })?;

        serde_json::from_value(result).map_err(|e| RpcError::Decode {
            endpoint,
            method: method.to_string(),
            reason: e.to_string(),
        })
    }

    fn decode_error(&self, method: &str, reason: impl ToString) -> RpcError {
        RpcError::Decode {
            endpoint: redact_url(&self.endpoint),
            method: method.to_string(),
            reason: reason.to_string(),
        }
    }

    // -- Typed methods ------------------------------------------------------

    /// `eth_chainId`.
    pub async fn chain_id(&self) -> Result<u64, RpcError> {
        let raw: String = self.request("eth_chainId", json!([])).await?;
        parse_u64_quantity(&raw).map_err(|e| self.decode_error("eth_chainId", e))
    }

    /// `eth_blockNumber`.
    pub async fn block_number(&self) -> Result<U256, RpcError> {
        self.request("eth_blockNumber", json!([])).await
    }

    /// `eth_gasPrice`.
    pub async fn gas_price(&self) -> Result<U256, RpcError> {
        self.request("eth_gasPrice", json!([])).await
    }

    /// `eth_getBlockByNumber("latest", false)`.
    pub async fn latest_block(&self) -> Result<RpcBlock, RpcError> {
        let block: Option<RpcBlock> = self
            .request("eth_getBlockByNumber", json!(["latest", false]))
            .await?;
        block.ok_or_else(|| RpcError::MissingResult {
            endpoint: redact_url(&self.endpoint),
            method: "eth_getBlockByNumber".to_string(),
        })
    }

    /// `eth_call` against the latest block.
    pub async fn call(&self, request: &TransactionRequest) -> Result<Bytes, RpcError> {
        self.request("eth_call", json!([request, "latest"])).await
    }

    /// `eth_sendTransaction`; returns the transaction hash.
    pub async fn send_transaction(&self, request: &TransactionRequest) -> Result<B256, RpcError> {
        self.request_once("eth_sendTransaction", json!([request]))
            .await
    }

    /// `eth_getTransactionReceipt`; `None` while the transaction is pending.
    pub async fn transaction_receipt(&self, hash: B256) -> Result<Option<RpcReceipt>, RpcError> {
        self.request("eth_getTransactionReceipt", json!([hash]))
            .await
    }
}
