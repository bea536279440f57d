//! # Cross-Chain Anchoring
//!
//! One cycle anchors the tip of network A into B's ledger and the tip of B
//! into A's ledger.
//!
//! ## Cycle
//!
//! 1. Validate the pair: distinct, both configured. No RPC happens before this.
//! 2. Read both tip headers concurrently. If both reads fail the cycle aborts
//!    with [`OrchestrationError::BothNetworksUnreachable`].
//! 3. Run both legs concurrently. Each leg is bounded by
//!    [`OrchestratorConfig::confirmation_timeout`] and fails on its own; a
//!    failed leg never cancels or rolls back the other.
//! 4. Aggregate: `overall_success` only when both legs landed, gas summed
//!    over the legs that did.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use xca_core::{HeaderSnapshot, NetworkName, B256, U256};
use xca_ledger::LedgerError;
use xca_registry::{NetworkRegistry, RegistryError};

use crate::error::OrchestrationError;

/// Orchestrator tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Upper bound on one leg's ledger write, confirmation included.
    pub confirmation_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            confirmation_timeout: Duration::from_secs(180),
        }
    }
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Why a leg failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegErrorKind {
    RpcUnavailable,
    NoLedger,
    Unauthorized,
    NonMonotonicBlock,
    Timeout,
    Reverted,
    LedgerUnavailable,
    InvalidResponse,
    Misconfigured,
    NotFound,
    EmptyLog,
    InvalidCount,
    InvalidOwner,
}

impl From<&LedgerError> for LegErrorKind {
    fn from(err: &LedgerError) -> Self {
        match err {
            LedgerError::Unauthorized { .. } => Self::Unauthorized,
            LedgerError::NonMonotonicBlock { .. } => Self::NonMonotonicBlock,
            LedgerError::NotFound(_) => Self::NotFound,
            LedgerError::EmptyLog => Self::EmptyLog,
            LedgerError::InvalidCount => Self::InvalidCount,
            LedgerError::InvalidOwner => Self::InvalidOwner,
            LedgerError::Unavailable { .. } => Self::LedgerUnavailable,
            LedgerError::Timeout { .. } => Self::Timeout,
            LedgerError::Reverted(_) => Self::Reverted,
            LedgerError::InvalidResponse(_) => Self::InvalidResponse,
            LedgerError::Misconfigured(_) => Self::Misconfigured,
        }
    }
}

/// A failed leg's classification and message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegError {
    pub kind: LegErrorKind,
    pub message: String,
}

/// One direction of a cycle: the source tip anchored into the target ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchoringLeg {
    pub source_network: NetworkName,
    pub target_network: NetworkName,
    /// Absent when the source header could not be read.
    pub source_block_number: Option<U256>,
    pub transaction_hash: Option<B256>,
    pub gas_used: Option<U256>,
    /// Block on the target chain that included the anchor transaction.
    pub included_in_block: Option<U256>,
    pub error: Option<LegError>,
}

impl AnchoringLeg {
    fn new(source: &NetworkName, target: &NetworkName) -> Self {
        Self {
            source_network: source.clone(),
            target_network: target.clone(),
            source_block_number: None,
            transaction_hash: None,
            gas_used: None,
            included_in_block: None,
            error: None,
        }
    }

    fn failed(mut self, kind: LegErrorKind, message: impl Into<String>) -> Self {
        self.error = Some(LegError {
            kind,
            message: message.into(),
        });
        self
    }

    /// Whether the anchor landed.
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcome of one anchoring cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossChainAnchoringResult {
    pub cycle_id: Uuid,
    /// True only when both legs landed.
    pub overall_success: bool,
    pub network_a: NetworkName,
    pub network_b: NetworkName,
    /// `[A into B, B into A]`.
    pub legs: [AnchoringLeg; 2],
    /// Gas of the legs that landed.
    pub aggregate_gas_used: U256,
    pub timestamp: DateTime<Utc>,
}

impl CrossChainAnchoringResult {
    /// Number of legs that landed.
    pub fn successful_legs(&self) -> usize {
        self.legs.iter().filter(|leg| leg.succeeded()).count()
    }
}

// ---------------------------------------------------------------------------
// CycleRunner
// ---------------------------------------------------------------------------

/// Anything the scheduler can drive once per tick.
#[async_trait]
pub trait CycleRunner: Send + Sync {
    /// Check a pair without touching any chain.
    fn validate_pair(&self, network_a: &NetworkName, network_b: &NetworkName)
        -> Result<(), OrchestrationError>;

    /// Run one cycle.
    async fn run_cycle(
        &self,
        network_a: &NetworkName,
        network_b: &NetworkName,
    ) -> Result<CrossChainAnchoringResult, OrchestrationError>;
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Runs anchoring cycles against a shared registry.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    registry: Arc<NetworkRegistry>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(registry: Arc<NetworkRegistry>) -> Self {
        Self::with_config(registry, OrchestratorConfig::default())
    }

    pub fn with_config(registry: Arc<NetworkRegistry>, config: OrchestratorConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &Arc<NetworkRegistry> {
        &self.registry
    }

    pub fn config(&self) -> OrchestratorConfig {
        self.config
    }

    fn check_pair(
        &self,
        network_a: &str,
        network_b: &str,
    ) -> Result<(NetworkName, NetworkName), OrchestrationError> {
        if let (Ok(a), Ok(b)) = (NetworkName::new(network_a), NetworkName::new(network_b)) {
            if a == b {
                return Err(OrchestrationError::SameNetwork(a));
            }
        }
        Ok((
            self.registry.resolve(network_a)?,
            self.registry.resolve(network_b)?,
        ))
    }

    /// Anchor each network's tip into the other's ledger.
    ///
    /// # Errors
    ///
    /// Only when the cycle cannot start: [`OrchestrationError::SameNetwork`],
    /// an unknown name, or both tip reads failing. Leg failures are reported
    /// inside the result.
    pub async fn perform_cross_chain_anchoring(
        &self,
        network_a: &str,
        network_b: &str,
    ) -> Result<CrossChainAnchoringResult, OrchestrationError> {
        let (a, b) = self.check_pair(network_a, network_b)?;
        let cycle_id = Uuid::new_v4();
        tracing::info!(%cycle_id, network_a = %a, network_b = %b, "anchoring cycle started");

        let (header_a, header_b) = tokio::join!(
            self.registry.latest_header(&a),
            self.registry.latest_header(&b),
        );

        if let (Err(err_a), Err(err_b)) = (&header_a, &header_b) {
            tracing::error!(%cycle_id, network_a = %a, network_b = %b, "both networks unreachable");
            return Err(OrchestrationError::BothNetworksUnreachable {
                network_a: a,
                reason_a: err_a.to_string(),
                network_b: b,
                reason_b: err_b.to_string(),
            });
        }

        let (leg_ab, leg_ba) = tokio::join!(
            self.run_leg(cycle_id, &a, &b, header_a),
            self.run_leg(cycle_id, &b, &a, header_b),
        );

        let aggregate_gas_used = [&leg_ab, &leg_ba]
            .into_iter()
            .filter(|leg| leg.succeeded())
            .filter_map(|leg| leg.gas_used)
            .fold(U256::ZERO, |total, gas| total.saturating_add(gas));
        let overall_success = leg_ab.succeeded() && leg_ba.succeeded();

        let result = CrossChainAnchoringResult {
            cycle_id,
            overall_success,
            network_a: a,
            network_b: b,
            legs: [leg_ab, leg_ba],
            aggregate_gas_used,
            timestamp: Utc::now(),
        };
        tracing::info!(
            %cycle_id,
            overall_success,
            successful_legs = result.successful_legs(),
            aggregate_gas_used = %result.aggregate_gas_used,
            "anchoring cycle finished"
        );
        Ok(result)
    }

    async fn run_leg(
        &self,
        cycle_id: Uuid,
        source: &NetworkName,
        target: &NetworkName,
        header: Result<HeaderSnapshot, RegistryError>,
    ) -> AnchoringLeg {
        let mut leg = AnchoringLeg::new(source, target);

        let header = match header {
            Ok(header) => header,
            Err(e) => {
                tracing::warn!(%cycle_id, network = %source, target = %target, error = %e, "leg skipped: source header unavailable");
                return leg.failed(LegErrorKind::RpcUnavailable, e.to_string());
            }
        };
        leg.source_block_number = Some(header.block_number);

        let ledger = match self.registry.ledger(target) {
            Ok(ledger) => ledger,
            Err(e) => {
                tracing::warn!(%cycle_id, network = %source, target = %target, error = %e, "leg skipped: no ledger on target");
                let kind = match e {
                    RegistryError::NoLedger(_) => LegErrorKind::NoLedger,
                    _ => LegErrorKind::RpcUnavailable,
                };
                return leg.failed(kind, e.to_string());
            }
        };

        let timeout = self.config.confirmation_timeout;
        match tokio::time::timeout(timeout, ledger.anchor(&header)).await {
            Ok(Ok(submission)) => {
                tracing::info!(
                    %cycle_id,
                    network = %source,
                    target = %target,
                    block_number = %header.block_number,
                    tx_hash = %submission.transaction_hash,
                    "header anchored"
                );
                leg.transaction_hash = Some(submission.transaction_hash);
                leg.gas_used = Some(submission.gas_used);
                leg.included_in_block = submission.included_in_block;
                leg
            }
            Ok(Err(e)) => {
                tracing::warn!(%cycle_id, network = %source, target = %target, block_number = %header.block_number, code = e.code(), error = %e, "anchoring leg failed");
                leg.failed(LegErrorKind::from(&e), e.to_string())
            }
            Err(_) => {
                tracing::warn!(%cycle_id, network = %source, target = %target, block_number = %header.block_number, "anchoring leg timed out");
                leg.failed(
                    LegErrorKind::Timeout,
                    format!("anchor into {target} not confirmed within {}s", timeout.as_secs()),
                )
            }
        }
    }
}

#[async_trait]
impl CycleRunner for Orchestrator {
    fn validate_pair(
        &self,
        network_a: &NetworkName,
        network_b: &NetworkName,
    ) -> Result<(), OrchestrationError> {
        self.check_pair(network_a.as_str(), network_b.as_str())
            .map(|_| ())
    }

    async fn run_cycle(
        &self,
        network_a: &NetworkName,
        network_b: &NetworkName,
    ) -> Result<CrossChainAnchoringResult, OrchestrationError> {
        self.perform_cross_chain_anchoring(network_a.as_str(), network_b.as_str())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_errors_map_to_leg_kinds() {
        assert_eq!(
            LegErrorKind::from(&LedgerError::Unavailable {
                ledger: "north".into(),
                reason: "refused".into()
            }),
            LegErrorKind::LedgerUnavailable
        );
        assert_eq!(
            LegErrorKind::from(&LedgerError::NonMonotonicBlock {
                block_number: U256::from(1u64),
                last_anchored: U256::from(2u64)
            }),
            LegErrorKind::NonMonotonicBlock
        );
        assert_eq!(
            LegErrorKind::from(&LedgerError::Reverted("nope".into())),
            LegErrorKind::Reverted
        );
    }

    #[test]
    fn leg_error_kind_serializes_snake_case() {
        let json = serde_json::to_string(&LegErrorKind::RpcUnavailable).unwrap();
        assert_eq!(json, "\"rpc_unavailable\"");
    }

    #[test]
    fn default_confirmation_timeout() {
        assert_eq!(
            OrchestratorConfig::default().confirmation_timeout,
            Duration::from_secs(180)
        );
    }
}
