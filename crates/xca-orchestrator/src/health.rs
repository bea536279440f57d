//! # Health and Metrics
//!
//! Per-network reports built concurrently. Each network is checked on its
//! own, so one unreachable endpoint or broken ledger never hides the state
//! of the others, and neither call ever fails.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use xca_core::{Address, AnchorLogStats, NetworkName, U256};
use xca_registry::NetworkRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Connectivity of one network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkHealth {
    pub status: HealthStatus,
    pub tip_block_number: Option<U256>,
    pub chain_id: Option<u64>,
    pub has_ledger: bool,
    pub ledger_address: Option<Address>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub networks: BTreeMap<NetworkName, NetworkHealth>,
    pub checked_at: DateTime<Utc>,
}

impl HealthReport {
    /// Whether every network answered.
    pub fn all_healthy(&self) -> bool {
        self.networks
            .values()
            .all(|network| network.status == HealthStatus::Healthy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricsStatus {
    Reporting,
    NoLedger,
    Error,
}

/// Ledger figures for one network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkMetrics {
    pub status: MetricsStatus,
    pub total_anchors: U256,
    pub stats: Option<AnchorLogStats>,
    pub ledger_address: Option<Address>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemMetrics {
    pub networks: BTreeMap<NetworkName, NetworkMetrics>,
    pub total_anchors_across_networks: U256,
    pub last_update: DateTime<Utc>,
}

/// Builds health and metrics reports from a registry.
#[derive(Debug, Clone)]
pub struct HealthMonitor {
    registry: Arc<NetworkRegistry>,
}

impl HealthMonitor {
    pub fn new(registry: Arc<NetworkRegistry>) -> Self {
        Self { registry }
    }

    /// Check every configured network.
    pub async fn check_health(&self) -> HealthReport {
        let checks = self.registry.networks().into_iter().map(|name| async move {
            let connectivity = self.registry.check_connectivity(&name).await;
            let ledger = self.registry.ledger(&name).ok();
            let status = if connectivity.reachable {
                HealthStatus::Healthy
            } else {
                tracing::warn!(network = %name, error = ?connectivity.error, "network unhealthy");
                HealthStatus::Unhealthy
            };
            let health = NetworkHealth {
                status,
                tip_block_number: connectivity.tip_block_number,
                chain_id: connectivity.chain_id,
                has_ledger: ledger.is_some(),
                ledger_address: ledger.and_then(|ledger| ledger.address()),
                error: connectivity.error,
            };
            (name, health)
        });

        HealthReport {
            networks: join_all(checks).await.into_iter().collect(),
            checked_at: Utc::now(),
        }
    }

    /// Read ledger statistics for every configured network.
    pub async fn system_metrics(&self) -> SystemMetrics {
        let reads = self.registry.networks().into_iter().map(|name| async move {
            let metrics = match self.registry.ledger(&name) {
                Err(_) => NetworkMetrics {
                    status: MetricsStatus::NoLedger,
                    total_anchors: U256::ZERO,
                    stats: None,
                    ledger_address: None,
                    error: None,
                },
                Ok(ledger) => match ledger.stats().await {
                    Ok(stats) => NetworkMetrics {
                        status: MetricsStatus::Reporting,
                        total_anchors: stats.total_anchors,
                        stats: Some(stats),
                        ledger_address: ledger.address(),
                        error: None,
                    },
                    Err(e) => {
                        tracing::warn!(network = %name, error = %e, "failed to read ledger stats");
                        NetworkMetrics {
                            status: MetricsStatus::Error,
                            total_anchors: U256::ZERO,
                            stats: None,
                            ledger_address: ledger.address(),
                            error: Some(e.to_string()),
                        }
                    }
                },
            };
            (name, metrics)
        });

        let networks: BTreeMap<_, _> = join_all(reads).await.into_iter().collect();
        let total_anchors_across_networks = networks
            .values()
            .fold(U256::ZERO, |total, m| total.saturating_add(m.total_anchors));
        SystemMetrics {
            networks,
            total_anchors_across_networks,
            last_update: Utc::now(),
        }
    }
}
