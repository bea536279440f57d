//! # xca-orchestrator — Cross-Chain Anchoring
//!
//! The active half of the watchtower:
//!
//! - [`Orchestrator`] runs one anchoring cycle for a pair of networks.
//! - [`Scheduler`] runs cycles on a cron schedule, one job at a time.
//! - [`HealthMonitor`] reports per-network connectivity and ledger metrics.
//! - [`anchoring_history`] pages through a ledger newest first.
//!
//! Everything here works against [`xca_registry::NetworkRegistry`] and the
//! [`xca_ledger::AnchorLedger`] trait, so the same code drives live chains
//! and the in-memory doubles used in tests.

pub mod cron;
pub mod error;
pub mod health;
pub mod history;
pub mod orchestrator;
pub mod scheduler;

pub use cron::{CronError, CronSchedule};
pub use error::{OrchestrationError, QueryError, SchedulerError};
pub use health::{
    HealthMonitor, HealthReport, HealthStatus, MetricsStatus, NetworkHealth, NetworkMetrics,
    SystemMetrics,
};
pub use history::{anchoring_history, AnchoringHistory, HistoryEntry};
pub use orchestrator::{
    AnchoringLeg, CrossChainAnchoringResult, CycleRunner, LegError, LegErrorKind, Orchestrator,
    OrchestratorConfig,
};
pub use scheduler::{Scheduler, SchedulerConfig, SchedulerStatus, TickCounters, TickOutcome};
