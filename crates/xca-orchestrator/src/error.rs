//! Orchestration, scheduling and query errors.

use thiserror::Error;
use xca_core::NetworkName;
use xca_ledger::LedgerError;
use xca_registry::RegistryError;

/// Reasons an anchoring cycle could not start.
///
/// A failure inside one leg is never an `OrchestrationError`; it is reported
/// on the leg and the cycle result carries `overall_success = false`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrchestrationError {
    /// Both sides of the pair name the same network.
    #[error("cannot anchor {0} against itself")]
    SameNetwork(NetworkName),

    /// Neither tip header could be read, so no write was attempted.
    #[error("both networks unreachable: {network_a}: {reason_a}; {network_b}: {reason_b}")]
    BothNetworksUnreachable {
        network_a: NetworkName,
        reason_a: String,
        network_b: NetworkName,
        reason_b: String,
    },

    /// A name failed registry resolution.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Scheduler control errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// `stop` was called with no active job.
    #[error("automatic anchoring is not running")]
    NotRunning,

    /// The requested pair cannot be anchored.
    #[error(transparent)]
    InvalidPair(#[from] OrchestrationError),

    /// The schedule never fires again.
    #[error("schedule \"{0}\" has no upcoming fire time")]
    Exhausted(String),
}

/// Errors from read-only ledger queries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
