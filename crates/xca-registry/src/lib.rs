//! # xca-registry — Named Networks
//!
//! Resolves a network name to its chain connection, the identity that signs
//! ledger writes there, and the anchor ledger it hosts (if any). Also reads
//! tip headers and checks connectivity for the orchestrator and the API.
//!
//! ## Seams
//!
//! - [`ChainClient`]: read-only chain queries. Implemented for
//!   [`xca_rpc_client::RpcClient`] and by [`MockChain`].
//! - [`xca_ledger::AnchorLedger`]: attached per network with
//!   [`NetworkRegistry::attach_ledger`].
//!
//! ## Configuration
//!
//! [`RegistryConfig`] loads from environment variables or YAML and builds a
//! registry of live JSON-RPC clients and on-chain ledgers.

pub mod chain;
pub mod config;
pub mod error;
pub mod mock;
pub mod registry;

pub use chain::{ChainClient, ChainTip};
pub use config::{ConfigError, NetworkConfig, RegistryConfig};
pub use error::{ChainError, RegistryError};
pub use mock::MockChain;
pub use registry::{Connectivity, NetworkHandle, NetworkRegistry};
