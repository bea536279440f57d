//! Registry configuration.
//!
//! Loaded either from a YAML file or from environment variables, then turned
//! into a live [`NetworkRegistry`] by [`RegistryConfig::build`]. Each network
//! gets a JSON-RPC client; networks with a ledger address also get an
//! [`EvmLedger`] writing as the configured signer.
//!
//! ```yaml
//! signer: "0x5B38Da6a701c568545dCfcB03FcB875f56beddC4"
//! networks:
//!   - name: amoy
//!     rpc_url: https://rpc-amoy.polygon.technology
//!     ledger_address: "0x0000000000000000000000000000000000001234"
//!   - name: alastria
//!     rpc_url: http://alastria-node:22000
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use url::Url;
use xca_core::{Address, NetworkName, ValidationError};
use xca_ledger::{EvmLedger, EvmLedgerConfig};
use xca_rpc_client::{redact_url, RetryPolicy, RpcClient, RpcClientConfig};

use crate::registry::NetworkRegistry;

/// One configured network.
#[derive(Clone, Deserialize)]
pub struct NetworkConfig {
    pub name: NetworkName,
    pub rpc_url: Url,
    #[serde(default)]
    pub ledger_address: Option<Address>,
}

impl std::fmt::Debug for NetworkConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkConfig")
            .field("name", &self.name)
            .field("rpc_url", &redact_url(&self.rpc_url))
            .field("ledger_address", &self.ledger_address)
            .finish()
    }
}

/// Configuration for every network plus shared RPC settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    pub networks: Vec<NetworkConfig>,
    /// Identity that signs ledger writes on every network.
    #[serde(default)]
    pub signer: Option<Address>,
    #[serde(default = "default_rpc_timeout_secs")]
    pub rpc_timeout_secs: u64,
    /// Transport retries for ledger reads and receipt polling. Chain
    /// header and connectivity reads are never retried.
    #[serde(default)]
    pub rpc_max_retries: u32,
    #[serde(default = "default_confirmation_timeout_secs")]
    pub confirmation_timeout_secs: u64,
    #[serde(default = "default_receipt_poll_ms")]
    pub receipt_poll_ms: u64,
}

fn default_rpc_timeout_secs() -> u64 {
    30
}

fn default_confirmation_timeout_secs() -> u64 {
    120
}

fn default_receipt_poll_ms() -> u64 {
    2_000
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    MissingVar(String),
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("invalid address for {0}: {1}")]
    InvalidAddress(String, String),
    #[error("invalid number for {0}: {1}")]
    InvalidNumber(String, String),
    #[error(transparent)]
    InvalidNetwork(#[from] ValidationError),
    #[error("no networks configured")]
    NoNetworks,
    #[error("network {0} configured twice")]
    DuplicateNetwork(NetworkName),
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("failed to build client for {0}: {1}")]
    Client(NetworkName, String),
}

impl RegistryConfig {
    /// Load from environment variables.
    ///
    /// Variables:
    /// - `XCA_NETWORKS` (required): comma-separated names, e.g. `alastria,amoy,bsc`
    /// - `XCA_<NAME>_RPC_URL` (required per network)
    /// - `XCA_<NAME>_LEDGER_ADDRESS` (optional per network)
    /// - `XCA_SIGNER_ADDRESS` (optional)
    /// - `XCA_RPC_TIMEOUT_SECS` (default: 30)
    /// - `XCA_RPC_MAX_RETRIES` (default: 0, ledger calls only)
    /// - `XCA_CONFIRMATION_TIMEOUT_SECS` (default: 120)
    /// - `XCA_RECEIPT_POLL_MS` (default: 2000)
    ///
    /// `<NAME>` is the network name uppercased with `-` mapped to `_`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup (the environment, in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let names = lookup("XCA_NETWORKS")
            .ok_or_else(|| ConfigError::MissingVar("XCA_NETWORKS".to_string()))?;

        let mut networks = Vec::new();
        for raw in names.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let name = NetworkName::new(raw)?;
            let segment = name.env_segment();

            let url_var = format!("XCA_{segment}_RPC_URL");
            let rpc_url = lookup(&url_var).ok_or_else(|| ConfigError::MissingVar(url_var.clone()))?;
            let rpc_url = Url::parse(&rpc_url)
                .map_err(|e| ConfigError::InvalidUrl(url_var.clone(), e.to_string()))?;

            let ledger_var = format!("XCA_{segment}_LEDGER_ADDRESS");
            let ledger_address = lookup(&ledger_var)
                .filter(|s| !s.trim().is_empty())
                .map(|s| parse_address(&ledger_var, &s))
                .transpose()?;

            networks.push(NetworkConfig {
                name,
                rpc_url,
                ledger_address,
            });
        }

        let signer = lookup("XCA_SIGNER_ADDRESS")
            .filter(|s| !s.trim().is_empty())
            .map(|s| parse_address("XCA_SIGNER_ADDRESS", &s))
            .transpose()?;

        let config = Self {
            networks,
            signer,
            rpc_timeout_secs: parse_number(&lookup, "XCA_RPC_TIMEOUT_SECS", default_rpc_timeout_secs())?,
            rpc_max_retries: parse_number(&lookup, "XCA_RPC_MAX_RETRIES", 0)?,
            confirmation_timeout_secs: parse_number(
                &lookup,
                "XCA_CONFIRMATION_TIMEOUT_SECS",
                default_confirmation_timeout_secs(),
            )?,
            receipt_poll_ms: parse_number(&lookup, "XCA_RECEIPT_POLL_MS", default_receipt_poll_ms())?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file.
    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&raw)
    }

    /// Parse YAML.
    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.networks.is_empty() {
            return Err(ConfigError::NoNetworks);
        }
        let mut seen = std::collections::BTreeSet::new();
        for network in &self.networks {
            if !seen.insert(&network.name) {
                return Err(ConfigError::DuplicateNetwork(network.name.clone()));
            }
        }
        Ok(())
    }

    /// Confirmation timeout for ledger writes.
    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }

    /// Build the live registry: one JSON-RPC client per network and an
    /// [`EvmLedger`] wherever a ledger address is configured. Only the
    /// ledger's client carries the retry policy.
    pub fn build(&self) -> Result<NetworkRegistry, ConfigError> {
        let mut registry = NetworkRegistry::new();
        for network in &self.networks {
            let client_config = RpcClientConfig::new(network.rpc_url.clone(), network.name.as_str())
                .with_timeout(Duration::from_secs(self.rpc_timeout_secs));
            // Header and connectivity reads surface the first failure.
            let chain_rpc = RpcClient::new(client_config.clone())
                .map_err(|e| ConfigError::Client(network.name.clone(), e.to_string()))?;

            registry
                .register(network.name.clone(), Arc::new(chain_rpc), self.signer)
                .map_err(|_| ConfigError::DuplicateNetwork(network.name.clone()))?;

            if let Some(contract) = network.ledger_address {
                let ledger_config = EvmLedgerConfig::new(contract, self.signer, network.name.as_str())
                    .with_confirmation(
                        self.confirmation_timeout(),
                        Duration::from_millis(self.receipt_poll_ms),
                    );
                let ledger_rpc = RpcClient::new(
                    client_config.with_retry(RetryPolicy::new(self.rpc_max_retries)),
                )
                .map_err(|e| ConfigError::Client(network.name.clone(), e.to_string()))?;
                let ledger = EvmLedger::new(ledger_rpc, ledger_config)
                    .map_err(|e| ConfigError::Client(network.name.clone(), e.to_string()))?;
                registry
                    .attach_ledger(&network.name, Arc::new(ledger))
                    .map_err(|e| ConfigError::Client(network.name.clone(), e.to_string()))?;
            }

            tracing::info!(
                network = %network.name,
                endpoint = %redact_url(&network.rpc_url),
                has_ledger = network.ledger_address.is_some(),
                "network registered"
            );
        }
        Ok(registry)
    }
}

fn parse_address(var: &str, raw: &str) -> Result<Address, ConfigError> {
    raw.trim()
        .parse::<Address>()
        .map_err(|e| ConfigError::InvalidAddress(var.to_string(), e.to_string()))
}

fn parse_number<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(var) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber(var.to_string(), raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn env_lookup_builds_networks() {
        let config = RegistryConfig::from_lookup(lookup(&[
            ("XCA_NETWORKS", "alastria, amoy,bsc-testnet"),
            ("XCA_ALASTRIA_RPC_URL", "http://alastria:22000"),
            ("XCA_AMOY_RPC_URL", "https://rpc-amoy.polygon.technology"),
            ("XCA_AMOY_LEDGER_ADDRESS", "0x0000000000000000000000000000000000001234"),
            ("XCA_BSC_TESTNET_RPC_URL", "https://bsc-testnet.example.org"),
            ("XCA_SIGNER_ADDRESS", "0x5B38Da6a701c568545dCfcB03FcB875f56beddC4"),
            ("XCA_CONFIRMATION_TIMEOUT_SECS", "60"),
        ]))
        .unwrap();

        assert_eq!(config.networks.len(), 3);
        assert_eq!(config.networks[2].name.as_str(), "bsc-testnet");
        assert!(config.networks[0].ledger_address.is_none());
        assert!(config.networks[1].ledger_address.is_some());
        assert!(config.signer.is_some());
        assert_eq!(config.rpc_timeout_secs, 30);
        assert_eq!(config.confirmation_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn missing_networks_var() {
        let err = RegistryConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(v) if v == "XCA_NETWORKS"));
    }

    #[test]
    fn missing_rpc_url() {
        let err = RegistryConfig::from_lookup(lookup(&[("XCA_NETWORKS", "amoy")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(v) if v == "XCA_AMOY_RPC_URL"));
    }

    #[test]
    fn invalid_address_rejected() {
        let err = RegistryConfig::from_lookup(lookup(&[
            ("XCA_NETWORKS", "amoy"),
            ("XCA_AMOY_RPC_URL", "http://localhost:8545"),
            ("XCA_AMOY_LEDGER_ADDRESS", "0x1234"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidAddress(..)));
    }

    #[test]
    fn invalid_number_rejected() {
        let err = RegistryConfig::from_lookup(lookup(&[
            ("XCA_NETWORKS", "amoy"),
            ("XCA_AMOY_RPC_URL", "http://localhost:8545"),
            ("XCA_RPC_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber(..)));
    }

    #[test]
    fn duplicate_networks_rejected() {
        let err = RegistryConfig::from_lookup(lookup(&[
            ("XCA_NETWORKS", "amoy,AMOY"),
            ("XCA_AMOY_RPC_URL", "http://localhost:8545"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateNetwork(_)));
    }

    #[test]
    fn yaml_defaults_and_build() {
        let config = RegistryConfig::from_yaml_str(
            r#"
signer: "0x5B38Da6a701c568545dCfcB03FcB875f56beddC4"
networks:
  - name: amoy
    rpc_url: http://127.0.0.1:8545
    ledger_address: "0x0000000000000000000000000000000000001234"
  - name: alastria
    rpc_url: http://127.0.0.1:22000
"#,
        )
        .unwrap();
        assert_eq!(config.rpc_timeout_secs, 30);
        assert_eq!(config.receipt_poll_ms, 2_000);

        let registry = config.build().unwrap();
        let amoy = NetworkName::new("amoy").unwrap();
        let alastria = NetworkName::new("alastria").unwrap();
        assert!(registry.has_ledger(&amoy));
        assert!(!registry.has_ledger(&alastria));
        assert_eq!(registry.connect("amoy").unwrap().signer, config.signer);
    }

    #[test]
    fn yaml_without_networks_rejected() {
        let err = RegistryConfig::from_yaml_str("networks: []").unwrap_err();
        assert!(matches!(err, ConfigError::NoNetworks));
    }

    #[test]
    fn debug_redacts_rpc_url() {
        let network = NetworkConfig {
            name: NetworkName::new("amoy").unwrap(),
            rpc_url: Url::parse("https://polygon-amoy.g.alchemy.com/v2/secret").unwrap(),
            ledger_address: None,
        };
        assert!(!format!("{network:?}").contains("secret"));
    }
}
