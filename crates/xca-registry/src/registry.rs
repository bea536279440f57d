//! # Network Registry
//!
//! Maps each [`NetworkName`] to its chain connection, optional signing
//! identity, and optional ledger. The registry is built once at startup and
//! is read-only afterwards, so it is shared as a plain `Arc` with no lock.
//!
//! ## Failure Semantics
//!
//! - [`NetworkRegistry::latest_header`] surfaces endpoint failures as
//!   [`RegistryError::RpcUnavailable`] and never retries; retry policy
//!   belongs to the caller.
//! - [`NetworkRegistry::check_connectivity`] never fails: an unreachable
//!   endpoint is reported as `reachable: false` with the reason attached.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use xca_core::{Address, HeaderSnapshot, NetworkName, U256, ZERO_STATE_ROOT};
use xca_ledger::AnchorLedger;

use crate::chain::ChainClient;
use crate::error::RegistryError;

/// Immutable connection details for one network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkHandle {
    pub name: NetworkName,
    /// Endpoint description, with credentials redacted.
    pub endpoint: String,
    pub signer: Option<Address>,
}

/// Result of a connectivity check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Connectivity {
    pub network: NetworkName,
    pub reachable: bool,
    pub chain_id: Option<u64>,
    pub tip_block_number: Option<U256>,
    pub gas_price: Option<U256>,
    pub error: Option<String>,
    pub checked_at: DateTime<Utc>,
}

#[derive(Debug)]
struct NetworkEntry {
    handle: NetworkHandle,
    chain: Arc<dyn ChainClient>,
    ledger: Option<Arc<dyn AnchorLedger>>,
}

/// Registry of every configured network.
#[derive(Debug, Default)]
pub struct NetworkRegistry {
    entries: BTreeMap<NetworkName, NetworkEntry>,
}

impl NetworkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a network.
    ///
    /// # Errors
    ///
    /// [`RegistryError::DuplicateNetwork`] if the name is already registered.
    pub fn register(
        &mut self,
        name: NetworkName,
        chain: Arc<dyn ChainClient>,
        signer: Option<Address>,
    ) -> Result<(), RegistryError> {
        if self.entries.contains_key(&name) {
            return Err(RegistryError::DuplicateNetwork(name));
        }
        let handle = NetworkHandle {
            name: name.clone(),
            endpoint: chain.endpoint(),
            signer,
        };
        self.entries.insert(
            name,
            NetworkEntry {
                handle,
                chain,
                ledger: None,
            },
        );
        Ok(())
    }

    /// Provision the ledger hosted on `name`.
    pub fn attach_ledger(
        &mut self,
        name: &NetworkName,
        ledger: Arc<dyn AnchorLedger>,
    ) -> Result<(), RegistryError> {
        let entry = self
            .entries
            .get_mut(name)
            .ok_or_else(|| RegistryError::UnknownNetwork {
                name: name.to_string(),
            })?;
        entry.ledger = Some(ledger);
        Ok(())
    }

    /// Validate a caller-supplied name and confirm it is configured.
    pub fn resolve(&self, raw: &str) -> Result<NetworkName, RegistryError> {
        let unknown = || RegistryError::UnknownNetwork {
            name: raw.to_string(),
        };
        let name = NetworkName::new(raw).map_err(|_| unknown())?;
        if self.entries.contains_key(&name) {
            Ok(name)
        } else {
            Err(unknown())
        }
    }

    /// The connection handle for a network.
    pub fn connect(&self, raw: &str) -> Result<NetworkHandle, RegistryError> {
        let name = self.resolve(raw)?;
        Ok(self.entry(&name)?.handle.clone())
    }

    /// Configured networks in name order.
    pub fn networks(&self) -> Vec<NetworkName> {
        self.entries.keys().cloned().collect()
    }

    pub fn contains(&self, name: &NetworkName) -> bool {
        self.entries.contains_key(name)
    }

    pub fn has_ledger(&self, name: &NetworkName) -> bool {
        self.entries
            .get(name)
            .is_some_and(|entry| entry.ledger.is_some())
    }

    /// The ledger hosted on `name`.
    pub fn ledger(&self, name: &NetworkName) -> Result<Arc<dyn AnchorLedger>, RegistryError> {
        self.entry(name)?
            .ledger
            .clone()
            .ok_or_else(|| RegistryError::NoLedger(name.clone()))
    }

    fn entry(&self, name: &NetworkName) -> Result<&NetworkEntry, RegistryError> {
        self.entries
            .get(name)
            .ok_or_else(|| RegistryError::UnknownNetwork {
                name: name.to_string(),
            })
    }

    /// Fetch the current tip header.
    pub async fn latest_header(&self, name: &NetworkName) -> Result<HeaderSnapshot, RegistryError> {
        let entry = self.entry(name)?;
        let tip = entry.chain.latest_block().await.map_err(|e| {
            tracing::warn!(network = %name, error = %e, "failed to fetch latest header");
            RegistryError::RpcUnavailable {
                network: name.clone(),
                reason: e.to_string(),
            }
        })?;
        tracing::debug!(network = %name, block_number = %tip.number, "fetched latest header");

        Ok(HeaderSnapshot {
            source_network: name.clone(),
            block_number: tip.number,
            block_hash: tip.hash,
            state_root: tip.state_root.unwrap_or(ZERO_STATE_ROOT),
            timestamp: tip.timestamp,
            parent_hash: tip.parent_hash,
            gas_used: tip.gas_used,
            gas_limit: tip.gas_limit,
        })
    }

    /// Query chain ID, tip height and gas price. Never fails.
    pub async fn check_connectivity(&self, name: &NetworkName) -> Connectivity {
        let checked_at = Utc::now();
        let entry = match self.entry(name) {
            Ok(entry) => entry,
            Err(e) => {
                return Connectivity {
                    network: name.clone(),
                    reachable: false,
                    chain_id: None,
                    tip_block_number: None,
                    gas_price: None,
                    error: Some(e.to_string()),
                    checked_at,
                }
            }
        };

        let (chain_id, tip, gas_price) = tokio::join!(
            entry.chain.chain_id(),
            entry.chain.block_number(),
            entry.chain.gas_price(),
        );

        match (chain_id, tip) {
            (Ok(chain_id), Ok(tip)) => Connectivity {
                network: name.clone(),
                reachable: true,
                chain_id: Some(chain_id),
                tip_block_number: Some(tip),
                gas_price: gas_price.ok(),
                error: None,
                checked_at,
            },
            (chain_id, tip) => {
                let reason = [chain_id.err(), tip.err()]
                    .into_iter()
                    .flatten()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("; ");
                tracing::warn!(network = %name, error = %reason, "network unreachable");
                Connectivity {
                    network: name.clone(),
                    reachable: false,
                    chain_id: None,
                    tip_block_number: None,
                    gas_price: None,
                    error: Some(reason),
                    checked_at,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockChain;
    use xca_ledger::InMemoryLedger;

    fn name(raw: &str) -> NetworkName {
        NetworkName::new(raw).unwrap()
    }

    fn registry() -> (NetworkRegistry, Arc<MockChain>) {
        let north = Arc::new(MockChain::new(1, 500));
        let mut registry = NetworkRegistry::new();
        registry
            .register(name("north"), north.clone(), Some(Address::repeat_byte(1)))
            .unwrap();
        registry
            .register(name("south"), Arc::new(MockChain::new(2, 9).without_state_root()), None)
            .unwrap();
        (registry, north)
    }

    #[test]
    fn connect_known_and_unknown() {
        let (registry, _) = registry();
        let handle = registry.connect("North").unwrap();
        assert_eq!(handle.name, name("north"));
        assert_eq!(handle.endpoint, "mock://1");
        assert_eq!(handle.signer, Some(Address::repeat_byte(1)));

        assert_eq!(
            registry.connect("east").unwrap_err(),
            RegistryError::UnknownNetwork {
                name: "east".into()
            }
        );
        assert!(matches!(
            registry.connect("not a name!"),
            Err(RegistryError::UnknownNetwork { .. })
        ));
    }

    #[test]
    fn duplicate_registration_rejected() {
        let (mut registry, _) = registry();
        let err = registry
            .register(name("north"), Arc::new(MockChain::new(3, 0)), None)
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateNetwork(name("north")));
    }

    #[test]
    fn ledger_lookup() {
        let (mut registry, _) = registry();
        assert_eq!(
            registry.ledger(&name("north")).unwrap_err(),
            RegistryError::NoLedger(name("north"))
        );
        let ledger = InMemoryLedger::new("north", "south", Address::repeat_byte(1)).unwrap();
        registry
            .attach_ledger(&name("north"), Arc::new(ledger))
            .unwrap();
        assert!(registry.has_ledger(&name("north")));
        assert!(!registry.has_ledger(&name("south")));
        assert_eq!(registry.ledger(&name("north")).unwrap().label(), "north");
    }

    #[tokio::test]
    async fn latest_header_fills_sentinels() {
        let (registry, _) = registry();
        let header = registry.latest_header(&name("south")).await.unwrap();
        assert_eq!(header.block_number, U256::from(9u64));
        assert_eq!(header.state_root, ZERO_STATE_ROOT);
        assert_eq!(header.source_network, name("south"));
    }

    #[tokio::test]
    async fn latest_header_unavailable() {
        let (registry, north) = registry();
        north.set_reachable(false);
        assert!(matches!(
            registry.latest_header(&name("north")).await,
            Err(RegistryError::RpcUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn connectivity_never_fails() {
        let (registry, north) = registry();
        let up = registry.check_connectivity(&name("north")).await;
        assert!(up.reachable);
        assert_eq!(up.chain_id, Some(1));
        assert_eq!(up.tip_block_number, Some(U256::from(500u64)));
        assert!(up.gas_price.is_some());

        north.set_reachable(false);
        let down = registry.check_connectivity(&name("north")).await;
        assert!(!down.reachable);
        assert!(down.error.unwrap().contains("offline"));

        let unknown = registry.check_connectivity(&name("east")).await;
        assert!(!unknown.reachable);
    }
}
