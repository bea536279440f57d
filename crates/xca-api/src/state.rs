//! # Application State
//!
//! Shared handles passed to every route handler. Cloning is cheap: every
//! field is an `Arc`.

use std::sync::Arc;

use xca_core::{NetworkName, ValidationError};
use xca_orchestrator::{CronError, CronSchedule, HealthMonitor, Orchestrator, OrchestratorConfig, Scheduler};
use xca_registry::NetworkRegistry;

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    /// Pair used by `/v1/automation/start` when the body omits one.
    pub default_network_a: Option<NetworkName>,
    pub default_network_b: Option<NetworkName>,
    pub default_schedule: CronSchedule,
    /// Start the scheduler on boot with the default pair.
    pub autostart: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            default_network_a: None,
            default_network_b: None,
            default_schedule: CronSchedule::default(),
            autostart: false,
        }
    }
}

/// Errors loading [`AppConfig`].
#[derive(Debug, thiserror::Error)]
pub enum AppConfigError {
    #[error("invalid {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
    #[error("{var}: {source}")]
    Network {
        var: &'static str,
        source: ValidationError,
    },
    #[error("XCA_DEFAULT_SCHEDULE: {0}")]
    Schedule(#[from] CronError),
}

impl AppConfig {
    /// Load from environment variables.
    ///
    /// - `XCA_PORT` (default: 3000)
    /// - `XCA_DEFAULT_NETWORK_A`, `XCA_DEFAULT_NETWORK_B` (optional)
    /// - `XCA_DEFAULT_SCHEDULE` (default: `*/5 * * * *`)
    /// - `XCA_AUTOSTART` (`true`/`1` to start the scheduler on boot)
    pub fn from_env() -> Result<Self, AppConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppConfigError> {
        let port = match lookup("XCA_PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| AppConfigError::Invalid {
                var: "XCA_PORT",
                reason: format!("\"{raw}\" is not a port number"),
            })?,
            None => 3000,
        };
        let network = |var: &'static str| -> Result<Option<NetworkName>, AppConfigError> {
            lookup(var)
                .filter(|raw| !raw.trim().is_empty())
                .map(|raw| NetworkName::new(raw).map_err(|source| AppConfigError::Network { var, source }))
                .transpose()
        };
        let default_schedule = match lookup("XCA_DEFAULT_SCHEDULE") {
            Some(raw) if !raw.trim().is_empty() => CronSchedule::parse(&raw)?,
            _ => CronSchedule::default(),
        };
        let autostart = lookup("XCA_AUTOSTART")
            .map(|raw| matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            port,
            default_network_a: network("XCA_DEFAULT_NETWORK_A")?,
            default_network_b: network("XCA_DEFAULT_NETWORK_B")?,
            default_schedule,
            autostart,
        })
    }
}

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub registry: Arc<NetworkRegistry>,
    pub orchestrator: Arc<Orchestrator>,
    pub scheduler: Arc<Scheduler>,
    pub health: HealthMonitor,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(registry: NetworkRegistry, config: AppConfig) -> Self {
        Self::with_orchestrator_config(registry, config, OrchestratorConfig::default())
    }

    pub fn with_orchestrator_config(
        registry: NetworkRegistry,
        config: AppConfig,
        orchestrator_config: OrchestratorConfig,
    ) -> Self {
        let registry = Arc::new(registry);
        let orchestrator = Arc::new(Orchestrator::with_config(
            Arc::clone(&registry),
            orchestrator_config,
        ));
        let scheduler = Arc::new(Scheduler::new(orchestrator.clone()));
        Self {
            health: HealthMonitor::new(Arc::clone(&registry)),
            registry,
            orchestrator,
            scheduler,
            config: Arc::new(config),
        }
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
    fn defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.default_schedule.as_str(), "*/5 * * * *");
    }

    #[test]
    fn reads_every_variable() {
        let config = AppConfig::from_lookup(lookup(&[
            ("XCA_PORT", "8080"),
            ("XCA_DEFAULT_NETWORK_A", "Amoy"),
            ("XCA_DEFAULT_NETWORK_B", "alastria"),
            ("XCA_DEFAULT_SCHEDULE", "0 * * * *"),
            ("XCA_AUTOSTART", "true"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.default_network_a.unwrap().as_str(), "amoy");
        assert_eq!(config.default_schedule.as_str(), "0 * * * *");
        assert!(config.autostart);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            AppConfig::from_lookup(lookup(&[("XCA_PORT", "http")])),
            Err(AppConfigError::Invalid { .. })
        ));
        assert!(matches!(
            AppConfig::from_lookup(lookup(&[("XCA_DEFAULT_SCHEDULE", "often")])),
            Err(AppConfigError::Schedule(_))
        ));
        assert!(matches!(
            AppConfig::from_lookup(lookup(&[("XCA_DEFAULT_NETWORK_A", "bad name!")])),
            Err(AppConfigError::Network { .. })
        ));
    }
}
