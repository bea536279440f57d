//! # Bootstrap
//!
//! Turns configuration into a running [`AppState`]: load the registry
//! config (YAML when a path is given, environment otherwise), build the
//! live registry, and start the scheduler when autostart is requested.

use std::path::{Path, PathBuf};
use std::time::Duration;

use xca_orchestrator::{OrchestratorConfig, SchedulerConfig};
use xca_registry::{ConfigError, RegistryConfig};

use crate::state::{AppConfig, AppState};

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("registry configuration: {0}")]
    Registry(#[from] ConfigError),

    #[error("XCA_AUTOSTART requires XCA_DEFAULT_NETWORK_A and XCA_DEFAULT_NETWORK_B")]
    AutostartWithoutPair,

    #[error("failed to start scheduler: {0}")]
    Scheduler(#[from] xca_orchestrator::SchedulerError),
}

/// Where the registry configuration comes from: an explicit path, then
/// `XCA_CONFIG`, then the `XCA_*` network variables.
pub fn load_registry_config(path: Option<&Path>) -> Result<RegistryConfig, ConfigError> {
    let path = path
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os("XCA_CONFIG").map(PathBuf::from));
    match path {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading registry configuration from file");
            RegistryConfig::from_yaml_file(&path)
        }
        None => RegistryConfig::from_env(),
    }
}

/// Build application state from loaded configuration.
///
/// The orchestrator's per-leg bound is kept above the ledger's own
/// confirmation wait so the ledger reports its timeout first.
pub fn build_state(
    registry_config: &RegistryConfig,
    app_config: AppConfig,
) -> Result<AppState, BootstrapError> {
    let registry = registry_config.build()?;
    let leg_timeout = registry_config
        .confirmation_timeout()
        .saturating_add(Duration::from_secs(60))
        .max(OrchestratorConfig::default().confirmation_timeout);
    let state = AppState::with_orchestrator_config(
        registry,
        app_config,
        OrchestratorConfig {
            confirmation_timeout: leg_timeout,
        },
    );
    tracing::info!(
        networks = state.registry.networks().len(),
        leg_timeout_secs = leg_timeout.as_secs(),
        "application state built"
    );
    Ok(state)
}

/// Start the scheduler with the default pair when configured to.
pub fn autostart(state: &AppState) -> Result<(), BootstrapError> {
    if !state.config.autostart {
        return Ok(());
    }
    let (Some(network_a), Some(network_b)) = (
        state.config.default_network_a.clone(),
        state.config.default_network_b.clone(),
    ) else {
        return Err(BootstrapError::AutostartWithoutPair);
    };
    state.scheduler.start(SchedulerConfig {
        network_a,
        network_b,
        interval: state.config.default_schedule.clone(),
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_config() -> RegistryConfig {
        RegistryConfig::from_yaml_str(
            r#"
confirmation_timeout_secs: 300
networks:
  - name: north
    rpc_url: http://127.0.0.1:1
  - name: south
    rpc_url: http://127.0.0.1:1
"#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn leg_timeout_exceeds_ledger_timeout() {
        let state = build_state(&registry_config(), AppConfig::default()).unwrap();
        assert_eq!(state.registry.networks().len(), 2);
        assert_eq!(
            state.orchestrator.config().confirmation_timeout,
            Duration::from_secs(360)
        );
        assert!(!state.scheduler.is_running());
    }

    #[tokio::test]
    async fn autostart_needs_a_pair() {
        let config = AppConfig {
            autostart: true,
            ..AppConfig::default()
        };
        let state = build_state(&registry_config(), config).unwrap();
        assert!(matches!(
            autostart(&state),
            Err(BootstrapError::AutostartWithoutPair)
        ));
    }

    #[tokio::test]
    async fn autostart_starts_scheduler() {
        let config = AppConfig {
            autostart: true,
            default_network_a: Some(xca_core::NetworkName::new("north").unwrap()),
            default_network_b: Some(xca_core::NetworkName::new("south").unwrap()),
            ..AppConfig::default()
        };
        let state = build_state(&registry_config(), config).unwrap();
        autostart(&state).unwrap();
        assert!(state.scheduler.is_running());
        state.scheduler.stop().unwrap();
    }
}
