//! Watchtower server: loads network configuration, optionally starts the
//! anchoring schedule, and serves the HTTP API until SIGINT or SIGTERM.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use xca_api::bootstrap::{autostart, build_state, load_registry_config};
use xca_api::state::AppConfig;
use xca_orchestrator::SchedulerError;

/// Cross-chain block-header anchoring watchtower.
#[derive(Debug, Parser)]
#[command(name = "xca-api", version, about)]
struct Cli {
    /// YAML network configuration. Falls back to `XCA_CONFIG`, then to
    /// `XCA_*` environment variables.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Listen port. Overrides `XCA_PORT`.
    #[arg(long)]
    port: Option<u16>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("XCA_LOG_FORMAT").is_ok_and(|format| format == "json");
    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let registry_config =
        load_registry_config(cli.config.as_deref()).context("loading network configuration")?;
    let mut app_config = AppConfig::from_env().context("loading server configuration")?;
    if let Some(port) = cli.port {
        app_config.port = port;
    }
    let port = app_config.port;

    let state = build_state(&registry_config, app_config)?;
    autostart(&state)?;
    let scheduler = state.scheduler.clone();

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!("xca-api listening on {addr}");

    axum::serve(listener, xca_api::app(state).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    match scheduler.stop() {
        Ok(config) => tracing::info!(
            network_a = %config.network_a,
            network_b = %config.network_b,
            "scheduler stopped"
        ),
        Err(SchedulerError::NotRunning) => {}
        Err(e) => tracing::warn!(error = %e, "failed to stop scheduler"),
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
