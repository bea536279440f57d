//! # xca-api — HTTP Boundary for the Anchoring Watchtower
//!
//! ## API Surface
//!
//! | Prefix                  | Module                   | Domain                      |
//! |-------------------------|--------------------------|-----------------------------|
//! | `/health`               | this module              | Connectivity of every network |
//! | `/v1/networks/*`        | [`routes::networks`]     | Networks, tips, connectivity |
//! | `/v1/ledgers/*`         | [`routes::ledgers`]      | Ledger queries              |
//! | `/v1/anchor/*`          | [`routes::anchoring`]    | Manual anchoring cycle      |
//! | `/v1/automation/*`      | [`routes::automation`]   | Scheduled anchoring         |
//! | `/v1/metrics`           | this module              | Per-ledger anchor totals    |
//!
//! Every error response carries `{"error": {"code", "message"}}`; see
//! [`error::AppError`].

pub mod bootstrap;
pub mod error;
pub mod routes;
pub mod state;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use tower_http::trace::TraceLayer;
use xca_orchestrator::{HealthReport, SystemMetrics};

use crate::state::AppState;

/// Assemble the full application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/liveness", get(liveness))
        .route("/v1/metrics", get(metrics))
        .merge(routes::networks::router())
        .merge(routes::ledgers::router())
        .merge(routes::anchoring::router())
        .merge(routes::automation::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health/liveness
async fn liveness() -> &'static str {
    "ok"
}

/// GET /health
///
/// Checks every network. 503 when any network is unhealthy.
async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let report = state.health.check_health().await;
    let status = if report.all_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report))
}

/// GET /v1/metrics
async fn metrics(State(state): State<AppState>) -> Json<SystemMetrics> {
    Json(state.health.system_metrics().await)
}
