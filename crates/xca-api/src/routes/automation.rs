//! # Automation API
//!
//! Controls the single scheduled anchoring job. Starting while a job runs
//! replaces it.

use axum::body::Bytes;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use xca_core::NetworkName;
use xca_orchestrator::{CronSchedule, SchedulerConfig, SchedulerStatus};

use crate::error::AppError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

/// Body of `POST /v1/automation/start`. Every field falls back to the
/// server defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StartRequest {
    pub network_a: Option<String>,
    pub network_b: Option<String>,
    /// Five-field cron expression, UTC.
    pub interval: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StartResponse {
    pub message: String,
    pub status: SchedulerStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StopResponse {
    pub message: String,
    pub config: SchedulerConfig,
}

/// Build the automation router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/automation/start", post(start))
        .route("/v1/automation/stop", post(stop))
        .route("/v1/automation/status", get(status))
}

fn pick_network(
    state: &AppState,
    requested: Option<String>,
    fallback: Option<&NetworkName>,
    field: &str,
) -> Result<NetworkName, AppError> {
    match requested {
        Some(raw) => Ok(state.registry.resolve(&raw)?),
        None => fallback.cloned().ok_or_else(|| {
            AppError::Validation(format!("{field} is required: no default is configured"))
        }),
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /v1/automation/start
///
/// An empty body starts the default pair on the default schedule.
async fn start(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<StartResponse>, AppError> {
    let request: StartRequest = if body.iter().all(u8::is_ascii_whitespace) {
        StartRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::BadRequest(format!("invalid JSON body: {e}")))?
    };

    let defaults = &state.config;
    let network_a = pick_network(
        &state,
        request.network_a,
        defaults.default_network_a.as_ref(),
        "network_a",
    )?;
    let network_b = pick_network(
        &state,
        request.network_b,
        defaults.default_network_b.as_ref(),
        "network_b",
    )?;
    let interval = match request.interval {
        Some(raw) => CronSchedule::parse(&raw)?,
        None => defaults.default_schedule.clone(),
    };

    let replaced = state.scheduler.is_running();
    let status = state.scheduler.start(SchedulerConfig {
        network_a,
        network_b,
        interval,
    })?;
    let message = if replaced {
        "automation restarted with new configuration"
    } else {
        "automation started"
    };
    Ok(Json(StartResponse {
        message: message.to_string(),
        status,
    }))
}

/// POST /v1/automation/stop
async fn stop(State(state): State<AppState>) -> Result<Json<StopResponse>, AppError> {
    let config = state.scheduler.stop()?;
    Ok(Json(StopResponse {
        message: "automation stopped".to_string(),
        config,
    }))
}

/// GET /v1/automation/status
async fn status(State(state): State<AppState>) -> Json<SchedulerStatus> {
    Json(state.scheduler.status())
}
