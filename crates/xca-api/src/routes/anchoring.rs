//! # Anchoring API
//!
//! Runs one cross-chain anchoring cycle on demand. Leg failures are part of
//! a 200 response; only a cycle that cannot start is an error.

use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use xca_orchestrator::CrossChainAnchoringResult;

use crate::error::AppError;
use crate::state::AppState;

/// Build the anchoring router.
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/anchor/:network_a/:network_b", post(anchor_pair))
}

/// POST /v1/anchor/:network_a/:network_b
async fn anchor_pair(
    State(state): State<AppState>,
    Path((network_a, network_b)): Path<(String, String)>,
) -> Result<Json<CrossChainAnchoringResult>, AppError> {
    let result = state
        .orchestrator
        .perform_cross_chain_anchoring(&network_a, &network_b)
        .await?;
    tracing::info!(
        cycle_id = %result.cycle_id,
        network_a = %result.network_a,
        network_b = %result.network_b,
        successful_legs = result.successful_legs(),
        "manual anchoring cycle finished"
    );
    Ok(Json(result))
}
