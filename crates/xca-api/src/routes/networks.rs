//! # Network API
//!
//! Configured networks, their connectivity, and their current tip header.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use xca_core::{Address, HeaderSnapshot, NetworkName};
use xca_registry::Connectivity;

use crate::error::AppError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

/// One configured network.
#[derive(Debug, Serialize, Deserialize)]
pub struct NetworkSummary {
    pub name: NetworkName,
    /// Endpoint with credentials redacted.
    pub endpoint: String,
    pub signer: Option<Address>,
    pub has_ledger: bool,
    pub ledger_address: Option<Address>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NetworkList {
    pub networks: Vec<NetworkSummary>,
}

/// Build the networks router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/networks", get(list_networks))
        .route("/v1/networks/:network/connection", get(connection))
        .route("/v1/networks/:network/blocks/latest", get(latest_block))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /v1/networks
async fn list_networks(State(state): State<AppState>) -> Result<Json<NetworkList>, AppError> {
    let mut networks = Vec::new();
    for name in state.registry.networks() {
        let handle = state.registry.connect(name.as_str())?;
        let ledger = state.registry.ledger(&name).ok();
        networks.push(NetworkSummary {
            name: handle.name,
            endpoint: handle.endpoint,
            signer: handle.signer,
            has_ledger: ledger.is_some(),
            ledger_address: ledger.and_then(|ledger| ledger.address()),
        });
    }
    Ok(Json(NetworkList { networks }))
}

/// GET /v1/networks/:network/connection
///
/// An unreachable endpoint is a 200 with `reachable: false`; only an unknown
/// name is an error.
async fn connection(
    State(state): State<AppState>,
    Path(network): Path<String>,
) -> Result<Json<Connectivity>, AppError> {
    let name = state.registry.resolve(&network)?;
    Ok(Json(state.registry.check_connectivity(&name).await))
}

/// GET /v1/networks/:network/blocks/latest
async fn latest_block(
    State(state): State<AppState>,
    Path(network): Path<String>,
) -> Result<Json<HeaderSnapshot>, AppError> {
    let name = state.registry.resolve(&network)?;
    let header = state.registry.latest_header(&name).await?;
    Ok(Json(header))
}
