//! # Ledger API
//!
//! Read-only queries against the anchor ledger hosted on each network.
//! Writes happen only through anchoring cycles.

use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use xca_core::{parse_quantity, Address, AnchorLogStats, AnchorRecord, NetworkName, U256};
use xca_ledger::AnchorLedger;
use xca_orchestrator::{anchoring_history, AnchoringHistory};

use crate::error::AppError;
use crate::state::AppState;

const DEFAULT_RECENT_COUNT: u64 = 5;
const DEFAULT_HISTORY_LIMIT: usize = 10;

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub count: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LedgerStatsResponse {
    pub network: NetworkName,
    pub ledger_address: Option<Address>,
    pub stats: AnchorLogStats,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecentAnchorsResponse {
    pub network: NetworkName,
    /// Oldest first.
    pub records: Vec<AnchorRecord>,
}

/// Build the ledgers router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/ledgers/:network/stats", get(stats))
        .route("/v1/ledgers/:network/latest", get(latest))
        .route("/v1/ledgers/:network/anchors", get(recent))
        .route("/v1/ledgers/:network/anchors/:block_number", get(by_block_number))
        .route("/v1/ledgers/:network/history", get(history))
}

fn ledger_for(
    state: &AppState,
    network: &str,
) -> Result<(NetworkName, Arc<dyn AnchorLedger>), AppError> {
    let name = state.registry.resolve(network)?;
    let ledger = state.registry.ledger(&name)?;
    Ok((name, ledger))
}

fn bad_query(rejection: QueryRejection) -> AppError {
    AppError::BadRequest(rejection.body_text())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /v1/ledgers/:network/stats
async fn stats(
    State(state): State<AppState>,
    Path(network): Path<String>,
) -> Result<Json<LedgerStatsResponse>, AppError> {
    let (name, ledger) = ledger_for(&state, &network)?;
    let stats = ledger.stats().await?;
    Ok(Json(LedgerStatsResponse {
        network: name,
        ledger_address: ledger.address(),
        stats,
    }))
}

/// GET /v1/ledgers/:network/latest
async fn latest(
    State(state): State<AppState>,
    Path(network): Path<String>,
) -> Result<Json<AnchorRecord>, AppError> {
    let (_, ledger) = ledger_for(&state, &network)?;
    Ok(Json(ledger.latest().await?))
}

/// GET /v1/ledgers/:network/anchors?count=5
async fn recent(
    State(state): State<AppState>,
    Path(network): Path<String>,
    query: Result<Query<RecentQuery>, QueryRejection>,
) -> Result<Json<RecentAnchorsResponse>, AppError> {
    let Query(query) = query.map_err(bad_query)?;
    let (name, ledger) = ledger_for(&state, &network)?;
    let count = U256::from(query.count.unwrap_or(DEFAULT_RECENT_COUNT));
    let records = ledger.last_n(count).await?;
    Ok(Json(RecentAnchorsResponse {
        network: name,
        records,
    }))
}

/// GET /v1/ledgers/:network/anchors/:block_number
///
/// Accepts decimal or `0x`-prefixed hex block numbers.
async fn by_block_number(
    State(state): State<AppState>,
    Path((network, block_number)): Path<(String, String)>,
) -> Result<Json<AnchorRecord>, AppError> {
    let block_number = parse_quantity(&block_number)
        .map_err(|e| AppError::BadRequest(format!("block_number: {e}")))?;
    let (_, ledger) = ledger_for(&state, &network)?;
    Ok(Json(ledger.by_block_number(block_number).await?))
}

/// GET /v1/ledgers/:network/history?limit=10&offset=0
async fn history(
    State(state): State<AppState>,
    Path(network): Path<String>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<AnchoringHistory>, AppError> {
    let Query(query) = query.map_err(bad_query)?;
    let history = anchoring_history(
        &state.registry,
        &network,
        query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT),
        query.offset.unwrap_or(0),
    )
    .await?;
    Ok(Json(history))
}
