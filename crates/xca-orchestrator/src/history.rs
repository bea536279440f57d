//! Paged anchoring history, newest first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use xca_core::{AnchorRecord, U256};
use xca_ledger::LedgerError;
use xca_registry::NetworkRegistry;

use crate::error::QueryError;

/// One record with its write time rendered for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub record: AnchorRecord,
    pub anchored_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchoringHistory {
    /// Newest first.
    pub entries: Vec<HistoryEntry>,
    pub total: U256,
    pub limit: usize,
    pub offset: usize,
}

/// Page backwards through the ledger hosted on `network`, skipping the
/// `offset` newest records and returning at most `limit`.
///
/// # Errors
///
/// [`LedgerError::InvalidCount`] for `limit == 0`, plus any registry or
/// ledger failure.
pub async fn anchoring_history(
    registry: &NetworkRegistry,
    network: &str,
    limit: usize,
    offset: usize,
) -> Result<AnchoringHistory, QueryError> {
    if limit == 0 {
        return Err(LedgerError::InvalidCount.into());
    }
    let name = registry.resolve(network)?;
    let ledger = registry.ledger(&name)?;
    let total = ledger.stats().await?.total_anchors;

    let empty = AnchoringHistory {
        entries: Vec::new(),
        total,
        limit,
        offset,
    };
    if total <= U256::from(offset) {
        return Ok(empty);
    }

    let window = U256::from(offset.saturating_add(limit)).min(total);
    let mut records = ledger.last_n(window).await?;
    records.reverse();

    let entries = records
        .into_iter()
        .skip(offset)
        .take(limit)
        .map(|record| HistoryEntry {
            anchored_at: i64::try_from(record.timestamp)
                .ok()
                .and_then(|secs| DateTime::from_timestamp(secs, 0)),
            record,
        })
        .collect();
    Ok(AnchoringHistory { entries, ..empty })
}
