//! # Anchor Log State Machine
//!
//! [`AnchorLog`] is the pure, synchronous model of a ledger: an append-only
//! sequence of [`AnchorRecord`]s with strictly increasing block numbers, an
//! owner who alone may append, and bounded windowed reads.
//!
//! ## Invariants
//!
//! - `records[i].block_number < records[i + 1].block_number` for all `i`.
//! - `last_anchored_block_number()` equals the last record's block number,
//!   or zero when empty. Zero is therefore never accepted as a block number.
//! - `total_anchors()` equals `records.len()`.
//! - A failed operation leaves every field unchanged.
//!
//! Callers that share a log across tasks wrap it in a mutex so that the
//! monotonicity check and the write happen under one lock (see
//! [`crate::memory::InMemoryLedger`]).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use xca_core::{Address, AnchorLogStats, AnchorRecord, B256, U256};

use crate::error::LedgerError;

/// Events emitted by state-changing log operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// A header was appended.
    BlockAnchored {
        /// The stored record.
        record: AnchorRecord,
        /// Label of the chain the header came from.
        anchored_chain: String,
    },
    /// Write permission moved to a new identity.
    OwnershipTransferred {
        /// Owner before the transfer.
        previous_owner: Address,
        /// Owner after the transfer.
        new_owner: Address,
    },
}

/// Append-only record of counterpart-chain headers.
#[derive(Debug, Clone)]
pub struct AnchorLog {
    this_chain: String,
    counterpart_chain: String,
    owner: Address,
    records: Vec<AnchorRecord>,
    by_number: HashMap<U256, usize>,
    /// Emitted but not yet taken by [`AnchorLog::take_events`].
    pending_events: Vec<LedgerEvent>,
}

impl AnchorLog {
    /// Create an empty log owned by `owner`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidOwner`] if `owner` is the zero address.
    pub fn new(
        this_chain: impl Into<String>,
        counterpart_chain: impl Into<String>,
        owner: Address,
    ) -> Result<Self, LedgerError> {
        if owner == Address::ZERO {
            return Err(LedgerError::InvalidOwner);
        }
        Ok(Self {
            this_chain: this_chain.into(),
            counterpart_chain: counterpart_chain.into(),
            owner,
            records: Vec::new(),
            by_number: HashMap::new(),
            pending_events: Vec::new(),
        })
    }

    /// Current owner.
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Label of the chain hosting this log.
    pub fn this_chain(&self) -> &str {
        &self.this_chain
    }

    /// Label of the chain whose headers this log records.
    pub fn counterpart_chain(&self) -> &str {
        &self.counterpart_chain
    }

    /// Number of records.
    pub fn total_anchors(&self) -> usize {
        self.records.len()
    }

    /// Highest anchored block number, or zero when empty.
    pub fn last_anchored_block_number(&self) -> U256 {
        self.records
            .last()
            .map_or(U256::ZERO, |record| record.block_number)
    }

    /// All records in append order.
    pub fn records(&self) -> &[AnchorRecord] {
        &self.records
    }

    /// Events emitted since the previous call, oldest first. Once taken
    /// they are no longer held by the log.
    pub fn take_events(&mut self) -> Vec<LedgerEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Append a header, timestamped with the current wall clock.
    pub fn append(
        &mut self,
        writer: Address,
        block_number: U256,
        block_hash: B256,
        state_root: B256,
    ) -> Result<AnchorRecord, LedgerError> {
        let now = u64::try_from(chrono::Utc::now().timestamp()).unwrap_or_default();
        self.append_at(writer, block_number, block_hash, state_root, now)
    }

    /// Append a header with an explicit timestamp.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Unauthorized`] if `writer` is not the owner.
    /// - [`LedgerError::NonMonotonicBlock`] if `block_number` does not exceed
    ///   the last anchored block number.
    pub fn append_at(
        &mut self,
        writer: Address,
        block_number: U256,
        block_hash: B256,
        state_root: B256,
        timestamp: u64,
    ) -> Result<AnchorRecord, LedgerError> {
        if writer != self.owner {
            return Err(LedgerError::Unauthorized { caller: writer });
        }
        let last_anchored = self.last_anchored_block_number();
        if block_number <= last_anchored {
            return Err(LedgerError::NonMonotonicBlock {
                block_number,
                last_anchored,
            });
        }

        let record = AnchorRecord {
            block_number,
            block_hash,
            state_root,
            timestamp,
            chain_name: self.counterpart_chain.clone(),
        };
        self.by_number.insert(block_number, self.records.len());
        self.records.push(record.clone());
        self.pending_events.push(LedgerEvent::BlockAnchored {
            record: record.clone(),
            anchored_chain: self.counterpart_chain.clone(),
        });
        Ok(record)
    }

    /// Look up the record for an exact block number.
    pub fn get_by_block_number(&self, block_number: U256) -> Result<AnchorRecord, LedgerError> {
        self.by_number
            .get(&block_number)
            .and_then(|&index| self.records.get(index))
            .cloned()
            .ok_or(LedgerError::NotFound(block_number))
    }

    /// The most recently appended record.
    pub fn get_latest(&self) -> Result<AnchorRecord, LedgerError> {
        self.records.last().cloned().ok_or(LedgerError::EmptyLog)
    }

    /// The last `count` records, oldest first. Counts above the total clamp.
    ///
    /// # Errors
    ///
    /// [`LedgerError::InvalidCount`] for zero (checked first), then
    /// [`LedgerError::EmptyLog`] when there is nothing to return.
    pub fn get_last_n(&self, count: U256) -> Result<Vec<AnchorRecord>, LedgerError> {
        if count == U256::ZERO {
            return Err(LedgerError::InvalidCount);
        }
        if self.records.is_empty() {
            return Err(LedgerError::EmptyLog);
        }
        let take = count.saturating_to::<usize>().min(self.records.len());
        Ok(self.records[self.records.len() - take..].to_vec())
    }

    /// Derived statistics.
    pub fn stats(&self) -> AnchorLogStats {
        AnchorLogStats {
            total_anchors: U256::from(self.records.len()),
            last_anchored_block_number: self.last_anchored_block_number(),
            this_chain: self.this_chain.clone(),
            counterpart_chain: self.counterpart_chain.clone(),
        }
    }

    /// Hand write permission to `new_owner`.
    ///
    /// # Errors
    ///
    /// [`LedgerError::Unauthorized`] if `caller` is not the owner (checked
    /// first), then [`LedgerError::InvalidOwner`] for the zero address.
    pub fn transfer_ownership(
        &mut self,
        caller: Address,
        new_owner: Address,
    ) -> Result<(), LedgerError> {
        if caller != self.owner {
            return Err(LedgerError::Unauthorized { caller });
        }
        if new_owner == Address::ZERO {
            return Err(LedgerError::InvalidOwner);
        }
        let previous_owner = std::mem::replace(&mut self.owner, new_owner);
        self.pending_events.push(LedgerEvent::OwnershipTransferred {
            previous_owner,
            new_owner,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn owner() -> Address {
        Address::repeat_byte(0x01)
    }

    fn stranger() -> Address {
        Address::repeat_byte(0x02)
    }

    fn log() -> AnchorLog {
        AnchorLog::new("south", "north", owner()).unwrap()
    }

    fn n(value: u64) -> U256 {
        U256::from(value)
    }

    fn append(log: &mut AnchorLog, block: u64) -> Result<AnchorRecord, LedgerError> {
        log.append_at(
            owner(),
            n(block),
            B256::repeat_byte(block as u8),
            B256::ZERO,
            1_700_000_000 + block,
        )
    }

    #[test]
    fn zero_owner_rejected() {
        assert_eq!(
            AnchorLog::new("a", "b", Address::ZERO).unwrap_err(),
            LedgerError::InvalidOwner
        );
    }

    #[test]
    fn append_advances_counters_and_emits_event() {
        let mut log = log();
        let record = append(&mut log, 500).unwrap();

        assert_eq!(record.chain_name, "north");
        assert_eq!(log.total_anchors(), 1);
        assert_eq!(log.last_anchored_block_number(), n(500));
        assert_eq!(
            log.take_events(),
            vec![LedgerEvent::BlockAnchored {
                record: record.clone(),
                anchored_chain: "north".to_string()
            }]
        );
        assert!(log.take_events().is_empty());
    }

    #[test]
    fn block_zero_is_never_accepted() {
        let mut log = log();
        assert_eq!(
            append(&mut log, 0).unwrap_err(),
            LedgerError::NonMonotonicBlock {
                block_number: n(0),
                last_anchored: n(0)
            }
        );
    }

    #[test]
    fn equal_or_lower_block_rejected_without_change() {
        let mut log = log();
        append(&mut log, 10).unwrap();
        let before = log.records().to_vec();

        for block in [10, 9, 1] {
            assert!(matches!(
                append(&mut log, block),
                Err(LedgerError::NonMonotonicBlock { .. })
            ));
        }
        assert_eq!(log.records(), before.as_slice());
        assert_eq!(log.take_events().len(), 1);
    }

    #[test]
    fn gaps_are_allowed() {
        let mut log = log();
        append(&mut log, 1).unwrap();
        append(&mut log, 1_000).unwrap();
        assert_eq!(log.total_anchors(), 2);
    }

    #[test]
    fn non_owner_cannot_append() {
        let mut log = log();
        let err = log
            .append_at(stranger(), n(5), B256::ZERO, B256::ZERO, 0)
            .unwrap_err();
        assert_eq!(err, LedgerError::Unauthorized { caller: stranger() });
        assert_eq!(log.total_anchors(), 0);
    }

    #[test]
    fn unauthorized_checked_before_monotonicity() {
        let mut log = log();
        append(&mut log, 10).unwrap();
        let err = log
            .append_at(stranger(), n(3), B256::ZERO, B256::ZERO, 0)
            .unwrap_err();
        assert!(matches!(err, LedgerError::Unauthorized { .. }));
    }

    #[test]
    fn lookup_by_number() {
        let mut log = log();
        let record = append(&mut log, 42).unwrap();
        assert_eq!(log.get_by_block_number(n(42)).unwrap(), record);
        assert_eq!(
            log.get_by_block_number(n(43)).unwrap_err(),
            LedgerError::NotFound(n(43))
        );
    }

    #[test]
    fn latest_on_empty_log() {
        assert_eq!(log().get_latest().unwrap_err(), LedgerError::EmptyLog);
    }

    #[test]
    fn last_n_windows() {
        let mut log = log();
        for block in [1, 2, 3, 4, 5] {
            append(&mut log, block).unwrap();
        }

        let window = log.get_last_n(n(2)).unwrap();
        let numbers: Vec<U256> = window.iter().map(|r| r.block_number).collect();
        assert_eq!(numbers, vec![n(4), n(5)]);

        assert_eq!(log.get_last_n(U256::MAX).unwrap().len(), 5);
    }

    #[test]
    fn last_n_zero_checked_before_empty() {
        let empty = log();
        assert_eq!(empty.get_last_n(U256::ZERO).unwrap_err(), LedgerError::InvalidCount);
        assert_eq!(empty.get_last_n(n(1)).unwrap_err(), LedgerError::EmptyLog);
    }

    #[test]
    fn stats_reflect_log() {
        let mut log = log();
        append(&mut log, 7).unwrap();
        append(&mut log, 9).unwrap();
        let stats = log.stats();
        assert_eq!(stats.total_anchors, n(2));
        assert_eq!(stats.last_anchored_block_number, n(9));
        assert_eq!(stats.this_chain, "south");
        assert_eq!(stats.counterpart_chain, "north");
    }

    #[test]
    fn transfer_ownership_moves_write_permission() {
        let mut log = log();
        log.transfer_ownership(owner(), stranger()).unwrap();
        assert_eq!(log.owner(), stranger());
        assert!(matches!(
            append(&mut log, 1),
            Err(LedgerError::Unauthorized { .. })
        ));
        log.append_at(stranger(), n(1), B256::ZERO, B256::ZERO, 0)
            .unwrap();
        assert!(matches!(
            log.take_events().first(),
            Some(LedgerEvent::OwnershipTransferred { .. })
        ));
    }

    #[test]
    fn transfer_to_zero_rejected() {
        let mut log = log();
        assert_eq!(
            log.transfer_ownership(owner(), Address::ZERO).unwrap_err(),
            LedgerError::InvalidOwner
        );
        assert_eq!(log.owner(), owner());
        assert!(log.take_events().is_empty());
    }

    #[test]
    fn transfer_by_non_owner_rejected() {
        let mut log = log();
        assert!(matches!(
            log.transfer_ownership(stranger(), stranger()),
            Err(LedgerError::Unauthorized { .. })
        ));
        // Authorization is checked before the zero-address rule.
        assert!(matches!(
            log.transfer_ownership(stranger(), Address::ZERO),
            Err(LedgerError::Unauthorized { .. })
        ));
        assert_eq!(log.owner(), owner());
    }

    #[test]
    fn block_numbers_up_to_u256_max() {
        let mut log = log();
        let near_max = U256::MAX - U256::from(1u64);
        log.append_at(owner(), near_max, B256::repeat_byte(1), B256::ZERO, 0)
            .unwrap();
        log.append_at(owner(), U256::MAX, B256::repeat_byte(2), B256::ZERO, 0)
            .unwrap();

        assert_eq!(
            log.get_by_block_number(near_max).unwrap().block_hash,
            B256::repeat_byte(1)
        );
        assert_eq!(
            log.get_by_block_number(U256::MAX).unwrap().block_hash,
            B256::repeat_byte(2)
        );
        assert_eq!(log.last_anchored_block_number(), U256::MAX);
        assert_eq!(
            log.append_at(owner(), U256::MAX, B256::ZERO, B256::ZERO, 0)
                .unwrap_err(),
            LedgerError::NonMonotonicBlock {
                block_number: U256::MAX,
                last_anchored: U256::MAX,
            }
        );
        assert_eq!(log.get_last_n(U256::MAX).unwrap().len(), 2);
    }

    proptest! {
        #[test]
        fn successful_appends_track_max_and_count(blocks in proptest::collection::vec(1u64..10_000, 0..64)) {
            let mut log = log();
            let mut accepted = Vec::new();
            for block in blocks {
                let before = log.total_anchors();
                match append(&mut log, block) {
                    Ok(_) => accepted.push(block),
                    Err(LedgerError::NonMonotonicBlock { .. }) => {
                        prop_assert_eq!(log.total_anchors(), before);
                    }
                    Err(other) => prop_assert!(false, "unexpected error {other}"),
                }
            }

            prop_assert_eq!(log.total_anchors(), accepted.len());
            let max = accepted.iter().copied().max().unwrap_or(0);
            prop_assert_eq!(log.last_anchored_block_number(), U256::from(max));
            prop_assert!(accepted.windows(2).all(|w| w[0] < w[1]));
        }

        #[test]
        fn last_n_returns_min_of_k_and_total(total in 1usize..40, k in 1u64..80) {
            let mut log = log();
            for block in 1..=total as u64 {
                append(&mut log, block).unwrap();
            }
            let window = log.get_last_n(U256::from(k)).unwrap();
            prop_assert_eq!(window.len(), (k as usize).min(total));
            prop_assert_eq!(window.last().map(|r| r.block_number), Some(U256::from(total as u64)));
            prop_assert!(window.windows(2).all(|w| w[0].block_number < w[1].block_number));
        }
    }
}
