//! # In-Memory Ledger
//!
//! [`InMemoryLedger`] hosts an [`AnchorLog`] inside the process. It is the
//! engine used by tests and local deployments, and the reference for how an
//! [`AnchorLedger`] is expected to behave.
//!
//! Writes are serialized by a single mutex, so the monotonicity check and
//! the append are atomic even when several tasks anchor concurrently.
//! Transaction hashes are synthetic (keccak over the calldata and a nonce)
//! and gas is the intrinsic cost of the equivalent contract call.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use xca_core::{keccak256, Address, AnchorLogStats, AnchorRecord, HeaderSnapshot, B256, U256};

use crate::abi;
use crate::error::LedgerError;
use crate::ledger::{AnchorLedger, AnchorSubmission};
use crate::log::{AnchorLog, LedgerEvent};

const EVENT_BUFFER: usize = 256;

/// An anchor log held in process memory.
#[derive(Debug)]
pub struct InMemoryLedger {
    label: String,
    log: Mutex<AnchorLog>,
    writer: Address,
    nonce: AtomicU64,
    confirmation_delay: Duration,
    events: broadcast::Sender<LedgerEvent>,
}

impl InMemoryLedger {
    /// A ledger on `this_chain` recording `counterpart_chain`, owned by and
    /// written as `owner`.
    pub fn new(
        this_chain: impl Into<String>,
        counterpart_chain: impl Into<String>,
        owner: Address,
    ) -> Result<Self, LedgerError> {
        let log = AnchorLog::new(this_chain, counterpart_chain, owner)?;
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Ok(Self {
            label: log.this_chain().to_string(),
            log: Mutex::new(log),
            writer: owner,
            nonce: AtomicU64::new(0),
            confirmation_delay: Duration::ZERO,
            events,
        })
    }

    /// Act as `writer` for [`AnchorLedger::anchor`] and ownership transfers.
    pub fn with_writer(mut self, writer: Address) -> Self {
        self.writer = writer;
        self
    }

    /// Delay every write by `delay` before it lands, as a confirmation wait would.
    pub fn with_confirmation_delay(mut self, delay: Duration) -> Self {
        self.confirmation_delay = delay;
        self
    }

    /// Subscribe to events emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.events.subscribe()
    }

    /// Copy of every record, oldest first.
    pub fn snapshot(&self) -> Vec<AnchorRecord> {
        self.log.lock().records().to_vec()
    }

    /// Append as an explicit writer, bypassing the configured one.
    pub fn append_as(
        &self,
        writer: Address,
        block_number: U256,
        block_hash: B256,
        state_root: B256,
    ) -> Result<AnchorRecord, LedgerError> {
        self.mutate(|log| log.append(writer, block_number, block_hash, state_root))
    }

    /// Transfer ownership as an explicit caller.
    pub fn transfer_ownership_as(
        &self,
        caller: Address,
        new_owner: Address,
    ) -> Result<(), LedgerError> {
        self.mutate(|log| log.transfer_ownership(caller, new_owner))
    }

    /// Run a mutation under the lock and publish whatever events it emitted.
    fn mutate<T>(
        &self,
        op: impl FnOnce(&mut AnchorLog) -> Result<T, LedgerError>,
    ) -> Result<T, LedgerError> {
        let (result, emitted) = {
            let mut log = self.log.lock();
            let result = op(&mut *log)?;
            (result, log.take_events())
        };
        for event in emitted {
            // No subscribers is fine.
            let _ = self.events.send(event);
        }
        Ok(result)
    }

    fn synthetic_hash(&self, calldata: &[u8]) -> B256 {
        let nonce = self.nonce.fetch_add(1, Ordering::Relaxed);
        let mut preimage = calldata.to_vec();
        preimage.extend_from_slice(&nonce.to_be_bytes());
        preimage.extend_from_slice(self.label.as_bytes());
        keccak256(preimage)
    }
}

#[async_trait]
impl AnchorLedger for InMemoryLedger {
    fn label(&self) -> &str {
        &self.label
    }

    fn address(&self) -> Option<Address> {
        None
    }

    async fn anchor(&self, header: &HeaderSnapshot) -> Result<AnchorSubmission, LedgerError> {
        if !self.confirmation_delay.is_zero() {
            tokio::time::sleep(self.confirmation_delay).await;
        }
        let calldata = abi::anchor_block_calldata(
            header.block_number,
            header.block_hash,
            header.state_root,
        );
        let record = self.append_as(
            self.writer,
            header.block_number,
            header.block_hash,
            header.state_root,
        )?;
        Ok(AnchorSubmission {
            transaction_hash: self.synthetic_hash(&calldata),
            gas_used: abi::intrinsic_gas(&calldata),
            included_in_block: None,
            anchored_block: record.block_number,
        })
    }

    async fn latest(&self) -> Result<AnchorRecord, LedgerError> {
        self.log.lock().get_latest()
    }

    async fn by_block_number(&self, block_number: U256) -> Result<AnchorRecord, LedgerError> {
        self.log.lock().get_by_block_number(block_number)
    }

    async fn last_n(&self, count: U256) -> Result<Vec<AnchorRecord>, LedgerError> {
        self.log.lock().get_last_n(count)
    }

    async fn stats(&self) -> Result<AnchorLogStats, LedgerError> {
        Ok(self.log.lock().stats())
    }

    async fn owner(&self) -> Result<Address, LedgerError> {
        Ok(self.log.lock().owner())
    }

    async fn transfer_ownership(&self, new_owner: Address) -> Result<B256, LedgerError> {
        self.transfer_ownership_as(self.writer, new_owner)?;
        let calldata = abi::transfer_ownership_calldata(new_owner);
        Ok(self.synthetic_hash(&calldata))
    }
}
