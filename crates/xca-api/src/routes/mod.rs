//! # API Route Modules
//!
//! - `networks`: configured networks, connectivity checks, tip headers.
//! - `ledgers`: read-only queries against each network's anchor ledger.
//! - `anchoring`: run one cross-chain anchoring cycle on demand.
//! - `automation`: start, stop and inspect the scheduled anchoring job.

pub mod anchoring;
pub mod automation;
pub mod ledgers;
pub mod networks;
