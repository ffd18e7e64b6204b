//! Sync orchestration.
//!
//! [`SyncEngine`] is the top-level entry point the host wires up: a store,
//! a vendor client, a mapping configuration and a source id. Its batch
//! drivers (`sync_all_case_types`, `sync_all_cases`) page the vendor to
//! exhaustion and report a [`SyncReport`]; its single-record drivers cover
//! targeted re-syncs and the outbound push operations.

pub mod engine;
pub mod report;

pub use engine::{DEFAULT_BATCH_SIZE, SyncEngine};
pub use report::SyncReport;
