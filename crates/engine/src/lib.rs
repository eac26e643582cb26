//! Reference graph store for isocheck
//!
//! This crate provides [`MemGraph`], an in-memory multi-versioned graph that
//! implements the store contract from `isocheck-core`:
//! - Snapshot reads for read and write transactions
//! - Strict mode: a store-wide writer lock held for the transaction lifetime
//! - Optimistic mode: read-set validation at commit (first-committer-wins)
//! - [`ValidationPolicy::SnapshotOnly`]: validation switched off, so lost
//!   updates and write skew become observable
//! - Transaction metrics through the [`TransactionCoordinator`]

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod catalog;
pub mod coordinator;
pub mod graph;
pub mod storage;
pub mod txn;

pub use coordinator::{TransactionCoordinator, TransactionMetrics};
pub use graph::{MemGraph, MemGraphBuilder};
pub use isocheck_concurrency::ValidationPolicy;
pub use txn::{MemReadTxn, MemWriteTxn};
