//! Transaction coordinator for managing transaction lifecycle
//!
//! The TransactionCoordinator wraps TransactionManager and adds:
//! - Active transaction tracking
//! - Transaction metrics (started, committed, aborted)
//! - Draining active transactions before a reset
//! - Commit rate calculation

use isocheck_concurrency::{
    TransactionContext, TransactionManager, ValidationPolicy, VersionSource,
};
use isocheck_core::{StoreError, StoreResult};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Transaction coordinator for the graph store
///
/// Manages transaction lifecycle, ID allocation, version tracking, and metrics.
///
/// # Memory Ordering
///
/// The metric counters use Relaxed ordering: they are observational only and
/// do not synchronize any other memory operations.
pub struct TransactionCoordinator {
    manager: TransactionManager,
    active_count: AtomicU64,
    total_started: AtomicU64,
    total_committed: AtomicU64,
    total_aborted: AtomicU64,
}

impl TransactionCoordinator {
    /// Create new coordinator with initial version
    pub fn new(initial_version: u64) -> Self {
        Self {
            manager: TransactionManager::new(initial_version),
            active_count: AtomicU64::new(0),
            total_started: AtomicU64::new(0),
            total_committed: AtomicU64::new(0),
            total_aborted: AtomicU64::new(0),
        }
    }

    /// Start a new transaction reading at the current version
    pub fn start_transaction(&self) -> TransactionContext {
        let txn = self.manager.begin();
        self.record_start();
        debug!(target: "isocheck::txn", txn_id = txn.txn_id, start_version = txn.start_version, "Transaction started");
        txn
    }

    /// Commit a transaction through the concurrency layer
    ///
    /// Records commit/abort metrics and converts `CommitError` to
    /// `StoreError` (validation failures become `StoreError::Conflict`).
    pub fn commit<S, F>(
        &self,
        txn: &mut TransactionContext,
        store: &S,
        policy: ValidationPolicy,
        apply: F,
    ) -> StoreResult<u64>
    where
        S: VersionSource + ?Sized,
        F: FnOnce(u64) -> StoreResult<()>,
    {
        match self.manager.commit(txn, store, policy, apply) {
            Ok(version) => {
                self.record_commit();
                debug!(target: "isocheck::txn", txn_id = txn.txn_id, version, "Transaction committed");
                Ok(version)
            }
            Err(e) => {
                self.record_abort();
                debug!(target: "isocheck::txn", txn_id = txn.txn_id, error = %e, "Transaction aborted");
                Err(StoreError::from(e))
            }
        }
    }

    /// Abort a transaction explicitly
    pub fn abort(&self, txn: &mut TransactionContext, reason: &str) {
        if txn.can_rollback() {
            let _ = self.manager.abort(txn, reason.to_string());
        }
        self.record_abort();
        debug!(target: "isocheck::txn", txn_id = txn.txn_id, reason, "Transaction aborted");
    }

    /// Run `f` with commits excluded
    pub fn exclusive<R>(&self, f: impl FnOnce() -> R) -> R {
        self.manager.exclusive(f)
    }

    /// Record transaction start
    pub fn record_start(&self) {
        self.active_count.fetch_add(1, Ordering::Relaxed);
        self.total_started.fetch_add(1, Ordering::Relaxed);
    }

    /// Record transaction commit
    ///
    /// Decrements active count (saturating at 0) and increments committed count.
    pub fn record_commit(&self) {
        self.release_active();
        self.total_committed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record transaction abort
    pub fn record_abort(&self) {
        self.release_active();
        self.total_aborted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the end of a read-only transaction
    ///
    /// Neither a commit nor an abort: only the active slot is released.
    pub fn record_finish(&self) {
        self.release_active();
    }

    fn release_active(&self) {
        let _ = self
            .active_count
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |x| {
                Some(x.saturating_sub(1))
            });
    }

    /// Get current global version
    pub fn current_version(&self) -> u64 {
        self.manager.current_version()
    }

    /// Get transaction metrics
    pub fn metrics(&self) -> TransactionMetrics {
        let started = self.total_started.load(Ordering::Relaxed);
        let committed = self.total_committed.load(Ordering::Relaxed);

        TransactionMetrics {
            active_count: self.active_count.load(Ordering::Relaxed),
            total_started: started,
            total_committed: committed,
            total_aborted: self.total_aborted.load(Ordering::Relaxed),
            commit_rate: if started > 0 {
                committed as f64 / started as f64
            } else {
                0.0
            },
        }
    }

    /// Get current active transaction count
    pub fn active_count(&self) -> u64 {
        self.active_count.load(Ordering::SeqCst)
    }

    /// Wait for all active transactions to complete
    ///
    /// Returns `false` if `timeout` expired with transactions still active.
    pub fn wait_for_idle(&self, timeout: std::time::Duration) -> bool {
        let start = std::time::Instant::now();
        let sleep_duration = std::time::Duration::from_millis(1);

        while self.active_count.load(Ordering::SeqCst) > 0 {
            if start.elapsed() > timeout {
                return false;
            }
            std::thread::sleep(sleep_duration);
        }
        true
    }
}

/// Transaction metrics
#[derive(Debug, Clone)]
pub struct TransactionMetrics {
    /// Number of currently active transactions
    pub active_count: u64,
    /// Total number of transactions started
    pub total_started: u64,
    /// Total number of transactions committed
    pub total_committed: u64,
    /// Total number of transactions aborted
    pub total_aborted: u64,
    /// Commit success rate (committed / started)
    pub commit_rate: f64,
}

impl TransactionMetrics {
    /// Total transactions that completed (committed + aborted)
    pub fn total_completed(&self) -> u64 {
        self.total_committed + self.total_aborted
    }

    /// Abort rate (aborted / started)
    pub fn abort_rate(&self) -> f64 {
        if self.total_started > 0 {
            self.total_aborted as f64 / self.total_started as f64
        } else {
            0.0
        }
    }
}
