//! Transaction manager for coordinating commit operations
//!
//! Provides atomic commit by orchestrating, under a single commit lock:
//! 1. Validation (first-committer-wins)
//! 2. Application of the buffered writes at the next version
//! 3. Publication of that version
//!
//! ## Commit Sequence
//!
//! ```text
//! 1. lock commit_lock
//! 2. validate read-set          -> Err(ValidationFailed), txn Aborted
//! 3. apply(commit_version)      -> Err(Apply), txn Aborted
//! 4. publish commit_version     (new snapshots now see the writes)
//! 5. unlock, return commit_version
//! ```
//!
//! The version is published only after every record is installed, so a
//! snapshot taken at version V never observes a partially applied commit V.

use crate::transaction::{CommitError, TransactionContext, TransactionStatus};
use crate::validation::{ValidationPolicy, VersionSource};
use isocheck_core::StoreResult;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Manages transaction lifecycle and atomic commits
///
/// Global version counter is incremented once per committed write
/// transaction. All records in a transaction get the same commit version.
pub struct TransactionManager {
    /// Latest published version
    version: AtomicU64,

    /// Next transaction ID
    next_txn_id: AtomicU64,

    /// Serializes validate + apply + publish
    commit_lock: Mutex<()>,
}

impl TransactionManager {
    /// Create a new transaction manager starting at `initial_version`
    pub fn new(initial_version: u64) -> Self {
        Self::with_txn_id(initial_version, 0)
    }

    /// Create a new transaction manager with a specific starting txn_id
    ///
    /// New transactions start at `max_txn_id + 1`.
    pub fn with_txn_id(initial_version: u64, max_txn_id: u64) -> Self {
        TransactionManager {
            version: AtomicU64::new(initial_version),
            next_txn_id: AtomicU64::new(max_txn_id + 1),
            commit_lock: Mutex::new(()),
        }
    }

    /// Get current global version
    pub fn current_version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    /// Allocate next transaction ID
    pub fn next_txn_id(&self) -> u64 {
        self.next_txn_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Begin a transaction reading at the current version
    pub fn begin(&self) -> TransactionContext {
        TransactionContext::new(self.next_txn_id(), self.current_version())
    }

    /// Commit a transaction atomically
    ///
    /// `apply` installs the buffered writes at the given version. It runs
    /// under the commit lock after validation passed; if it fails, nothing it
    /// installed may remain visible and the transaction is aborted.
    ///
    /// # Returns
    /// - `Ok(commit_version)` on success
    /// - `Err(CommitError)` on conflict, invalid state, or apply failure
    pub fn commit<S, F>(
        &self,
        txn: &mut TransactionContext,
        store: &S,
        policy: ValidationPolicy,
        apply: F,
    ) -> Result<u64, CommitError>
    where
        S: VersionSource + ?Sized,
        F: FnOnce(u64) -> StoreResult<()>,
    {
        let _guard = self.commit_lock.lock();

        // Active -> Validating -> Committed | Aborted
        txn.commit(store, policy)?;

        if txn.is_read_only() {
            return Ok(self.current_version());
        }

        let commit_version = self.current_version() + 1;
        if let Err(e) = apply(commit_version) {
            txn.status = TransactionStatus::Aborted {
                reason: format!("apply failed: {}", e),
            };
            tracing::debug!(txn_id = txn.txn_id, error = %e, "commit refused during apply");
            return Err(CommitError::Apply(e));
        }

        self.version.store(commit_version, Ordering::SeqCst);
        tracing::trace!(txn_id = txn.txn_id, commit_version, "transaction committed");
        Ok(commit_version)
    }

    /// Explicitly abort a transaction
    pub fn abort(&self, txn: &mut TransactionContext, reason: String) -> StoreResult<()> {
        txn.mark_aborted(reason)
    }

    /// Run `f` while holding the commit lock
    ///
    /// Used for store-wide maintenance (such as dropping all data) that must
    /// not interleave with a commit.
    pub fn exclusive<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = self.commit_lock.lock();
        f()
    }
}

impl Default for TransactionManager {
    fn default() -> Self {
        Self::new(0)
    }
}
