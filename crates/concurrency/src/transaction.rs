//! Transaction context for OCC
//!
//! TransactionContext tracks which records a transaction read (and at which
//! version) and which records it intends to write, enabling validation at
//! commit time. Buffered record contents live in the engine.

use crate::key::RecordKey;
use crate::validation::{validate_transaction, ValidationPolicy, ValidationResult, VersionSource};
use isocheck_core::{StoreError, StoreResult};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Error type for commit failures
#[derive(Debug, Clone, Error)]
pub enum CommitError {
    /// Transaction aborted due to read-set conflicts
    #[error("commit failed: {}", .0.summary())]
    ValidationFailed(ValidationResult),

    /// Transaction was not in the correct state for commit
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Installing the buffered writes was refused
    #[error("apply failed: {0}")]
    Apply(StoreError),
}

impl From<CommitError> for StoreError {
    fn from(e: CommitError) -> Self {
        match e {
            CommitError::ValidationFailed(result) => StoreError::Conflict {
                reason: result.summary(),
            },
            CommitError::InvalidState(msg) => StoreError::InvalidState(msg),
            CommitError::Apply(inner) => inner,
        }
    }
}

/// Status of a transaction in its lifecycle
///
/// State transitions:
/// - `Active` → `Validating` (begin commit)
/// - `Validating` → `Committed` (validation passed)
/// - `Validating` → `Aborted` (conflict detected)
/// - `Active` → `Aborted` (user abort or error)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Transaction is executing, can read/write
    Active,
    /// Transaction is being validated for conflicts
    Validating,
    /// Transaction committed successfully
    Committed,
    /// Transaction was aborted
    Aborted {
        /// Human-readable reason for abort
        reason: String,
    },
}

/// Transaction context for OCC with snapshot reads
///
/// # Read-Set Tracking
///
/// The first observed version of every record read from the snapshot is
/// kept in `read_set`. Records this transaction already wrote are not
/// tracked (read-your-writes). At commit time the read versions are compared
/// against the current committed versions.
///
/// # Lifecycle
///
/// 1. **BEGIN**: `new()`, status is `Active`
/// 2. **READ/WRITE**: `record_read()`, `record_write()`
/// 3. **VALIDATE**: `commit()` runs `Active → Validating → Committed|Aborted`
pub struct TransactionContext {
    /// Unique transaction ID
    pub txn_id: u64,

    /// Version at transaction start (snapshot version)
    pub start_version: u64,

    /// Records read and the version observed
    ///
    /// Version 0 means the record did not exist when read.
    pub read_set: HashMap<RecordKey, u64>,

    /// Records this transaction will install at commit
    pub write_set: HashSet<RecordKey>,

    /// Current transaction status
    pub status: TransactionStatus,
}

impl TransactionContext {
    /// Create a new transaction context reading at `start_version`
    ///
    /// # Example
    ///
    /// ```
    /// use isocheck_concurrency::TransactionContext;
    ///
    /// let txn = TransactionContext::new(1, 100);
    /// assert!(txn.is_active());
    /// assert_eq!(txn.start_version, 100);
    /// ```
    pub fn new(txn_id: u64, start_version: u64) -> Self {
        TransactionContext {
            txn_id,
            start_version,
            read_set: HashMap::new(),
            write_set: HashSet::new(),
            status: TransactionStatus::Active,
        }
    }

    // === Read/Write Tracking ===

    /// Record that `key` was read from the snapshot at `version`
    ///
    /// Only the first observation of a key is kept. Reads of records this
    /// transaction has written are not tracked.
    pub fn record_read(&mut self, key: RecordKey, version: u64) -> StoreResult<()> {
        self.ensure_active()?;
        if !self.write_set.contains(&key) {
            self.read_set.entry(key).or_insert(version);
        }
        Ok(())
    }

    /// Record that `key` will be written at commit
    pub fn record_write(&mut self, key: RecordKey) -> StoreResult<()> {
        self.ensure_active()?;
        self.write_set.insert(key);
        Ok(())
    }

    // === State Management ===

    /// Check if transaction is in Active state
    pub fn is_active(&self) -> bool {
        matches!(self.status, TransactionStatus::Active)
    }

    /// Check if transaction is committed
    pub fn is_committed(&self) -> bool {
        matches!(self.status, TransactionStatus::Committed)
    }

    /// Check if transaction is aborted
    pub fn is_aborted(&self) -> bool {
        matches!(self.status, TransactionStatus::Aborted { .. })
    }

    /// Check if transaction can be rolled back
    ///
    /// Once committed or aborted, rollback is not possible.
    pub fn can_rollback(&self) -> bool {
        matches!(
            self.status,
            TransactionStatus::Active | TransactionStatus::Validating
        )
    }

    /// Check if transaction can accept operations
    ///
    /// # Errors
    /// Returns `StoreError::InvalidState` if transaction is not `Active`.
    pub fn ensure_active(&self) -> StoreResult<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(StoreError::invalid_state(format!(
                "transaction {} is not active: {:?}",
                self.txn_id, self.status
            )))
        }
    }

    /// Transition to Validating state
    ///
    /// # State Transition
    /// `Active` → `Validating`
    pub fn mark_validating(&mut self) -> StoreResult<()> {
        self.ensure_active()?;
        self.status = TransactionStatus::Validating;
        Ok(())
    }

    /// Transition to Committed state
    ///
    /// # State Transition
    /// `Validating` → `Committed`
    pub fn mark_committed(&mut self) -> StoreResult<()> {
        match &self.status {
            TransactionStatus::Validating => {
                self.status = TransactionStatus::Committed;
                Ok(())
            }
            _ => Err(StoreError::invalid_state(format!(
                "cannot commit transaction {} from state {:?}",
                self.txn_id, self.status
            ))),
        }
    }

    /// Abort the transaction
    ///
    /// Can be called from `Active` (user abort) or `Validating` (conflict
    /// detected). The write-set is discarded; the read-set is kept for
    /// diagnostics.
    ///
    /// # Errors
    /// Returns `StoreError::InvalidState` if already `Committed` or `Aborted`.
    pub fn mark_aborted(&mut self, reason: String) -> StoreResult<()> {
        match &self.status {
            TransactionStatus::Committed => Err(StoreError::invalid_state(format!(
                "cannot abort committed transaction {}",
                self.txn_id
            ))),
            TransactionStatus::Aborted { .. } => Err(StoreError::invalid_state(format!(
                "transaction {} already aborted",
                self.txn_id
            ))),
            _ => {
                self.status = TransactionStatus::Aborted { reason };
                self.write_set.clear();
                Ok(())
            }
        }
    }

    // === Commit Operation ===

    /// Validate the transaction and move it to a terminal state
    ///
    /// 1. Transition to Validating
    /// 2. Validate the read-set under `policy`
    /// 3. Transition to Committed, or to Aborted on conflict
    ///
    /// The caller must hold the commit lock so that validation and the
    /// subsequent apply are atomic with respect to other committers.
    pub fn commit<S: VersionSource + ?Sized>(
        &mut self,
        store: &S,
        policy: ValidationPolicy,
    ) -> Result<(), CommitError> {
        if !self.is_active() {
            return Err(CommitError::InvalidState(format!(
                "cannot commit transaction {} from {:?} state - must be Active",
                self.txn_id, self.status
            )));
        }
        self.status = TransactionStatus::Validating;

        let validation_result = validate_transaction(self, store, policy);
        if !validation_result.is_valid() {
            self.status = TransactionStatus::Aborted {
                reason: format!(
                    "commit failed: {} conflict(s) detected",
                    validation_result.conflict_count()
                ),
            };
            return Err(CommitError::ValidationFailed(validation_result));
        }

        self.status = TransactionStatus::Committed;
        Ok(())
    }

    // === Introspection ===

    /// Check if transaction is read-only
    pub fn is_read_only(&self) -> bool {
        self.write_set.is_empty()
    }

    /// Get the abort reason if transaction is aborted
    pub fn abort_reason(&self) -> Option<&str> {
        match &self.status {
            TransactionStatus::Aborted { reason } => Some(reason),
            _ => None,
        }
    }
}

impl std::fmt::Debug for TransactionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionContext")
            .field("txn_id", &self.txn_id)
            .field("start_version", &self.start_version)
            .field("reads", &self.read_set.len())
            .field("writes", &self.write_set.len())
            .field("status", &self.status)
            .finish()
    }
}
