//! Transaction validation for OCC
//!
//! Conflict rules:
//! - First-committer-wins based on the READ-SET, not the write-set
//! - Blind writes (write without read) do not conflict
//! - Read-only transactions always validate
//! - A record that did not exist when read is tracked at version 0
//!
//! Every write to a record in this store is preceded by a read of the same
//! record, so lost updates and write skew both surface as read-set conflicts.

use crate::key::RecordKey;
use crate::transaction::TransactionContext;
use std::collections::HashMap;

/// Source of the latest committed version of each record
///
/// Implemented by the engine's storage; version 0 means "never written".
pub trait VersionSource {
    /// Latest committed version of `key`
    fn current_version(&self, key: &RecordKey) -> u64;
}

/// How strictly commits are validated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationPolicy {
    /// Validate the read-set under the commit lock (serializable)
    #[default]
    Serializable,
    /// Skip validation; the last committer wins
    ///
    /// Reads still come from a stable snapshot, so this is plain snapshot
    /// reads without write-conflict detection. It admits lost updates and
    /// write skew.
    SnapshotOnly,
}

impl ValidationPolicy {
    /// Check if commits are validated at all
    pub fn validates(&self) -> bool {
        matches!(self, ValidationPolicy::Serializable)
    }
}

/// Types of conflicts that can occur during transaction validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictType {
    /// Record was read at one version but its current version differs
    ReadWriteConflict {
        /// The record that has a conflict
        key: RecordKey,
        /// Version recorded in the read-set
        read_version: u64,
        /// Current version at validation time
        current_version: u64,
    },
}

impl std::fmt::Display for ConflictType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConflictType::ReadWriteConflict {
                key,
                read_version,
                current_version,
            } => write!(
                f,
                "{} read at version {} but now at {}",
                key, read_version, current_version
            ),
        }
    }
}

/// Result of transaction validation
///
/// Accumulates all conflicts found during validation.
/// A transaction commits only if `is_valid()` returns true.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// All conflicts detected during validation
    pub conflicts: Vec<ConflictType>,
}

impl ValidationResult {
    /// Create a successful validation result (no conflicts)
    pub fn ok() -> Self {
        ValidationResult {
            conflicts: Vec::new(),
        }
    }

    /// Create a validation result with a single conflict
    pub fn conflict(conflict: ConflictType) -> Self {
        ValidationResult {
            conflicts: vec![conflict],
        }
    }

    /// Check if validation passed (no conflicts)
    pub fn is_valid(&self) -> bool {
        self.conflicts.is_empty()
    }

    /// Merge another validation result into this one
    pub fn merge(&mut self, other: ValidationResult) {
        self.conflicts.extend(other.conflicts);
    }

    /// Get the number of conflicts
    pub fn conflict_count(&self) -> usize {
        self.conflicts.len()
    }

    /// Short description naming the first conflicting record
    pub fn summary(&self) -> String {
        match self.conflicts.first() {
            None => "no conflicts".to_string(),
            Some(first) if self.conflicts.len() == 1 => first.to_string(),
            Some(first) => format!("{} (+{} more)", first, self.conflicts.len() - 1),
        }
    }
}

/// Validate the read-set against current versions
///
/// For each record in the read-set, report a `ReadWriteConflict` if its
/// current version differs from the version read.
pub fn validate_read_set<S: VersionSource + ?Sized>(
    read_set: &HashMap<RecordKey, u64>,
    store: &S,
) -> ValidationResult {
    let mut result = ValidationResult::ok();

    for (key, read_version) in read_set {
        let current_version = store.current_version(key);
        if current_version != *read_version {
            result.conflicts.push(ConflictType::ReadWriteConflict {
                key: *key,
                read_version: *read_version,
                current_version,
            });
        }
    }

    result
}

/// Validate a complete transaction against current versions
///
/// Read-only transactions and the `SnapshotOnly` policy skip validation.
pub fn validate_transaction<S: VersionSource + ?Sized>(
    txn: &TransactionContext,
    store: &S,
    policy: ValidationPolicy,
) -> ValidationResult {
    if txn.is_read_only() || !policy.validates() {
        return ValidationResult::ok();
    }
    validate_read_set(&txn.read_set, store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    struct FixedVersions(HashMap<RecordKey, u64>);

    impl VersionSource for FixedVersions {
        fn current_version(&self, key: &RecordKey) -> u64 {
            self.0.get(key).copied().unwrap_or(0)
        }
    }

    fn versions(entries: &[(RecordKey, u64)]) -> FixedVersions {
        FixedVersions(entries.iter().copied().collect())
    }

    #[test]
    fn test_unchanged_read_set_is_valid() {
        let store = versions(&[(RecordKey::Vertex(1), 4)]);
        let mut txn = TransactionContext::new(1, 4);
        txn.record_read(RecordKey::Vertex(1), 4).unwrap();
        txn.record_write(RecordKey::Vertex(1)).unwrap();
        assert!(validate_transaction(&txn, &store, ValidationPolicy::Serializable).is_valid());
    }

    #[test]
    fn test_changed_record_conflicts() {
        let store = versions(&[(RecordKey::Vertex(1), 5)]);
        let mut txn = TransactionContext::new(1, 4);
        txn.record_read(RecordKey::Vertex(1), 4).unwrap();
        txn.record_write(RecordKey::Vertex(1)).unwrap();

        let result = validate_transaction(&txn, &store, ValidationPolicy::Serializable);
        assert_eq!(result.conflict_count(), 1);
        assert_eq!(
            result.conflicts[0],
            ConflictType::ReadWriteConflict {
                key: RecordKey::Vertex(1),
                read_version: 4,
                current_version: 5,
            }
        );
        assert!(result.summary().contains("vertex/1"));
    }

    #[test]
    fn test_phantom_insert_conflicts() {
        // Read an empty adjacency list, someone else inserted an edge
        let store = versions(&[(RecordKey::InEdges(2), 7)]);
        let mut txn = TransactionContext::new(1, 6);
        txn.record_read(RecordKey::InEdges(2), 0).unwrap();
        txn.record_write(RecordKey::Vertex(9)).unwrap();
        assert!(!validate_transaction(&txn, &store, ValidationPolicy::Serializable).is_valid());
    }

    #[test]
    fn test_read_only_always_valid() {
        let store = versions(&[(RecordKey::Vertex(1), 100)]);
        let mut txn = TransactionContext::new(1, 1);
        txn.record_read(RecordKey::Vertex(1), 1).unwrap();
        assert!(validate_transaction(&txn, &store, ValidationPolicy::Serializable).is_valid());
    }

    #[test]
    fn test_snapshot_only_skips_validation() {
        let store = versions(&[(RecordKey::Vertex(1), 100)]);
        let mut txn = TransactionContext::new(1, 1);
        txn.record_read(RecordKey::Vertex(1), 1).unwrap();
        txn.record_write(RecordKey::Vertex(1)).unwrap();
        assert!(validate_transaction(&txn, &store, ValidationPolicy::SnapshotOnly).is_valid());
        assert!(!validate_transaction(&txn, &store, ValidationPolicy::Serializable).is_valid());
    }

    #[test]
    fn test_merge_and_summary() {
        let mut result = ValidationResult::ok();
        assert_eq!(result.summary(), "no conflicts");
        for id in 0..3 {
            result.merge(ValidationResult::conflict(ConflictType::ReadWriteConflict {
                key: RecordKey::Edge(id),
                read_version: 1,
                current_version: 2,
            }));
        }
        assert_eq!(result.conflict_count(), 3);
        assert!(result.summary().ends_with("(+2 more)"));
    }

    proptest! {
        #[test]
        fn prop_valid_iff_no_version_moved(
            reads in proptest::collection::hash_map(0u64..32, 0u64..8, 0..16),
            bumps in proptest::collection::hash_set(0u64..32, 0..8),
        ) {
            let current: HashMap<RecordKey, u64> = reads
                .iter()
                .map(|(id, v)| {
                    let v = if bumps.contains(id) { v + 1 } else { *v };
                    (RecordKey::Vertex(*id), v)
                })
                .collect();
            let read_set: HashMap<RecordKey, u64> = reads
                .iter()
                .map(|(id, v)| (RecordKey::Vertex(*id), *v))
                .collect();

            let result = validate_read_set(&read_set, &FixedVersions(current));
            let moved = reads.keys().filter(|id| bumps.contains(id)).count();
            prop_assert_eq!(result.conflict_count(), moved);
        }
    }
}
