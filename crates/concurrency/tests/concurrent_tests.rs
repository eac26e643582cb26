//! Concurrent/Multi-threaded Tests for isocheck-concurrency
//!
//! These tests verify correct behavior under actual concurrent execution:
//!
//! 1. **TOCTOU Prevention** - The commit lock makes validate + apply atomic
//! 2. **Concurrent Commits** - Multiple threads committing simultaneously
//! 3. **Version Monotonicity** - Published versions always increase
//! 4. **Validation Policy** - SnapshotOnly admits lost updates, Serializable does not
//!
//! ```bash
//! cargo test -p isocheck-concurrency --test concurrent_tests
//! ```

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use isocheck_concurrency::{
    RecordKey, TransactionContext, TransactionManager, ValidationPolicy, VersionSource,
};

// ============================================================================
// Test Helpers
// ============================================================================

/// Versioned integer cells keyed by record
#[derive(Default)]
struct Cells {
    inner: Mutex<HashMap<RecordKey, (u64, i64)>>,
}

impl VersionSource for Cells {
    fn current_version(&self, key: &RecordKey) -> u64 {
        self.inner.lock().get(key).map(|(v, _)| *v).unwrap_or(0)
    }
}

impl Cells {
    fn put(&self, key: RecordKey, version: u64, value: i64) {
        self.inner.lock().insert(key, (version, value));
    }

    fn value(&self, key: RecordKey) -> Option<i64> {
        self.inner.lock().get(&key).map(|(_, value)| *value)
    }

    /// Read `key`, tracking it in the transaction's read set
    fn read(&self, txn: &mut TransactionContext, key: RecordKey) -> i64 {
        let (version, value) = self.inner.lock().get(&key).copied().unwrap_or((0, 0));
        txn.record_read(key, version).unwrap();
        value
    }
}

fn setup(initial: &[(RecordKey, i64)]) -> (Arc<Cells>, Arc<TransactionManager>) {
    let cells = Cells::default();
    for (key, value) in initial {
        cells.put(*key, 1, *value);
    }
    let version = if initial.is_empty() { 0 } else { 1 };
    (Arc::new(cells), Arc::new(TransactionManager::new(version)))
}

/// Commit a single-key write of `value`
fn commit_write(
    manager: &TransactionManager,
    cells: &Cells,
    txn: &mut TransactionContext,
    key: RecordKey,
    value: i64,
    policy: ValidationPolicy,
) -> bool {
    txn.record_write(key).unwrap();
    manager
        .commit(txn, cells, policy, |version| {
            cells.put(key, version, value);
            Ok(())
        })
        .is_ok()
}

// ============================================================================
// SECTION 1: TOCTOU Prevention Tests
// ============================================================================

mod toctou_prevention {
    use super::*;

    /// Two transactions read the same record on the same snapshot and both
    /// try to commit: exactly one may win.
    #[test]
    fn test_commit_lock_prevents_toctou_race() {
        let key = RecordKey::Vertex(1);
        let (cells, manager) = setup(&[(key, 0)]);

        let barrier = Arc::new(Barrier::new(2));
        let success_count = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..2)
            .map(|i| {
                let manager = Arc::clone(&manager);
                let cells = Arc::clone(&cells);
                let barrier = Arc::clone(&barrier);
                let success_count = Arc::clone(&success_count);

                thread::spawn(move || {
                    let mut txn = manager.begin();
                    let _ = cells.read(&mut txn, key);

                    barrier.wait();

                    if commit_write(
                        &manager,
                        &cells,
                        &mut txn,
                        key,
                        i + 1,
                        ValidationPolicy::Serializable,
                    ) {
                        success_count.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(success_count.load(Ordering::SeqCst), 1);
        let value = cells.value(key).unwrap();
        assert!(value == 1 || value == 2);
    }

    /// Ten threads read-modify-write the same record; only one commits.
    #[test]
    fn test_validation_apply_atomicity() {
        let key = RecordKey::Vertex(7);
        let (cells, manager) = setup(&[(key, 0)]);

        let num_threads = 10;
        let barrier = Arc::new(Barrier::new(num_threads));
        let success_count = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..num_threads)
            .map(|_| {
                let manager = Arc::clone(&manager);
                let cells = Arc::clone(&cells);
                let barrier = Arc::clone(&barrier);
                let success_count = Arc::clone(&success_count);

                thread::spawn(move || {
                    let mut txn = manager.begin();
                    let seen = cells.read(&mut txn, key);
                    barrier.wait();
                    if commit_write(
                        &manager,
                        &cells,
                        &mut txn,
                        key,
                        seen + 1,
                        ValidationPolicy::Serializable,
                    ) {
                        success_count.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(success_count.load(Ordering::SeqCst), 1);
        assert_eq!(cells.value(key), Some(1));
    }
}

// ============================================================================
// SECTION 2: Concurrent Commit Tests
// ============================================================================

mod concurrent_commits {
    use super::*;

    /// Read-modify-write on distinct records never conflicts
    #[test]
    fn test_concurrent_commits_different_keys() {
        let (cells, manager) = setup(&[]);

        let num_threads = 20;
        let barrier = Arc::new(Barrier::new(num_threads));
        let success_count = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..num_threads)
            .map(|i| {
                let manager = Arc::clone(&manager);
                let cells = Arc::clone(&cells);
                let barrier = Arc::clone(&barrier);
                let success_count = Arc::clone(&success_count);

                thread::spawn(move || {
                    let key = RecordKey::Vertex(i as u64);
                    let mut txn = manager.begin();
                    let _ = cells.read(&mut txn, key);
                    barrier.wait();
                    if commit_write(
                        &manager,
                        &cells,
                        &mut txn,
                        key,
                        i as i64,
                        ValidationPolicy::Serializable,
                    ) {
                        success_count.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(success_count.load(Ordering::SeqCst), num_threads);
        for i in 0..num_threads {
            assert_eq!(cells.value(RecordKey::Vertex(i as u64)), Some(i as i64));
        }
        assert_eq!(manager.current_version(), num_threads as u64);
    }

    /// Blind writes to the same record all commit
    #[test]
    fn test_concurrent_blind_writes_same_key() {
        let key = RecordKey::Edge(1);
        let (cells, manager) = setup(&[]);

        let num_threads = 10;
        let barrier = Arc::new(Barrier::new(num_threads));
        let committed = Arc::new(Mutex::new(Vec::new()));

        let handles: Vec<_> = (0..num_threads)
            .map(|i| {
                let manager = Arc::clone(&manager);
                let cells = Arc::clone(&cells);
                let barrier = Arc::clone(&barrier);
                let committed = Arc::clone(&committed);

                thread::spawn(move || {
                    let mut txn = manager.begin();
                    txn.record_write(key).unwrap();
                    barrier.wait();
                    let result = manager.commit(
                        &mut txn,
                        cells.as_ref(),
                        ValidationPolicy::Serializable,
                        |version| {
                            cells.put(key, version, i as i64);
                            Ok(())
                        },
                    );
                    if let Ok(version) = result {
                        committed.lock().push((i as i64, version));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let committed = committed.lock();
        assert_eq!(committed.len(), num_threads);

        // The surviving value belongs to the highest commit version
        let (last_value, _) = committed
            .iter()
            .max_by_key(|(_, version)| *version)
            .copied()
            .unwrap();
        assert_eq!(cells.value(key), Some(last_value));
    }
}

// ============================================================================
// SECTION 3: Version Monotonicity
// ============================================================================

mod version_monotonicity {
    use super::*;

    #[test]
    fn test_commit_versions_are_unique_and_dense() {
        let (cells, manager) = setup(&[]);
        let versions = Arc::new(Mutex::new(Vec::new()));

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let manager = Arc::clone(&manager);
                let cells = Arc::clone(&cells);
                let versions = Arc::clone(&versions);
                thread::spawn(move || {
                    for i in 0..25u64 {
                        let key = RecordKey::Vertex(t * 1000 + i);
                        let mut txn = manager.begin();
                        txn.record_write(key).unwrap();
                        let version = manager
                            .commit(&mut txn, cells.as_ref(), ValidationPolicy::Serializable, |v| {
                                cells.put(key, v, 0);
                                Ok(())
                            })
                            .unwrap();
                        versions.lock().push(version);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let mut versions = versions.lock().clone();
        versions.sort_unstable();
        let expected: Vec<u64> = (1..=200).collect();
        assert_eq!(versions, expected);
        assert_eq!(manager.current_version(), 200);
    }

    #[test]
    fn test_txn_ids_are_unique_under_contention() {
        let manager = Arc::new(TransactionManager::new(0));
        let ids = Arc::new(Mutex::new(Vec::new()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let manager = Arc::clone(&manager);
                let ids = Arc::clone(&ids);
                thread::spawn(move || {
                    for _ in 0..100 {
                        ids.lock().push(manager.next_txn_id());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let mut ids = ids.lock().clone();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 800);
    }
}

// ============================================================================
// SECTION 4: Validation Policy
// ============================================================================

mod validation_policy {
    use super::*;

    fn run_increments(policy: ValidationPolicy) -> (usize, i64) {
        let key = RecordKey::Vertex(1);
        let (cells, manager) = setup(&[(key, 0)]);

        let num_threads = 16;
        let barrier = Arc::new(Barrier::new(num_threads));
        let success_count = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..num_threads)
            .map(|_| {
                let manager = Arc::clone(&manager);
                let cells = Arc::clone(&cells);
                let barrier = Arc::clone(&barrier);
                let success_count = Arc::clone(&success_count);
                thread::spawn(move || {
                    let mut txn = manager.begin();
                    let seen = cells.read(&mut txn, key);
                    barrier.wait();
                    if commit_write(&manager, &cells, &mut txn, key, seen + 1, policy) {
                        success_count.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        (success_count.load(Ordering::SeqCst), cells.value(key).unwrap())
    }

    #[test]
    fn test_serializable_counter_matches_commits() {
        let (committed, counter) = run_increments(ValidationPolicy::Serializable);
        assert_eq!(counter as usize, committed);
    }

    #[test]
    fn test_snapshot_only_loses_updates() {
        // Every thread read 0 before any commit, so all commit and write 1
        let (committed, counter) = run_increments(ValidationPolicy::SnapshotOnly);
        assert_eq!(committed, 16);
        assert_eq!(counter, 1);
    }
}
