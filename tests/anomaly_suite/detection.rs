//! Oracle detection with hand-built interleavings
//!
//! Two optimistic transactions start on the same snapshot and both commit.
//! Snapshot-only validation lets both through and the oracle must flag the
//! result; serializable validation refuses the second commit. The full
//! workloads against a snapshot-only store must fail the same way.

use crate::common::{balance_of, quick_config, strong_store, weak_store};
use isocheck::engine::MemWriteTxn;
use isocheck::harness::fixture::{
    create_account, locate_account, BALANCE, NUM_TRANSFERRED, TRANSFER,
};
use isocheck::harness::oracle::{no_aborted_read, no_lost_update, pair_invariant_holds};
use isocheck::prelude::*;

fn transfer_from_first(txn: &MemWriteTxn, target: i64) {
    let mut cursor = txn.scan_vertices().unwrap();
    let source = locate_account(&mut cursor, 1).unwrap();
    let counter = cursor.field(NUM_TRANSFERRED).unwrap().as_int().unwrap();
    cursor
        .set_field(NUM_TRANSFERRED, Value::Int(counter + 1))
        .unwrap();
    drop(cursor);
    let fresh = create_account(txn, target, &[]).unwrap();
    txn.create_edge(source, fresh, TRANSFER, &[]).unwrap();
}

fn counter_and_transfers(graph: &MemGraph) -> (i64, u64) {
    let txn = graph.begin_read().unwrap();
    let mut cursor = txn.scan_vertices().unwrap();
    locate_account(&mut cursor, 1).unwrap();
    let counter = cursor.field(NUM_TRANSFERRED).unwrap().as_int().unwrap();
    (counter, cursor.out_edges().unwrap().len() as u64)
}

/// Debit 100 from one side of pair (1, 2) after checking the pair sum
fn debit_pair(txn: &MemWriteTxn, debit_first: bool) {
    let mut first = txn.scan_vertices().unwrap();
    locate_account(&mut first, 1).unwrap();
    let mut second = txn.scan_vertices().unwrap();
    locate_account(&mut second, 2).unwrap();
    let b1 = first.field(BALANCE).unwrap().as_float().unwrap();
    let b2 = second.field(BALANCE).unwrap().as_float().unwrap();
    assert!(b1 + b2 - 100.0 >= 0.0);
    if debit_first {
        first.set_field(BALANCE, Value::Float(b1 - 100.0)).unwrap();
    } else {
        second.set_field(BALANCE, Value::Float(b2 - 100.0)).unwrap();
    }
}

// ============================================================================
// Lost update
// ============================================================================

#[test]
fn lost_update_detected_without_validation() {
    let graph = weak_store(TestName::Lu);
    let t1 = graph.begin_write(ConcurrencyMode::Optimistic).unwrap();
    let t2 = graph.begin_write(ConcurrencyMode::Optimistic).unwrap();
    transfer_from_first(&t1, 2);
    transfer_from_first(&t2, 3);
    t1.commit().unwrap();
    t2.commit().unwrap();

    let (counter, transfers) = counter_and_transfers(&graph);
    assert_eq!(counter, 1);
    assert_eq!(transfers, 2);
    assert!(!no_lost_update(counter, transfers, 2));
}

#[test]
fn lost_update_prevented_by_validation() {
    let graph = strong_store(TestName::Lu);
    let t1 = graph.begin_write(ConcurrencyMode::Optimistic).unwrap();
    let t2 = graph.begin_write(ConcurrencyMode::Optimistic).unwrap();
    transfer_from_first(&t1, 2);
    transfer_from_first(&t2, 3);
    t1.commit().unwrap();
    assert!(matches!(t2.commit(), Err(StoreError::Conflict { .. })));

    let (counter, transfers) = counter_and_transfers(&graph);
    assert!(no_lost_update(counter, transfers, 1));
}

// ============================================================================
// Write skew
// ============================================================================

#[test]
fn write_skew_detected_without_validation() {
    let graph = weak_store(TestName::Ws);
    let t1 = graph.begin_write(ConcurrencyMode::Optimistic).unwrap();
    let t2 = graph.begin_write(ConcurrencyMode::Optimistic).unwrap();
    debit_pair(&t1, true);
    debit_pair(&t2, false);
    t1.commit().unwrap();
    t2.commit().unwrap();

    let (b1, b2) = (balance_of(&graph, 1), balance_of(&graph, 2));
    assert_eq!((b1, b2), (-30.0, -20.0));
    assert!(!pair_invariant_holds(b1, b2));
}

#[test]
fn write_skew_prevented_by_validation() {
    let graph = strong_store(TestName::Ws);
    let t1 = graph.begin_write(ConcurrencyMode::Optimistic).unwrap();
    let t2 = graph.begin_write(ConcurrencyMode::Optimistic).unwrap();
    debit_pair(&t1, true);
    debit_pair(&t2, false);
    t1.commit().unwrap();
    assert!(t2.commit().unwrap_err().is_conflict());

    let (b1, b2) = (balance_of(&graph, 1), balance_of(&graph, 2));
    assert_eq!((b1, b2), (-30.0, 80.0));
    assert!(pair_invariant_holds(b1, b2));
}

#[test]
fn write_skew_prevented_in_strict_mode() {
    let graph = weak_store(TestName::Ws);
    let t1 = graph.begin_write(ConcurrencyMode::Strict).unwrap();
    debit_pair(&t1, true);
    t1.commit().unwrap();

    // The second writer now sees 50 in total and must not debit
    let t2 = graph.begin_write(ConcurrencyMode::Strict).unwrap();
    let mut cursor = t2.scan_vertices().unwrap();
    locate_account(&mut cursor, 1).unwrap();
    let b1 = cursor.field(BALANCE).unwrap().as_float().unwrap();
    locate_account(&mut cursor, 2).unwrap();
    let b2 = cursor.field(BALANCE).unwrap().as_float().unwrap();
    assert!(b1 + b2 - 100.0 < 0.0);
    drop(cursor);
    t2.abort();

    assert!(pair_invariant_holds(balance_of(&graph, 1), balance_of(&graph, 2)));
}

// ============================================================================
// Aborted read
// ============================================================================

#[test]
fn aborted_write_never_visible_even_without_validation() {
    let graph = weak_store(TestName::G1a);
    let writer = graph.begin_write(ConcurrencyMode::Optimistic).unwrap();
    let mut cursor = writer.scan_vertices().unwrap();
    locate_account(&mut cursor, 1).unwrap();
    cursor.set_field(BALANCE, Value::Float(200.0)).unwrap();

    let seen = balance_of(&graph, 1);
    assert!(no_aborted_read(seen, 99.0));

    drop(cursor);
    writer.abort();
    assert!(no_aborted_read(balance_of(&graph, 1), 99.0));
}

#[test]
fn weak_store_suite_reports_failures() {
    let graph = MemGraph::builder().snapshot_only().open().unwrap();
    let mut config = quick_config(ConcurrencyMode::Optimistic);
    config.delay_ms = 20;
    config.only = ["atomicity-c", "g0", "lu", "ws"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let report = run_suite(&graph, &config).unwrap();
    assert_eq!(report.outcomes.len(), 4);
    for outcome in &report.outcomes {
        assert!(
            !outcome.passed(),
            "{} passed on a store without commit validation",
            outcome.test
        );
        assert!(outcome.oracle_failures > 0);
        assert!(!outcome.violations.is_empty());
    }
    assert!(!report.all_passed());
    assert_eq!(report.failures(), 4);
}
