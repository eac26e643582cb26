//! Graph Transaction Integration Tests
//!
//! Validates the MemGraph transaction lifecycle:
//! - Snapshot reads and read-your-writes
//! - Conflict detection for record and predicate reads
//! - Schema and primary-key enforcement at write and commit time
//! - Reset and metrics bookkeeping

use isocheck_core::{
    ConcurrencyMode, FieldSpec, FieldType, GraphStore, StoreError, Transaction, Value, VertexRef,
    WriteTxn,
};
use isocheck_engine::MemGraph;

fn account_schema(graph: &MemGraph) {
    graph
        .define_vertex_type(
            "Account",
            &[
                FieldSpec::required("id", FieldType::Int64),
                FieldSpec::optional("name", FieldType::String),
                FieldSpec::optional("balance", FieldType::Double),
            ],
            "id",
        )
        .unwrap();
    graph
        .define_edge_type(
            "transfer",
            &[FieldSpec::optional("amount", FieldType::Double)],
        )
        .unwrap();
}

fn seeded(balances: &[f64]) -> MemGraph {
    let graph = MemGraph::ephemeral();
    account_schema(&graph);
    let txn = graph.begin_write(ConcurrencyMode::Strict).unwrap();
    for (i, balance) in balances.iter().enumerate() {
        txn.create_vertex(
            "Account",
            &[("id", Value::Int(i as i64 + 1)), ("balance", Value::Float(*balance))],
        )
        .unwrap();
    }
    txn.commit().unwrap();
    graph
}

/// Scan for an account by business key
fn find<T: Transaction>(txn: &T, id: i64) -> VertexRef {
    txn.vertex_refs()
        .unwrap()
        .into_iter()
        .find(|v| txn.vertex_field(*v, "id").unwrap() == Value::Int(id))
        .unwrap()
}

fn balance<T: Transaction>(txn: &T, id: i64) -> f64 {
    let v = find(txn, id);
    txn.vertex_field(v, "balance").unwrap().as_float().unwrap()
}

// ============================================================================
// Snapshot Reads
// ============================================================================

#[test]
fn test_read_txn_keeps_its_snapshot() {
    let graph = seeded(&[99.0]);
    let reader = graph.begin_read().unwrap();
    assert_eq!(balance(&reader, 1), 99.0);

    let writer = graph.begin_write(ConcurrencyMode::Optimistic).unwrap();
    let v = find(&writer, 1);
    writer.set_vertex_field(v, "balance", Value::Float(200.0)).unwrap();
    writer.create_vertex("Account", &[("id", Value::Int(2))]).unwrap();
    writer.commit().unwrap();

    assert_eq!(balance(&reader, 1), 99.0);
    assert_eq!(reader.vertex_refs().unwrap().len(), 1);

    let fresh = graph.begin_read().unwrap();
    assert_eq!(balance(&fresh, 1), 200.0);
    assert_eq!(fresh.vertex_refs().unwrap().len(), 2);
}

#[test]
fn test_uncommitted_writes_invisible_to_others() {
    let graph = seeded(&[99.0]);
    let writer = graph.begin_write(ConcurrencyMode::Optimistic).unwrap();
    let v = find(&writer, 1);
    writer.set_vertex_field(v, "balance", Value::Float(200.0)).unwrap();

    let reader = graph.begin_read().unwrap();
    assert_eq!(balance(&reader, 1), 99.0);
    writer.abort();

    let reader = graph.begin_read().unwrap();
    assert_eq!(balance(&reader, 1), 99.0);
}

#[test]
fn test_read_your_writes() {
    let graph = seeded(&[0.0, 0.0]);
    let txn = graph.begin_write(ConcurrencyMode::Optimistic).unwrap();
    let a = find(&txn, 1);
    let b = find(&txn, 2);
    txn.set_vertex_field(a, "balance", Value::Int(5)).unwrap();
    assert_eq!(txn.vertex_field(a, "balance").unwrap(), Value::Float(5.0));

    let c = txn.create_vertex("Account", &[("id", Value::Int(3))]).unwrap();
    assert_eq!(txn.vertex_refs().unwrap().len(), 3);

    let e = txn.create_edge(a, c, "transfer", &[("amount", Value::Float(1.0))]).unwrap();
    assert_eq!(txn.out_edges(a).unwrap(), vec![e]);
    assert_eq!(txn.in_edges(c).unwrap(), vec![e]);
    assert!(txn.in_edges(b).unwrap().is_empty());
    txn.set_edge_field(e, "amount", Value::Float(2.0)).unwrap();
    assert_eq!(txn.edge_field(e, "amount").unwrap(), Value::Float(2.0));
    assert_eq!(txn.edge_label(e).unwrap(), "transfer");
    txn.commit().unwrap();

    let reader = graph.begin_read().unwrap();
    let a = find(&reader, 1);
    let edges = reader.out_edges(a).unwrap();
    assert_eq!(edges.len(), 1);
    assert_eq!(reader.edge_field(edges[0], "amount").unwrap(), Value::Float(2.0));
}

#[test]
fn test_cursor_navigation_over_store() {
    let graph = seeded(&[1.0, 2.0, 3.0]);
    let reader = graph.begin_read().unwrap();
    let mut cursor = reader.scan_vertices().unwrap();
    let mut total = 0.0;
    while cursor.valid() {
        assert_eq!(cursor.label().unwrap(), "Account");
        total += cursor.field("balance").unwrap().as_float().unwrap();
        cursor.advance();
    }
    assert_eq!(total, 6.0);
    cursor.rewind().unwrap();
    assert!(cursor.valid());
}

// ============================================================================
// Conflict Detection
// ============================================================================

#[test]
fn test_concurrent_read_modify_write_conflicts() {
    let graph = seeded(&[0.0]);
    let t1 = graph.begin_write(ConcurrencyMode::Optimistic).unwrap();
    let t2 = graph.begin_write(ConcurrencyMode::Optimistic).unwrap();

    for txn in [&t1, &t2] {
        let v = find(txn, 1);
        let seen = txn.vertex_field(v, "balance").unwrap().as_float().unwrap();
        txn.set_vertex_field(v, "balance", Value::Float(seen + 1.0)).unwrap();
    }

    t1.commit().unwrap();
    let err = t2.commit().unwrap_err();
    assert!(err.is_conflict());

    let reader = graph.begin_read().unwrap();
    assert_eq!(balance(&reader, 1), 1.0);
}

#[test]
fn test_predicate_read_conflicts_with_insert() {
    let graph = seeded(&[0.0, 0.0]);

    // t1 counts incoming edges of account 2 and writes elsewhere
    let t1 = graph.begin_write(ConcurrencyMode::Optimistic).unwrap();
    let target = find(&t1, 2);
    assert_eq!(t1.in_edges(target).unwrap().len(), 0);
    let a = find(&t1, 1);
    t1.set_vertex_field(a, "name", Value::from("seen 0")).unwrap();

    // t2 inserts an edge into account 2 and commits first
    let t2 = graph.begin_write(ConcurrencyMode::Optimistic).unwrap();
    let src = find(&t2, 1);
    let dst = find(&t2, 2);
    t2.create_edge(src, dst, "transfer", &[]).unwrap();
    t2.commit().unwrap();

    assert!(t1.commit().unwrap_err().is_conflict());
}

#[test]
fn test_write_skew_rejected_when_serializable() {
    let graph = seeded(&[70.0, 80.0]);
    let t1 = graph.begin_write(ConcurrencyMode::Optimistic).unwrap();
    let t2 = graph.begin_write(ConcurrencyMode::Optimistic).unwrap();

    for (txn, debit) in [(&t1, 1), (&t2, 2)] {
        let total = balance(txn, 1) + balance(txn, 2);
        assert!(total - 100.0 >= 0.0);
        let v = find(txn, debit);
        let current = txn.vertex_field(v, "balance").unwrap().as_float().unwrap();
        txn.set_vertex_field(v, "balance", Value::Float(current - 100.0)).unwrap();
    }

    t1.commit().unwrap();
    assert!(t2.commit().is_err());
}

#[test]
fn test_write_skew_admitted_when_snapshot_only() {
    let graph = MemGraph::builder().snapshot_only().open().unwrap();
    account_schema(&graph);
    let seed = graph.begin_write(ConcurrencyMode::Strict).unwrap();
    seed.create_vertex("Account", &[("id", Value::Int(1)), ("balance", Value::Float(70.0))])
        .unwrap();
    seed.create_vertex("Account", &[("id", Value::Int(2)), ("balance", Value::Float(80.0))])
        .unwrap();
    seed.commit().unwrap();

    let t1 = graph.begin_write(ConcurrencyMode::Optimistic).unwrap();
    let t2 = graph.begin_write(ConcurrencyMode::Optimistic).unwrap();
    for (txn, debit) in [(&t1, 1), (&t2, 2)] {
        let v = find(txn, debit);
        let current = txn.vertex_field(v, "balance").unwrap().as_float().unwrap();
        txn.set_vertex_field(v, "balance", Value::Float(current - 100.0)).unwrap();
    }
    t1.commit().unwrap();
    t2.commit().unwrap();

    let reader = graph.begin_read().unwrap();
    assert!(balance(&reader, 1) + balance(&reader, 2) < 0.0);
}

// ============================================================================
// Schema and Constraints
// ============================================================================

#[test]
fn test_schema_violations_rejected_at_write() {
    let graph = seeded(&[0.0]);
    let txn = graph.begin_write(ConcurrencyMode::Optimistic).unwrap();
    let v = find(&txn, 1);

    let err = txn
        .set_vertex_field(v, "balance", Value::from("lots"))
        .unwrap_err();
    assert!(matches!(err, StoreError::Schema(_)));
    assert!(txn.set_vertex_field(v, "colour", Value::Int(1)).is_err());
    assert!(txn.create_vertex("Person", &[("id", Value::Int(9))]).is_err());
    assert!(txn.create_vertex("Account", &[("name", Value::from("no id"))]).is_err());
    assert!(txn.create_edge(v, VertexRef(999), "transfer", &[]).is_err());

    // Missing fields read as null
    assert_eq!(txn.vertex_field(v, "name").unwrap(), Value::Null);
    txn.commit().unwrap();
}

#[test]
fn test_duplicate_primary_key_fails_commit() {
    let graph = seeded(&[0.0]);
    let txn = graph.begin_write(ConcurrencyMode::Optimistic).unwrap();
    txn.create_vertex("Account", &[("id", Value::Int(1))]).unwrap();
    let err = txn.commit().unwrap_err();
    assert!(matches!(err, StoreError::ConstraintViolation(_)));

    let reader = graph.begin_read().unwrap();
    assert_eq!(reader.vertex_refs().unwrap().len(), 1);
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn test_reset_clears_schema_and_data() {
    let graph = seeded(&[1.0, 2.0]);
    graph.reset_all_data().unwrap();
    assert_eq!(graph.vertex_count(), 0);

    let txn = graph.begin_write(ConcurrencyMode::Strict).unwrap();
    assert!(txn.create_vertex("Account", &[("id", Value::Int(1))]).is_err());
    txn.abort();

    account_schema(&graph);
    let txn = graph.begin_write(ConcurrencyMode::Strict).unwrap();
    let v = txn.create_vertex("Account", &[("id", Value::Int(1))]).unwrap();
    assert_eq!(v, VertexRef(1));
    txn.commit().unwrap();
}

#[test]
fn test_reset_refused_while_transaction_active() {
    let graph = seeded(&[1.0]);
    let reader = graph.begin_read().unwrap();
    assert!(matches!(
        graph.reset_all_data(),
        Err(StoreError::InvalidState(_))
    ));
    drop(reader);
    graph.reset_all_data().unwrap();
}

#[test]
fn test_reset_waits_for_reader_to_finish() {
    let graph = seeded(&[1.0]);
    let reader = graph.begin_read().unwrap();
    std::thread::scope(|s| {
        s.spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(20));
            drop(reader);
        });
        graph.reset_all_data().unwrap();
    });
    assert_eq!(graph.vertex_count(), 0);
}

#[test]
fn test_read_transactions_are_not_commits() {
    let graph = seeded(&[1.0]);
    let before = graph.metrics();

    for _ in 0..3 {
        let txn = graph.begin_read().unwrap();
        assert_eq!(txn.vertex_refs().unwrap().len(), 1);
    }

    let after = graph.metrics();
    assert_eq!(after.total_started - before.total_started, 3);
    assert_eq!(after.total_committed, before.total_committed);
    assert_eq!(after.total_aborted, before.total_aborted);
    assert_eq!(after.active_count, 0);
}

#[test]
fn test_metrics_count_explicit_and_dropped_aborts() {
    let graph = seeded(&[1.0]);
    let before = graph.metrics();

    let txn = graph.begin_write(ConcurrencyMode::Optimistic).unwrap();
    txn.abort();
    let txn = graph.begin_write(ConcurrencyMode::Optimistic).unwrap();
    drop(txn);
    let txn = graph.begin_write(ConcurrencyMode::Optimistic).unwrap();
    txn.commit().unwrap();

    let after = graph.metrics();
    assert_eq!(after.total_aborted - before.total_aborted, 2);
    assert_eq!(after.total_committed - before.total_committed, 1);
    assert_eq!(after.active_count, 0);
}
