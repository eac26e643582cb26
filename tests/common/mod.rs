//! Shared test utilities for the workspace integration tests.

#![allow(dead_code)]

use isocheck::prelude::*;
use isocheck::harness::fixture::{locate_account, BALANCE};
use isocheck::harness::prepare;

/// Suite config with a short race window for fast runs.
pub fn quick_config(mode: ConcurrencyMode) -> SuiteConfig {
    SuiteConfig {
        mode,
        delay_ms: 2,
        parallelism: 8,
        seed: 7,
        ..SuiteConfig::default()
    }
}

/// Store that validates nothing at commit, seeded for `test`.
pub fn weak_store(test: TestName) -> MemGraph {
    let graph = MemGraph::builder().snapshot_only().open().unwrap();
    prepare(&graph, test, ConcurrencyMode::Optimistic).unwrap();
    graph
}

/// Store with serializable validation, seeded for `test`.
pub fn strong_store(test: TestName) -> MemGraph {
    let graph = MemGraph::builder().serializable().open().unwrap();
    prepare(&graph, test, ConcurrencyMode::Optimistic).unwrap();
    graph
}

/// Committed balance of account `id`.
pub fn balance_of(graph: &MemGraph, id: i64) -> f64 {
    let txn = graph.begin_read().unwrap();
    let mut cursor = txn.scan_vertices().unwrap();
    locate_account(&mut cursor, id).unwrap();
    cursor.field(BALANCE).unwrap().as_float().unwrap()
}
