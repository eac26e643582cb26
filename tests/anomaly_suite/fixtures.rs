//! Idempotent fixtures: reset + seed twice yields identical state

use isocheck::harness::{dump_state, prepare};
use isocheck::prelude::*;

#[test]
fn every_fixture_reseeds_identically() {
    let graph = MemGraph::ephemeral();
    for test in TestName::ALL {
        prepare(&graph, test, ConcurrencyMode::Strict).unwrap();
        let first = dump_state(&graph).unwrap();
        prepare(&graph, test, ConcurrencyMode::Optimistic).unwrap();
        let second = dump_state(&graph).unwrap();
        assert_eq!(first, second, "fixture of {} is not reproducible", test);
    }
}

#[test]
fn fixture_after_a_run_matches_fresh_fixture() {
    let fresh = MemGraph::ephemeral();
    prepare(&fresh, TestName::Ws, ConcurrencyMode::Strict).unwrap();
    let expected = dump_state(&fresh).unwrap();

    let used = MemGraph::ephemeral();
    let config = SuiteConfig {
        delay_ms: 0,
        only: vec!["ws".to_string()],
        ..SuiteConfig::default()
    };
    run_suite(&used, &config).unwrap();
    assert_ne!(dump_state(&used).unwrap(), expected);

    prepare(&used, TestName::Ws, ConcurrencyMode::Strict).unwrap();
    assert_eq!(dump_state(&used).unwrap(), expected);
}

#[test]
fn dump_is_keyed_by_business_key() {
    let graph = MemGraph::ephemeral();
    prepare(&graph, TestName::G0, ConcurrencyMode::Strict).unwrap();
    let dump: serde_json::Value = serde_json::from_slice(&dump_state(&graph).unwrap()).unwrap();

    assert_eq!(dump["accounts"]["1"]["versionHistory"]["String"], "0");
    let transfers = dump["transfers"].as_array().unwrap();
    assert_eq!(transfers.len(), 1);
    assert_eq!(transfers[0]["src"], 1);
    assert_eq!(transfers[0]["dst"], 2);
}
