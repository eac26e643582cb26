//! Full suite runs against a serializable store

use crate::common::quick_config;
use isocheck::harness::CONFIG_FILE_NAME;
use isocheck::prelude::*;

fn assert_all_pass(report: &SuiteReport) {
    assert!(report.all_passed(), "{}", report.render_table());
}

#[test]
fn strict_mode_passes_every_test() {
    let graph = MemGraph::ephemeral();
    let report = run_suite(&graph, &quick_config(ConcurrencyMode::Strict)).unwrap();

    assert_eq!(report.outcomes.len(), TestName::ALL.len());
    assert_all_pass(&report);
    for outcome in &report.outcomes {
        // Strict writers never collide
        assert_eq!(outcome.conflicts, 0, "{} saw conflicts", outcome.test);
    }
}

#[test]
fn optimistic_mode_passes_every_test() {
    let graph = MemGraph::ephemeral();
    let report = run_suite(&graph, &quick_config(ConcurrencyMode::Optimistic)).unwrap();

    assert_eq!(report.mode, ConcurrencyMode::Optimistic);
    assert_all_pass(&report);
    for outcome in &report.outcomes {
        assert_eq!(
            outcome.attempts,
            outcome.committed + outcome.aborted() + outcome.skipped,
            "{} lost track of an attempt",
            outcome.test
        );
    }
}

#[test]
fn rollback_variant_aborts_half_in_both_modes() {
    for mode in [ConcurrencyMode::Strict, ConcurrencyMode::Optimistic] {
        let graph = MemGraph::ephemeral();
        let config = SuiteConfig {
            only: vec!["atomicity-rb".to_string()],
            ..quick_config(mode)
        };
        let report = run_suite(&graph, &config).unwrap();
        assert_all_pass(&report);
        assert_eq!(report.outcomes[0].explicit_aborts, 25);
    }
}

#[test]
fn suite_driven_by_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(
        &path,
        r#"
mode = "optimistic"
delay_ms = 1
parallelism = 4
only = ["g1c", "lu"]

[workloads.lu]
writers = 20

[workloads.g1c]
writers = 30
"#,
    )
    .unwrap();

    let config = SuiteConfig::from_file(&path).unwrap();
    let graph = MemGraph::ephemeral();
    let report = run_suite(&graph, &config).unwrap();

    assert_all_pass(&report);
    let attempts: Vec<(TestName, u64)> = report
        .outcomes
        .iter()
        .map(|o| (o.test, o.attempts))
        .collect();
    assert_eq!(attempts, vec![(TestName::G1c, 30), (TestName::Lu, 20)]);
}

#[test]
fn json_report_lists_outcomes() {
    let graph = MemGraph::ephemeral();
    let config = SuiteConfig {
        only: vec!["imp".to_string(), "pmp".to_string()],
        ..quick_config(ConcurrencyMode::Strict)
    };
    let report = run_suite(&graph, &config).unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&report.render(OutputMode::Json).unwrap()).unwrap();

    assert_eq!(json["mode"], "strict");
    let outcomes = json["outcomes"].as_array().unwrap();
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0]["test"], "imp");
    assert_eq!(outcomes[1]["test"], "pmp");
    assert_eq!(outcomes[1]["oracle_failures"], 0);
}
