//! Suite driver: runs the selected tests one after another
//!
//! Every test is isolated: the store is reset and seeded before its
//! workload starts. A setup failure stops the whole run.

use crate::anomaly::TestName;
use crate::config::SuiteConfig;
use crate::error::HarnessResult;
use crate::fixture::prepare;
use crate::orchestrator::Orchestrator;
use crate::outcome::TestOutcome;
use crate::report::SuiteReport;
use crate::workload::{self, RunContext};
use isocheck_core::GraphStore;
use std::time::Instant;
use tracing::{info, warn};

/// Runs anomaly tests against one store
pub struct Suite<'a, S: GraphStore> {
    store: &'a S,
    config: &'a SuiteConfig,
    orchestrator: Orchestrator,
}

impl<'a, S: GraphStore> Suite<'a, S> {
    /// Create a driver for `store`
    pub fn new(store: &'a S, config: &'a SuiteConfig) -> Self {
        Suite {
            store,
            config,
            orchestrator: config.orchestrator(),
        }
    }

    /// Prepare the fixture of `test`, run its workload and judge it
    pub fn run_test(&self, test: TestName) -> HarnessResult<TestOutcome> {
        let start = Instant::now();
        prepare(self.store, test, self.config.mode)?;

        let ctx = RunContext {
            store: self.store,
            test,
            mode: self.config.mode,
            delay: self.config.delay(),
            size: self.config.size_for(test),
            orchestrator: &self.orchestrator,
        };
        let tally = workload::run(&ctx)?;
        let outcome = TestOutcome::from_tally(test, tally, start.elapsed());

        if outcome.passed() {
            info!(
                target: "isocheck::suite",
                %test,
                aborted = outcome.aborted(),
                committed = outcome.committed,
                elapsed_ms = outcome.elapsed.as_millis() as u64,
                "Test passed"
            );
        } else {
            warn!(
                target: "isocheck::suite",
                %test,
                aborted = outcome.aborted(),
                failures = outcome.oracle_failures,
                "Test failed"
            );
        }
        Ok(outcome)
    }

    /// Run every selected test in suite order
    pub fn run(&self) -> HarnessResult<SuiteReport> {
        let tests = self.config.selected_tests()?;
        let start = Instant::now();
        let mut report = SuiteReport::begin(self.config.mode);
        info!(
            target: "isocheck::suite",
            mode = %self.config.mode,
            tests = tests.len(),
            parallelism = self.orchestrator.parallelism(),
            seed = self.orchestrator.seed(),
            "Starting suite"
        );
        for test in tests {
            report.outcomes.push(self.run_test(test)?);
        }
        report.elapsed = start.elapsed();
        info!(
            target: "isocheck::suite",
            failed = report.failures(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Suite finished"
        );
        Ok(report)
    }
}

/// Run the tests selected by `config` against `store`
pub fn run_suite<S: GraphStore>(store: &S, config: &SuiteConfig) -> HarnessResult<SuiteReport> {
    Suite::new(store, config).run()
}
