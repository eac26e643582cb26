//! Workload and test outcomes
//!
//! Each write attempt ends in exactly one [`TxnOutcome`]. Tasks fold their
//! outcomes and oracle checks into a [`Tally`]; tallies of a population are
//! combined with [`Tally::merge`], which is associative so the fan-out may
//! reduce in any grouping. The final tally becomes the test's
//! [`TestOutcome`].

use crate::anomaly::TestName;
use isocheck_core::{StoreError, StoreResult, WriteTxn};
use serde::{Serialize, Serializer};
use std::time::Duration;
use tracing::debug;

/// Maximum number of violation descriptions kept per test
pub const MAX_VIOLATIONS: usize = 16;

/// Result of one write transaction attempt
#[derive(Debug, Clone, PartialEq)]
pub enum TxnOutcome<T> {
    /// The store committed the transaction
    Committed(T),
    /// The store refused the transaction under contention
    Conflict(String),
    /// The workload discarded the transaction on purpose
    ExplicitAbort,
    /// The workload's precondition did not hold; nothing was written
    Skipped,
}

impl<T> TxnOutcome<T> {
    /// Check if the transaction committed
    pub fn is_committed(&self) -> bool {
        matches!(self, TxnOutcome::Committed(_))
    }

    /// Value carried by a committed transaction
    pub fn committed(&self) -> Option<&T> {
        match self {
            TxnOutcome::Committed(value) => Some(value),
            _ => None,
        }
    }

    /// Check if the transaction was aborted, by the store or the workload
    pub fn is_aborted(&self) -> bool {
        matches!(self, TxnOutcome::Conflict(_) | TxnOutcome::ExplicitAbort)
    }
}

/// Run a write attempt, turning contention raised mid-transaction into
/// [`TxnOutcome::Conflict`]
///
/// Any other store error is returned to the caller.
pub fn attempt<T>(f: impl FnOnce() -> StoreResult<TxnOutcome<T>>) -> StoreResult<TxnOutcome<T>> {
    match f() {
        Err(StoreError::Conflict { reason }) => {
            debug!(target: "isocheck::workload", %reason, "Transaction conflicted before commit");
            Ok(TxnOutcome::Conflict(reason))
        }
        other => other,
    }
}

/// Commit `txn`; any commit failure counts as a store-side abort
pub fn commit<W: WriteTxn, T>(txn: W, value: T) -> TxnOutcome<T> {
    match txn.commit() {
        Ok(()) => TxnOutcome::Committed(value),
        Err(e) => {
            debug!(target: "isocheck::workload", error = %e, "Commit refused");
            TxnOutcome::Conflict(e.to_string())
        }
    }
}

/// Counters aggregated over the tasks of a test
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    /// Write transactions attempted
    pub attempts: u64,
    /// Write transactions committed
    pub committed: u64,
    /// Write transactions refused by the store
    pub conflicts: u64,
    /// Write transactions aborted by the workload
    pub explicit_aborts: u64,
    /// Write transactions skipped by the workload
    pub skipped: u64,
    /// Oracle evaluations
    pub checks: u64,
    /// Oracle evaluations that failed
    pub oracle_failures: u64,
    /// Descriptions of the first failed evaluations
    pub violations: Vec<String>,
}

impl Tally {
    /// Tally of a single write attempt
    pub fn of<T>(outcome: &TxnOutcome<T>) -> Self {
        let mut tally = Tally::default();
        tally.record(outcome);
        tally
    }

    /// Count a write attempt
    pub fn record<T>(&mut self, outcome: &TxnOutcome<T>) {
        self.attempts += 1;
        match outcome {
            TxnOutcome::Committed(_) => self.committed += 1,
            TxnOutcome::Conflict(_) => self.conflicts += 1,
            TxnOutcome::ExplicitAbort => self.explicit_aborts += 1,
            TxnOutcome::Skipped => self.skipped += 1,
        }
    }

    /// Count an oracle evaluation; `describe` is only called on failure
    pub fn check(&mut self, holds: bool, describe: impl FnOnce() -> String) {
        self.checks += 1;
        if !holds {
            self.oracle_failures += 1;
            if self.violations.len() < MAX_VIOLATIONS {
                self.violations.push(describe());
            }
        }
    }

    /// Combine two tallies
    pub fn merge(mut self, other: Tally) -> Tally {
        self.attempts += other.attempts;
        self.committed += other.committed;
        self.conflicts += other.conflicts;
        self.explicit_aborts += other.explicit_aborts;
        self.skipped += other.skipped;
        self.checks += other.checks;
        self.oracle_failures += other.oracle_failures;
        let room = MAX_VIOLATIONS.saturating_sub(self.violations.len());
        self.violations.extend(other.violations.into_iter().take(room));
        self
    }

    /// Aborts of either kind
    pub fn aborted(&self) -> u64 {
        self.conflicts + self.explicit_aborts
    }
}

impl FromIterator<Tally> for Tally {
    fn from_iter<I: IntoIterator<Item = Tally>>(iter: I) -> Self {
        iter.into_iter().fold(Tally::default(), Tally::merge)
    }
}

fn serialize_millis<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

/// Final record of one test
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestOutcome {
    /// Test name
    pub test: TestName,
    /// Write transactions attempted
    pub attempts: u64,
    /// Write transactions committed
    pub committed: u64,
    /// Write transactions refused by the store
    pub conflicts: u64,
    /// Write transactions aborted by the workload
    pub explicit_aborts: u64,
    /// Write transactions skipped by the workload
    pub skipped: u64,
    /// Oracle evaluations that failed
    pub oracle_failures: u64,
    /// Descriptions of the first failed evaluations
    pub violations: Vec<String>,
    /// Wall-clock time of the test, fixture included
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

impl TestOutcome {
    /// Build the outcome of `test` from its final tally
    pub fn from_tally(test: TestName, tally: Tally, elapsed: Duration) -> Self {
        TestOutcome {
            test,
            attempts: tally.attempts,
            committed: tally.committed,
            conflicts: tally.conflicts,
            explicit_aborts: tally.explicit_aborts,
            skipped: tally.skipped,
            oracle_failures: tally.oracle_failures,
            violations: tally.violations,
            elapsed,
        }
    }

    /// Aborts of either kind
    pub fn aborted(&self) -> u64 {
        self.conflicts + self.explicit_aborts
    }

    /// Check if no oracle evaluation failed
    pub fn passed(&self) -> bool {
        self.oracle_failures == 0
    }
}
