//! Racing workloads, one module per anomaly family
//!
//! Each test function runs its populations through the [`Orchestrator`],
//! evaluates its oracle and returns the final [`Tally`]. The fixture must
//! already be seeded.
//!
//! Writers locate records by business key with a fresh scan, mutate them,
//! optionally pause to widen the race window, then commit or abort. Readers
//! capture values, pause, and capture them again.

mod atomicity;
mod cycle;
mod dirty;
mod preceders;
mod update;

pub use atomicity::summarize;

use crate::anomaly::{TestName, WorkloadSize};
use crate::error::{HarnessError, HarnessResult};
use crate::fixture::{BALANCE, TRANSFER};
use crate::orchestrator::Orchestrator;
use crate::outcome::{attempt, Tally, TxnOutcome};
use isocheck_core::{
    ConcurrencyMode, EdgeCursor, GraphStore, StoreError, StoreResult, Transaction, VertexCursor,
};
use std::thread;
use std::time::Duration;
use tracing::debug;

/// Everything a workload needs to run one test
pub struct RunContext<'a, S: GraphStore> {
    /// Store under test
    pub store: &'a S,
    /// Test being run
    pub test: TestName,
    /// Concurrency mode of every write transaction
    pub mode: ConcurrencyMode,
    /// Race window between two operations of one transaction
    pub delay: Duration,
    /// Writer and reader counts
    pub size: WorkloadSize,
    /// Task fan-out
    pub orchestrator: &'a Orchestrator,
}

impl<'a, S: GraphStore> RunContext<'a, S> {
    /// Wrap a non-contention store failure
    pub fn failure(&self, source: StoreError) -> HarnessError {
        HarnessError::workload(self.test, source)
    }

    /// Sleep for the race window
    pub fn pause(&self) {
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
    }

    /// Run one write transaction attempt
    ///
    /// Contention at any point becomes [`TxnOutcome::Conflict`]; other store
    /// failures stop the test.
    pub fn write<T>(
        &self,
        f: impl FnOnce(S::WriteTxn) -> StoreResult<TxnOutcome<T>>,
    ) -> HarnessResult<TxnOutcome<T>> {
        attempt(|| f(self.store.begin_write(self.mode)?)).map_err(|e| self.failure(e))
    }

    /// Run one read-only transaction
    ///
    /// A read refused under contention is tallied as a conflict and judged by
    /// no oracle.
    pub fn observe(
        &self,
        f: impl FnOnce(&S::ReadTxn) -> StoreResult<Tally>,
    ) -> HarnessResult<Tally> {
        match self.store.begin_read().and_then(|txn| f(&txn)) {
            Ok(tally) => Ok(tally),
            Err(StoreError::Conflict { reason }) => {
                debug!(target: "isocheck::workload", test = %self.test, %reason, "Read refused");
                Ok(Tally {
                    conflicts: 1,
                    ..Tally::default()
                })
            }
            Err(e) => Err(self.failure(e)),
        }
    }
}

/// Run the workload and oracle of `ctx.test`
pub fn run<S: GraphStore>(ctx: &RunContext<'_, S>) -> HarnessResult<Tally> {
    match ctx.test {
        TestName::AtomicityC => atomicity::commit_all(ctx),
        TestName::AtomicityRb => atomicity::roll_back_half(ctx),
        TestName::G0 => dirty::g0(ctx),
        TestName::G1a => dirty::g1a(ctx),
        TestName::G1b => dirty::g1b(ctx),
        TestName::G1c => dirty::g1c(ctx),
        TestName::Imp => preceders::imp(ctx),
        TestName::Pmp => preceders::pmp(ctx),
        TestName::Otv => cycle::otv(ctx),
        TestName::Fr => cycle::fr(ctx),
        TestName::Lu => update::lu(ctx),
        TestName::Ws => update::ws(ctx),
    }
}

/// Balance of the cursor's current account
fn balance<T: Transaction>(cursor: &VertexCursor<'_, T>) -> StoreResult<f64> {
    cursor
        .field(BALANCE)?
        .as_float()
        .ok_or_else(|| StoreError::invalid_state("account has no balance"))
}

/// Number of transfer edges under an edge cursor
fn count_transfers<T: Transaction>(mut edges: EdgeCursor<'_, T>) -> StoreResult<u64> {
    let mut count = 0;
    while edges.valid() {
        if edges.label()? == TRANSFER {
            count += 1;
        }
        edges.advance();
    }
    Ok(count)
}
