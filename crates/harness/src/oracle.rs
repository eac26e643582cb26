//! Correctness predicates, one per anomaly
//!
//! Oracles are pure functions over values captured by the workloads. They
//! never touch the store, so they can be checked exhaustively in isolation.

use serde::Serialize;

/// Summary compared by the atomicity oracle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AtomicityCheck {
    /// Number of accounts
    pub accounts: u64,
    /// Number of accounts with a name
    pub named: u64,
    /// Total transfer history items over all accounts
    pub history_items: u64,
}

impl AtomicityCheck {
    /// Expected state after `committed` writers each added one account and
    /// one history item on top of `self`
    pub fn after_commits(&self, committed: u64) -> AtomicityCheck {
        AtomicityCheck {
            accounts: self.accounts + committed,
            named: self.named,
            history_items: self.history_items + committed,
        }
    }
}

/// Atomicity: the final summary reflects exactly the committed writers
pub fn atomicity_holds(baseline: AtomicityCheck, committed: u64, actual: AtomicityCheck) -> bool {
    baseline.after_commits(committed) == actual
}

/// Dirty write: both account logs and the transfer log agree exactly
pub fn logs_agree(account1: &str, account2: &str, transfer: &str) -> bool {
    account1 == transfer && account2 == transfer
}

/// Aborted read: the reader saw the committed pre-image
pub fn no_aborted_read(observed: f64, committed: f64) -> bool {
    observed == committed
}

/// Intermediate read: every committed balance in the test is odd
pub fn no_intermediate_read(observed: f64) -> bool {
    (observed as i64) % 2 == 1
}

/// Circular information flow over a batch of transactions
///
/// `results[i - 1]` is what transaction `i` read, or `None` if it aborted.
/// Transaction ids start at 1; a read of 0 is the fixture value. Returns
/// `(reader, writer)` pairs where `reader` read `writer`'s value and either
/// `writer` aborted, `writer` is unknown, or `writer` read `reader` back.
pub fn circular_flows(results: &[Option<i64>]) -> Vec<(i64, i64)> {
    let mut cycles = Vec::new();
    for (index, result) in results.iter().enumerate() {
        let reader = index as i64 + 1;
        let writer = match result {
            Some(0) | None => continue,
            Some(w) => *w,
        };
        let back = writer
            .checked_sub(1)
            .and_then(|w| usize::try_from(w).ok())
            .and_then(|i| results.get(i))
            .copied()
            .flatten();
        match back {
            Some(v) if v != reader => {}
            _ => cycles.push((reader, writer)),
        }
    }
    cycles
}

/// Item- and predicate-many-preceders, fractured read: a re-read matches
pub fn stable_read<T: PartialEq>(first: &T, second: &T) -> bool {
    first == second
}

/// Observed transaction vanishes: nothing seen first is newer than anything
/// seen later
pub fn no_vanished_writes(first: &[f64], second: &[f64]) -> bool {
    let max_first = first.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min_second = second.iter().copied().fold(f64::INFINITY, f64::min);
    max_first <= min_second
}

/// Lost update: counter and structural count both equal the commits
pub fn no_lost_update(counter: i64, edges: u64, committed: u64) -> bool {
    counter >= 0 && counter as u64 == committed && edges == committed
}

/// Write skew: a pair of balances keeps a non-negative sum
pub fn pair_invariant_holds(balance1: f64, balance2: f64) -> bool {
    balance1 + balance2 >= 0.0
}
