//! The anomaly test catalog
//!
//! Every test has a stable kebab-case name used by configuration files, the
//! CLI `--only` flag and reports, plus default workload sizes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One anomaly test of the suite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TestName {
    /// Atomicity, every writer commits
    AtomicityC,
    /// Atomicity, half of the writers roll back
    AtomicityRb,
    /// Dirty write
    G0,
    /// Aborted read
    G1a,
    /// Intermediate read
    G1b,
    /// Circular information flow
    G1c,
    /// Item-many-preceders
    Imp,
    /// Predicate-many-preceders
    Pmp,
    /// Observed transaction vanishes
    Otv,
    /// Fractured read
    Fr,
    /// Lost update
    Lu,
    /// Write skew
    Ws,
}

impl TestName {
    /// All tests in suite order
    pub const ALL: [TestName; 12] = [
        TestName::AtomicityC,
        TestName::AtomicityRb,
        TestName::G0,
        TestName::G1a,
        TestName::G1b,
        TestName::G1c,
        TestName::Imp,
        TestName::Pmp,
        TestName::Otv,
        TestName::Fr,
        TestName::Lu,
        TestName::Ws,
    ];

    /// Stable kebab-case name
    pub fn as_str(&self) -> &'static str {
        match self {
            TestName::AtomicityC => "atomicity-c",
            TestName::AtomicityRb => "atomicity-rb",
            TestName::G0 => "g0",
            TestName::G1a => "g1a",
            TestName::G1b => "g1b",
            TestName::G1c => "g1c",
            TestName::Imp => "imp",
            TestName::Pmp => "pmp",
            TestName::Otv => "otv",
            TestName::Fr => "fr",
            TestName::Lu => "lu",
            TestName::Ws => "ws",
        }
    }

    /// One-line description of the anomaly
    pub fn description(&self) -> &'static str {
        match self {
            TestName::AtomicityC => "committed transactions apply all of their writes",
            TestName::AtomicityRb => "rolled back transactions apply none of their writes",
            TestName::G0 => "dirty write: concurrent writers interleave on the same records",
            TestName::G1a => "aborted read: readers observe writes of aborted transactions",
            TestName::G1b => "intermediate read: readers observe non-final writes",
            TestName::G1c => "circular information flow: two transactions observe each other",
            TestName::Imp => "item-many-preceders: a re-read item changes within a transaction",
            TestName::Pmp => "predicate-many-preceders: a re-evaluated predicate changes",
            TestName::Otv => "observed transaction vanishes: a later read goes back in time",
            TestName::Fr => "fractured read: a re-read tuple differs within a transaction",
            TestName::Lu => "lost update: concurrent increments are dropped",
            TestName::Ws => "write skew: disjoint writes jointly break a pair invariant",
        }
    }

    /// Default workload size
    pub fn default_size(&self) -> WorkloadSize {
        match self {
            TestName::AtomicityC | TestName::AtomicityRb => WorkloadSize::writers_only(50),
            TestName::G0 => WorkloadSize::writers_only(200),
            TestName::G1a => WorkloadSize::new(5, 5),
            TestName::G1b => WorkloadSize::new(50, 100),
            TestName::G1c => WorkloadSize::writers_only(100),
            TestName::Imp | TestName::Pmp | TestName::Otv => WorkloadSize::new(50, 50),
            TestName::Fr => WorkloadSize::new(100, 100),
            TestName::Lu => WorkloadSize::writers_only(200),
            TestName::Ws => WorkloadSize::writers_only(50),
        }
    }

    /// Check if the test runs a reader population next to its writers
    pub fn has_readers(&self) -> bool {
        self.default_size().readers > 0
    }
}

impl fmt::Display for TestName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TestName::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = TestName::ALL.iter().map(|t| t.as_str()).collect();
                format!("unknown test '{}', expected one of: {}", s, known.join(", "))
            })
    }
}

/// Number of writer and reader tasks of one test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadSize {
    /// Writer tasks (transactions for writer-only tests)
    pub writers: usize,
    /// Reader tasks
    pub readers: usize,
}

impl WorkloadSize {
    /// Create a size with both populations
    pub fn new(writers: usize, readers: usize) -> Self {
        WorkloadSize { writers, readers }
    }

    /// Create a size for a test without readers
    pub fn writers_only(writers: usize) -> Self {
        WorkloadSize {
            writers,
            readers: 0,
        }
    }
}
