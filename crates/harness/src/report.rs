//! Suite report → human/json string formatting.
//!
//! Two modes:
//! - **Human** (default): one line per test with its aborted count and verdict,
//!   followed by the recorded violations of failing tests
//! - **JSON** (`--json`): `serde_json::to_string_pretty`

use crate::error::HarnessResult;
use crate::outcome::TestOutcome;
use chrono::{DateTime, Utc};
use isocheck_core::ConcurrencyMode;
use serde::{Serialize, Serializer};
use std::time::Duration;

/// Output formatting mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Aligned table
    Human,
    /// Pretty JSON
    Json,
}

fn serialize_millis<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

/// Outcomes of one suite run
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    /// Wall-clock start of the run
    pub started_at: DateTime<Utc>,
    /// Concurrency mode of every write transaction
    pub mode: ConcurrencyMode,
    /// Per-test outcomes in suite order
    pub outcomes: Vec<TestOutcome>,
    /// Wall-clock time of the whole run
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

impl SuiteReport {
    /// Empty report of a run starting now
    pub fn begin(mode: ConcurrencyMode) -> Self {
        SuiteReport {
            started_at: Utc::now(),
            mode,
            outcomes: Vec::new(),
            elapsed: Duration::ZERO,
        }
    }

    /// Check if every test passed
    pub fn all_passed(&self) -> bool {
        self.outcomes.iter().all(TestOutcome::passed)
    }

    /// Number of failing tests
    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.passed()).count()
    }

    /// Format the report.
    pub fn render(&self, mode: OutputMode) -> HarnessResult<String> {
        match mode {
            OutputMode::Json => self.to_json(),
            OutputMode::Human => Ok(self.render_table()),
        }
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> HarnessResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Human-readable table
    pub fn render_table(&self) -> String {
        let mut lines = Vec::with_capacity(self.outcomes.len() + 4);
        lines.push(format!(
            "isocheck run started {} ({} mode)",
            self.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.mode
        ));
        lines.push(format!(
            "{:<14} {:>8} {:>9} {:>9} {:>9} {:>7} {:>7} {:>9}  {}",
            "TEST",
            "ATTEMPTS",
            "COMMITTED",
            "CONFLICTS",
            "ROLLBACKS",
            "ABORTED",
            "SKIPPED",
            "TIME",
            "RESULT"
        ));
        for o in &self.outcomes {
            lines.push(format!(
                "{:<14} {:>8} {:>9} {:>9} {:>9} {:>7} {:>7} {:>7}ms  {}",
                o.test.as_str(),
                o.attempts,
                o.committed,
                o.conflicts,
                o.explicit_aborts,
                o.aborted(),
                o.skipped,
                o.elapsed.as_millis(),
                if o.passed() { "PASS" } else { "FAIL" }
            ));
        }
        for o in self.outcomes.iter().filter(|o| !o.passed()) {
            lines.push(format!(
                "{}: {} oracle failure(s)",
                o.test, o.oracle_failures
            ));
            for violation in &o.violations {
                lines.push(format!("  - {}", violation));
            }
        }
        lines.push(format!(
            "{} of {} tests passed in {:.1}s",
            self.outcomes.len() - self.failures(),
            self.outcomes.len(),
            self.elapsed.as_secs_f64()
        ));
        lines.join("\n")
    }
}
