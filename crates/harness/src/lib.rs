//! Transactional isolation anomaly harness
//!
//! Runs racing writer and reader workloads against any [`GraphStore`] and
//! judges the observed state with one oracle per anomaly:
//! - Atomicity (commit and rollback variants)
//! - G0, G1a, G1b, G1c: dirty writes, aborted/intermediate reads, circular flow
//! - IMP, PMP: item and predicate many-preceders
//! - OTV, FR: vanishing and fractured reads over a transfer cycle
//! - LU, WS: lost update and write skew
//!
//! ```no_run
//! use isocheck_harness::{run_suite, SuiteConfig};
//! # fn demo<S: isocheck_core::GraphStore>(store: &S) -> isocheck_harness::HarnessResult<()> {
//! let report = run_suite(store, &SuiteConfig::default())?;
//! println!("{}", report.render_table());
//! # Ok(())
//! # }
//! ```
//!
//! [`GraphStore`]: isocheck_core::GraphStore

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod anomaly;
pub mod config;
pub mod error;
pub mod fixture;
pub mod log;
pub mod oracle;
pub mod orchestrator;
pub mod outcome;
pub mod report;
pub mod suite;
pub mod workload;

pub use anomaly::{TestName, WorkloadSize};
pub use config::{SuiteConfig, WorkloadOverride, CONFIG_FILE_NAME};
pub use error::{HarnessError, HarnessResult};
pub use fixture::{dump_state, prepare, reset_schema};
pub use orchestrator::{Orchestrator, Population, TaskContext};
pub use outcome::{Tally, TestOutcome, TxnOutcome};
pub use report::{OutputMode, SuiteReport};
pub use suite::{run_suite, Suite};
