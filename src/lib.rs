//! isocheck - transactional isolation anomaly checker for graph stores
//!
//! isocheck races writer and reader transactions against a store and judges
//! the outcome with one oracle per isolation anomaly (atomicity, G0, G1a,
//! G1b, G1c, IMP, PMP, OTV, FR, LU, WS).
//!
//! # Quick Start
//!
//! ```no_run
//! use isocheck::prelude::*;
//!
//! let graph = MemGraph::ephemeral();
//! let config = SuiteConfig {
//!     mode: ConcurrencyMode::Optimistic,
//!     ..SuiteConfig::default()
//! };
//! let report = run_suite(&graph, &config).unwrap();
//! assert!(report.all_passed());
//! ```
//!
//! # Architecture
//!
//! - [`core`]: graph values, the store contract and cursors
//! - [`engine`]: `MemGraph`, the in-memory reference store
//! - [`harness`]: fixtures, workloads, oracles and the suite driver
//!
//! Any store implementing [`core::GraphStore`] can be checked.

pub use isocheck_concurrency as concurrency;
pub use isocheck_core as core;
pub use isocheck_engine as engine;
pub use isocheck_harness as harness;

/// Common imports for running the suite
pub mod prelude {
    pub use isocheck_core::{
        ConcurrencyMode, GraphStore, OpenOptions, StoreError, StoreResult, Transaction, Value,
        WriteTxn,
    };
    pub use isocheck_engine::{MemGraph, ValidationPolicy};
    pub use isocheck_harness::{
        run_suite, HarnessError, HarnessResult, OutputMode, Suite, SuiteConfig, SuiteReport,
        TestName, TestOutcome,
    };
}
