//! Harness error types
//!
//! Only failures that stop a test are errors. Contention and deliberate
//! aborts are workload outcomes, and oracle violations are reported data.

use crate::anomaly::TestName;
use isocheck_core::StoreError;
use thiserror::Error;

/// Result type alias for harness operations
pub type HarnessResult<T> = std::result::Result<T, HarnessError>;

/// Errors that halt a test or the whole suite
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Schema registration or fixture seeding failed
    #[error("setup of '{test}' failed: {source}")]
    Setup {
        /// Test being prepared
        test: TestName,
        /// Store failure
        #[source]
        source: StoreError,
    },

    /// A workload hit a store failure that is not contention
    #[error("workload of '{test}' failed: {source}")]
    Workload {
        /// Test being run
        test: TestName,
        /// Store failure
        #[source]
        source: StoreError,
    },

    /// A store failure outside any test
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Invalid configuration value or file
    #[error("configuration error: {0}")]
    Config(String),

    /// Worker pool could not be created
    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    /// I/O failure reading or writing a file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Report or state could not be serialized
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl HarnessError {
    /// Wrap a store failure raised while preparing `test`
    pub fn setup(test: TestName, source: StoreError) -> Self {
        HarnessError::Setup { test, source }
    }

    /// Wrap a store failure raised while running `test`
    pub fn workload(test: TestName, source: StoreError) -> Self {
        HarnessError::Workload { test, source }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        HarnessError::Config(message.into())
    }

    /// Check if this error was raised while preparing a test
    pub fn is_setup(&self) -> bool {
        matches!(self, HarnessError::Setup { .. })
    }
}
