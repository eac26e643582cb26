//! Suite configuration via `isocheck.toml`
//!
//! Every key is optional. Command-line flags override the file, and the file
//! overrides the built-in defaults.

use crate::anomaly::{TestName, WorkloadSize};
use crate::error::{HarnessError, HarnessResult};
use crate::orchestrator::Orchestrator;
use isocheck_core::ConcurrencyMode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::thread;
use std::time::Duration;

/// Default config file name
pub const CONFIG_FILE_NAME: &str = "isocheck.toml";

/// Per-test override of the default workload size
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadOverride {
    /// Writer transactions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub writers: Option<usize>,
    /// Reader transactions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readers: Option<usize>,
}

/// Suite configuration loaded from `isocheck.toml`.
///
/// # Example
///
/// ```toml
/// mode = "optimistic"
/// delay_ms = 50
/// only = ["lu", "ws"]
///
/// [workloads.ws]
/// writers = 20
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteConfig {
    /// Concurrency mode of every write transaction
    #[serde(default)]
    pub mode: ConcurrencyMode,
    /// Race window in milliseconds
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    /// Worker threads per population
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Base seed of the per-task random sources
    #[serde(default)]
    pub seed: u64,
    /// Tests to run; empty runs all of them
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub only: Vec<String>,
    /// Workload size overrides keyed by test name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub workloads: BTreeMap<String, WorkloadOverride>,
}

fn default_delay_ms() -> u64 {
    250
}

fn default_parallelism() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            mode: ConcurrencyMode::default(),
            delay_ms: default_delay_ms(),
            parallelism: default_parallelism(),
            seed: 0,
            only: Vec::new(),
            workloads: BTreeMap::new(),
        }
    }
}

fn parse_test(name: &str) -> HarnessResult<TestName> {
    name.parse().map_err(HarnessError::config)
}

impl SuiteConfig {
    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# isocheck suite configuration
#
# Concurrency mode of every write transaction: "strict" (default) or "optimistic"
#   "strict"     = writers exclude each other for their whole lifetime
#   "optimistic" = writers run concurrently and are validated at commit
mode = "strict"

# Race window between two operations of one transaction, in milliseconds
delay_ms = 250

# Worker threads per population (default: available cores)
# parallelism = 8

# Base seed of the per-task random sources
seed = 0

# Run only these tests (default: all)
# only = ["atomicity-c", "atomicity-rb", "g0", "g1a", "g1b", "g1c",
#         "imp", "pmp", "otv", "fr", "lu", "ws"]

# Workload size overrides
# [workloads.lu]
# writers = 200
#
# [workloads.g1b]
# writers = 50
# readers = 100
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> HarnessResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            HarnessError::config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: SuiteConfig = toml::from_str(&content).map_err(|e| {
            HarnessError::config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> HarnessResult<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml())?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> HarnessResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| HarnessError::config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject unknown test names and reader overrides on writer-only tests
    pub fn validate(&self) -> HarnessResult<()> {
        for name in &self.only {
            parse_test(name)?;
        }
        for (name, size) in &self.workloads {
            let test = parse_test(name)?;
            if size.readers.is_some() && !test.has_readers() {
                return Err(HarnessError::config(format!(
                    "test '{}' has no readers to override",
                    test
                )));
            }
        }
        Ok(())
    }

    /// Tests to run, in suite order
    pub fn selected_tests(&self) -> HarnessResult<Vec<TestName>> {
        if self.only.is_empty() {
            return Ok(TestName::ALL.to_vec());
        }
        let mut selected = self
            .only
            .iter()
            .map(|name| parse_test(name))
            .collect::<HarnessResult<Vec<_>>>()?;
        selected.sort();
        selected.dedup();
        Ok(selected)
    }

    /// Workload size of `test`, overrides applied
    pub fn size_for(&self, test: TestName) -> WorkloadSize {
        let mut size = test.default_size();
        if let Some(over) = self.workloads.get(test.as_str()) {
            size.writers = over.writers.unwrap_or(size.writers);
            size.readers = over.readers.unwrap_or(size.readers);
        }
        size
    }

    /// Race window
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Orchestrator for this configuration
    pub fn orchestrator(&self) -> Orchestrator {
        Orchestrator::new(self.parallelism, self.seed)
    }
}
