//! In-memory multi-versioned graph store
//!
//! [`MemGraph`] is the reference implementation of the store contract. It
//! offers snapshot reads for every transaction, a strict write path (one
//! writer at a time) and an optimistic write path (concurrent writers,
//! first-committer-wins validation).
//!
//! # Example
//!
//! ```
//! use isocheck_core::{ConcurrencyMode, FieldSpec, FieldType, GraphStore, Transaction, Value, WriteTxn};
//! use isocheck_engine::MemGraph;
//!
//! let graph = MemGraph::ephemeral();
//! graph
//!     .define_vertex_type("Account", &[FieldSpec::required("id", FieldType::Int64)], "id")
//!     .unwrap();
//!
//! let txn = graph.begin_write(ConcurrencyMode::Optimistic).unwrap();
//! txn.create_vertex("Account", &[("id", Value::Int(1))]).unwrap();
//! txn.commit().unwrap();
//!
//! let read = graph.begin_read().unwrap();
//! assert_eq!(read.vertex_refs().unwrap().len(), 1);
//! ```

mod builder;

pub use builder::MemGraphBuilder;

use crate::catalog::Catalog;
use crate::coordinator::{TransactionCoordinator, TransactionMetrics};
use crate::storage::GraphStorage;
use crate::txn::{MemReadTxn, MemWriteTxn};
use isocheck_concurrency::ValidationPolicy;
use isocheck_core::{
    ConcurrencyMode, FieldSpec, GraphStore, OpenOptions, StoreError, StoreResult,
};
use parking_lot::{Mutex, RwLock};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// How long a reset waits for in-flight transactions to finish
const RESET_DRAIN_TIMEOUT: Duration = Duration::from_millis(200);

/// State shared by the store handle and its transactions
pub(crate) struct Shared {
    pub(crate) storage: GraphStorage,
    pub(crate) catalog: RwLock<Catalog>,
    pub(crate) coordinator: TransactionCoordinator,
    pub(crate) writer_lock: Arc<Mutex<()>>,
    pub(crate) policy: ValidationPolicy,
}

/// In-memory graph store
///
/// Cheap to clone; clones share the same data.
#[derive(Clone)]
pub struct MemGraph {
    shared: Arc<Shared>,
    path: PathBuf,
}

impl MemGraph {
    /// Create a builder
    pub fn builder() -> MemGraphBuilder {
        MemGraphBuilder::new()
    }

    /// Open an unnamed store with default settings
    pub fn ephemeral() -> Self {
        Self::with_policy(PathBuf::from(":memory:"), ValidationPolicy::Serializable)
    }

    pub(crate) fn with_policy(path: PathBuf, policy: ValidationPolicy) -> Self {
        MemGraph {
            shared: Arc::new(Shared {
                storage: GraphStorage::new(),
                catalog: RwLock::new(Catalog::default()),
                coordinator: TransactionCoordinator::new(0),
                writer_lock: Arc::new(Mutex::new(())),
                policy,
            }),
            path,
        }
    }

    /// Name the store was opened under
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Commit validation policy
    pub fn validation_policy(&self) -> ValidationPolicy {
        self.shared.policy
    }

    /// Transaction metrics since open
    pub fn metrics(&self) -> TransactionMetrics {
        self.shared.coordinator.metrics()
    }

    /// Latest committed version
    pub fn current_version(&self) -> u64 {
        self.shared.coordinator.current_version()
    }

    /// Number of vertices ever committed since the last reset
    pub fn vertex_count(&self) -> usize {
        self.shared.storage.vertex_count()
    }

    /// Number of edges ever committed since the last reset
    pub fn edge_count(&self) -> usize {
        self.shared.storage.edge_count()
    }
}

impl std::fmt::Debug for MemGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemGraph")
            .field("path", &self.path)
            .field("policy", &self.shared.policy)
            .field("version", &self.current_version())
            .finish()
    }
}

impl GraphStore for MemGraph {
    type ReadTxn = MemReadTxn;
    type WriteTxn = MemWriteTxn;

    fn open(options: &OpenOptions) -> StoreResult<Self> {
        MemGraph::builder().options(options).open()
    }

    fn reset_all_data(&self) -> StoreResult<()> {
        let shared = &self.shared;
        if !shared.coordinator.wait_for_idle(RESET_DRAIN_TIMEOUT) {
            debug!(target: "isocheck::store", active = shared.coordinator.active_count(), "Reset drain timed out");
        }
        shared.coordinator.exclusive(|| {
            let active = shared.coordinator.active_count();
            if active > 0 {
                return Err(StoreError::invalid_state(format!(
                    "cannot reset with {} active transaction(s)",
                    active
                )));
            }
            shared.storage.clear();
            *shared.catalog.write() = Catalog::default();
            Ok(())
        })?;
        info!(target: "isocheck::store", path = %self.path.display(), "All data reset");
        Ok(())
    }

    fn define_vertex_type(
        &self,
        name: &str,
        fields: &[FieldSpec],
        primary_key: &str,
    ) -> StoreResult<()> {
        self.shared
            .catalog
            .write()
            .define_vertex_type(name, fields, primary_key)?;
        debug!(target: "isocheck::store", name, fields = fields.len(), primary_key, "Vertex type defined");
        Ok(())
    }

    fn define_edge_type(&self, name: &str, fields: &[FieldSpec]) -> StoreResult<()> {
        self.shared.catalog.write().define_edge_type(name, fields)?;
        debug!(target: "isocheck::store", name, fields = fields.len(), "Edge type defined");
        Ok(())
    }

    fn begin_write(&self, mode: ConcurrencyMode) -> StoreResult<MemWriteTxn> {
        Ok(MemWriteTxn::new(Arc::clone(&self.shared), mode))
    }

    fn begin_read(&self) -> StoreResult<MemReadTxn> {
        Ok(MemReadTxn::new(Arc::clone(&self.shared)))
    }
}
