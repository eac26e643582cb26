//! Read and write transactions over [`MemGraph`](crate::MemGraph)
//!
//! Both kinds read from a fixed snapshot version. Write transactions buffer
//! full copies of every record they touch in a [`WriteBatch`] and track
//! reads in a [`TransactionContext`] for commit-time validation.

use crate::graph::Shared;
use crate::storage::{EdgeRecord, VertexRecord, Versioned, WriteBatch};
use isocheck_concurrency::{RecordKey, TransactionContext};
use isocheck_core::{
    ConcurrencyMode, EdgeRef, StoreError, StoreResult, Transaction, Value, VertexRef, WriteTxn,
};
use parking_lot::lock_api::ArcMutexGuard;
use parking_lot::RawMutex;
use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Snapshot-bound read access shared by both transaction kinds
struct View {
    shared: Arc<Shared>,
    snapshot: u64,
}

impl View {
    fn vertex(&self, vertex: VertexRef) -> StoreResult<Versioned<VertexRecord>> {
        self.shared
            .storage
            .vertex_at(vertex.0, self.snapshot)
            .ok_or_else(|| StoreError::not_found(format!("vertex {}", vertex)))
    }

    fn edge(&self, edge: EdgeRef) -> StoreResult<Versioned<EdgeRecord>> {
        self.shared
            .storage
            .edge_at(edge.id, self.snapshot)
            .ok_or_else(|| StoreError::not_found(format!("edge {}", edge)))
    }

    fn vertex_ids(&self) -> Vec<u64> {
        self.shared.storage.vertex_ids_at(self.snapshot)
    }

    fn edge_refs(&self, ids: Vec<u64>) -> Vec<EdgeRef> {
        ids.into_iter()
            .filter_map(|id| {
                self.shared
                    .storage
                    .edge_at(id, self.snapshot)
                    .map(|e| edge_ref(id, &e.value))
            })
            .collect()
    }

    fn out_edges(&self, vertex: VertexRef) -> Vec<EdgeRef> {
        self.edge_refs(self.shared.storage.out_edge_ids_at(vertex.0, self.snapshot))
    }

    fn in_edges(&self, vertex: VertexRef) -> Vec<EdgeRef> {
        self.edge_refs(self.shared.storage.in_edge_ids_at(vertex.0, self.snapshot))
    }

    fn version_of(&self, key: &RecordKey) -> u64 {
        self.shared.storage.version_at(key, self.snapshot)
    }
}

fn edge_ref(id: u64, record: &EdgeRecord) -> EdgeRef {
    EdgeRef {
        id,
        src: VertexRef(record.src),
        dst: VertexRef(record.dst),
    }
}

// ============================================================================
// Read transactions
// ============================================================================

/// Read-only transaction on a stable snapshot
pub struct MemReadTxn {
    view: View,
}

impl MemReadTxn {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        shared.coordinator.record_start();
        let snapshot = shared.coordinator.current_version();
        tracing::trace!(target: "isocheck::txn", snapshot, "Read transaction started");
        MemReadTxn {
            view: View { shared, snapshot },
        }
    }

    /// Snapshot version this transaction reads at
    pub fn snapshot_version(&self) -> u64 {
        self.view.snapshot
    }
}

impl Drop for MemReadTxn {
    fn drop(&mut self) {
        self.view.shared.coordinator.record_finish();
    }
}

impl Transaction for MemReadTxn {
    fn vertex_refs(&self) -> StoreResult<Vec<VertexRef>> {
        Ok(self.view.vertex_ids().into_iter().map(VertexRef).collect())
    }

    fn vertex_label(&self, vertex: VertexRef) -> StoreResult<String> {
        Ok(self.view.vertex(vertex)?.value.label)
    }

    fn vertex_field(&self, vertex: VertexRef, field: &str) -> StoreResult<Value> {
        Ok(self.view.vertex(vertex)?.value.field(field))
    }

    fn out_edges(&self, vertex: VertexRef) -> StoreResult<Vec<EdgeRef>> {
        self.view.vertex(vertex)?;
        Ok(self.view.out_edges(vertex))
    }

    fn in_edges(&self, vertex: VertexRef) -> StoreResult<Vec<EdgeRef>> {
        self.view.vertex(vertex)?;
        Ok(self.view.in_edges(vertex))
    }

    fn edge_label(&self, edge: EdgeRef) -> StoreResult<String> {
        Ok(self.view.edge(edge)?.value.label)
    }

    fn edge_field(&self, edge: EdgeRef, field: &str) -> StoreResult<Value> {
        Ok(self.view.edge(edge)?.value.field(field))
    }
}

// ============================================================================
// Write transactions
// ============================================================================

/// Write transaction
///
/// In [`ConcurrencyMode::Strict`] the transaction holds the store-wide
/// writer lock from begin until it is committed, aborted, or dropped. In
/// [`ConcurrencyMode::Optimistic`] it runs alongside other writers and is
/// validated at commit.
///
/// Dropping a write transaction without committing aborts it.
pub struct MemWriteTxn {
    view: View,
    mode: ConcurrencyMode,
    ctx: RefCell<TransactionContext>,
    pending: RefCell<WriteBatch>,
    finished: Cell<bool>,
    _writer: Option<ArcMutexGuard<RawMutex, ()>>,
}

impl MemWriteTxn {
    pub(crate) fn new(shared: Arc<Shared>, mode: ConcurrencyMode) -> Self {
        // Strict writers take the snapshot only once they own the lock
        let writer = match mode {
            ConcurrencyMode::Strict => Some(shared.writer_lock.lock_arc()),
            ConcurrencyMode::Optimistic => None,
        };
        let ctx = shared.coordinator.start_transaction();
        let snapshot = ctx.start_version;
        MemWriteTxn {
            view: View { shared, snapshot },
            mode,
            ctx: RefCell::new(ctx),
            pending: RefCell::new(WriteBatch::default()),
            finished: Cell::new(false),
            _writer: writer,
        }
    }

    /// Concurrency mode this transaction was started with
    pub fn mode(&self) -> ConcurrencyMode {
        self.mode
    }

    /// Identifier assigned by the transaction manager
    pub fn txn_id(&self) -> u64 {
        self.ctx.borrow().txn_id
    }

    /// Snapshot version this transaction reads at
    pub fn snapshot_version(&self) -> u64 {
        self.view.snapshot
    }

    fn track_read(&self, key: RecordKey) -> StoreResult<()> {
        let version = self.view.version_of(&key);
        self.ctx.borrow_mut().record_read(key, version)
    }

    fn track_write(&self, key: RecordKey) -> StoreResult<()> {
        self.ctx.borrow_mut().record_write(key)
    }

    /// Current contents of a vertex as this transaction sees it
    fn read_vertex(&self, vertex: VertexRef) -> StoreResult<VertexRecord> {
        if let Some(record) = self.pending.borrow().vertices.get(&vertex.0) {
            return Ok(record.clone());
        }
        let record = self.view.vertex(vertex)?;
        self.track_read(RecordKey::Vertex(vertex.0))?;
        Ok(record.value)
    }

    fn read_edge(&self, edge: EdgeRef) -> StoreResult<EdgeRecord> {
        if let Some(record) = self.pending.borrow().edges.get(&edge.id) {
            return Ok(record.clone());
        }
        let record = self.view.edge(edge)?;
        self.track_read(RecordKey::Edge(edge.id))?;
        Ok(record.value)
    }

    fn pending_edges(&self, matches: impl Fn(&EdgeRecord) -> bool) -> Vec<EdgeRef> {
        self.pending
            .borrow()
            .edges
            .iter()
            .filter(|(id, record)| {
                matches(record) && self.view.shared.storage.edge_at(**id, self.view.snapshot).is_none()
            })
            .map(|(id, record)| edge_ref(*id, record))
            .collect()
    }

    fn finish(&self) -> bool {
        !self.finished.replace(true)
    }
}

impl Drop for MemWriteTxn {
    fn drop(&mut self) {
        if self.finish() {
            let ctx = self.ctx.get_mut();
            self.view.shared.coordinator.abort(ctx, "dropped without commit");
        }
    }
}

impl Transaction for MemWriteTxn {
    fn vertex_refs(&self) -> StoreResult<Vec<VertexRef>> {
        self.track_read(RecordKey::VertexSet)?;
        let mut ids: BTreeSet<u64> = self.view.vertex_ids().into_iter().collect();
        ids.extend(self.pending.borrow().vertices.keys().copied());
        Ok(ids.into_iter().map(VertexRef).collect())
    }

    fn vertex_label(&self, vertex: VertexRef) -> StoreResult<String> {
        if let Some(record) = self.pending.borrow().vertices.get(&vertex.0) {
            return Ok(record.label.clone());
        }
        Ok(self.view.vertex(vertex)?.value.label)
    }

    fn vertex_field(&self, vertex: VertexRef, field: &str) -> StoreResult<Value> {
        Ok(self.read_vertex(vertex)?.field(field))
    }

    fn out_edges(&self, vertex: VertexRef) -> StoreResult<Vec<EdgeRef>> {
        self.vertex_label(vertex)?;
        self.track_read(RecordKey::OutEdges(vertex.0))?;
        let mut edges = self.view.out_edges(vertex);
        edges.extend(self.pending_edges(|e| e.src == vertex.0));
        Ok(edges)
    }

    fn in_edges(&self, vertex: VertexRef) -> StoreResult<Vec<EdgeRef>> {
        self.vertex_label(vertex)?;
        self.track_read(RecordKey::InEdges(vertex.0))?;
        let mut edges = self.view.in_edges(vertex);
        edges.extend(self.pending_edges(|e| e.dst == vertex.0));
        Ok(edges)
    }

    fn edge_label(&self, edge: EdgeRef) -> StoreResult<String> {
        if let Some(record) = self.pending.borrow().edges.get(&edge.id) {
            return Ok(record.label.clone());
        }
        Ok(self.view.edge(edge)?.value.label)
    }

    fn edge_field(&self, edge: EdgeRef, field: &str) -> StoreResult<Value> {
        Ok(self.read_edge(edge)?.field(field))
    }
}

impl WriteTxn for MemWriteTxn {
    fn create_vertex(&self, label: &str, fields: &[(&str, Value)]) -> StoreResult<VertexRef> {
        self.ctx.borrow().ensure_active()?;
        let fields = self.view.shared.catalog.read().check_vertex(label, fields)?;
        let id = self.view.shared.storage.allocate_vertex_id();
        self.track_write(RecordKey::Vertex(id))?;
        self.track_write(RecordKey::VertexSet)?;
        self.pending.borrow_mut().vertices.insert(
            id,
            VertexRecord {
                label: label.to_string(),
                fields,
            },
        );
        Ok(VertexRef(id))
    }

    fn create_edge(
        &self,
        src: VertexRef,
        dst: VertexRef,
        label: &str,
        fields: &[(&str, Value)],
    ) -> StoreResult<EdgeRef> {
        self.ctx.borrow().ensure_active()?;
        self.vertex_label(src)?;
        self.vertex_label(dst)?;
        let fields = self.view.shared.catalog.read().check_edge(label, fields)?;
        let id = self.view.shared.storage.allocate_edge_id();
        self.track_write(RecordKey::Edge(id))?;
        self.track_write(RecordKey::OutEdges(src.0))?;
        self.track_write(RecordKey::InEdges(dst.0))?;
        let record = EdgeRecord {
            label: label.to_string(),
            src: src.0,
            dst: dst.0,
            fields,
        };
        let edge = edge_ref(id, &record);
        self.pending.borrow_mut().edges.insert(id, record);
        Ok(edge)
    }

    fn set_vertex_field(&self, vertex: VertexRef, field: &str, value: Value) -> StoreResult<()> {
        let mut record = self.read_vertex(vertex)?;
        let value = self
            .view
            .shared
            .catalog
            .read()
            .check_vertex_field(&record.label, field, value)?;
        if value.is_null() {
            record.fields.remove(field);
        } else {
            record.fields.insert(field.to_string(), value);
        }
        self.track_write(RecordKey::Vertex(vertex.0))?;
        self.pending.borrow_mut().vertices.insert(vertex.0, record);
        Ok(())
    }

    fn set_edge_field(&self, edge: EdgeRef, field: &str, value: Value) -> StoreResult<()> {
        let mut record = self.read_edge(edge)?;
        let value = self
            .view
            .shared
            .catalog
            .read()
            .check_edge_field(&record.label, field, value)?;
        if value.is_null() {
            record.fields.remove(field);
        } else {
            record.fields.insert(field.to_string(), value);
        }
        self.track_write(RecordKey::Edge(edge.id))?;
        self.pending.borrow_mut().edges.insert(edge.id, record);
        Ok(())
    }

    fn commit(self) -> StoreResult<()> {
        self.finish();
        let shared = &self.view.shared;
        let batch = self.pending.take();
        let mut ctx = self.ctx.borrow_mut();
        shared
            .coordinator
            .commit(&mut ctx, &shared.storage, shared.policy, |version| {
                let catalog = shared.catalog.read();
                shared.storage.apply(&batch, version, &catalog)
            })
            .map(|_| ())
    }

    fn abort(self) {
        self.finish();
        let mut ctx = self.ctx.borrow_mut();
        self.view.shared.coordinator.abort(&mut ctx, "explicit abort");
    }
}
