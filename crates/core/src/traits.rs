//! The minimal transactional contract a store must offer
//!
//! The harness is written against these traits only. A store exposes:
//! - schema registration and a full data reset ([`GraphStore`])
//! - write and read transactions ([`GraphStore::begin_write`],
//!   [`GraphStore::begin_read`])
//! - a full vertex scan plus per-vertex adjacency and field access
//!   ([`Transaction`])
//! - record creation, field updates, commit and abort ([`WriteTxn`])
//!
//! Point lookups by business key are deliberately absent: callers locate
//! records by scanning and filtering, so any store with a scan can be bound.
//!
//! Transaction methods take `&self` so that several cursors may be open on
//! one transaction at once. `commit` and `abort` consume the transaction,
//! which forces every cursor borrowed from it to be dropped first.

use crate::cursor::VertexCursor;
use crate::error::StoreResult;
use crate::schema::FieldSpec;
use crate::types::{ConcurrencyMode, EdgeRef, OpenOptions, VertexRef};
use crate::value::Value;

/// Read surface shared by read-only and write transactions
///
/// A read-only transaction observes a stable snapshot for its whole lifetime.
pub trait Transaction {
    /// All vertices visible to this transaction, in the store's scan order
    fn vertex_refs(&self) -> StoreResult<Vec<VertexRef>>;

    /// Label (type name) of a vertex
    fn vertex_label(&self, vertex: VertexRef) -> StoreResult<String>;

    /// Value of a vertex field; unset or undeclared fields read as `Null`
    fn vertex_field(&self, vertex: VertexRef, field: &str) -> StoreResult<Value>;

    /// Outgoing edges of a vertex
    fn out_edges(&self, vertex: VertexRef) -> StoreResult<Vec<EdgeRef>>;

    /// Incoming edges of a vertex
    fn in_edges(&self, vertex: VertexRef) -> StoreResult<Vec<EdgeRef>>;

    /// Label (type name) of an edge
    fn edge_label(&self, edge: EdgeRef) -> StoreResult<String>;

    /// Value of an edge field; unset or undeclared fields read as `Null`
    fn edge_field(&self, edge: EdgeRef, field: &str) -> StoreResult<Value>;

    /// Open a cursor positioned at the first vertex
    fn scan_vertices(&self) -> StoreResult<VertexCursor<'_, Self>>
    where
        Self: Sized,
    {
        VertexCursor::open(self)
    }
}

/// A write transaction
pub trait WriteTxn: Transaction {
    /// Create a vertex with the given fields
    fn create_vertex(&self, label: &str, fields: &[(&str, Value)]) -> StoreResult<VertexRef>;

    /// Create a directed edge from `src` to `dst`
    fn create_edge(
        &self,
        src: VertexRef,
        dst: VertexRef,
        label: &str,
        fields: &[(&str, Value)],
    ) -> StoreResult<EdgeRef>;

    /// Overwrite one field of a vertex
    fn set_vertex_field(&self, vertex: VertexRef, field: &str, value: Value) -> StoreResult<()>;

    /// Overwrite one field of an edge
    fn set_edge_field(&self, edge: EdgeRef, field: &str, value: Value) -> StoreResult<()>;

    /// Make every buffered write visible atomically
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` when the store's concurrency control
    /// rejects the transaction. All writes are discarded in that case.
    fn commit(self) -> StoreResult<()>;

    /// Discard every buffered write. Never fails.
    fn abort(self);
}

/// A transactional graph store
///
/// Shared by reference across all worker threads of a run; the store's own
/// transaction manager is the only synchronization the harness relies on.
pub trait GraphStore: Send + Sync {
    /// Read-only transaction type
    type ReadTxn: Transaction;
    /// Write transaction type
    type WriteTxn: WriteTxn;

    /// Open (or connect to) a store
    fn open(options: &OpenOptions) -> StoreResult<Self>
    where
        Self: Sized;

    /// Drop every record and every registered type
    fn reset_all_data(&self) -> StoreResult<()>;

    /// Register a vertex type with its fields and primary key field
    fn define_vertex_type(
        &self,
        name: &str,
        fields: &[FieldSpec],
        primary_key: &str,
    ) -> StoreResult<()>;

    /// Register an edge type with its fields
    fn define_edge_type(&self, name: &str, fields: &[FieldSpec]) -> StoreResult<()>;

    /// Begin a write transaction under the given concurrency mode
    fn begin_write(&self, mode: ConcurrencyMode) -> StoreResult<Self::WriteTxn>;

    /// Begin a read-only transaction on a stable snapshot
    fn begin_read(&self) -> StoreResult<Self::ReadTxn>;
}
