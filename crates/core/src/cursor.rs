//! Rewindable cursors over a transaction's vertices and edges
//!
//! A [`VertexCursor`] walks the vertex set in scan order. It can be rewound
//! to the beginning (re-reading the transaction's view, so records created
//! by the same transaction become visible) or repositioned on a known
//! vertex. From any position an [`EdgeCursor`] over the vertex's outgoing or
//! incoming edges can be opened.
//!
//! Cursors only borrow the transaction, so several may be open at once.

use crate::error::{StoreError, StoreResult};
use crate::traits::{Transaction, WriteTxn};
use crate::types::{EdgeRef, VertexRef};
use crate::value::Value;

/// Cursor over the vertices visible to a transaction
pub struct VertexCursor<'t, T: Transaction> {
    txn: &'t T,
    refs: Vec<VertexRef>,
    pos: usize,
}

impl<'t, T: Transaction> VertexCursor<'t, T> {
    /// Open a cursor positioned at the first vertex
    pub fn open(txn: &'t T) -> StoreResult<Self> {
        Ok(VertexCursor {
            txn,
            refs: txn.vertex_refs()?,
            pos: 0,
        })
    }

    /// Open a cursor positioned at `vertex`
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the vertex is not visible.
    pub fn at(txn: &'t T, vertex: VertexRef) -> StoreResult<Self> {
        let mut cursor = Self::open(txn)?;
        if cursor.seek(vertex) {
            Ok(cursor)
        } else {
            Err(StoreError::not_found(format!("vertex {}", vertex)))
        }
    }

    /// Check if the cursor is on a vertex
    pub fn valid(&self) -> bool {
        self.pos < self.refs.len()
    }

    /// Move to the next vertex
    pub fn advance(&mut self) {
        if self.valid() {
            self.pos += 1;
        }
    }

    /// Restart from the first vertex of a fresh scan
    pub fn rewind(&mut self) -> StoreResult<()> {
        self.refs = self.txn.vertex_refs()?;
        self.pos = 0;
        Ok(())
    }

    /// Position on `vertex`; leaves the cursor invalid if it is not in the scan
    pub fn seek(&mut self, vertex: VertexRef) -> bool {
        match self.refs.iter().position(|r| *r == vertex) {
            Some(pos) => {
                self.pos = pos;
                true
            }
            None => {
                self.pos = self.refs.len();
                false
            }
        }
    }

    /// Reference of the current vertex, if valid
    pub fn record_ref(&self) -> Option<VertexRef> {
        self.refs.get(self.pos).copied()
    }

    /// Reference of the current vertex
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidState` if the cursor is exhausted.
    pub fn current(&self) -> StoreResult<VertexRef> {
        self.record_ref()
            .ok_or_else(|| StoreError::invalid_state("vertex cursor is not valid"))
    }

    /// Label of the current vertex
    pub fn label(&self) -> StoreResult<String> {
        self.txn.vertex_label(self.current()?)
    }

    /// Field of the current vertex
    pub fn field(&self, name: &str) -> StoreResult<Value> {
        self.txn.vertex_field(self.current()?, name)
    }

    /// Cursor over the current vertex's outgoing edges
    pub fn out_edges(&self) -> StoreResult<EdgeCursor<'t, T>> {
        let edges = self.txn.out_edges(self.current()?)?;
        Ok(EdgeCursor::new(self.txn, edges))
    }

    /// Cursor over the current vertex's incoming edges
    pub fn in_edges(&self) -> StoreResult<EdgeCursor<'t, T>> {
        let edges = self.txn.in_edges(self.current()?)?;
        Ok(EdgeCursor::new(self.txn, edges))
    }
}

impl<'t, T: WriteTxn> VertexCursor<'t, T> {
    /// Overwrite a field of the current vertex
    pub fn set_field(&self, name: &str, value: Value) -> StoreResult<()> {
        self.txn.set_vertex_field(self.current()?, name, value)
    }
}

/// Cursor over a list of edges adjacent to one vertex
pub struct EdgeCursor<'t, T: Transaction> {
    txn: &'t T,
    edges: Vec<EdgeRef>,
    pos: usize,
}

impl<'t, T: Transaction> EdgeCursor<'t, T> {
    fn new(txn: &'t T, edges: Vec<EdgeRef>) -> Self {
        EdgeCursor { txn, edges, pos: 0 }
    }

    /// Check if the cursor is on an edge
    pub fn valid(&self) -> bool {
        self.pos < self.edges.len()
    }

    /// Move to the next edge
    pub fn advance(&mut self) {
        if self.valid() {
            self.pos += 1;
        }
    }

    /// Restart from the first edge
    pub fn rewind(&mut self) {
        self.pos = 0;
    }

    /// Reference of the current edge, if valid
    pub fn edge_ref(&self) -> Option<EdgeRef> {
        self.edges.get(self.pos).copied()
    }

    /// Reference of the current edge
    pub fn current(&self) -> StoreResult<EdgeRef> {
        self.edge_ref()
            .ok_or_else(|| StoreError::invalid_state("edge cursor is not valid"))
    }

    /// Source vertex of the current edge
    pub fn src(&self) -> StoreResult<VertexRef> {
        Ok(self.current()?.src)
    }

    /// Destination vertex of the current edge
    pub fn dst(&self) -> StoreResult<VertexRef> {
        Ok(self.current()?.dst)
    }

    /// Label of the current edge
    pub fn label(&self) -> StoreResult<String> {
        self.txn.edge_label(self.current()?)
    }

    /// Field of the current edge
    pub fn field(&self, name: &str) -> StoreResult<Value> {
        self.txn.edge_field(self.current()?, name)
    }

    /// Number of edges in this cursor
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Check if there are no edges
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

impl<'t, T: WriteTxn> EdgeCursor<'t, T> {
    /// Overwrite a field of the current edge
    pub fn set_field(&self, name: &str, value: Value) -> StoreResult<()> {
        self.txn.set_edge_field(self.current()?, name, value)
    }
}
