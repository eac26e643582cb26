//! Versioned record keys

use std::fmt;

/// Identity of a versioned unit in the graph
///
/// Adjacency lists and the vertex set are versioned alongside the records
/// they index, so that a transaction which counted edges or scanned
/// vertices conflicts with a concurrent insert (predicate reads).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordKey {
    /// Membership of the vertex set
    VertexSet,
    /// A vertex record by internal id
    Vertex(u64),
    /// An edge record by internal id
    Edge(u64),
    /// Outgoing adjacency list of a vertex
    OutEdges(u64),
    /// Incoming adjacency list of a vertex
    InEdges(u64),
}

impl RecordKey {
    /// Check if this key names a single record rather than an index
    pub fn is_record(&self) -> bool {
        matches!(self, RecordKey::Vertex(_) | RecordKey::Edge(_))
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKey::VertexSet => write!(f, "vertex-set"),
            RecordKey::Vertex(id) => write!(f, "vertex/{}", id),
            RecordKey::Edge(id) => write!(f, "edge/{}", id),
            RecordKey::OutEdges(id) => write!(f, "vertex/{}/out", id),
            RecordKey::InEdges(id) => write!(f, "vertex/{}/in", id),
        }
    }
}
