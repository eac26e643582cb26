//! Multi-versioned graph storage
//!
//! Every vertex and edge keeps a [`VersionChain`], newest first. A snapshot
//! at version `S` sees, for each record, the newest version `<= S`; records
//! whose first version is above `S` are invisible. Adjacency lists and the
//! vertex set are derived from record visibility, and their modification
//! versions are tracked separately so predicate reads can be validated.

use crate::catalog::Catalog;
use isocheck_concurrency::{RecordKey, VersionSource};
use isocheck_core::{StoreError, StoreResult, Value};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};

/// A value tagged with the commit version that installed it
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    /// Commit version
    pub version: u64,
    /// Record contents
    pub value: T,
}

/// Versions of one record, newest first
#[derive(Debug, Clone)]
pub struct VersionChain<T> {
    versions: VecDeque<Versioned<T>>,
}

impl<T> VersionChain<T> {
    /// Create a chain with a single version
    pub fn new(version: u64, value: T) -> Self {
        let mut versions = VecDeque::with_capacity(4);
        versions.push_front(Versioned { version, value });
        Self { versions }
    }

    /// Add a new version (must be newer than existing versions)
    pub fn push(&mut self, version: u64, value: T) {
        debug_assert!(version > self.latest_version());
        self.versions.push_front(Versioned { version, value });
    }

    /// Get the version at or before `max_version`
    pub fn get_at_version(&self, max_version: u64) -> Option<&Versioned<T>> {
        self.versions.iter().find(|v| v.version <= max_version)
    }

    /// Get the latest version
    pub fn latest(&self) -> Option<&Versioned<T>> {
        self.versions.front()
    }

    /// Commit version of the latest version, 0 if empty
    pub fn latest_version(&self) -> u64 {
        self.latest().map(|v| v.version).unwrap_or(0)
    }

    /// Number of versions retained
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    /// Check if the chain holds no versions
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

/// Contents of one vertex version
#[derive(Debug, Clone, PartialEq)]
pub struct VertexRecord {
    /// Vertex type name
    pub label: String,
    /// Set fields; unset fields are absent
    pub fields: BTreeMap<String, Value>,
}

impl VertexRecord {
    /// Read a field, `Null` if unset
    pub fn field(&self, name: &str) -> Value {
        self.fields.get(name).cloned().unwrap_or_default()
    }
}

/// Contents of one edge version
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeRecord {
    /// Edge type name
    pub label: String,
    /// Source vertex id
    pub src: u64,
    /// Destination vertex id
    pub dst: u64,
    /// Set fields; unset fields are absent
    pub fields: BTreeMap<String, Value>,
}

impl EdgeRecord {
    /// Read a field, `Null` if unset
    pub fn field(&self, name: &str) -> Value {
        self.fields.get(name).cloned().unwrap_or_default()
    }
}

/// Records a committing transaction installs
#[derive(Debug, Default, Clone)]
pub struct WriteBatch {
    /// New or replaced vertex versions
    pub vertices: BTreeMap<u64, VertexRecord>,
    /// New or replaced edge versions
    pub edges: BTreeMap<u64, EdgeRecord>,
}

impl WriteBatch {
    /// Check if the batch installs nothing
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.edges.is_empty()
    }
}

#[derive(Default)]
struct Tables {
    vertices: BTreeMap<u64, VersionChain<VertexRecord>>,
    edges: BTreeMap<u64, VersionChain<EdgeRecord>>,
    out_index: HashMap<u64, Vec<u64>>,
    in_index: HashMap<u64, Vec<u64>>,
    /// Ascending modification versions of the vertex set and adjacency lists
    index_history: HashMap<RecordKey, Vec<u64>>,
}

impl Tables {
    fn touch(&mut self, key: RecordKey, version: u64) {
        let history = self.index_history.entry(key).or_default();
        if history.last() != Some(&version) {
            history.push(version);
        }
    }

    fn index_version_at(&self, key: &RecordKey, snapshot: u64) -> u64 {
        self.index_history
            .get(key)
            .and_then(|h| h.iter().rev().find(|v| **v <= snapshot))
            .copied()
            .unwrap_or(0)
    }

    fn visible_edges(&self, ids: Option<&Vec<u64>>, snapshot: u64) -> Vec<u64> {
        ids.map(|ids| {
            ids.iter()
                .copied()
                .filter(|id| {
                    self.edges
                        .get(id)
                        .map_or(false, |chain| chain.get_at_version(snapshot).is_some())
                })
                .collect()
        })
        .unwrap_or_default()
    }

    /// Reject a batch that would duplicate a primary key among latest versions
    fn check_unique(&self, batch: &WriteBatch, catalog: &Catalog) -> StoreResult<()> {
        let mut claimed: HashMap<(&str, String), u64> = HashMap::new();

        for (id, record) in &batch.vertices {
            let Some(pk) = catalog.primary_key(&record.label) else {
                continue;
            };
            let key = record.field(pk);
            if key.is_null() {
                continue;
            }
            if let Some(other) = claimed.insert((record.label.as_str(), key.to_string()), *id) {
                return Err(StoreError::ConstraintViolation(format!(
                    "{} {}={} written twice (vertices {} and {})",
                    record.label, pk, key, other, id
                )));
            }
        }
        if claimed.is_empty() {
            return Ok(());
        }

        for (id, chain) in &self.vertices {
            if batch.vertices.contains_key(id) {
                continue;
            }
            let Some(latest) = chain.latest() else {
                continue;
            };
            let record = &latest.value;
            let Some(pk) = catalog.primary_key(&record.label) else {
                continue;
            };
            let candidate = (record.label.as_str(), record.field(pk).to_string());
            if let Some(new_id) = claimed.get(&candidate) {
                return Err(StoreError::ConstraintViolation(format!(
                    "{} {}={} already exists (vertex {} conflicts with {})",
                    record.label, pk, candidate.1, id, new_id
                )));
            }
        }
        Ok(())
    }
}

/// Shared, versioned storage for a graph
pub struct GraphStorage {
    tables: RwLock<Tables>,
    next_vertex_id: AtomicU64,
    next_edge_id: AtomicU64,
}

impl GraphStorage {
    /// Create empty storage
    pub fn new() -> Self {
        GraphStorage {
            tables: RwLock::new(Tables::default()),
            next_vertex_id: AtomicU64::new(1),
            next_edge_id: AtomicU64::new(1),
        }
    }

    /// Allocate an internal vertex id
    pub fn allocate_vertex_id(&self) -> u64 {
        self.next_vertex_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Allocate an internal edge id
    pub fn allocate_edge_id(&self) -> u64 {
        self.next_edge_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Drop every record and restart id allocation
    pub fn clear(&self) {
        *self.tables.write() = Tables::default();
        self.next_vertex_id.store(1, Ordering::SeqCst);
        self.next_edge_id.store(1, Ordering::SeqCst);
    }

    /// Ids of vertices visible at `snapshot`, ascending
    pub fn vertex_ids_at(&self, snapshot: u64) -> Vec<u64> {
        self.tables
            .read()
            .vertices
            .iter()
            .filter(|(_, chain)| chain.get_at_version(snapshot).is_some())
            .map(|(id, _)| *id)
            .collect()
    }

    /// Vertex contents visible at `snapshot`
    pub fn vertex_at(&self, id: u64, snapshot: u64) -> Option<Versioned<VertexRecord>> {
        self.tables
            .read()
            .vertices
            .get(&id)
            .and_then(|chain| chain.get_at_version(snapshot))
            .cloned()
    }

    /// Edge contents visible at `snapshot`
    pub fn edge_at(&self, id: u64, snapshot: u64) -> Option<Versioned<EdgeRecord>> {
        self.tables
            .read()
            .edges
            .get(&id)
            .and_then(|chain| chain.get_at_version(snapshot))
            .cloned()
    }

    /// Outgoing edge ids of a vertex visible at `snapshot`, in creation order
    pub fn out_edge_ids_at(&self, vertex: u64, snapshot: u64) -> Vec<u64> {
        let tables = self.tables.read();
        tables.visible_edges(tables.out_index.get(&vertex), snapshot)
    }

    /// Incoming edge ids of a vertex visible at `snapshot`, in creation order
    pub fn in_edge_ids_at(&self, vertex: u64, snapshot: u64) -> Vec<u64> {
        let tables = self.tables.read();
        tables.visible_edges(tables.in_index.get(&vertex), snapshot)
    }

    /// Version of `key` as seen by a snapshot, 0 if not visible
    pub fn version_at(&self, key: &RecordKey, snapshot: u64) -> u64 {
        let tables = self.tables.read();
        match key {
            RecordKey::Vertex(id) => tables
                .vertices
                .get(id)
                .and_then(|c| c.get_at_version(snapshot))
                .map_or(0, |v| v.version),
            RecordKey::Edge(id) => tables
                .edges
                .get(id)
                .and_then(|c| c.get_at_version(snapshot))
                .map_or(0, |v| v.version),
            index => tables.index_version_at(index, snapshot),
        }
    }

    /// Install a batch at `version`
    ///
    /// Primary keys are checked against the latest version of every other
    /// vertex before anything is installed; on violation nothing changes.
    pub fn apply(&self, batch: &WriteBatch, version: u64, catalog: &Catalog) -> StoreResult<()> {
        let mut tables = self.tables.write();
        tables.check_unique(batch, catalog)?;

        for (id, record) in &batch.vertices {
            match tables.vertices.get_mut(id) {
                Some(chain) => chain.push(version, record.clone()),
                None => {
                    tables
                        .vertices
                        .insert(*id, VersionChain::new(version, record.clone()));
                    tables.touch(RecordKey::VertexSet, version);
                }
            }
        }

        for (id, record) in &batch.edges {
            match tables.edges.get_mut(id) {
                Some(chain) => chain.push(version, record.clone()),
                None => {
                    tables
                        .edges
                        .insert(*id, VersionChain::new(version, record.clone()));
                    tables.out_index.entry(record.src).or_default().push(*id);
                    tables.in_index.entry(record.dst).or_default().push(*id);
                    tables.touch(RecordKey::OutEdges(record.src), version);
                    tables.touch(RecordKey::InEdges(record.dst), version);
                }
            }
        }
        Ok(())
    }

    /// Number of vertices in the latest state
    pub fn vertex_count(&self) -> usize {
        self.tables.read().vertices.len()
    }

    /// Number of edges in the latest state
    pub fn edge_count(&self) -> usize {
        self.tables.read().edges.len()
    }
}

impl Default for GraphStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionSource for GraphStorage {
    fn current_version(&self, key: &RecordKey) -> u64 {
        self.version_at(key, u64::MAX)
    }
}
