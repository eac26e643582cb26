//! Core types and traits for isocheck
//!
//! This crate defines the vocabulary shared by the anomaly harness and every
//! store it can be pointed at:
//! - Value: Field values stored on vertices and edges
//! - FieldType / FieldSpec: Schema declarations for vertex and edge types
//! - VertexRef / EdgeRef: Transaction-scoped record references
//! - ConcurrencyMode: Strict vs optimistic write transactions
//! - StoreError: Error type hierarchy
//! - Traits: The minimal transactional contract (GraphStore, Transaction, WriteTxn)
//! - Cursors: Rewindable scans over vertices and adjacent edges

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cursor;
pub mod error;
pub mod schema;
pub mod traits;
pub mod types;
pub mod value;

pub use cursor::{EdgeCursor, VertexCursor};
pub use error::{StoreError, StoreResult};
pub use schema::{FieldSpec, FieldType};
pub use traits::{GraphStore, Transaction, WriteTxn};
pub use types::{ConcurrencyMode, EdgeRef, OpenOptions, VertexRef};
pub use value::Value;
