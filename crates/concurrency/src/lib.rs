//! Optimistic concurrency control for the reference graph store
//!
//! This crate implements first-committer-wins OCC over graph records:
//! - [`RecordKey`]: the unit of versioning (a vertex, an edge, an adjacency
//!   list, or the vertex set itself)
//! - [`TransactionContext`]: read/write-set tracking and the status machine
//! - [`validate_transaction`]: read-set validation against current versions
//! - [`TransactionManager`]: commit lock, transaction ids, version publication
//!
//! Record payloads are not stored here; the engine buffers them and installs
//! them from the apply step of [`TransactionManager::commit`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod key;
pub mod manager;
pub mod transaction;
pub mod validation;

pub use key::RecordKey;
pub use manager::TransactionManager;
pub use transaction::{CommitError, TransactionContext, TransactionStatus};
pub use validation::{
    validate_read_set, validate_transaction, ConflictType, ValidationPolicy, ValidationResult,
    VersionSource,
};
