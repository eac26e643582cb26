//! Error types for store operations
//!
//! Every store bound to the harness reports failures through [`StoreError`].
//! The harness only needs to tell contention apart from everything else, so
//! the taxonomy is intentionally small.

use thiserror::Error;

/// Result type alias for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors surfaced by a store through the transactional contract
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    /// The store refused the transaction because of concurrent contention
    /// (write-write or read-write conflict, deadlock, detected violation)
    #[error("transaction conflict: {reason}")]
    Conflict {
        /// Human-readable reason reported by the store
        reason: String,
    },

    /// A declared constraint (e.g. primary key uniqueness) would be violated
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// Unknown label, undeclared field, or mistyped value
    #[error("schema error: {0}")]
    Schema(String),

    /// A referenced record does not exist in the transaction's view
    #[error("not found: {0}")]
    NotFound(String),

    /// Caller supplied an invalid argument
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Operation not permitted in the current state (e.g. cursor exhausted)
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Bug or broken invariant inside the store
    #[error("internal error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Create a conflict error
    pub fn conflict(reason: impl Into<String>) -> Self {
        StoreError::Conflict {
            reason: reason.into(),
        }
    }

    /// Create a not-found error
    pub fn not_found(what: impl Into<String>) -> Self {
        StoreError::NotFound(what.into())
    }

    /// Create a schema error
    pub fn schema(message: impl Into<String>) -> Self {
        StoreError::Schema(message.into())
    }

    /// Create an invalid-input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        StoreError::InvalidInput(message.into())
    }

    /// Create an invalid-state error
    pub fn invalid_state(message: impl Into<String>) -> Self {
        StoreError::InvalidState(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        StoreError::Internal(message.into())
    }

    /// Check if this is a contention conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_display() {
        let err = StoreError::conflict("read set changed");
        let msg = err.to_string();
        assert!(msg.contains("transaction conflict"));
        assert!(msg.contains("read set changed"));
    }

    #[test]
    fn test_only_conflicts_are_conflicts() {
        assert!(StoreError::conflict("x").is_conflict());
        assert!(!StoreError::ConstraintViolation("dup".into()).is_conflict());
        assert!(!StoreError::schema("no such label").is_conflict());
        assert!(!StoreError::internal("bug").is_conflict());
    }

    #[test]
    fn test_schema_display() {
        let err = StoreError::schema("unknown field 'foo'");
        assert_eq!(err.to_string(), "schema error: unknown field 'foo'");
    }
}
