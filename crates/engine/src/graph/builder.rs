//! Builder for configuring and opening a [`MemGraph`]

use super::MemGraph;
use isocheck_concurrency::ValidationPolicy;
use isocheck_core::{OpenOptions, StoreError, StoreResult};
use std::path::PathBuf;

/// Builder for MemGraph configuration
///
/// ```
/// use isocheck_engine::MemGraph;
///
/// let graph = MemGraph::builder()
///     .path("./testdb")
///     .snapshot_only()
///     .open()
///     .unwrap();
/// assert!(!graph.validation_policy().validates());
/// ```
#[derive(Debug, Clone)]
pub struct MemGraphBuilder {
    path: Option<PathBuf>,
    user: String,
    policy: ValidationPolicy,
}

impl MemGraphBuilder {
    /// Create new builder with defaults (serializable validation)
    pub fn new() -> Self {
        Self {
            path: None,
            user: "admin".to_string(),
            policy: ValidationPolicy::Serializable,
        }
    }

    /// Set the name the store is opened under
    pub fn path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the user the store is opened as
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    /// Take path and user from open options
    ///
    /// The password is not checked by the in-memory store.
    pub fn options(self, options: &OpenOptions) -> Self {
        self.path(options.path.clone()).user(options.user.clone())
    }

    /// Set the commit validation policy
    pub fn validation(mut self, policy: ValidationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Validate read-sets at commit (default)
    pub fn serializable(self) -> Self {
        self.validation(ValidationPolicy::Serializable)
    }

    /// Skip commit validation; the last committer wins
    pub fn snapshot_only(self) -> Self {
        self.validation(ValidationPolicy::SnapshotOnly)
    }

    /// Open the store
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidInput` if the user name is empty.
    pub fn open(self) -> StoreResult<MemGraph> {
        if self.user.trim().is_empty() {
            return Err(StoreError::invalid_input("user name must not be empty"));
        }
        let path = self.path.unwrap_or_else(|| PathBuf::from(":memory:"));
        tracing::info!(
            target: "isocheck::store",
            path = %path.display(),
            user = %self.user,
            policy = ?self.policy,
            "Opened in-memory graph store"
        );
        Ok(MemGraph::with_policy(path, self.policy))
    }
}

impl Default for MemGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}
