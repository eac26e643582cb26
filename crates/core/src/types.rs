//! Identity and configuration types for the store contract
//!
//! - VertexRef / EdgeRef: Store-assigned references, valid only inside the
//!   transaction that obtained them
//! - ConcurrencyMode: How a write transaction coordinates with others
//! - OpenOptions: Location and credentials used to open a store

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Reference to a vertex inside one transaction
///
/// This is the store's internal identifier, NOT the business key. Callers
/// must not carry it from one transaction into another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VertexRef(pub u64);

impl VertexRef {
    /// Raw identifier value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for VertexRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Reference to a directed edge inside one transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeRef {
    /// Store-assigned edge identifier
    pub id: u64,
    /// Source vertex
    pub src: VertexRef,
    /// Destination vertex
    pub dst: VertexRef,
}

impl fmt::Display for EdgeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}({}->{})", self.id, self.src, self.dst)
    }
}

/// Concurrency control applied to a write transaction
///
/// One mode is chosen per run and passed to every `begin_write` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConcurrencyMode {
    /// Writers exclude each other for their whole lifetime
    #[default]
    Strict,
    /// Writers run concurrently and are validated at commit
    Optimistic,
}

impl ConcurrencyMode {
    /// Check if this is optimistic mode
    pub fn is_optimistic(&self) -> bool {
        matches!(self, ConcurrencyMode::Optimistic)
    }

    /// Stable lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            ConcurrencyMode::Strict => "strict",
            ConcurrencyMode::Optimistic => "optimistic",
        }
    }
}

impl fmt::Display for ConcurrencyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConcurrencyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strict" | "serializable" => Ok(ConcurrencyMode::Strict),
            "optimistic" => Ok(ConcurrencyMode::Optimistic),
            other => Err(format!(
                "unknown concurrency mode '{}', expected \"strict\" or \"optimistic\"",
                other
            )),
        }
    }
}

/// Location and credentials used to open a store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenOptions {
    /// Store location (directory, URI, ...), interpreted by the store
    pub path: PathBuf,
    /// User name
    pub user: String,
    /// Password
    pub password: String,
}

impl OpenOptions {
    /// Create options for the given location with default credentials
    pub fn new(path: impl Into<PathBuf>) -> Self {
        OpenOptions {
            path: path.into(),
            user: "admin".to_string(),
            password: String::new(),
        }
    }

    /// Set the credentials
    pub fn credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = user.into();
        self.password = password.into();
        self
    }
}

impl Default for OpenOptions {
    fn default() -> Self {
        OpenOptions::new("./testdb")
    }
}
