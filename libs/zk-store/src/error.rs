//! Error types for store sessions and the connection pool.
//!
//! Provides typed variants so that consumers can distinguish caller mistakes
//! (empty parameters), cache-relevant conditions (missing nodes, empty child
//! sets), and transport failures without matching on the underlying client's
//! error strings.

use thiserror::Error;
use zookeeper_client as zk;

/// Top-level error type for the zk-store crate.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An empty string was supplied where an identifier or path is required.
    #[error("empty parameter: {0}")]
    EmptyParameter(&'static str),

    /// A child listing came back empty where at least one child is needed.
    #[error("no children under '{path}'")]
    NoChildren {
        /// The parent path that was listed.
        path: String,
    },

    /// The requested node does not exist.
    #[error("node not found at '{path}'")]
    NodeNotFound {
        /// The absolute path that was read.
        path: String,
    },

    /// A write was attempted against a path with no existing node.
    #[error("invalid path '{path}': node does not exist")]
    InvalidPath {
        /// The absolute path that was written.
        path: String,
    },

    /// The node's version changed between the read and the conditional write.
    #[error("version conflict writing '{path}'")]
    VersionConflict {
        /// The absolute path that was written.
        path: String,
    },

    /// A reconnect was requested on a session no pool manages.
    #[error("session is not managed by any connection pool")]
    NotPooled,

    /// Dialing the store server set failed.
    #[error("failed to connect to store '{server_set}'")]
    Connect {
        /// The comma-separated server set that was dialed.
        server_set: String,
        /// The underlying connect failure.
        #[source]
        source: zk::Error,
    },

    /// Any other failure from the underlying store client, surfaced verbatim.
    #[error("store operation failed: {0}")]
    Operation(#[from] zk::Error),
}

impl StoreError {
    /// Returns true if this error indicates a transient condition that may
    /// succeed if the caller retries (connection trouble or a lost
    /// version race).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StoreError::Connect { .. } | StoreError::Operation(_) | StoreError::VersionConflict { .. }
        )
    }

    /// Returns true if this error is a version conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::VersionConflict { .. })
    }

    /// Returns true if this error reports an absent node or empty child set.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::NodeNotFound { .. } | StoreError::NoChildren { .. }
        )
    }
}

/// Shorthand result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
