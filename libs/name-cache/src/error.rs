//! Error types for cache lookups and watch-driven refreshes.
//!
//! Lookup failures are typed misses, never fatal: a caller asking for a name
//! that is unknown, emptied, or only partially cached gets a variant it can
//! match on and degrade from.

use thiserror::Error;
use zk_store::StoreError;

/// A cache miss surfaced to a lookup caller.
#[derive(Debug, Error)]
pub enum LookupError {
    /// The short name was never registered, or its path list is empty.
    #[error("short name '{short_name}' has no live instances")]
    UnknownShortName {
        /// The short name that was looked up.
        short_name: String,
    },

    /// An indexed path is empty or has no cached payload.
    #[error("no payload cached for '{full_path}'")]
    MissingNodeData {
        /// The full path whose payload is absent.
        full_path: String,
    },

    /// No indexed path for the short name carries the master suffix.
    #[error("no master instance registered under '{short_name}'")]
    NoMasterFound {
        /// The short name that was looked up.
        short_name: String,
    },
}

/// Shorthand result alias for cache lookups.
pub type LookupResult<T> = Result<T, LookupError>;

/// A refresh cycle failed before anything could be installed.
///
/// Raised only from the listing/watch-arming step of a cycle; individual
/// child fetch failures degrade to a partial refresh instead.
#[derive(Debug, Error)]
#[error("failed to refresh '{short_name}' from '{full_path}'")]
pub struct RefreshError {
    /// The short name being refreshed.
    pub short_name: String,
    /// The subtree whose children were being mirrored.
    pub full_path: String,
    /// The store failure that aborted the cycle.
    #[source]
    pub source: StoreError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_error_display() {
        let err = LookupError::UnknownShortName {
            short_name: "svc".into(),
        };
        assert_eq!(format!("{err}"), "short name 'svc' has no live instances");

        let err = LookupError::NoMasterFound {
            short_name: "svc".into(),
        };
        assert!(format!("{err}").contains("master"));
    }

    #[test]
    fn test_refresh_error_carries_source() {
        let err = RefreshError {
            short_name: "svc".into(),
            full_path: "/ns/svc".into(),
            source: StoreError::EmptyParameter("path"),
        };
        let msg = format!("{err}");
        assert!(msg.contains("svc"));
        assert!(msg.contains("/ns/svc"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
