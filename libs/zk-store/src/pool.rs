//! Process-wide registry of store sessions, one per server set.
//!
//! Sessions are created lazily on first request for a server-set identifier
//! and replaced transparently when an existing session is observed
//! disconnected. The whole check-then-dial-then-insert sequence runs while
//! holding the registry lock, so concurrent requests for the same identifier
//! perform exactly one dial.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info};
use zookeeper_client as zk;

use crate::error::{StoreError, StoreResult};
use crate::session::ZkSession;

/// Session timeout negotiated with the store on dial.
const SESSION_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Default)]
pub(crate) struct PoolInner {
    /// server-set identifier -> live session. At most one per identifier.
    sessions: Mutex<HashMap<String, ZkSession>>,
}

/// Registry mapping a server-set identifier (comma-separated `host:port`
/// list) to a live [`ZkSession`].
///
/// Cloning is cheap and clones share the same registry.
#[derive(Clone, Default)]
pub struct ConnectionPool {
    inner: Arc<PoolInner>,
}

impl ConnectionPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the pooled session for `server_set`, dialing one if none is
    /// pooled yet or the pooled one has dropped its connection.
    pub async fn get(&self, server_set: &str) -> StoreResult<ZkSession> {
        if server_set.is_empty() {
            return Err(StoreError::EmptyParameter("server_set"));
        }
        PoolInner::get(&self.inner, server_set).await
    }

    /// Idempotent upsert of a session into the registry.
    pub async fn register(&self, server_set: &str, session: ZkSession) {
        let mut sessions = self.inner.sessions.lock().await;
        sessions.insert(server_set.to_owned(), session);
    }
}

impl PoolInner {
    pub(crate) async fn get(pool: &Arc<Self>, server_set: &str) -> StoreResult<ZkSession> {
        // The lock is held across the dial: creation and
        // disconnected-replacement both funnel through here, and only one
        // caller dials a given server set at a time.
        let mut sessions = pool.sessions.lock().await;
        if let Some(session) = sessions.get(server_set) {
            if session.is_connected() {
                return Ok(session.clone());
            }
            debug!(server_set, state = ?session.state(), "pooled session dropped, replacing");
        }
        let session = Self::dial(pool, server_set).await?;
        sessions.insert(server_set.to_owned(), session.clone());
        Ok(session)
    }

    async fn dial(pool: &Arc<Self>, server_set: &str) -> StoreResult<ZkSession> {
        debug!(server_set, "dialing store server set");
        let client = zk::Client::connector()
            .session_timeout(SESSION_TIMEOUT)
            .connect(server_set)
            .await
            .map_err(|source| StoreError::Connect {
                server_set: server_set.to_owned(),
                source,
            })?;
        info!(server_set, "store session established");
        Ok(ZkSession::new(client, Arc::downgrade(pool)))
    }

    /// Linear scan for the identifier a session is registered under.
    pub(crate) async fn find_server_set(&self, session: &ZkSession) -> Option<String> {
        let sessions = self.sessions.lock().await;
        sessions
            .iter()
            .find(|(_, pooled)| pooled.is_same_session(session))
            .map(|(server_set, _)| server_set.clone())
    }
}

impl fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionPool").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_server_set_rejected() {
        let pool = ConnectionPool::new();
        let err = pool.get("").await.unwrap_err();
        assert!(matches!(err, StoreError::EmptyParameter("server_set")));
    }

    #[test]
    fn test_pool_clones_share_registry() {
        let pool = ConnectionPool::new();
        let clone = pool.clone();
        assert!(Arc::ptr_eq(&pool.inner, &clone.inner));
    }
}
