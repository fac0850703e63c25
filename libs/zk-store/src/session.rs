//! Store session wrapper: node CRUD, child watches, and lazy
//! reconnect-on-disconnect.
//!
//! A [`ZkSession`] wraps one `zookeeper-client` session handle. Disconnection
//! is discovered lazily, on the next operation: the session asks its owning
//! pool for a fresh replacement and retries the operation against it exactly
//! once. There is no background health check.

use std::fmt;
use std::sync::{Arc, Weak};

use rand::Rng;
use tracing::{debug, warn};
use zookeeper_client as zk;

use crate::error::{StoreError, StoreResult};
use crate::pool::PoolInner;

struct SessionInner {
    client: zk::Client,
    /// Owning pool registry. Weak so a dropped pool does not keep sessions
    /// alive through their own back-reference.
    pool: Weak<PoolInner>,
}

/// One live session against a store server set.
///
/// Cloning is cheap and clones observe the same underlying session. The
/// handle is safe for concurrent use; per-operation synchronization is left
/// to the underlying client.
#[derive(Clone)]
pub struct ZkSession {
    inner: Arc<SessionInner>,
}

impl ZkSession {
    pub(crate) fn new(client: zk::Client, pool: Weak<PoolInner>) -> Self {
        Self {
            inner: Arc::new(SessionInner { client, pool }),
        }
    }

    /// Current state of the underlying session.
    pub fn state(&self) -> zk::SessionState {
        self.inner.client.state()
    }

    /// Returns true if the underlying session is currently connected.
    pub fn is_connected(&self) -> bool {
        state_is_connected(self.state())
    }

    /// Returns true if both handles refer to the same underlying session.
    pub fn is_same_session(&self, other: &ZkSession) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Validate the path and return a connected client handle, reconnecting
    /// through the pool first if this session has dropped.
    async fn ensure_session(&self, path: &str) -> StoreResult<zk::Client> {
        validate_path(path)?;
        let state = self.state();
        if state_is_connected(state) {
            return Ok(self.inner.client.clone());
        }
        warn!(?state, path, "session not connected, reconnecting before operation");
        let fresh = self.reconnect().await?;
        Ok(fresh.inner.client.clone())
    }

    /// Read the payload of one uniformly random child of `path`.
    ///
    /// Fails with [`StoreError::NoChildren`] when the listing is empty.
    pub async fn get_random_child(&self, path: &str) -> StoreResult<Vec<u8>> {
        let client = self.ensure_session(path).await?;
        let children = client.list_children(path).await?;
        if children.is_empty() {
            return Err(StoreError::NoChildren {
                path: path.to_owned(),
            });
        }
        let pick = rand::thread_rng().gen_range(0..children.len());
        let node_path = join_path(path, &children[pick]);
        let (value, _stat) = client.get_data(&node_path).await?;
        Ok(value)
    }

    /// Read the payload at an exact absolute path.
    pub async fn get_node(&self, path: &str) -> StoreResult<Vec<u8>> {
        let client = self.ensure_session(path).await?;
        match client.get_data(path).await {
            Ok((value, _stat)) => Ok(value),
            Err(zk::Error::NoNode) => Err(StoreError::NodeNotFound {
                path: path.to_owned(),
            }),
            Err(err) => Err(err.into()),
        }
    }

    /// Overwrite the payload of an existing node.
    ///
    /// The write is conditional on the version observed by the preceding
    /// existence check; a lost race surfaces as
    /// [`StoreError::VersionConflict`] and is not retried here.
    pub async fn set_node(&self, path: &str, value: &[u8]) -> StoreResult<()> {
        let client = self.ensure_session(path).await?;
        let stat = client
            .check_stat(path)
            .await?
            .ok_or_else(|| StoreError::InvalidPath {
                path: path.to_owned(),
            })?;
        match client.set_data(path, value, Some(stat.version)).await {
            Ok(_stat) => Ok(()),
            Err(zk::Error::BadVersion) => Err(StoreError::VersionConflict {
                path: path.to_owned(),
            }),
            Err(err) => Err(err.into()),
        }
    }

    /// Create every missing segment of `path`: intermediates as persistent
    /// nodes with empty payloads, the final segment as an ephemeral node
    /// holding `value`.
    ///
    /// Segments that already exist are skipped, including ones created
    /// concurrently between the existence check and the create. The first
    /// creation error aborts the walk; already-created segments are not
    /// rolled back. Returns the full path of the final segment.
    pub async fn create_node(&self, path: &str, value: &[u8]) -> StoreResult<String> {
        let client = self.ensure_session(path).await?;
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if segments.is_empty() {
            return Err(StoreError::InvalidPath {
                path: path.to_owned(),
            });
        }

        let last = segments.len() - 1;
        let mut node_path = String::with_capacity(path.len());
        for (index, segment) in segments.iter().enumerate() {
            node_path.push('/');
            node_path.push_str(segment);

            if client.check_stat(&node_path).await?.is_some() {
                continue;
            }

            let (mode, payload): (zk::CreateMode, &[u8]) = if index == last {
                (zk::CreateMode::Ephemeral, value)
            } else {
                (zk::CreateMode::Persistent, &[])
            };
            match client
                .create(&node_path, payload, &mode.with_acls(zk::Acls::anyone_all()))
                .await
            {
                Ok(_) => {}
                // lost a creation race; the segment exists
                Err(zk::Error::NodeExists) => {
                    debug!(path = %node_path, "segment created concurrently, skipping");
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(node_path)
    }

    /// List the children of `path` and arm a one-shot watch on its child set.
    ///
    /// The watcher fires exactly once on the next change; callers re-issue
    /// this call to keep watching.
    pub async fn list_children_watch(
        &self,
        path: &str,
    ) -> StoreResult<(Vec<String>, zk::OneshotWatcher)> {
        let client = self.ensure_session(path).await?;
        Ok(client.list_and_watch_children(path).await?)
    }

    /// Replace this session with a fresh one from its owning pool.
    ///
    /// The server-set identifier is recovered by scanning the pool registry
    /// for this session under the registry lock. Fails with
    /// [`StoreError::NotPooled`] when no pool manages this session, which is
    /// also the case once a replacement has evicted it from the registry.
    pub async fn reconnect(&self) -> StoreResult<ZkSession> {
        let pool = self.inner.pool.upgrade().ok_or(StoreError::NotPooled)?;
        let server_set = pool
            .find_server_set(self)
            .await
            .ok_or(StoreError::NotPooled)?;
        warn!(%server_set, "reconnecting store session");
        PoolInner::get(&pool, &server_set).await
    }
}

impl fmt::Debug for ZkSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZkSession")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// Mirrors `zk::SessionState::is_connected`, which is crate-private upstream.
fn state_is_connected(state: zk::SessionState) -> bool {
    matches!(
        state,
        zk::SessionState::SyncConnected | zk::SessionState::ConnectedReadOnly
    )
}

fn validate_path(path: &str) -> StoreResult<()> {
    if path.is_empty() {
        return Err(StoreError::EmptyParameter("path"));
    }
    Ok(())
}

fn join_path(parent: &str, child: &str) -> String {
    format!("{}/{}", parent.trim_end_matches('/'), child)
}
