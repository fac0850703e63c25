//! Name service facade: registration, watch-driven refresh, and lookups.
//!
//! One [`NameService`] per process owns the connection pool and the shared
//! container. Each registered (short name, full path) pair gets its own
//! long-lived refresh task: run a list+fetch+replace cycle, park on the
//! one-shot child watch, repeat. Registrations have no cancellation; a task
//! runs until process exit or until a cycle fails.

use std::sync::Arc;

use tracing::{debug, warn};
use zk_store::zk;
use zk_store::{ConnectionPool, StoreResult};

use crate::container::NameContainer;
use crate::error::{LookupResult, RefreshError};

/// Client-side name resolution backed by a store-mirrored cache.
///
/// Construct once at process start and pass by reference to every component
/// needing name resolution or low-level store access.
#[derive(Debug, Default)]
pub struct NameService {
    pool: ConnectionPool,
    container: Arc<NameContainer>,
}

impl NameService {
    /// Create a service with an empty pool and an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The connection pool, for collaborators needing raw node CRUD.
    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    /// Begin tracking `full_path`'s children under `short_name`.
    ///
    /// Runs the first refresh cycle synchronously -- its failure surfaces
    /// here and nothing is spawned -- then hands the armed watch to a
    /// background task that refreshes on every child-set change.
    pub async fn register(
        &self,
        server_set: &str,
        short_name: &str,
        full_path: &str,
    ) -> Result<(), RefreshError> {
        let watcher = refresh_cycle(&self.pool, &self.container, server_set, short_name, full_path)
            .await
            .map_err(|source| RefreshError {
                short_name: short_name.to_owned(),
                full_path: full_path.to_owned(),
                source,
            })?;

        tokio::spawn(watch_loop(
            self.pool.clone(),
            Arc::clone(&self.container),
            server_set.to_owned(),
            short_name.to_owned(),
            full_path.to_owned(),
            watcher,
        ));
        Ok(())
    }

    /// Best-effort batch registration: per-pair failures are logged and the
    /// remaining pairs still register.
    pub async fn register_all(&self, server_set: &str, names: &[(String, String)]) {
        for (short_name, full_path) in names {
            if let Err(err) = self.register(server_set, short_name, full_path).await {
                warn!(%err, %short_name, %full_path, "skipping name registration");
            }
        }
    }

    /// Payload of one uniformly random live instance of `short_name`.
    pub async fn lookup_instance(&self, short_name: &str) -> LookupResult<Vec<u8>> {
        self.container
            .get_random_instance(short_name)
            .await
            .inspect_err(|err| debug!(%err, short_name, "instance lookup miss"))
    }

    /// Payload of the designated master instance of `short_name`.
    pub async fn lookup_master(&self, short_name: &str) -> LookupResult<Vec<u8>> {
        self.container
            .get_master(short_name)
            .await
            .inspect_err(|err| debug!(%err, short_name, "master lookup miss"))
    }

    /// Payloads of every live instance of `short_name`, in index order.
    pub async fn lookup_all(&self, short_name: &str) -> LookupResult<Vec<Vec<u8>>> {
        self.container.get_all_instances(short_name).await
    }

    /// Drop the cached payloads for `short_name`.
    ///
    /// Cache-only: any refresh loop for the name keeps running and will
    /// repopulate on the next child-set change.
    pub async fn forget(&self, short_name: &str) {
        self.container.delete_entry(short_name).await;
    }
}

/// One refresh cycle: list children and arm the watch in one round-trip,
/// fetch each child's payload, install the result as the short name's whole
/// list. Returns the armed watcher for the next cycle.
///
/// A child whose fetch fails or whose payload is empty is logged and
/// skipped; the partial result still installs. A listing/arming failure
/// aborts the cycle with nothing installed.
async fn refresh_cycle(
    pool: &ConnectionPool,
    container: &NameContainer,
    server_set: &str,
    short_name: &str,
    full_path: &str,
) -> StoreResult<zk::OneshotWatcher> {
    let session = pool.get(server_set).await?;
    let (children, watcher) = session.list_children_watch(full_path).await?;

    let mut entries = Vec::with_capacity(children.len());
    for child in &children {
        let node_path = format!("{full_path}/{child}");
        match session.get_node(&node_path).await {
            Ok(value) if value.is_empty() => {
                warn!(path = %node_path, "child payload is empty, skipping");
            }
            Ok(value) => entries.push((node_path, value)),
            Err(err) => {
                warn!(%err, path = %node_path, "failed to fetch child payload, skipping");
            }
        }
    }

    debug!(
        short_name,
        full_path,
        listed = children.len(),
        cached = entries.len(),
        "installing refreshed name entries"
    );
    container.replace_entries(short_name, entries).await;
    Ok(watcher)
}

/// Long-lived per-registration task: park on the one-shot watch, refresh,
/// take the next watch from the successful cycle.
async fn watch_loop(
    pool: ConnectionPool,
    container: Arc<NameContainer>,
    server_set: String,
    short_name: String,
    full_path: String,
    mut watcher: zk::OneshotWatcher,
) {
    loop {
        let event = watcher.changed().await;
        debug!(
            event = ?event.event_type,
            path = %event.path,
            %short_name,
            "child set changed, refreshing"
        );
        match refresh_cycle(&pool, &container, &server_set, &short_name, &full_path).await {
            Ok(next) => watcher = next,
            Err(err) => {
                // per-registration failure semantics: no re-arm after a
                // failed cycle, the cache keeps its last installed state
                warn!(%err, %short_name, %full_path, "refresh cycle failed, stopping watch");
                return;
            }
        }
    }
}
