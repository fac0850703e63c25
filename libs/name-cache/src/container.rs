//! The name container: short-name index plus cached node payloads.
//!
//! Two mappings behind one reader/writer lock: `node_values` holds the
//! last-fetched payload per full path, `name_index` holds the ordered full
//! paths currently believed live per short name. A refresh replaces a short
//! name's whole list atomically under the write lock, so readers see either
//! the old list or the new one, never a partial mix.

use std::collections::HashMap;

use rand::Rng;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{LookupError, LookupResult};

/// Paths whose final segment ends with this literal designate the primary
/// instance for their short name.
const MASTER_SUFFIX: &str = "master";

#[derive(Debug, Default)]
struct ContainerInner {
    /// full path -> last-fetched payload.
    node_values: HashMap<String, Vec<u8>>,
    /// short name -> ordered full paths from the last refresh.
    name_index: HashMap<String, Vec<String>>,
}

/// In-process cache mapping short names to live store subtree children.
#[derive(Debug, Default)]
pub struct NameContainer {
    inner: RwLock<ContainerInner>,
}

impl NameContainer {
    /// Create an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `full_path` to the short name's path list and cache its value.
    ///
    /// Single-entry append; use [`replace_entries`](Self::replace_entries)
    /// to install a whole refreshed list.
    pub async fn set_entry(&self, short_name: &str, full_path: &str, value: Vec<u8>) {
        let mut inner = self.inner.write().await;
        inner.node_values.insert(full_path.to_owned(), value);
        inner
            .name_index
            .entry(short_name.to_owned())
            .or_default()
            .push(full_path.to_owned());
    }

    /// Drop the cached payloads of every path indexed under `short_name`.
    ///
    /// An unknown short name is logged and ignored. The index entry itself
    /// is left in place; only the payloads go.
    pub async fn delete_entry(&self, short_name: &str) {
        let mut inner = self.inner.write().await;
        let ContainerInner {
            node_values,
            name_index,
        } = &mut *inner;
        let Some(full_paths) = name_index.get(short_name) else {
            debug!(short_name, "delete for unknown short name, ignoring");
            return;
        };
        for full_path in full_paths {
            node_values.remove(full_path);
        }
    }

    /// Return the payload of one uniformly random instance of `short_name`.
    pub async fn get_random_instance(&self, short_name: &str) -> LookupResult<Vec<u8>> {
        let inner = self.inner.read().await;
        let full_paths = inner.indexed_paths(short_name)?;
        let pick = rand::thread_rng().gen_range(0..full_paths.len());
        inner.payload_of(short_name, &full_paths[pick])
    }

    /// Return the payload of the first instance (in index order) whose final
    /// path segment ends with `"master"`.
    pub async fn get_master(&self, short_name: &str) -> LookupResult<Vec<u8>> {
        let inner = self.inner.read().await;
        let full_paths = inner.indexed_paths(short_name)?;
        for full_path in full_paths {
            let last_segment = full_path.rsplit('/').next().unwrap_or_default();
            if !last_segment.ends_with(MASTER_SUFFIX) {
                continue;
            }
            return inner.payload_of(short_name, full_path);
        }
        Err(LookupError::NoMasterFound {
            short_name: short_name.to_owned(),
        })
    }

    /// Return the payload of every instance of `short_name`, in index order.
    ///
    /// A path with no cached payload yields an empty payload rather than an
    /// error, so the output length always equals the index length.
    pub async fn get_all_instances(&self, short_name: &str) -> LookupResult<Vec<Vec<u8>>> {
        let inner = self.inner.read().await;
        let full_paths = inner.indexed_paths(short_name)?;
        Ok(full_paths
            .iter()
            .map(|full_path| inner.node_values.get(full_path).cloned().unwrap_or_default())
            .collect())
    }

    /// Atomically replace the short name's whole path list with `entries`.
    ///
    /// Empty input leaves the short name with an empty list. Payloads of
    /// paths dropped from the previous list stay in `node_values` until an
    /// explicit [`delete_entry`](Self::delete_entry); the cache does not
    /// garbage-collect them.
    pub async fn replace_entries(&self, short_name: &str, entries: Vec<(String, Vec<u8>)>) {
        let mut inner = self.inner.write().await;
        let ContainerInner {
            node_values,
            name_index,
        } = &mut *inner;
        let index = name_index.entry(short_name.to_owned()).or_default();
        index.clear();
        for (full_path, value) in entries {
            index.push(full_path.clone());
            node_values.insert(full_path, value);
        }
    }

    /// Reset the short name's path list to empty without touching payloads.
    pub async fn clear_entries(&self, short_name: &str) {
        let mut inner = self.inner.write().await;
        inner.name_index.insert(short_name.to_owned(), Vec::new());
    }
}

impl ContainerInner {
    /// The short name's path list, or the unknown-name miss when it is
    /// absent or empty.
    fn indexed_paths(&self, short_name: &str) -> LookupResult<&[String]> {
        match self.name_index.get(short_name) {
            Some(paths) if !paths.is_empty() => Ok(paths),
            _ => Err(LookupError::UnknownShortName {
                short_name: short_name.to_owned(),
            }),
        }
    }

    fn payload_of(&self, short_name: &str, full_path: &str) -> LookupResult<Vec<u8>> {
        if full_path.is_empty() {
            warn!(short_name, "indexed path is empty");
            return Err(LookupError::MissingNodeData {
                full_path: full_path.to_owned(),
            });
        }
        self.node_values.get(full_path).cloned().ok_or_else(|| {
            warn!(short_name, full_path, "no payload cached for indexed path");
            LookupError::MissingNodeData {
                full_path: full_path.to_owned(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn entries(pairs: &[(&str, &str)]) -> Vec<(String, Vec<u8>)> {
        pairs
            .iter()
            .map(|(path, value)| (path.to_string(), value.as_bytes().to_vec()))
            .collect()
    }

    #[tokio::test]
    async fn test_unregistered_name_always_misses() {
        let container = NameContainer::new();
        assert!(matches!(
            container.get_random_instance("ghost").await,
            Err(LookupError::UnknownShortName { .. })
        ));
        assert!(matches!(
            container.get_master("ghost").await,
            Err(LookupError::UnknownShortName { .. })
        ));
        assert!(matches!(
            container.get_all_instances("ghost").await,
            Err(LookupError::UnknownShortName { .. })
        ));
    }

    #[tokio::test]
    async fn test_replace_then_batch_returns_values_in_order() {
        let container = NameContainer::new();
        container
            .replace_entries(
                "svc",
                entries(&[
                    ("/ns/svc/node-a", "A"),
                    ("/ns/svc/node-b", "B"),
                    ("/ns/svc/node-c", "C"),
                ]),
            )
            .await;

        let all = container.get_all_instances("svc").await.unwrap();
        assert_eq!(all, vec![b"A".to_vec(), b"B".to_vec(), b"C".to_vec()]);
    }

    #[tokio::test]
    async fn test_replace_overwrites_previous_list() {
        let container = NameContainer::new();
        container
            .replace_entries("svc", entries(&[("/ns/svc/node-a", "A")]))
            .await;
        container
            .replace_entries("svc", entries(&[("/ns/svc/node-b", "B")]))
            .await;

        let all = container.get_all_instances("svc").await.unwrap();
        assert_eq!(all, vec![b"B".to_vec()]);
    }

    #[tokio::test]
    async fn test_empty_replace_clears_short_name() {
        let container = NameContainer::new();
        container
            .replace_entries("svc", entries(&[("/ns/svc/node-a", "A")]))
            .await;
        container.replace_entries("svc", Vec::new()).await;

        assert!(matches!(
            container.get_random_instance("svc").await,
            Err(LookupError::UnknownShortName { .. })
        ));
    }

    #[tokio::test]
    async fn test_master_is_first_matching_path_in_index_order() {
        let container = NameContainer::new();
        container
            .replace_entries(
                "svc",
                entries(&[
                    ("/ns/svc/replica-1", "R1"),
                    ("/ns/svc/shard-master", "M1"),
                    ("/ns/svc/other-master", "M2"),
                ]),
            )
            .await;

        let master = container.get_master("svc").await.unwrap();
        assert_eq!(master, b"M1".to_vec());
    }

    #[tokio::test]
    async fn test_no_master_among_live_instances() {
        let container = NameContainer::new();
        container
            .replace_entries(
                "svc",
                entries(&[("/ns/svc/replica-1", "R1"), ("/ns/svc/replica-2", "R2")]),
            )
            .await;

        assert!(matches!(
            container.get_master("svc").await,
            Err(LookupError::NoMasterFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_random_instance_covers_all_paths() {
        let container = NameContainer::new();
        container
            .replace_entries(
                "svc",
                entries(&[
                    ("/ns/svc/node-a", "A"),
                    ("/ns/svc/node-b", "B"),
                    ("/ns/svc/node-c", "C"),
                ]),
            )
            .await;

        let mut seen = HashSet::new();
        for _ in 0..1000 {
            seen.insert(container.get_random_instance("svc").await.unwrap());
        }
        // with 1000 uniform draws over 3 instances, starving one is
        // (2/3)^1000 -- not happening
        assert_eq!(seen.len(), 3);
    }

    #[tokio::test]
    async fn test_batch_pads_missing_payloads() {
        let container = NameContainer::new();
        container
            .replace_entries("svc", entries(&[("/ns/svc/node-a", "A")]))
            .await;
        // index a second path without caching a payload for it
        {
            let mut inner = container.inner.write().await;
            inner
                .name_index
                .get_mut("svc")
                .unwrap()
                .push("/ns/svc/node-b".to_owned());
        }

        let all = container.get_all_instances("svc").await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0], b"A".to_vec());
        assert!(all[1].is_empty());
    }

    #[tokio::test]
    async fn test_random_instance_missing_payload_is_typed_miss() {
        let container = NameContainer::new();
        {
            let mut inner = container.inner.write().await;
            inner
                .name_index
                .insert("svc".to_owned(), vec!["/ns/svc/node-a".to_owned()]);
        }

        assert!(matches!(
            container.get_random_instance("svc").await,
            Err(LookupError::MissingNodeData { .. })
        ));
    }

    #[tokio::test]
    async fn test_set_entry_appends() {
        let container = NameContainer::new();
        container
            .set_entry("svc", "/ns/svc/node-a", b"A".to_vec())
            .await;
        container
            .set_entry("svc", "/ns/svc/node-b", b"B".to_vec())
            .await;

        let all = container.get_all_instances("svc").await.unwrap();
        assert_eq!(all, vec![b"A".to_vec(), b"B".to_vec()]);
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn test_delete_entry_drops_payloads_not_index() {
        let container = NameContainer::new();
        container
            .replace_entries("svc", entries(&[("/ns/svc/node-a", "A")]))
            .await;
        container.delete_entry("svc").await;

        // the index row survives, so batch still answers -- with padding
        let all = container.get_all_instances("svc").await.unwrap();
        assert_eq!(all, vec![Vec::<u8>::new()]);
        // deleting an unknown name is a logged no-op
        container.delete_entry("ghost").await;
        assert!(logs_contain("delete for unknown short name"));
    }

    #[tokio::test]
    async fn test_clear_entries_empties_list() {
        let container = NameContainer::new();
        container
            .replace_entries("svc", entries(&[("/ns/svc/node-a", "A")]))
            .await;
        container.clear_entries("svc").await;

        assert!(matches!(
            container.get_all_instances("svc").await,
            Err(LookupError::UnknownShortName { .. })
        ));
    }
}
