//! End-to-end tests against a live ZooKeeper server set.
//!
//! These are `#[ignore]`d because they need a running store:
//!
//! ```sh
//! ZNS_TEST_SERVERS=127.0.0.1:2181 cargo test -p name-cache -- --ignored
//! ```
//!
//! Each test works under a unique base path so concurrent runs do not
//! trample each other; the leaf nodes are ephemeral and vanish with the
//! test's session.

use std::time::Duration;

use anyhow::{Result, bail};
use name_cache::NameService;
use zk_store::ConnectionPool;

fn test_servers() -> String {
    std::env::var("ZNS_TEST_SERVERS").unwrap_or_else(|_| "127.0.0.1:2181".to_owned())
}

fn unique_base(test: &str) -> String {
    format!("/zns-test/{}-{}", test, std::process::id())
}

#[tokio::test]
#[ignore = "requires a live ZooKeeper server set (ZNS_TEST_SERVERS)"]
async fn test_register_then_batch_lookup() -> Result<()> {
    let servers = test_servers();
    let base = unique_base("batch");

    let service = NameService::new();
    let session = service.pool().get(&servers).await?;
    session
        .create_node(&format!("{base}/node-a"), b"A")
        .await?;
    session
        .create_node(&format!("{base}/node-b"), b"B")
        .await?;

    service.register(&servers, "svc", &base).await?;

    let mut all = service.lookup_all("svc").await?;
    all.sort();
    assert_eq!(all, vec![b"A".to_vec(), b"B".to_vec()]);
    Ok(())
}

#[tokio::test]
#[ignore = "requires a live ZooKeeper server set (ZNS_TEST_SERVERS)"]
async fn test_watch_refresh_picks_up_new_children() -> Result<()> {
    let servers = test_servers();
    let base = unique_base("watch");

    let service = NameService::new();
    let session = service.pool().get(&servers).await?;
    session
        .create_node(&format!("{base}/node-a"), b"A")
        .await?;
    session
        .create_node(&format!("{base}/node-b"), b"B")
        .await?;

    service.register(&servers, "svc", &base).await?;
    assert_eq!(service.lookup_all("svc").await?.len(), 2);

    // a new child fires the armed watch; the refreshed list shows up
    // without any further calls on the service
    session
        .create_node(&format!("{base}/node-c"), b"C")
        .await?;

    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        if service.lookup_all("svc").await?.len() == 3 {
            let mut all = service.lookup_all("svc").await?;
            all.sort();
            assert_eq!(all, vec![b"A".to_vec(), b"B".to_vec(), b"C".to_vec()]);
            return Ok(());
        }
    }
    bail!("watch-driven refresh never observed the third child");
}

#[tokio::test]
#[ignore = "requires a live ZooKeeper server set (ZNS_TEST_SERVERS)"]
async fn test_master_lookup_prefers_suffixed_path() -> Result<()> {
    let servers = test_servers();
    let base = unique_base("master");

    let service = NameService::new();
    let session = service.pool().get(&servers).await?;
    session
        .create_node(&format!("{base}/replica-1"), b"R1")
        .await?;
    session
        .create_node(&format!("{base}/shard-master"), b"M")
        .await?;

    service.register(&servers, "svc", &base).await?;

    assert_eq!(service.lookup_master("svc").await?, b"M".to_vec());
    Ok(())
}

#[tokio::test]
#[ignore = "requires a live ZooKeeper server set (ZNS_TEST_SERVERS)"]
async fn test_concurrent_gets_share_one_session() -> Result<()> {
    let servers = test_servers();
    let pool = ConnectionPool::new();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let pool = pool.clone();
        let servers = servers.clone();
        handles.push(tokio::spawn(async move { pool.get(&servers).await }));
    }

    let mut sessions = Vec::new();
    for handle in handles {
        sessions.push(handle.await??);
    }
    let first = &sessions[0];
    assert!(sessions.iter().all(|s| s.is_same_session(first)));
    Ok(())
}
