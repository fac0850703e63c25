use std::time::Duration;

use anyhow::{Context, Result};

mod config;

use config::{
    cli::{self, Parser},
    trace,
};
use name_cache::NameService;
use tokio::runtime::Builder;
use tracing::*;

fn main() -> Result<()> {
    // parses from cli or environment var
    let config = cli::Config::parse();
    let trace_config = trace::Config::parse(&config.zns_log)?;
    debug!(?config, ?trace_config);
    if let Err(err) = dotenv::dotenv() {
        debug!(?err, ".env file not loaded");
    }

    let mut builder = Builder::new_multi_thread();
    // configure thread name & enable IO/time
    builder.thread_name(&config.thread_name).enable_all();
    // default num threads will be num logical CPUs
    if let Some(num) = config.threads {
        builder.worker_threads(num);
    }
    let rt = builder.build()?;

    rt.block_on(async move {
        match tokio::spawn(async move { run(config).await }).await {
            Err(err) => error!(?err, "demo task panicked"),
            Ok(Err(err)) => error!(?err, "exited with error"),
            Ok(_) => debug!("exiting..."),
        }
    });

    Ok(())
}

/// Sequential walk over the low-level node CRUD surface and the cached name
/// lookups, against the configured server set.
async fn run(config: cli::Config) -> Result<()> {
    let service = NameService::new();
    let session = service
        .pool()
        .get(&config.servers)
        .await
        .with_context(|| format!("failed to connect to store at {}", config.servers))?;

    // ad-hoc inspection first: read whatever instance is already there
    match session.get_random_child(&config.base_path).await {
        Ok(value) => {
            info!(value = %String::from_utf8_lossy(&value), "read one existing instance")
        }
        Err(err) => warn!(%err, path = %config.base_path, "no readable instance yet"),
    }

    // publish an instance of our own; the leaf is ephemeral, so it lives
    // only as long as this process's session
    let instance_path = format!("{}/1", config.base_path);
    let created = session
        .create_node(&instance_path, b"hello world, zns")
        .await
        .context("failed to create demo instance")?;
    info!(path = %created, "created ephemeral demo instance");

    let value = session.get_node(&instance_path).await?;
    info!(value = %String::from_utf8_lossy(&value), "read back created instance");

    session
        .set_node(&instance_path, b"hello again, zns")
        .await
        .context("failed to overwrite demo instance")?;
    let value = session.get_node(&instance_path).await?;
    info!(value = %String::from_utf8_lossy(&value), "read back after set");

    // now the cached view of the same subtree
    service
        .register(&config.servers, &config.short_name, &config.base_path)
        .await
        .context("failed to register name mapping")?;
    info!(
        short_name = %config.short_name,
        base_path = %config.base_path,
        "name mapping registered"
    );

    match service.lookup_instance(&config.short_name).await {
        Ok(value) => info!(value = %String::from_utf8_lossy(&value), "random instance"),
        Err(err) => warn!(%err, "random instance lookup missed"),
    }
    match service.lookup_master(&config.short_name).await {
        Ok(value) => info!(value = %String::from_utf8_lossy(&value), "master instance"),
        Err(err) => warn!(%err, "no master designated"),
    }
    match service.lookup_all(&config.short_name).await {
        Ok(all) => info!(instances = all.len(), "batch lookup"),
        Err(err) => warn!(%err, "batch lookup missed"),
    }

    info!(seconds = config.linger, "lingering to observe watch-driven refreshes");
    tokio::time::sleep(Duration::from_secs(config.linger)).await;

    match service.lookup_all(&config.short_name).await {
        Ok(all) => info!(instances = all.len(), "final instance count"),
        Err(err) => warn!(%err, "short name emptied while lingering"),
    }

    Ok(())
}
