//! One-shot connectivity check against Docker and etcd, without starting
//! the bridge.

use anyhow::{Context, Result};
use tracing::info;

use stellar_registrator::config::Config;
use stellar_registrator::docker::RuntimeClient;
use stellar_registrator::store::{EtcdStore, KvStore};

pub async fn run() -> Result<()> {
    let config = Config::from_env();

    let runtime = match &config.docker_socket {
        Some(path) => RuntimeClient::connect_socket(path),
        None => RuntimeClient::connect_default(),
    }
    .context("failed to construct Docker client")?;
    runtime.ping().await.context("Docker ping failed")?;
    info!("Docker: ok");

    let store = EtcdStore::connect(&config.etcd_endpoint())
        .await
        .context("failed to connect to etcd")?;
    let probe_key = format!("{}__diagnostics_probe", config.namespace);
    store
        .write(&probe_key, "ok", 5)
        .await
        .context("etcd write failed")?;
    store
        .delete_prefix(&probe_key)
        .await
        .context("etcd delete failed")?;
    info!("etcd: ok");

    Ok(())
}
