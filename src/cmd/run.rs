//! Runs the bridge: bootstrap pass, then the event loop, until `SIGINT`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// How long to let in-flight refresh writes finish once shutdown starts.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

use stellar_registrator::backend::{EtcdSink, LogSink, Registration, Registry};
use stellar_registrator::config::Config;
use stellar_registrator::docker::RuntimeClient;
use stellar_registrator::event_loop;
use stellar_registrator::store::{EtcdStore, KvStore};

pub async fn run() -> Result<()> {
    let config = Arc::new(Config::from_env());
    info!(
        etcd = %config.etcd_endpoint(),
        namespace = %config.namespace,
        refresh_period_secs = config.refresh_period_secs,
        "starting registrator bridge"
    );

    let runtime = match &config.docker_socket {
        Some(path) => RuntimeClient::connect_socket(path)?,
        None => RuntimeClient::connect_default()?,
    };
    runtime.ping().await?;

    let store: Arc<dyn KvStore> = Arc::new(EtcdStore::connect(&config.etcd_endpoint()).await?);

    let shutdown = CancellationToken::new();
    let etcd_sink = EtcdSink::new(config.clone(), store.clone(), shutdown.clone());
    let registry = Registry::new(vec![
        Registration {
            backend: Box::new(etcd_sink),
            default_enabled: true,
        },
        Registration {
            backend: Box::new(LogSink),
            default_enabled: false,
        },
    ]);

    event_loop::bootstrap(&runtime, &registry).await;

    let shutdown_for_signal = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install SIGINT handler");
            return;
        }
        info!("received SIGINT, shutting down");
        shutdown_for_signal.cancel();
    });

    tokio::select! {
        _ = event_loop::run(&runtime, &registry) => {
            info!("event stream ended");
        }
        _ = shutdown.cancelled() => {
            info!("shutdown requested");
        }
    }

    // Cancelling here is a no-op if SIGINT already did it; on a plain stream
    // end it's what actually stops every refresh worker's loop.
    shutdown.cancel();
    registry.shutdown(SHUTDOWN_GRACE).await;

    Ok(())
}
