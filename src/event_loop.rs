//! The single-threaded event loop: bootstrap pass, then classify/inspect/
//! dispatch for every event drawn from the runtime's stream.

use futures_util::StreamExt;
use tracing::{debug, error, info};

use crate::backend::Registry;
use crate::docker::RuntimeClient;
use crate::lazy::LazyInfo;

/// Enumerate currently-running containers and dispatch each as a synthetic
/// `running` event, before the event loop itself starts consuming the
/// stream. Runs once, at startup.
pub async fn bootstrap(runtime: &RuntimeClient, registry: &Registry) {
    let ids = match runtime.list_running_ids().await {
        Ok(ids) => ids,
        Err(e) => {
            error!(error = %e, "failed to list running containers, skipping bootstrap");
            return;
        }
    };

    info!(count = ids.len(), "bootstrapping already-running containers");
    for id in ids {
        let info = LazyInfo::new(runtime.clone(), id);
        registry.dispatch("running", &info).await;
    }
}

/// Drive the runtime's event stream until it ends (normally only on
/// shutdown or a fatal stream error).
pub async fn run(runtime: &RuntimeClient, registry: &Registry) {
    let mut events = Box::pin(runtime.events());

    while let Some(event) = events.next().await {
        let event = match event {
            Ok(event) => event,
            Err(e) => {
                error!(error = %e, "docker event stream error");
                continue;
            }
        };

        if event.is_filtered() {
            debug!(?event, "dropping filtered event");
            continue;
        }

        // is_filtered() already guarantees id/status are present.
        let id = event.id.clone().unwrap();
        let status = event.status.clone().unwrap();

        info!(id, status, "docker event");

        if event.is_destroy() {
            // inspect() would fail on an already-destroyed container.
            continue;
        }

        let info = LazyInfo::new(runtime.clone(), id);
        registry.dispatch(&status, &info).await;
    }
}
